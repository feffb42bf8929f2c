//! # lossless-huffman
//!
//! Length-limited canonical Huffman codes for a lossless image codec's
//! entropy-coding stage.
//!
//! Given a symbol histogram this crate produces per-symbol code lengths no
//! longer than a format-imposed limit, the matching bit-reversed canonical
//! codes, and the run-length token stream that describes the code lengths in
//! a bitstream header.
//!
//! ## Features
//!
//! - **Histogram reshaping** that makes code-length tables cheaper to send
//! - **Length-limited Huffman trees** built over a flat node arena
//! - **Canonical codes**, stored least-significant bit first
//! - **Code-length tokenization** with the 16/17/18 repeat escapes
//! - Optional `huffcodes` CLI via the `cli` feature
//!
//! ## Example
//!
//! ```rust
//! use lossless_huffman::{create_huffman_tree, HuffmanTreeCode};
//!
//! let mut histogram = vec![40u32, 3, 3, 0, 12, 7];
//! let mut tree = HuffmanTreeCode::new(histogram.len());
//! create_huffman_tree(&mut histogram, 15, &mut tree).unwrap();
//!
//! assert_eq!(tree.code_lengths[3], 0);
//! let tokens = tree.tokens();
//! assert!(!tokens.is_empty());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod huffman;

pub use error::{Error, Result};
pub use huffman::{
    compress_code_lengths, create_huffman_tree, create_huffman_tree_with_options,
    token_histogram, HuffmanOptions, HuffmanTreeCode, HuffmanTreeToken, RleOutcome,
};

/// Longest code length the bitstream format allows.
pub const MAX_ALLOWED_CODE_LENGTH: u8 = 15;

/// Size of the code-length meta-alphabet (lengths 0-15 plus escapes 16-18).
pub const CODE_LENGTH_CODES: usize = 19;

/// Code length a decoder assumes as "previous" before reading any nonzero
/// length; the token encoder starts from the same value.
pub const DEFAULT_CODE_LENGTH: u8 = 8;
