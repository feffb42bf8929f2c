//! Huffman code construction for the lossless entropy coder.
//!
//! The pipeline runs in three steps, each usable on its own:
//!
//! 1. [`optimize_for_rle`] reshapes the histogram so the code lengths come
//!    out in long runs.
//! 2. [`generate_bit_depths`] builds a length-limited Huffman tree.
//! 3. [`convert_bit_depths_to_codes`] assigns bit-reversed canonical codes.
//!
//! [`create_huffman_tree`] chains all three. Once a table is final,
//! [`compress_code_lengths`] turns its lengths into the token stream the
//! header writer transmits.

pub mod canonical;
pub mod rle;
pub mod token;
pub mod tree;

pub use canonical::{convert_bit_depths_to_codes, reverse_bits};
pub use rle::{optimize_for_rle, RleOutcome};
pub use token::{compress_code_lengths, token_histogram, HuffmanTreeToken};
pub use tree::{build_bit_depths, fits_depth_limit, generate_bit_depths};

use crate::error::{try_filled_vec, Result};
use crate::MAX_ALLOWED_CODE_LENGTH;
use tracing::debug;

/// Code lengths and bit-reversed codes for one alphabet.
///
/// `codes[i]` is only meaningful where `code_lengths[i] > 0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HuffmanTreeCode {
    /// Bits per symbol; 0 marks an unused symbol.
    pub code_lengths: Vec<u8>,
    /// Codes, stored least-significant bit first.
    pub codes: Vec<u16>,
}

impl HuffmanTreeCode {
    /// Create an empty table for `num_symbols` symbols.
    pub fn new(num_symbols: usize) -> Self {
        Self {
            code_lengths: vec![0; num_symbols],
            codes: vec![0; num_symbols],
        }
    }

    /// Alphabet size.
    #[inline]
    pub fn num_symbols(&self) -> usize {
        self.code_lengths.len()
    }

    /// Number of symbols with a nonzero code length.
    pub fn num_used(&self) -> usize {
        self.code_lengths.iter().filter(|&&l| l != 0).count()
    }

    /// Longest code length in the table (0 when no symbol is used).
    pub fn max_code_length(&self) -> u8 {
        self.code_lengths.iter().copied().max().unwrap_or(0)
    }

    /// The `(code, length)` pair for `symbol`, or `None` if it is unused.
    pub fn code(&self, symbol: usize) -> Option<(u16, u8)> {
        match self.code_lengths.get(symbol) {
            Some(&length) if length > 0 => Some((self.codes[symbol], length)),
            _ => None,
        }
    }

    /// Tokenize the code lengths for transmission.
    ///
    /// Every token covers at least one symbol, so the alphabet size is always
    /// a sufficient budget.
    pub fn tokens(&self) -> Vec<HuffmanTreeToken> {
        compress_code_lengths(&self.code_lengths, self.num_symbols())
    }
}

/// Options for building a Huffman code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HuffmanOptions {
    /// Maximum code length in bits (1-15).
    pub max_code_length: u8,
    /// Reshape the histogram for run-length friendly code lengths first.
    pub optimize_for_rle: bool,
}

impl Default for HuffmanOptions {
    fn default() -> Self {
        Self::lossless()
    }
}

impl HuffmanOptions {
    /// Full 15-bit codes with histogram reshaping, as the lossless encoder
    /// uses them.
    pub const fn lossless() -> Self {
        Self {
            max_code_length: MAX_ALLOWED_CODE_LENGTH,
            optimize_for_rle: true,
        }
    }

    /// Full 15-bit codes built from the counts exactly as given.
    pub const fn exact() -> Self {
        Self {
            max_code_length: MAX_ALLOWED_CODE_LENGTH,
            optimize_for_rle: false,
        }
    }

    /// Same options with a different depth limit.
    pub const fn with_max_code_length(mut self, max_code_length: u8) -> Self {
        self.max_code_length = max_code_length;
        self
    }
}

/// Build codes for `histogram` with at most `depth_limit` bits each.
///
/// The histogram is reshaped in place first (see [`optimize_for_rle`]). An
/// all-zero histogram yields a table with every length 0. On error the
/// table contents are unspecified.
///
/// Reshaping can give counts to unused symbols inside a run. If that leaves
/// more used symbols than `depth_limit` bits can code, the counts are kept
/// as given instead.
///
/// # Panics
///
/// Panics if `histogram` and `tree` disagree on the alphabet size, or on any
/// contract breach listed for [`generate_bit_depths`].
pub fn create_huffman_tree(
    histogram: &mut [u32],
    depth_limit: u8,
    tree: &mut HuffmanTreeCode,
) -> Result<()> {
    let options = HuffmanOptions::lossless().with_max_code_length(depth_limit);
    create_huffman_tree_with_options(histogram, &options, tree)
}

/// Build codes for `histogram` as configured by `options`.
///
/// The histogram is only modified when `options.optimize_for_rle` is set
/// and the reshaped counts still fit `options.max_code_length`.
pub fn create_huffman_tree_with_options(
    histogram: &mut [u32],
    options: &HuffmanOptions,
    tree: &mut HuffmanTreeCode,
) -> Result<()> {
    assert_eq!(
        histogram.len(),
        tree.num_symbols(),
        "histogram and code table sizes differ"
    );
    assert_eq!(
        tree.codes.len(),
        tree.code_lengths.len(),
        "code table is inconsistent"
    );

    if options.optimize_for_rle {
        shape_histogram(histogram, options.max_code_length)?;
    }
    generate_bit_depths(histogram, options.max_code_length, &mut tree.code_lengths)?;
    convert_bit_depths_to_codes(tree);

    debug!(
        num_symbols = tree.num_symbols(),
        used = tree.num_used(),
        max_length = tree.max_code_length(),
        "built huffman code"
    );
    Ok(())
}

/// Apply [`optimize_for_rle`] unless the reshaped counts would use more
/// symbols than `depth_limit` bits can code.
fn shape_histogram(histogram: &mut [u32], depth_limit: u8) -> Result<()> {
    let mut shaped = try_filled_vec(histogram.len(), 0u32)?;
    shaped.copy_from_slice(histogram);

    match optimize_for_rle(&mut shaped)? {
        RleOutcome::AllZero => {
            debug!(num_symbols = histogram.len(), "no symbols used, no codes needed");
        }
        RleOutcome::Optimized if fits_depth_limit(&shaped, depth_limit) => {
            histogram.copy_from_slice(&shaped);
        }
        RleOutcome::Optimized => {
            debug!(
                used = shaped.iter().filter(|&&c| c != 0).count(),
                depth_limit,
                "reshaped counts do not fit the depth limit, keeping counts as given"
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_symbol() {
        let mut histogram = [5u32];
        let mut tree = HuffmanTreeCode::new(1);
        create_huffman_tree(&mut histogram, 15, &mut tree).unwrap();
        assert_eq!(tree.code_lengths, vec![1]);
        assert_eq!(tree.code(0), Some((0, 1)));
    }

    #[test]
    fn test_all_zero() {
        let mut histogram = [0u32; 3];
        let mut tree = HuffmanTreeCode::new(3);
        create_huffman_tree(&mut histogram, 15, &mut tree).unwrap();
        assert_eq!(tree.code_lengths, vec![0, 0, 0]);
        assert_eq!(tree.num_used(), 0);
        assert_eq!(tree.max_code_length(), 0);
        assert_eq!(tree.code(1), None);
    }

    #[test]
    fn test_two_equal_symbols() {
        let mut histogram = [3u32, 3];
        let mut tree = HuffmanTreeCode::new(2);
        create_huffman_tree(&mut histogram, 15, &mut tree).unwrap();
        assert_eq!(tree.code_lengths, vec![1, 1]);
        assert_eq!(tree.codes, vec![0, 1]);
    }

    #[test]
    fn test_exact_leaves_histogram_alone() {
        let original = [10u32, 11, 9, 10, 50];
        let mut histogram = original;
        let mut tree = HuffmanTreeCode::new(histogram.len());
        create_huffman_tree_with_options(&mut histogram, &HuffmanOptions::exact(), &mut tree)
            .unwrap();
        assert_eq!(histogram, original);
        assert_eq!(tree.num_used(), 5);
    }

    #[test]
    fn test_rle_shaping_evens_out_lengths() {
        let mut histogram = [10u32, 11, 9, 10, 50];
        let mut tree = HuffmanTreeCode::new(histogram.len());
        create_huffman_tree(&mut histogram, 15, &mut tree).unwrap();
        assert_eq!(histogram, [10, 10, 10, 10, 50]);
        assert_eq!(tree.code_lengths, vec![3, 3, 3, 3, 1]);
        assert_eq!(tree.codes, vec![0b001, 0b101, 0b011, 0b111, 0b0]);
    }

    #[test]
    fn test_shaping_that_overfills_limit_is_dropped() {
        // Shaping turns this into five used symbols, more than 2 bits can code.
        let mut histogram = [1u32, 0, 0, 0, 1];
        let mut tree = HuffmanTreeCode::new(histogram.len());
        create_huffman_tree(&mut histogram, 2, &mut tree).unwrap();
        assert_eq!(histogram, [1, 0, 0, 0, 1]);
        assert_eq!(tree.code_lengths, vec![1, 0, 0, 0, 1]);

        let mut histogram = [1u32, 0, 0, 0, 1];
        create_huffman_tree(&mut histogram, 1, &mut tree).unwrap();
        assert_eq!(tree.code_lengths, vec![1, 0, 0, 0, 1]);
    }

    #[test]
    fn test_shaping_kept_when_it_fits() {
        let mut histogram = [1u32, 0, 0, 0, 1];
        let mut tree = HuffmanTreeCode::new(histogram.len());
        create_huffman_tree(&mut histogram, 3, &mut tree).unwrap();
        assert_eq!(histogram, [1, 1, 1, 1, 1]);
        assert_eq!(tree.num_used(), 5);
        assert!(tree.max_code_length() <= 3);
    }

    #[test]
    fn test_tokens_cover_table() {
        let mut histogram = vec![0u32; 280];
        for (i, count) in histogram.iter_mut().enumerate().take(256) {
            *count = 1 + (i as u32 % 3);
        }
        let mut tree = HuffmanTreeCode::new(histogram.len());
        create_huffman_tree(&mut histogram, 15, &mut tree).unwrap();
        let tokens = tree.tokens();
        let covered: usize = tokens.iter().map(HuffmanTreeToken::run_length).sum();
        assert_eq!(covered, tree.num_symbols());
    }

    #[test]
    fn test_default_options() {
        let options = HuffmanOptions::default();
        assert_eq!(options.max_code_length, 15);
        assert!(options.optimize_for_rle);
        assert_eq!(options.with_max_code_length(7).max_code_length, 7);
    }

    #[test]
    #[should_panic(expected = "sizes differ")]
    fn test_size_mismatch() {
        let mut histogram = [1u32, 2];
        let mut tree = HuffmanTreeCode::new(3);
        let _ = create_huffman_tree(&mut histogram, 15, &mut tree);
    }
}
