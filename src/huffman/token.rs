//! Run-length tokenization of code-length tables.
//!
//! A code-length table is sent as a sequence of meta-alphabet symbols:
//!
//! | code  | meaning                                   | extra bits |
//! |-------|-------------------------------------------|------------|
//! | 0-15  | literal code length                       | 0          |
//! | 16    | repeat previous nonzero length 3-6 times  | 2          |
//! | 17    | 3-10 zeros                                | 3          |
//! | 18    | 11-138 zeros                              | 7          |
//!
//! The "previous nonzero length" starts at [`DEFAULT_CODE_LENGTH`] and is
//! only updated by nonzero runs.

use crate::{CODE_LENGTH_CODES, DEFAULT_CODE_LENGTH, MAX_ALLOWED_CODE_LENGTH};

/// Repeat the previous nonzero code length.
pub const REPEAT_PREVIOUS: u8 = 16;
/// Short run of zeros.
pub const REPEAT_ZEROS_SHORT: u8 = 17;
/// Long run of zeros.
pub const REPEAT_ZEROS_LONG: u8 = 18;

const MAX_REPEAT_PREVIOUS: usize = 6;
const MAX_ZEROS_SHORT: usize = 10;
const MAX_ZEROS_LONG: usize = 138;

/// One symbol of the code-length meta-alphabet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct HuffmanTreeToken {
    /// Literal length (0-15) or repeat escape (16-18).
    pub code: u8,
    /// Value of the escape's extra bits; 0 for literals.
    pub extra_bits: u8,
}

impl HuffmanTreeToken {
    #[inline]
    const fn literal(length: u8) -> Self {
        Self {
            code: length,
            extra_bits: 0,
        }
    }

    #[inline]
    const fn escape(code: u8, extra_bits: u8) -> Self {
        Self { code, extra_bits }
    }

    /// Number of bits the writer spends on `extra_bits`.
    pub const fn extra_bit_count(&self) -> u8 {
        match self.code {
            REPEAT_PREVIOUS => 2,
            REPEAT_ZEROS_SHORT => 3,
            REPEAT_ZEROS_LONG => 7,
            _ => 0,
        }
    }

    /// How many code lengths this token stands for.
    pub const fn run_length(&self) -> usize {
        match self.code {
            REPEAT_PREVIOUS | REPEAT_ZEROS_SHORT => 3 + self.extra_bits as usize,
            REPEAT_ZEROS_LONG => 11 + self.extra_bits as usize,
            _ => 1,
        }
    }
}

/// Tokenize `code_lengths`.
///
/// Never produces more tokens than there are code lengths.
///
/// # Panics
///
/// Panics if more than `max_tokens` tokens would be produced, or if a length
/// exceeds [`MAX_ALLOWED_CODE_LENGTH`].
pub fn compress_code_lengths(code_lengths: &[u8], max_tokens: usize) -> Vec<HuffmanTreeToken> {
    let mut tokens = Vec::with_capacity(max_tokens.min(code_lengths.len()));
    let mut prev_value = DEFAULT_CODE_LENGTH;

    for run in code_lengths.chunk_by(|a, b| a == b) {
        let value = run[0];
        if value == 0 {
            code_repeated_zeros(run.len(), &mut tokens);
        } else {
            code_repeated_values(run.len(), value, prev_value, &mut tokens);
            prev_value = value;
        }
        assert!(
            tokens.len() <= max_tokens,
            "token budget of {max_tokens} exceeded"
        );
    }

    tokens
}

fn code_repeated_values(
    mut repetitions: usize,
    value: u8,
    prev_value: u8,
    tokens: &mut Vec<HuffmanTreeToken>,
) {
    assert!(
        value <= MAX_ALLOWED_CODE_LENGTH,
        "code length {value} exceeds {MAX_ALLOWED_CODE_LENGTH}"
    );
    if value != prev_value {
        tokens.push(HuffmanTreeToken::literal(value));
        repetitions -= 1;
    }
    while repetitions > 0 {
        if repetitions < 3 {
            tokens.extend((0..repetitions).map(|_| HuffmanTreeToken::literal(value)));
            break;
        } else if repetitions <= MAX_REPEAT_PREVIOUS {
            tokens.push(HuffmanTreeToken::escape(
                REPEAT_PREVIOUS,
                (repetitions - 3) as u8,
            ));
            break;
        } else {
            tokens.push(HuffmanTreeToken::escape(REPEAT_PREVIOUS, 3));
            repetitions -= MAX_REPEAT_PREVIOUS;
        }
    }
}

fn code_repeated_zeros(mut repetitions: usize, tokens: &mut Vec<HuffmanTreeToken>) {
    while repetitions > 0 {
        if repetitions < 3 {
            tokens.extend((0..repetitions).map(|_| HuffmanTreeToken::literal(0)));
            break;
        } else if repetitions <= MAX_ZEROS_SHORT {
            tokens.push(HuffmanTreeToken::escape(
                REPEAT_ZEROS_SHORT,
                (repetitions - 3) as u8,
            ));
            break;
        } else if repetitions <= MAX_ZEROS_LONG {
            tokens.push(HuffmanTreeToken::escape(
                REPEAT_ZEROS_LONG,
                (repetitions - 11) as u8,
            ));
            break;
        } else {
            tokens.push(HuffmanTreeToken::escape(REPEAT_ZEROS_LONG, 0x7f));
            repetitions -= MAX_ZEROS_LONG;
        }
    }
}

/// Count how often each meta-alphabet symbol occurs in `tokens`.
///
/// This is the histogram the writer feeds back into
/// [`create_huffman_tree`](crate::create_huffman_tree) to build the code
/// that transmits the token stream.
pub fn token_histogram(tokens: &[HuffmanTreeToken]) -> [u32; CODE_LENGTH_CODES] {
    let mut histogram = [0u32; CODE_LENGTH_CODES];
    for token in tokens {
        histogram[usize::from(token.code)] += 1;
    }
    histogram
}
