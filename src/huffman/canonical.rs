//! Canonical code assignment.
//!
//! Codes of equal length are consecutive in symbol order and each length
//! class starts right after the shorter ones, as in DEFLATE. The bitstream is
//! read least-significant bit first, so every code is stored bit-reversed.

use crate::MAX_ALLOWED_CODE_LENGTH;

use super::HuffmanTreeCode;

/// Bit-reversed values of every 4-bit nibble.
const REVERSED_NIBBLES: [u8; 16] = [
    0x0, 0x8, 0x4, 0xc, 0x2, 0xa, 0x6, 0xe, 0x1, 0x9, 0x5, 0xd, 0x3, 0xb, 0x7, 0xf,
];

const REVERSE_WIDTH: u32 = MAX_ALLOWED_CODE_LENGTH as u32 + 1;

/// Reverse the low `num_bits` bits of `bits`.
///
/// Nibbles are reversed from the table and stacked from the top of a
/// 16-bit window, then the result is shifted down to `num_bits` wide.
#[inline]
pub fn reverse_bits(num_bits: u8, bits: u32) -> u32 {
    debug_assert!(num_bits <= MAX_ALLOWED_CODE_LENGTH);
    let num_bits = u32::from(num_bits);
    let mut bits = bits;
    let mut reversed = 0u32;
    let mut i = 0;
    while i < num_bits {
        i += 4;
        reversed |= u32::from(REVERSED_NIBBLES[(bits & 0xf) as usize]) << (REVERSE_WIDTH - i);
        bits >>= 4;
    }
    reversed >> (REVERSE_WIDTH - num_bits)
}

/// Fill `tree.codes` from `tree.code_lengths`.
///
/// Symbols with length 0 get code 0, which is never read.
pub fn convert_bit_depths_to_codes(tree: &mut HuffmanTreeCode) {
    const CLASSES: usize = MAX_ALLOWED_CODE_LENGTH as usize + 1;

    let mut depth_count = [0u32; CLASSES];
    for &length in &tree.code_lengths {
        assert!(
            length <= MAX_ALLOWED_CODE_LENGTH,
            "code length {length} exceeds {MAX_ALLOWED_CODE_LENGTH}"
        );
        depth_count[usize::from(length)] += 1;
    }
    depth_count[0] = 0;

    let mut next_code = [0u32; CLASSES];
    let mut code = 0u32;
    for length in 1..CLASSES {
        code = (code + depth_count[length - 1]) << 1;
        next_code[length] = code;
    }

    for (slot, &length) in tree.codes.iter_mut().zip(&tree.code_lengths) {
        *slot = if length == 0 {
            0
        } else {
            let class = usize::from(length);
            let canonical = next_code[class];
            next_code[class] += 1;
            // A valid length set never needs more than `length` bits.
            reverse_bits(length, canonical) as u16
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(lengths: &[u8]) -> HuffmanTreeCode {
        let mut tree = HuffmanTreeCode::new(lengths.len());
        tree.code_lengths.copy_from_slice(lengths);
        convert_bit_depths_to_codes(&mut tree);
        tree
    }

    #[test]
    fn test_reverse_bits() {
        assert_eq!(reverse_bits(0, 0), 0);
        assert_eq!(reverse_bits(1, 1), 1);
        assert_eq!(reverse_bits(3, 0b001), 0b100);
        assert_eq!(reverse_bits(4, 0b0011), 0b1100);
        assert_eq!(reverse_bits(5, 0b10110), 0b01101);
        assert_eq!(reverse_bits(15, 1), 1 << 14);
        assert_eq!(reverse_bits(15, 0x7fff), 0x7fff);
    }

    #[test]
    fn test_reverse_bits_matches_naive() {
        for num_bits in 1..=MAX_ALLOWED_CODE_LENGTH {
            for bits in [0u32, 1, 2, 5, 0x55, 0x1234, 0x7fff] {
                let bits = bits & ((1 << num_bits) - 1);
                let naive = (0..num_bits).fold(0u32, |acc, i| (acc << 1) | ((bits >> i) & 1));
                assert_eq!(reverse_bits(num_bits, bits), naive, "{num_bits} bits of {bits:#x}");
            }
        }
    }

    #[test]
    fn test_two_symbols() {
        let tree = table(&[1, 1]);
        assert_eq!(tree.codes, vec![0, 1]);
    }

    #[test]
    fn test_mixed_lengths() {
        // Canonical codes 0, 10, 11 stored reversed.
        let tree = table(&[1, 2, 2]);
        assert_eq!(tree.codes, vec![0b0, 0b01, 0b11]);
    }

    #[test]
    fn test_unused_symbols_skipped() {
        // Canonical codes: sym0 = 00, sym1 = 01, sym3 = 10, sym4 = 110, sym5 = 111.
        let tree = table(&[2, 2, 0, 2, 3, 3]);
        assert_eq!(tree.codes, vec![0b00, 0b10, 0, 0b01, 0b011, 0b111]);
    }

    #[test]
    fn test_rfc1951_example() {
        // RFC 1951 section 3.2.2: lengths (3, 3, 3, 3, 3, 2, 4, 4) give
        // 010, 011, 100, 101, 110, 00, 1110, 1111.
        let tree = table(&[3, 3, 3, 3, 3, 2, 4, 4]);
        let expected: Vec<u16> = [
            (0b010, 3),
            (0b011, 3),
            (0b100, 3),
            (0b101, 3),
            (0b110, 3),
            (0b00, 2),
            (0b1110, 4),
            (0b1111, 4),
        ]
        .iter()
        .map(|&(code, len)| reverse_bits(len, code) as u16)
        .collect();
        assert_eq!(tree.codes, expected);
    }
}
