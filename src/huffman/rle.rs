//! Histogram reshaping for run-length friendly code lengths.
//!
//! The code-length table of a Huffman code is itself run-length coded (see
//! [`crate::huffman::token`]). Nudging nearly-equal population counts to a
//! common value makes neighbouring symbols receive equal code lengths, which
//! in turn produces longer runs and a smaller table, at a negligible cost in
//! entropy.

use crate::error::{try_filled_vec, Result};
use tracing::trace;

/// Zero runs at least this long are already cheap to run-length code.
const GOOD_ZERO_RUN: usize = 5;
/// Nonzero runs at least this long are already cheap to run-length code.
const GOOD_NONZERO_RUN: usize = 7;
/// Counts closer than this to the running stride average are merged.
const COLLAPSE_DISTANCE: u64 = 4;

/// What [`optimize_for_rle`] found in the histogram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RleOutcome {
    /// Every count is zero; no code needs to be built.
    AllZero,
    /// The histogram holds at least one nonzero count and may have been
    /// rewritten.
    Optimized,
}

/// Rewrite `counts` in place so the resulting code lengths form longer runs.
///
/// Trailing zeros are never touched, and runs that are already long enough
/// to be run-length coded cheaply are left exactly as they are.
pub fn optimize_for_rle(counts: &mut [u32]) -> Result<RleOutcome> {
    let Some(last) = counts.iter().rposition(|&c| c != 0) else {
        trace!(len = counts.len(), "histogram is all zero");
        return Ok(RleOutcome::AllZero);
    };
    let counts = &mut counts[..=last];

    let good_for_rle = mark_good_runs(counts)?;
    collapse_strides(counts, &good_for_rle);

    Ok(RleOutcome::Optimized)
}

/// Flag every position that belongs to a run worth keeping verbatim.
fn mark_good_runs(counts: &[u32]) -> Result<Vec<bool>> {
    let mut good_for_rle = try_filled_vec(counts.len(), false)?;

    let mut start = 0;
    for run in counts.chunk_by(|a, b| a == b) {
        let threshold = if run[0] == 0 {
            GOOD_ZERO_RUN
        } else {
            GOOD_NONZERO_RUN
        };
        if run.len() >= threshold {
            good_for_rle[start..start + run.len()].fill(true);
        }
        start += run.len();
    }

    Ok(good_for_rle)
}

#[inline]
fn close_to_stride_average(value: u32, limit: u64) -> bool {
    u64::from(value).abs_diff(limit) < COLLAPSE_DISTANCE
}

/// Replace strides of similar counts by their rounded average.
fn collapse_strides(counts: &mut [u32], good_for_rle: &[bool]) {
    let length = counts.len();
    let mut stride = 0usize;
    let mut limit = u64::from(counts[0]);
    let mut sum = 0u64;

    for i in 0..=length {
        let stride_ends = i == length
            || good_for_rle[i]
            || (i != 0 && good_for_rle[i - 1])
            || !close_to_stride_average(counts[i], limit);

        if stride_ends {
            if stride >= 4 || (stride >= 3 && sum == 0) {
                // A zero stride must stay zero; anything else rounds to at least 1.
                let count = if sum == 0 {
                    0
                } else {
                    ((sum + stride as u64 / 2) / stride as u64).max(1)
                };
                // The average of u32 values always fits in u32.
                counts[i - stride..i].fill(count as u32);
            }
            stride = 0;
            sum = 0;
            limit = if i + 3 < length {
                (counts[i..i + 4].iter().map(|&c| u64::from(c)).sum::<u64>() + 2) / 4
            } else if i < length {
                u64::from(counts[i])
            } else {
                0
            };
        }

        stride += 1;
        if i != length {
            sum += u64::from(counts[i]);
            if stride >= 4 {
                limit = (sum + stride as u64 / 2) / stride as u64;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_zero() {
        let mut counts = [0u32, 0, 0];
        assert_eq!(optimize_for_rle(&mut counts).unwrap(), RleOutcome::AllZero);
        assert_eq!(counts, [0, 0, 0]);
    }

    #[test]
    fn test_empty_histogram() {
        let mut counts: [u32; 0] = [];
        assert_eq!(optimize_for_rle(&mut counts).unwrap(), RleOutcome::AllZero);
    }

    #[test]
    fn test_similar_counts_collapse() {
        let mut counts = [10u32, 11, 9, 10, 50];
        assert_eq!(
            optimize_for_rle(&mut counts).unwrap(),
            RleOutcome::Optimized
        );
        assert_eq!(counts, [10, 10, 10, 10, 50]);
    }

    #[test]
    fn test_alternating_small_counts_collapse() {
        let mut counts = [2u32, 1, 2, 1, 2, 1, 100];
        optimize_for_rle(&mut counts).unwrap();
        assert_eq!(counts, [2, 2, 2, 2, 2, 2, 100]);
    }

    #[test]
    fn test_sparse_ones_become_ones() {
        // A nonzero stride average is floored at 1.
        let mut counts = [1u32, 0, 0, 0, 1];
        optimize_for_rle(&mut counts).unwrap();
        assert_eq!(counts, [1, 1, 1, 1, 1]);
    }

    #[test]
    fn test_short_stride_untouched() {
        let mut counts = [10u32, 11, 9, 50];
        optimize_for_rle(&mut counts).unwrap();
        assert_eq!(counts, [10, 11, 9, 50]);
    }

    #[test]
    fn test_good_run_preserved() {
        let mut counts = [5u32, 5, 5, 5, 5, 5, 5, 6, 4, 6, 4, 50];
        optimize_for_rle(&mut counts).unwrap();
        assert_eq!(counts, [5, 5, 5, 5, 5, 5, 5, 5, 5, 5, 5, 50]);
    }

    #[test]
    fn test_trailing_zeros_untouched() {
        let mut counts = [3u32, 3, 2, 3, 0, 0, 0];
        optimize_for_rle(&mut counts).unwrap();
        assert_eq!(counts, [3, 3, 3, 3, 0, 0, 0]);
    }

    #[test]
    fn test_good_runs_are_stable() {
        let original = [7u32, 7, 7, 7, 7, 7, 7, 0, 0, 0, 0, 0, 3, 3, 3, 3, 3, 3, 3];
        let mut counts = original;
        optimize_for_rle(&mut counts).unwrap();
        assert_eq!(counts, original);
    }

    #[test]
    fn test_mark_good_runs() {
        let counts = [0u32, 0, 0, 0, 0, 1, 2, 2, 2, 2, 2, 2, 2, 0, 0];
        let good = mark_good_runs(&counts).unwrap();
        let expected: Vec<bool> = (0..counts.len()).map(|i| i < 5 || (6..13).contains(&i)).collect();
        assert_eq!(good, expected);
    }
}
