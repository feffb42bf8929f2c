//! Error types for the lossless-huffman library.

use thiserror::Error;

/// Result type alias for lossless-huffman operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building Huffman codes.
///
/// Caller contract violations (an out-of-range depth limit, an alphabet too
/// large for the requested depth, mismatched buffer lengths) are not
/// represented here; they panic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A scratch buffer or tree arena could not be reserved.
    #[error("allocation failed: could not allocate {requested_bytes} bytes")]
    AllocationFailed {
        /// Size of the failed reservation in bytes.
        requested_bytes: usize,
    },
}

impl Error {
    /// Create an allocation error for `count` elements of type `T`.
    pub(crate) fn allocation<T>(count: usize) -> Self {
        Error::AllocationFailed {
            requested_bytes: count.saturating_mul(std::mem::size_of::<T>()),
        }
    }
}

/// Reserve an exactly sized, default-filled buffer, reporting failure instead
/// of aborting.
pub(crate) fn try_filled_vec<T: Clone>(len: usize, value: T) -> Result<Vec<T>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|_| Error::allocation::<T>(len))?;
    buf.resize(len, value);
    Ok(buf)
}
