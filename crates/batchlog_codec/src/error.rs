//! Error types for the codec crate.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while encoding or decoding.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Fewer bytes remain than the next field requires.
    #[error("truncated input: needed {needed} bytes, {available} available")]
    Truncated {
        /// Bytes the field needed.
        needed: usize,
        /// Bytes that were left in the input.
        available: usize,
    },

    /// A varint ran past its maximum width or carried bits beyond the
    /// target integer.
    #[error("varint overflows {bits}-bit integer")]
    VarintOverflow {
        /// Width of the integer being decoded.
        bits: u32,
    },

    /// A slice is too long for its varint32 length prefix.
    #[error("slice of {len} bytes exceeds the u32 length prefix")]
    SliceTooLarge {
        /// Length of the rejected slice.
        len: usize,
    },
}

impl CodecError {
    /// Creates a truncation error.
    pub fn truncated(needed: usize, available: usize) -> Self {
        Self::Truncated { needed, available }
    }

    /// Returns true if this error reports a short input.
    #[must_use]
    pub fn is_truncated(&self) -> bool {
        matches!(self, Self::Truncated { .. })
    }
}
