//! Error types for Bloom filter construction.

use thiserror::Error;

/// Result type for filter operations.
pub type FilterResult<T> = Result<T, FilterError>;

/// Errors that can occur when sizing a Bloom filter.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FilterError {
    /// A filter needs at least one probe per key.
    #[error("bloom filter requires at least one probe")]
    ZeroProbes,

    /// A filter needs at least one bit.
    #[error("bloom filter requires a non-zero bit count")]
    ZeroBits,

    /// The requested size does not fit the 32-bit bit index.
    #[error("bloom filter too large: {requested} bits requested")]
    TooLarge {
        /// Number of bits that was asked for.
        requested: u64,
    },
}
