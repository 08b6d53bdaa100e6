//! Error types for batchlog core.

use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur while building, decoding or replaying a batch.
///
/// Soft replay outcomes (skipped records, declined merges, filtered
/// deletes) are never reported here; they show up in
/// [`ReplayStats`](crate::ReplayStats) instead.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Low-level codec error.
    #[error("codec error: {0}")]
    Codec(#[from] batchlog_codec::CodecError),

    /// Bloom filter construction error.
    #[error("filter error: {0}")]
    Filter(#[from] batchlog_bloom::FilterError),

    /// Batch bytes are malformed.
    #[error("corruption: {message}")]
    Corruption {
        /// Description of the corruption.
        message: String,
    },

    /// A well-formed request that cannot be satisfied.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Description of the problem.
        message: String,
    },

    /// A handler was asked to do something it does not support.
    #[error("not implemented: {capability}")]
    NotImplemented {
        /// The unsupported operation.
        capability: String,
    },
}

impl CoreError {
    /// Creates a corruption error.
    pub fn corruption(message: impl Into<String>) -> Self {
        Self::Corruption {
            message: message.into(),
        }
    }

    /// Creates an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates a not implemented error.
    pub fn not_implemented(capability: impl Into<String>) -> Self {
        Self::NotImplemented {
            capability: capability.into(),
        }
    }

    /// Returns true if this is a corruption error.
    #[must_use]
    pub fn is_corruption(&self) -> bool {
        matches!(self, Self::Corruption { .. })
    }

    /// Returns true if this is an invalid argument error.
    #[must_use]
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(
            CoreError::corruption("unknown tag").to_string(),
            "corruption: unknown tag"
        );
        assert_eq!(
            CoreError::not_implemented("merge").to_string(),
            "not implemented: merge"
        );
    }

    #[test]
    fn codec_errors_convert() {
        let err: CoreError = batchlog_codec::CodecError::VarintOverflow { bits: 32 }.into();
        assert!(matches!(err, CoreError::Codec(_)));
        assert!(!err.is_corruption());
    }
}
