//! Merge operators.
//!
//! A merge operator folds a list of pending operands into an optional
//! existing value. Tables resolve operand chains with it on read, and the
//! batch applier uses it to collapse long chains eagerly.

use std::fmt;

/// Combines merge operands with an existing value.
pub trait MergeOperator: Send + Sync {
    /// Name of the operator, for diagnostics.
    fn name(&self) -> &str;

    /// Merges `operands` (oldest first) onto `existing`.
    ///
    /// Returns `None` when the operands cannot be combined, for example
    /// because one of them is malformed.
    fn full_merge(&self, key: &[u8], existing: Option<&[u8]>, operands: &[&[u8]])
        -> Option<Vec<u8>>;
}

impl fmt::Debug for dyn MergeOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MergeOperator({})", self.name())
    }
}

/// Appends operands to the existing value, separated by a delimiter.
#[derive(Debug, Clone)]
pub struct StringAppendOperator {
    delimiter: u8,
}

impl StringAppendOperator {
    /// Creates an operator that joins with `delimiter`.
    #[must_use]
    pub const fn new(delimiter: u8) -> Self {
        Self { delimiter }
    }
}

impl Default for StringAppendOperator {
    fn default() -> Self {
        Self::new(b',')
    }
}

impl MergeOperator for StringAppendOperator {
    fn name(&self) -> &str {
        "StringAppendOperator"
    }

    fn full_merge(
        &self,
        _key: &[u8],
        existing: Option<&[u8]>,
        operands: &[&[u8]],
    ) -> Option<Vec<u8>> {
        let mut out = existing.map(<[u8]>::to_vec).unwrap_or_default();
        let mut first = existing.is_none();
        for operand in operands {
            if !first {
                out.push(self.delimiter);
            }
            out.extend_from_slice(operand);
            first = false;
        }
        Some(out)
    }
}

/// Treats values as little-endian `u64` counters and adds operands.
///
/// A missing value counts as zero. Any value or operand that is not
/// exactly eight bytes makes the merge fail.
#[derive(Debug, Clone, Copy, Default)]
pub struct UInt64AddOperator;

impl UInt64AddOperator {
    fn decode(bytes: &[u8]) -> Option<u64> {
        let arr: [u8; 8] = bytes.try_into().ok()?;
        Some(u64::from_le_bytes(arr))
    }
}

impl MergeOperator for UInt64AddOperator {
    fn name(&self) -> &str {
        "UInt64AddOperator"
    }

    fn full_merge(
        &self,
        _key: &[u8],
        existing: Option<&[u8]>,
        operands: &[&[u8]],
    ) -> Option<Vec<u8>> {
        let mut total = match existing {
            Some(bytes) => Self::decode(bytes)?,
            None => 0,
        };
        for operand in operands {
            total = total.wrapping_add(Self::decode(operand)?);
        }
        Some(total.to_le_bytes().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_append_without_existing() {
        let op = StringAppendOperator::default();
        let merged = op.full_merge(b"k", None, &[b"a", b"b"]).unwrap();
        assert_eq!(merged, b"a,b");
    }

    #[test]
    fn string_append_with_existing() {
        let op = StringAppendOperator::new(b'|');
        let merged = op.full_merge(b"k", Some(b"x"), &[b"y"]).unwrap();
        assert_eq!(merged, b"x|y");
    }

    #[test]
    fn string_append_empty_existing_still_delimits() {
        let op = StringAppendOperator::default();
        let merged = op.full_merge(b"k", Some(b""), &[b"y"]).unwrap();
        assert_eq!(merged, b",y");
    }

    #[test]
    fn uint64_add() {
        let op = UInt64AddOperator;
        let one = 1u64.to_le_bytes();
        let five = 5u64.to_le_bytes();
        let merged = op.full_merge(b"k", Some(&five), &[&one, &one]).unwrap();
        assert_eq!(merged, 7u64.to_le_bytes());

        let merged = op.full_merge(b"k", None, &[&five]).unwrap();
        assert_eq!(merged, 5u64.to_le_bytes());
    }

    #[test]
    fn uint64_add_rejects_malformed() {
        let op = UInt64AddOperator;
        assert!(op.full_merge(b"k", Some(b"abc"), &[]).is_none());
        assert!(op.full_merge(b"k", None, &[b"+1"]).is_none());
    }

    #[test]
    fn debug_uses_name() {
        let op: Box<dyn MergeOperator> = Box::new(UInt64AddOperator);
        assert_eq!(format!("{op:?}"), "MergeOperator(UInt64AddOperator)");
    }
}
