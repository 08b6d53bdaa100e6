//! Core type definitions for batchlog.

use std::fmt;

/// Sequence number stamped on every table entry.
///
/// Sequence numbers give a total order over mutations. Higher sequence
/// numbers indicate later writes; point reads are taken "as of" one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SequenceNumber(pub u64);

impl SequenceNumber {
    /// Creates a new sequence number.
    #[must_use]
    pub const fn new(seq: u64) -> Self {
        Self(seq)
    }

    /// Returns the raw sequence value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Returns the next sequence number.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for SequenceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "seq:{}", self.0)
    }
}

/// Identifier for a column family.
///
/// Id 0 is the default column family and is never written to the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ColumnFamilyId(pub u32);

impl ColumnFamilyId {
    /// The default column family.
    pub const DEFAULT: Self = Self(0);

    /// Creates a new column family ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Returns true for the default column family.
    #[must_use]
    pub const fn is_default(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for ColumnFamilyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cf:{}", self.0)
    }
}

/// Kind of a versioned table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ValueType {
    /// Tombstone.
    Deletion = 0x00,
    /// Full value.
    Value = 0x01,
    /// Unresolved merge operand.
    Merge = 0x02,
}

impl ValueType {
    /// Converts a byte to a value type.
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0x00 => Some(Self::Deletion),
            0x01 => Some(Self::Value),
            0x02 => Some(Self::Merge),
            _ => None,
        }
    }

    /// Converts the value type to a byte.
    #[must_use]
    pub const fn as_byte(self) -> u8 {
        self as u8
    }

    /// Short lowercase name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Deletion => "delete",
            Self::Value => "put",
            Self::Merge => "merge",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_number_next() {
        let s1 = SequenceNumber::new(5);
        let s2 = s1.next();
        assert_eq!(s2.as_u64(), 6);
        assert!(s1 < s2);
    }

    #[test]
    fn column_family_display() {
        assert_eq!(format!("{}", ColumnFamilyId::new(42)), "cf:42");
        assert!(ColumnFamilyId::DEFAULT.is_default());
        assert!(!ColumnFamilyId::new(1).is_default());
    }

    #[test]
    fn value_type_bytes() {
        for vt in [ValueType::Deletion, ValueType::Value, ValueType::Merge] {
            assert_eq!(ValueType::from_byte(vt.as_byte()), Some(vt));
        }
        assert_eq!(ValueType::from_byte(0x03), None);
    }
}
