//! Batch record types and wire tags.

use crate::types::{ColumnFamilyId, ValueType};

/// Size of the batch header: 8-byte sequence plus 4-byte count.
pub const HEADER_SIZE: usize = 12;

/// One-byte record tag.
///
/// The column family variants are followed by a varint32 column family id
/// and are only written for non-default families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RecordTag {
    /// Delete in the default column family.
    Deletion = 0x00,
    /// Put in the default column family.
    Value = 0x01,
    /// Merge in the default column family.
    Merge = 0x02,
    /// Opaque log data blob.
    LogData = 0x03,
    /// Delete with an explicit column family.
    ColumnFamilyDeletion = 0x04,
    /// Put with an explicit column family.
    ColumnFamilyValue = 0x05,
    /// Merge with an explicit column family.
    ColumnFamilyMerge = 0x06,
}

impl RecordTag {
    /// Converts a byte to a record tag.
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0x00 => Some(Self::Deletion),
            0x01 => Some(Self::Value),
            0x02 => Some(Self::Merge),
            0x03 => Some(Self::LogData),
            0x04 => Some(Self::ColumnFamilyDeletion),
            0x05 => Some(Self::ColumnFamilyValue),
            0x06 => Some(Self::ColumnFamilyMerge),
            _ => None,
        }
    }

    /// Converts the tag to a byte.
    #[must_use]
    pub const fn as_byte(self) -> u8 {
        self as u8
    }

    /// Returns the tag for a mutation of `kind` in `cf`.
    #[must_use]
    pub const fn for_mutation(kind: ValueType, cf: ColumnFamilyId) -> Self {
        match (kind, cf.is_default()) {
            (ValueType::Deletion, true) => Self::Deletion,
            (ValueType::Value, true) => Self::Value,
            (ValueType::Merge, true) => Self::Merge,
            (ValueType::Deletion, false) => Self::ColumnFamilyDeletion,
            (ValueType::Value, false) => Self::ColumnFamilyValue,
            (ValueType::Merge, false) => Self::ColumnFamilyMerge,
        }
    }

    /// Returns true if a varint column family id follows the tag.
    #[must_use]
    pub const fn has_column_family(self) -> bool {
        matches!(
            self,
            Self::ColumnFamilyDeletion | Self::ColumnFamilyValue | Self::ColumnFamilyMerge
        )
    }

    /// The mutation kind, or `None` for log data.
    #[must_use]
    pub const fn value_type(self) -> Option<ValueType> {
        match self {
            Self::Deletion | Self::ColumnFamilyDeletion => Some(ValueType::Deletion),
            Self::Value | Self::ColumnFamilyValue => Some(ValueType::Value),
            Self::Merge | Self::ColumnFamilyMerge => Some(ValueType::Merge),
            Self::LogData => None,
        }
    }
}

/// A decoded record borrowing from the batch bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Record<'a> {
    /// Set `key` to `value`.
    Put {
        /// Target column family.
        cf: ColumnFamilyId,
        /// Key bytes.
        key: &'a [u8],
        /// Value bytes.
        value: &'a [u8],
    },
    /// Add a merge operand for `key`.
    Merge {
        /// Target column family.
        cf: ColumnFamilyId,
        /// Key bytes.
        key: &'a [u8],
        /// Operand bytes.
        value: &'a [u8],
    },
    /// Delete `key`.
    Delete {
        /// Target column family.
        cf: ColumnFamilyId,
        /// Key bytes.
        key: &'a [u8],
    },
    /// Opaque blob carried alongside the mutations.
    LogData {
        /// Blob bytes.
        blob: &'a [u8],
    },
}

impl<'a> Record<'a> {
    /// The mutation kind, or `None` for log data.
    #[must_use]
    pub fn value_type(&self) -> Option<ValueType> {
        match self {
            Self::Put { .. } => Some(ValueType::Value),
            Self::Merge { .. } => Some(ValueType::Merge),
            Self::Delete { .. } => Some(ValueType::Deletion),
            Self::LogData { .. } => None,
        }
    }

    /// Column family of a mutation, `None` for log data.
    #[must_use]
    pub fn column_family(&self) -> Option<ColumnFamilyId> {
        match self {
            Self::Put { cf, .. } | Self::Merge { cf, .. } | Self::Delete { cf, .. } => Some(*cf),
            Self::LogData { .. } => None,
        }
    }

    /// Key of a mutation, `None` for log data.
    #[must_use]
    pub fn key(&self) -> Option<&'a [u8]> {
        match self {
            Self::Put { key, .. } | Self::Merge { key, .. } | Self::Delete { key, .. } => {
                Some(key)
            }
            Self::LogData { .. } => None,
        }
    }

    /// Returns true for records that count toward the header count.
    #[must_use]
    pub fn is_counted(&self) -> bool {
        !matches!(self, Self::LogData { .. })
    }

    /// Copies the record out of the batch.
    #[must_use]
    pub fn to_owned_record(&self) -> OwnedRecord {
        match *self {
            Self::Put { cf, key, value } => OwnedRecord::Put {
                cf,
                key: key.to_vec(),
                value: value.to_vec(),
            },
            Self::Merge { cf, key, value } => OwnedRecord::Merge {
                cf,
                key: key.to_vec(),
                value: value.to_vec(),
            },
            Self::Delete { cf, key } => OwnedRecord::Delete {
                cf,
                key: key.to_vec(),
            },
            Self::LogData { blob } => OwnedRecord::LogData {
                blob: blob.to_vec(),
            },
        }
    }
}

/// An owned copy of a [`Record`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OwnedRecord {
    /// Set `key` to `value`.
    Put {
        /// Target column family.
        cf: ColumnFamilyId,
        /// Key bytes.
        key: Vec<u8>,
        /// Value bytes.
        value: Vec<u8>,
    },
    /// Add a merge operand for `key`.
    Merge {
        /// Target column family.
        cf: ColumnFamilyId,
        /// Key bytes.
        key: Vec<u8>,
        /// Operand bytes.
        value: Vec<u8>,
    },
    /// Delete `key`.
    Delete {
        /// Target column family.
        cf: ColumnFamilyId,
        /// Key bytes.
        key: Vec<u8>,
    },
    /// Opaque blob.
    LogData {
        /// Blob bytes.
        blob: Vec<u8>,
    },
}

impl OwnedRecord {
    /// Borrows the record.
    #[must_use]
    pub fn as_record(&self) -> Record<'_> {
        match self {
            Self::Put { cf, key, value } => Record::Put {
                cf: *cf,
                key,
                value,
            },
            Self::Merge { cf, key, value } => Record::Merge {
                cf: *cf,
                key,
                value,
            },
            Self::Delete { cf, key } => Record::Delete { cf: *cf, key },
            Self::LogData { blob } => Record::LogData { blob },
        }
    }

    /// Returns true for records that count toward the header count.
    #[must_use]
    pub fn is_counted(&self) -> bool {
        !matches!(self, Self::LogData { .. })
    }
}
