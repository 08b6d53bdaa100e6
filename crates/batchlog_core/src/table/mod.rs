//! Table abstraction targeted by batch replay.
//!
//! The applier never touches storage directly. It resolves a column family
//! to a [`ColumnFamilyTarget`] and drives the [`MutableTable`] inside it.

mod column_family;
mod memtable;

pub use column_family::{ColumnFamily, ColumnFamilyResolver, ColumnFamilySet, ColumnFamilyTarget};
pub use memtable::MemTable;

use crate::error::CoreResult;
use crate::types::{SequenceNumber, ValueType};
use std::sync::Arc;

/// Result of an in-place update callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateStatus {
    /// The callback declined; nothing is written.
    Failed,
    /// The callback rewrote the existing value buffer.
    UpdatedInPlace,
    /// The callback produced a replacement value.
    Updated(Vec<u8>),
}

/// In-place update function.
///
/// Called with the existing value (if any) and the incoming value.
pub type InplaceCallback = Arc<dyn Fn(Option<&mut Vec<u8>>, &[u8]) -> UpdateStatus + Send + Sync>;

/// What [`MutableTable::update_with_callback`] did with a resident value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The resident value was rewritten in place.
    InPlace,
    /// A new value entry was added.
    Written,
    /// The callback declined.
    Declined,
}

/// One version of a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableEntry {
    /// Sequence number of the write.
    pub sequence: SequenceNumber,
    /// Entry kind.
    pub kind: ValueType,
    /// Value or merge operand; empty for deletions.
    pub value: Vec<u8>,
}

/// A versioned key/value table.
///
/// All methods take `&self`; implementations use interior locking.
/// "As of `seq`" means only entries with a sequence number at or below
/// `seq` are considered.
pub trait MutableTable: Send + Sync {
    /// Adds a new version of `key`.
    fn add(&self, seq: SequenceNumber, kind: ValueType, key: &[u8], value: &[u8]);

    /// Replaces the resident value of `key` in place, or adds a new value
    /// entry if there is none.
    fn update(&self, seq: SequenceNumber, key: &[u8], value: &[u8]);

    /// Runs `callback` against the resident value of `key`.
    ///
    /// Returns `None` when the newest visible entry is not a value, in
    /// which case the callback was not called.
    fn update_with_callback(
        &self,
        seq: SequenceNumber,
        key: &[u8],
        value: &[u8],
        callback: &InplaceCallback,
    ) -> Option<UpdateOutcome>;

    /// Number of merge operands at the head of the version chain of `key`,
    /// as of `seq`.
    fn count_successive_merge_entries(&self, key: &[u8], seq: SequenceNumber) -> usize;

    /// Reads the value of `key` as of `seq`, resolving merge operands.
    ///
    /// # Errors
    ///
    /// Returns an error if operands cannot be resolved.
    fn get(&self, key: &[u8], seq: SequenceNumber) -> CoreResult<Option<Vec<u8>>>;

    /// Returns false only if `key` certainly has no live value as of `seq`.
    fn key_may_exist(&self, key: &[u8], seq: SequenceNumber) -> bool;
}
