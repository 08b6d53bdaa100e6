//! # batchlog Core
//!
//! Write batches and their replay into versioned tables.
//!
//! This crate provides:
//! - [`WriteBatch`]: building and owning the binary batch format
//! - [`BatchView`] / [`BatchIter`]: validating decode over borrowed bytes
//! - [`BatchApplier`]: replay into column families with sequence numbering
//! - [`MemTable`] and [`ColumnFamilySet`]: a reference table implementation
//! - [`MergeOperator`]: pluggable read-modify-write resolution
//!
//! ## Batch Format
//!
//! ```text
//! header  := sequence: fixed64 | count: fixed32
//! record  := tag: u8 | [cf: varint32] | key | [value]
//! key, value, blob := varint32 length | bytes
//! ```
//!
//! Tags: `0x00` delete, `0x01` put, `0x02` merge, `0x03` log data, and
//! `0x04`..`0x06` for delete/put/merge in a non-default column family.
//! Log data is not counted in the header and consumes no sequence number.
//!
//! ## Usage
//!
//! ```
//! use batchlog_core::{insert_into, ColumnFamilySet, MutableTable, ReplayOptions,
//!     SequenceNumber, WriteBatch};
//!
//! let families = ColumnFamilySet::new();
//!
//! let mut batch = WriteBatch::new();
//! batch.set_sequence(SequenceNumber::new(100));
//! batch.put(b"a", b"1").unwrap();
//! batch.delete(b"b").unwrap();
//!
//! let next = insert_into(&batch, &families, ReplayOptions::new()).unwrap();
//! assert_eq!(next, SequenceNumber::new(102));
//!
//! let table = families.default_family().unwrap().memtable().clone();
//! assert_eq!(table.get(b"a", next).unwrap(), Some(b"1".to_vec()));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod apply;
mod batch;
mod config;
mod error;
mod merge;
mod stats;
mod table;
mod types;

pub use apply::{insert_into, BatchApplier};
pub use batch::{
    BatchIter, BatchView, Handler, OwnedRecord, Record, RecordCollector, RecordTag, WriteBatch,
    HEADER_SIZE,
};
pub use config::{ColumnFamilyOptions, MemTableBloomOptions, ReplayOptions};
pub use error::{CoreError, CoreResult};
pub use merge::{MergeOperator, StringAppendOperator, UInt64AddOperator};
pub use stats::{ReplayStats, StatsSnapshot};
pub use table::{
    ColumnFamily, ColumnFamilyResolver, ColumnFamilySet, ColumnFamilyTarget, InplaceCallback,
    MemTable, MutableTable, TableEntry, UpdateOutcome, UpdateStatus,
};
pub use types::{ColumnFamilyId, SequenceNumber, ValueType};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
