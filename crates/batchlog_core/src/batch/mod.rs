//! Write batch format.
//!
//! A write batch is a compact, replayable encoding of a sequence of
//! key/value mutations. This module provides:
//!
//! - [`WriteBatch`]: the builder and owner of batch bytes
//! - [`BatchView`] and [`BatchIter`]: decoding over borrowed bytes
//! - [`Handler`]: the push-style dispatch interface
//! - [`Record`] / [`OwnedRecord`]: decoded records

mod builder;
mod iterator;
mod record;

pub use builder::WriteBatch;
pub use iterator::{BatchIter, BatchView, Handler, RecordCollector};
pub use record::{OwnedRecord, Record, RecordTag, HEADER_SIZE};
