//! # batchlog Testkit
//!
//! Test utilities for batchlog.
//!
//! This crate provides:
//! - Column family fixtures and a reference replay model
//! - Property-based test generators using proptest
//! - Golden wire vectors for the write batch format
//! - Fuzz testing harnesses
//! - Stress testing utilities
//!
//! ## Usage
//!
//! ```rust
//! use batchlog_core::{insert_into, OwnedRecord, ReplayOptions, SequenceNumber};
//! use batchlog_testkit::prelude::*;
//!
//! let records = vec![OwnedRecord::Delete {
//!     cf: batchlog_core::ColumnFamilyId::DEFAULT,
//!     key: b"k".to_vec(),
//! }];
//! let families = plain_families(1);
//! let batch = build_batch(SequenceNumber::new(1), &records);
//! insert_into(&batch, &families, ReplayOptions::new()).unwrap();
//!
//! let expected = expected_contents(SequenceNumber::new(1), &records, |_| true);
//! assert_eq!(contents(&families), expected);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod fuzz;
pub mod generators;
pub mod stress;
pub mod vectors;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::fuzz::*;
    pub use crate::generators::*;
    pub use crate::stress::*;
    pub use crate::vectors::*;
}

pub use fixtures::*;
pub use fuzz::*;
pub use generators::*;
pub use stress::*;
pub use vectors::*;
