//! Shared helpers for the batchlog benchmarks.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod utils;
