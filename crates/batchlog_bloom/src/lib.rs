//! # batchlog Bloom
//!
//! Concurrent Bloom filter with optional cache-line locality.
//!
//! The filter answers "was this key possibly added?" with no false
//! negatives. It is used by memtables to skip point lookups for keys that
//! were never written, which makes delete filtering during batch replay
//! cheap.
//!
//! ## Design Principles
//!
//! - Fixed size chosen at construction; no resizing
//! - Insertion and lookup take `&self` and are lock-free
//! - Locality mode confines all probes for a key to one 64-byte line
//! - Hashing is deterministic and platform independent
//!
//! ## Example
//!
//! ```rust
//! use batchlog_bloom::BloomFilter;
//!
//! let filter = BloomFilter::for_keys(1000, 10, true, 6).unwrap();
//! filter.add(b"apple");
//! assert!(filter.may_contain(b"apple"));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod aligned;
mod error;
mod filter;
mod hash;

pub use aligned::{AlignedBits, CACHE_LINE_BITS, CACHE_LINE_SIZE};
pub use error::{FilterError, FilterResult};
pub use filter::{theoretical_false_positive_rate, BloomFilter, HashFn};
pub use hash::{bloom_hash, hash, BLOOM_HASH_SEED};
