//! # batchlog Codec
//!
//! Low-level encoding primitives for the batchlog write-batch format.
//!
//! This crate provides:
//! - Fixed-width little-endian integers (batch header fields)
//! - Varints (lengths and column family ids)
//! - Length-prefixed byte strings (keys, values, blobs)
//!
//! ## Encoding Rules
//!
//! - Fixed-width integers are little-endian
//! - Varints carry 7 bits per byte, least significant group first
//! - A length-prefixed slice is a varint32 length followed by raw bytes
//!
//! ## Usage
//!
//! ```
//! use batchlog_codec::{put_length_prefixed_slice, put_varint32, SliceReader};
//!
//! let mut buf = Vec::new();
//! put_varint32(&mut buf, 300);
//! put_length_prefixed_slice(&mut buf, b"key").unwrap();
//!
//! let mut reader = SliceReader::new(&buf);
//! assert_eq!(reader.read_varint32().unwrap(), 300);
//! assert_eq!(reader.read_length_prefixed_slice().unwrap(), b"key");
//! assert!(reader.is_empty());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod decoder;
mod encoder;
mod error;

pub use decoder::{decode_fixed32, decode_fixed64, SliceReader};
pub use encoder::{
    checked_slice_len, encode_fixed32, encode_fixed64, put_fixed32, put_fixed64,
    put_length_prefixed_slice, put_length_prefixed_slice_parts, put_varint32, put_varint64,
    varint_length, MAX_VARINT32_LEN, MAX_VARINT64_LEN,
};
pub use error::{CodecError, CodecResult};

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn varint64_roundtrip(value in any::<u64>()) {
            let mut buf = Vec::new();
            put_varint64(&mut buf, value);
            prop_assert_eq!(buf.len(), varint_length(value));
            let mut reader = SliceReader::new(&buf);
            prop_assert_eq!(reader.read_varint64().unwrap(), value);
            prop_assert!(reader.is_empty());
        }

        #[test]
        fn varint32_roundtrip(value in any::<u32>()) {
            let mut buf = Vec::new();
            put_varint32(&mut buf, value);
            let mut reader = SliceReader::new(&buf);
            prop_assert_eq!(reader.read_varint32().unwrap(), value);
        }

        #[test]
        fn slice_sequence_roundtrip(slices in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..200), 0..16)) {
            let mut buf = Vec::new();
            for s in &slices {
                put_length_prefixed_slice(&mut buf, s).unwrap();
            }
            let mut reader = SliceReader::new(&buf);
            for s in &slices {
                prop_assert_eq!(reader.read_length_prefixed_slice().unwrap(), &s[..]);
            }
            prop_assert!(reader.is_empty());
        }

        #[test]
        fn truncated_slice_is_detected(data in prop::collection::vec(any::<u8>(), 1..64), cut in 0usize..64) {
            let mut buf = Vec::new();
            put_length_prefixed_slice(&mut buf, &data).unwrap();
            let cut = cut % buf.len();
            let mut reader = SliceReader::new(&buf[..cut]);
            prop_assert!(reader.read_length_prefixed_slice().unwrap_err().is_truncated());
        }
    }
}
