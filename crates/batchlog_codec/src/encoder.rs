//! Fixed-width, varint and length-prefixed encoders.
//!
//! All encoders append to any [`BufMut`]; a `Vec<u8>` is the usual target.

use crate::error::{CodecError, CodecResult};
use bytes::BufMut;

/// Maximum encoded size of a 32-bit varint.
pub const MAX_VARINT32_LEN: usize = 5;

/// Maximum encoded size of a 64-bit varint.
pub const MAX_VARINT64_LEN: usize = 10;

/// Appends `value` as 4 little-endian bytes.
pub fn put_fixed32<B: BufMut>(dst: &mut B, value: u32) {
    dst.put_u32_le(value);
}

/// Appends `value` as 8 little-endian bytes.
pub fn put_fixed64<B: BufMut>(dst: &mut B, value: u64) {
    dst.put_u64_le(value);
}

/// Overwrites the first 4 bytes of `dst` with `value` in little-endian order.
///
/// # Panics
///
/// Panics if `dst` is shorter than 4 bytes.
pub fn encode_fixed32(dst: &mut [u8], value: u32) {
    dst[..4].copy_from_slice(&value.to_le_bytes());
}

/// Overwrites the first 8 bytes of `dst` with `value` in little-endian order.
///
/// # Panics
///
/// Panics if `dst` is shorter than 8 bytes.
pub fn encode_fixed64(dst: &mut [u8], value: u64) {
    dst[..8].copy_from_slice(&value.to_le_bytes());
}

/// Appends `value` as a varint: 7 bits per byte, least significant group
/// first, high bit set on every byte but the last.
pub fn put_varint32<B: BufMut>(dst: &mut B, value: u32) {
    put_varint64(dst, u64::from(value));
}

/// Appends `value` as a 64-bit varint.
#[allow(clippy::cast_possible_truncation)]
pub fn put_varint64<B: BufMut>(dst: &mut B, mut value: u64) {
    while value >= 0x80 {
        dst.put_u8((value as u8) | 0x80);
        value >>= 7;
    }
    dst.put_u8(value as u8);
}

/// Returns the number of bytes `value` occupies as a varint.
#[must_use]
pub const fn varint_length(mut value: u64) -> usize {
    let mut len = 1;
    while value >= 0x80 {
        value >>= 7;
        len += 1;
    }
    len
}

/// Checks that a slice of `len` bytes fits the varint32 length prefix.
///
/// # Errors
///
/// Returns [`CodecError::SliceTooLarge`] if `len` exceeds `u32::MAX`.
pub fn checked_slice_len(len: usize) -> CodecResult<u32> {
    u32::try_from(len).map_err(|_| CodecError::SliceTooLarge { len })
}

/// Appends a varint32 length followed by the raw bytes of `value`.
///
/// Nothing is written when the slice is rejected.
///
/// # Errors
///
/// Returns [`CodecError::SliceTooLarge`] if `value` is longer than
/// `u32::MAX` bytes.
pub fn put_length_prefixed_slice<B: BufMut>(dst: &mut B, value: &[u8]) -> CodecResult<()> {
    let len = checked_slice_len(value.len())?;
    put_varint32(dst, len);
    dst.put_slice(value);
    Ok(())
}

/// Appends a single length prefix covering the concatenation of `parts`,
/// then each part in order.
///
/// The result decodes as one slice, identical to calling
/// [`put_length_prefixed_slice`] on the joined bytes.
///
/// # Errors
///
/// Returns [`CodecError::SliceTooLarge`] if the parts add up to more than
/// `u32::MAX` bytes.
pub fn put_length_prefixed_slice_parts<B: BufMut>(
    dst: &mut B,
    parts: &[&[u8]],
) -> CodecResult<()> {
    let total: usize = parts.iter().map(|p| p.len()).sum();
    let len = checked_slice_len(total)?;
    put_varint32(dst, len);
    for part in parts {
        dst.put_slice(part);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn varint_single_byte() {
        let mut buf = Vec::new();
        put_varint32(&mut buf, 0);
        put_varint32(&mut buf, 127);
        assert_eq!(buf, vec![0x00, 0x7F]);
    }

    #[test]
    fn varint_two_bytes() {
        let mut buf = Vec::new();
        put_varint32(&mut buf, 128);
        assert_eq!(buf, vec![0x80, 0x01]);

        buf.clear();
        put_varint32(&mut buf, 300);
        assert_eq!(buf, vec![0xAC, 0x02]);
    }

    #[test]
    fn varint_max_widths() {
        let mut buf = Vec::new();
        put_varint32(&mut buf, u32::MAX);
        assert_eq!(buf, vec![0xFF, 0xFF, 0xFF, 0xFF, 0x0F]);
        assert_eq!(buf.len(), MAX_VARINT32_LEN);

        buf.clear();
        put_varint64(&mut buf, u64::MAX);
        assert_eq!(buf.len(), MAX_VARINT64_LEN);
        assert_eq!(buf[9], 0x01);
    }

    #[test]
    fn varint_length_matches_encoding() {
        for value in [0, 1, 127, 128, 16_383, 16_384, u64::from(u32::MAX), u64::MAX] {
            let mut buf = Vec::new();
            put_varint64(&mut buf, value);
            assert_eq!(varint_length(value), buf.len(), "value {value}");
        }
    }

    #[test]
    fn fixed_widths_are_little_endian() {
        let mut buf = Vec::new();
        put_fixed32(&mut buf, 0x0403_0201);
        put_fixed64(&mut buf, 0x0C0B_0A09_0807_0605);
        assert_eq!(buf, (1..=12).collect::<Vec<u8>>());
    }

    #[test]
    fn encode_fixed_in_place() {
        let mut buf = vec![0u8; 12];
        encode_fixed64(&mut buf, 7);
        encode_fixed32(&mut buf[8..], 3);
        assert_eq!(&buf[..8], &7u64.to_le_bytes());
        assert_eq!(&buf[8..], &3u32.to_le_bytes());
    }

    #[test]
    fn length_prefixed_slice_layout() {
        let mut buf = Vec::new();
        put_length_prefixed_slice(&mut buf, b"abc").unwrap();
        assert_eq!(buf, vec![3, b'a', b'b', b'c']);
    }

    #[test]
    fn slice_parts_match_joined_slice() {
        let mut parts = Vec::new();
        put_length_prefixed_slice_parts(&mut parts, &[&b"ab"[..], &b""[..], &b"cde"[..]]).unwrap();

        let mut joined = Vec::new();
        put_length_prefixed_slice(&mut joined, b"abcde").unwrap();

        assert_eq!(parts, joined);
    }

    #[test]
    fn checked_slice_len_bounds() {
        assert_eq!(checked_slice_len(0).unwrap(), 0);
        assert_eq!(checked_slice_len(u32::MAX as usize).unwrap(), u32::MAX);
        #[cfg(target_pointer_width = "64")]
        assert_eq!(
            checked_slice_len(u32::MAX as usize + 1),
            Err(CodecError::SliceTooLarge {
                len: u32::MAX as usize + 1
            })
        );
    }
}
