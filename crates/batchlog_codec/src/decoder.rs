//! Cursor-based decoding of fixed-width integers, varints and
//! length-prefixed slices.

use crate::encoder::{MAX_VARINT32_LEN, MAX_VARINT64_LEN};
use crate::error::{CodecError, CodecResult};

/// Decodes a little-endian `u32` from the first 4 bytes of `src`.
///
/// # Errors
///
/// Returns [`CodecError::Truncated`] if `src` is shorter than 4 bytes.
pub fn decode_fixed32(src: &[u8]) -> CodecResult<u32> {
    let bytes: [u8; 4] = src
        .get(..4)
        .and_then(|b| b.try_into().ok())
        .ok_or_else(|| CodecError::truncated(4, src.len()))?;
    Ok(u32::from_le_bytes(bytes))
}

/// Decodes a little-endian `u64` from the first 8 bytes of `src`.
///
/// # Errors
///
/// Returns [`CodecError::Truncated`] if `src` is shorter than 8 bytes.
pub fn decode_fixed64(src: &[u8]) -> CodecResult<u64> {
    let bytes: [u8; 8] = src
        .get(..8)
        .and_then(|b| b.try_into().ok())
        .ok_or_else(|| CodecError::truncated(8, src.len()))?;
    Ok(u64::from_le_bytes(bytes))
}

/// A forward-only reader over a byte slice.
///
/// Every `read_*` method either consumes exactly the bytes of one field and
/// returns it, or fails and leaves the cursor where it was.
/// Slices returned by [`SliceReader::read_length_prefixed_slice`] borrow from
/// the underlying input.
#[derive(Debug, Clone, Copy)]
pub struct SliceReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> SliceReader<'a> {
    /// Creates a reader positioned at the start of `data`.
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Returns true if every byte has been consumed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Returns the unread bytes.
    #[must_use]
    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    /// Returns the number of bytes consumed so far.
    #[must_use]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Skips `len` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Truncated`] if fewer than `len` bytes remain.
    pub fn skip(&mut self, len: usize) -> CodecResult<()> {
        self.read_bytes(len).map(|_| ())
    }

    /// Reads a single byte.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Truncated`] at end of input.
    pub fn read_u8(&mut self) -> CodecResult<u8> {
        let byte = *self
            .data
            .get(self.pos)
            .ok_or_else(|| CodecError::truncated(1, 0))?;
        self.pos += 1;
        Ok(byte)
    }

    /// Reads a little-endian `u32`.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Truncated`] if fewer than 4 bytes remain.
    pub fn read_fixed32(&mut self) -> CodecResult<u32> {
        let value = decode_fixed32(self.remaining())?;
        self.pos += 4;
        Ok(value)
    }

    /// Reads a little-endian `u64`.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Truncated`] if fewer than 8 bytes remain.
    pub fn read_fixed64(&mut self) -> CodecResult<u64> {
        let value = decode_fixed64(self.remaining())?;
        self.pos += 8;
        Ok(value)
    }

    /// Reads a varint that must fit in 32 bits.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Truncated`] if the input ends mid-varint and
    /// [`CodecError::VarintOverflow`] if the value needs more than 32 bits.
    pub fn read_varint32(&mut self) -> CodecResult<u32> {
        let (value, len) = parse_varint(self.remaining(), MAX_VARINT32_LEN, 32)?;
        let value = u32::try_from(value).map_err(|_| CodecError::VarintOverflow { bits: 32 })?;
        self.pos += len;
        Ok(value)
    }

    /// Reads a 64-bit varint.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Truncated`] if the input ends mid-varint and
    /// [`CodecError::VarintOverflow`] if the value needs more than 64 bits.
    pub fn read_varint64(&mut self) -> CodecResult<u64> {
        let (value, len) = parse_varint(self.remaining(), MAX_VARINT64_LEN, 64)?;
        self.pos += len;
        Ok(value)
    }

    /// Reads a varint32 length followed by that many bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Truncated`] if the length or the payload runs
    /// past the end of input.
    pub fn read_length_prefixed_slice(&mut self) -> CodecResult<&'a [u8]> {
        let start = self.pos;
        let len = self.read_varint32()? as usize;
        match self.read_bytes(len) {
            Ok(bytes) => Ok(bytes),
            Err(e) => {
                self.pos = start;
                Err(e)
            }
        }
    }

    fn read_bytes(&mut self, len: usize) -> CodecResult<&'a [u8]> {
        let available = self.data.len() - self.pos;
        if len > available {
            return Err(CodecError::truncated(len, available));
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }
}

/// Parses a varint from the front of `src`, returning `(value, bytes_read)`.
fn parse_varint(src: &[u8], max_len: usize, bits: u32) -> CodecResult<(u64, usize)> {
    let mut value: u64 = 0;
    for (i, &byte) in src.iter().enumerate().take(max_len) {
        let shift = 7 * i as u32;
        let group = u64::from(byte & 0x7F);
        if shift >= 64 || (shift > 0 && group >> (64 - shift) != 0) {
            return Err(CodecError::VarintOverflow { bits });
        }
        value |= group << shift;
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }
    if src.len() >= max_len {
        Err(CodecError::VarintOverflow { bits })
    } else {
        Err(CodecError::truncated(src.len() + 1, src.len()))
    }
}
