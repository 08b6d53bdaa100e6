//! Cache-line aligned, zero-initialised bit storage.
//!
//! Storage is a boxed slice of [`CacheLine`]s. `#[repr(C, align(64))]` puts
//! every line on a 64-byte boundary, so the usable region starts aligned no
//! matter what the allocator would hand back for a plain byte buffer, and no
//! pointer arithmetic is needed to carve it out.

use std::sync::atomic::{AtomicU8, Ordering};

/// Cache line size in bytes.
///
/// 64 bytes on x86-64 and AArch64.
pub const CACHE_LINE_SIZE: usize = 64;

/// Number of bits in one cache line.
pub const CACHE_LINE_BITS: u32 = (CACHE_LINE_SIZE * 8) as u32;

/// One cache line worth of atomically updatable bytes.
#[repr(C, align(64))]
struct CacheLine([AtomicU8; CACHE_LINE_SIZE]);

impl CacheLine {
    fn zeroed() -> Self {
        Self(std::array::from_fn(|_| AtomicU8::new(0)))
    }
}

/// Owned bit storage with a requested alignment and a usable length.
///
/// Bits are set with an atomic OR, so concurrent writers never lose each
/// other's bits and readers never observe a torn byte.
pub struct AlignedBits {
    lines: Box<[CacheLine]>,
    len: usize,
    alignment: usize,
}

impl AlignedBits {
    /// Allocates `len` zeroed bytes.
    ///
    /// `cache_aligned` records whether callers rely on the region starting at
    /// a cache-line boundary; the backing lines are always aligned.
    #[must_use]
    pub fn new(len: usize, cache_aligned: bool) -> Self {
        let num_lines = len.div_ceil(CACHE_LINE_SIZE);
        let lines = (0..num_lines).map(|_| CacheLine::zeroed()).collect();
        Self {
            lines,
            len,
            alignment: if cache_aligned { CACHE_LINE_SIZE } else { 1 },
        }
    }

    /// Alignment the storage was requested with, in bytes.
    #[must_use]
    pub fn alignment(&self) -> usize {
        self.alignment
    }

    /// Number of usable bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if there are no usable bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of bytes actually allocated, including tail padding of the
    /// last cache line.
    #[must_use]
    pub fn allocated_len(&self) -> usize {
        self.lines.len() * CACHE_LINE_SIZE
    }

    /// Sets bit `bit` (counted from the start of the usable region).
    #[inline]
    pub fn set_bit(&self, bit: u32) {
        let (byte, mask) = self.locate(bit);
        byte.fetch_or(mask, Ordering::Relaxed);
    }

    /// Returns whether bit `bit` is set.
    #[inline]
    #[must_use]
    pub fn get_bit(&self, bit: u32) -> bool {
        let (byte, mask) = self.locate(bit);
        byte.load(Ordering::Relaxed) & mask != 0
    }

    /// Copies the usable region out as plain bytes.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        (0..self.len)
            .map(|i| self.byte(i).load(Ordering::Relaxed))
            .collect()
    }

    /// Number of set bits in the usable region.
    #[must_use]
    pub fn count_ones(&self) -> u64 {
        (0..self.len)
            .map(|i| u64::from(self.byte(i).load(Ordering::Relaxed).count_ones()))
            .sum()
    }

    #[inline]
    fn byte(&self, index: usize) -> &AtomicU8 {
        debug_assert!(index < self.len);
        &self.lines[index / CACHE_LINE_SIZE].0[index % CACHE_LINE_SIZE]
    }

    #[inline]
    fn locate(&self, bit: u32) -> (&AtomicU8, u8) {
        let byte = self.byte((bit / 8) as usize);
        (byte, 1u8 << (bit % 8))
    }
}

impl std::fmt::Debug for AlignedBits {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlignedBits")
            .field("len", &self.len)
            .field("alignment", &self.alignment)
            .field("allocated_len", &self.allocated_len())
            .finish()
    }
}
