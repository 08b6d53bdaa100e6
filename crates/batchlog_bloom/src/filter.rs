//! Blocked Bloom filter.

use crate::aligned::{AlignedBits, CACHE_LINE_BITS};
use crate::error::{FilterError, FilterResult};
use crate::hash::bloom_hash;

/// Hash function signature accepted by [`BloomFilter::with_hasher`].
pub type HashFn = fn(&[u8]) -> u32;

/// A fixed-size Bloom filter with optional cache-line locality.
///
/// With locality enabled the bit array is split into cache-line sized
/// blocks and every probe for a key lands in one block, so a lookup touches
/// a single cache line. Without locality the probes range over the whole
/// array.
///
/// # Layout
///
/// | mode | `total_bits` | `num_blocks` |
/// |------|--------------|--------------|
/// | flat | requested bits rounded up to a byte | 0 |
/// | locality | `num_blocks * 512` | `ceil(bits / 512)`, forced odd |
///
/// The block count is kept odd so the block index (`hash mod num_blocks`)
/// depends on more than the low bits that also pick the in-block position.
///
/// # Concurrency
///
/// `add` takes `&self`: bits are set with an atomic OR, so any number of
/// threads may insert and query concurrently without a lock.
///
/// # Guarantees
///
/// No false negatives: every key passed to [`BloomFilter::add`] makes
/// [`BloomFilter::may_contain`] return `true` from then on.
pub struct BloomFilter {
    total_bits: u32,
    num_blocks: u32,
    num_probes: u32,
    hash_fn: HashFn,
    bits: AlignedBits,
}

impl BloomFilter {
    /// Creates a filter of at least `total_bits` bits using the default key
    /// hash.
    ///
    /// # Errors
    ///
    /// Returns an error if `total_bits` or `num_probes` is zero, or if the
    /// rounded size overflows a 32-bit bit index.
    pub fn new(total_bits: u32, locality: bool, num_probes: u32) -> FilterResult<Self> {
        Self::with_hasher(total_bits, locality, num_probes, bloom_hash)
    }

    /// Creates a filter that hashes keys with `hash_fn`.
    ///
    /// # Errors
    ///
    /// Same conditions as [`BloomFilter::new`].
    pub fn with_hasher(
        total_bits: u32,
        locality: bool,
        num_probes: u32,
        hash_fn: HashFn,
    ) -> FilterResult<Self> {
        if num_probes == 0 {
            return Err(FilterError::ZeroProbes);
        }
        if total_bits == 0 {
            return Err(FilterError::ZeroBits);
        }

        let (total_bits, num_blocks) = if locality {
            let mut num_blocks = total_bits.div_ceil(CACHE_LINE_BITS);
            if num_blocks % 2 == 0 {
                num_blocks += 1;
            }
            let bits = u64::from(num_blocks) * u64::from(CACHE_LINE_BITS);
            let bits = u32::try_from(bits).map_err(|_| FilterError::TooLarge { requested: bits })?;
            (bits, num_blocks)
        } else {
            let bits = u64::from(total_bits).div_ceil(8) * 8;
            let bits = u32::try_from(bits).map_err(|_| FilterError::TooLarge { requested: bits })?;
            (bits, 0)
        };

        let bits = AlignedBits::new((total_bits / 8) as usize, num_blocks > 0);

        Ok(Self {
            total_bits,
            num_blocks,
            num_probes,
            hash_fn,
            bits,
        })
    }

    /// Creates a filter sized for `num_keys` keys at `bits_per_key`.
    ///
    /// # Errors
    ///
    /// Same conditions as [`BloomFilter::new`]; a zero key count still
    /// allocates one byte (or one block).
    pub fn for_keys(
        num_keys: u32,
        bits_per_key: u32,
        locality: bool,
        num_probes: u32,
    ) -> FilterResult<Self> {
        let requested = u64::from(num_keys.max(1)) * u64::from(bits_per_key);
        let total_bits =
            u32::try_from(requested).map_err(|_| FilterError::TooLarge { requested })?;
        Self::new(total_bits, locality, num_probes)
    }

    /// Inserts `key`.
    pub fn add(&self, key: &[u8]) {
        self.add_hash((self.hash_fn)(key));
    }

    /// Inserts a key by its precomputed hash.
    pub fn add_hash(&self, hash: u32) {
        self.for_each_probe(hash, |bit| {
            self.bits.set_bit(bit);
            true
        });
    }

    /// Returns `false` if `key` was definitely never added, `true` if it may
    /// have been.
    #[must_use]
    pub fn may_contain(&self, key: &[u8]) -> bool {
        self.may_contain_hash((self.hash_fn)(key))
    }

    /// Membership test by precomputed hash.
    #[must_use]
    pub fn may_contain_hash(&self, hash: u32) -> bool {
        self.for_each_probe(hash, |bit| self.bits.get_bit(bit))
    }

    /// Total number of bits after rounding.
    #[must_use]
    pub fn total_bits(&self) -> u32 {
        self.total_bits
    }

    /// Number of cache-line blocks, or 0 for a flat filter.
    #[must_use]
    pub fn num_blocks(&self) -> u32 {
        self.num_blocks
    }

    /// Number of bits probed per key.
    #[must_use]
    pub fn num_probes(&self) -> u32 {
        self.num_probes
    }

    /// Returns true if probes are confined to one cache line.
    #[must_use]
    pub fn has_locality(&self) -> bool {
        self.num_blocks > 0
    }

    /// The underlying bit storage.
    #[must_use]
    pub fn storage(&self) -> &AlignedBits {
        &self.bits
    }

    /// Fraction of bits currently set.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn fill_ratio(&self) -> f64 {
        self.bits.count_ones() as f64 / f64::from(self.total_bits)
    }

    /// Walks the probe sequence for `hash`, stopping as soon as `visit`
    /// returns false. Returns whether every visit returned true.
    #[inline]
    fn for_each_probe(&self, mut hash: u32, mut visit: impl FnMut(u32) -> bool) -> bool {
        let delta = hash.rotate_right(17);
        if self.num_blocks != 0 {
            let block_base = (hash.rotate_right(11) % self.num_blocks) * CACHE_LINE_BITS;
            for _ in 0..self.num_probes {
                if !visit(block_base + hash % CACHE_LINE_BITS) {
                    return false;
                }
                hash = hash.wrapping_add(delta);
            }
        } else {
            for _ in 0..self.num_probes {
                if !visit(hash % self.total_bits) {
                    return false;
                }
                hash = hash.wrapping_add(delta);
            }
        }
        true
    }
}

impl std::fmt::Debug for BloomFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BloomFilter")
            .field("total_bits", &self.total_bits)
            .field("num_blocks", &self.num_blocks)
            .field("num_probes", &self.num_probes)
            .finish_non_exhaustive()
    }
}

/// Expected false-positive rate of a standard Bloom filter with
/// `bits_per_key` bits per inserted key and `num_probes` probes:
/// `(1 - e^(-k/b))^k`.
///
/// Blocked filters run slightly above this figure.
#[must_use]
pub fn theoretical_false_positive_rate(bits_per_key: f64, num_probes: u32) -> f64 {
    let k = f64::from(num_probes);
    (1.0 - (-k / bits_per_key).exp()).powf(k)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(i: u32) -> [u8; 4] {
        i.to_le_bytes()
    }

    #[test]
    fn rejects_zero_probes() {
        assert_eq!(
            BloomFilter::new(1024, true, 0).unwrap_err(),
            FilterError::ZeroProbes
        );
    }

    #[test]
    fn rejects_zero_bits() {
        assert_eq!(
            BloomFilter::new(0, false, 6).unwrap_err(),
            FilterError::ZeroBits
        );
    }

    #[test]
    fn flat_rounds_to_byte() {
        let filter = BloomFilter::new(13, false, 2).unwrap();
        assert_eq!(filter.total_bits(), 16);
        assert_eq!(filter.num_blocks(), 0);
        assert!(!filter.has_locality());
        assert_eq!(filter.storage().len(), 2);
        assert_eq!(filter.storage().alignment(), 1);
    }

    #[test]
    fn locality_rounds_to_odd_block_count() {
        // 1000 bits need 2 blocks; forced up to 3.
        let filter = BloomFilter::new(1000, true, 6).unwrap();
        assert_eq!(filter.num_blocks(), 3);
        assert_eq!(filter.total_bits(), 3 * 512);
        assert_eq!(filter.storage().len(), 3 * 64);
        assert_eq!(filter.storage().alignment(), 64);

        // Already odd stays put.
        let filter = BloomFilter::new(512, true, 6).unwrap();
        assert_eq!(filter.num_blocks(), 1);
        assert_eq!(filter.total_bits(), 512);
    }

    #[test]
    fn total_bits_is_byte_multiple() {
        for bits in [1, 7, 9, 511, 513, 4097] {
            for locality in [false, true] {
                let filter = BloomFilter::new(bits, locality, 3).unwrap();
                assert_eq!(filter.total_bits() % 8, 0);
                assert!(filter.total_bits() >= bits);
                if locality {
                    assert_eq!(filter.num_blocks() % 2, 1);
                    assert_eq!(filter.total_bits() % CACHE_LINE_BITS, 0);
                }
            }
        }
    }

    #[test]
    fn empty_filter_contains_nothing() {
        for locality in [false, true] {
            let filter = BloomFilter::new(100, locality, 2).unwrap();
            assert!(!filter.may_contain(b"hello"));
            assert!(!filter.may_contain(b"world"));
            assert!(!filter.may_contain(b""));
        }
    }

    #[test]
    fn small_filter_membership() {
        for locality in [false, true] {
            let filter = BloomFilter::new(100, locality, 2).unwrap();
            filter.add(b"hello");
            filter.add(b"world");
            assert!(filter.may_contain(b"hello"));
            assert!(filter.may_contain(b"world"));
            assert!(!filter.may_contain(b"x"));
            assert!(!filter.may_contain(b"foo"));
        }
    }

    #[test]
    fn locality_probes_stay_in_one_line() {
        let filter = BloomFilter::new(64 * 512, true, 6).unwrap();
        filter.add(b"confined");
        let bytes = filter.storage().to_bytes();
        let touched: Vec<usize> = bytes
            .chunks(64)
            .enumerate()
            .filter(|(_, line)| line.iter().any(|&b| b != 0))
            .map(|(i, _)| i)
            .collect();
        assert_eq!(touched.len(), 1);
    }

    #[test]
    fn no_false_negatives_varying_lengths() {
        let mut length = 1u32;
        while length <= 10_000 {
            for locality in [false, true] {
                let filter = BloomFilter::new(length * 10, locality, 6).unwrap();
                for i in 0..length {
                    filter.add(&key(i));
                }
                for i in 0..length {
                    assert!(filter.may_contain(&key(i)), "length {length} key {i}");
                }
            }
            length = if length < 10 {
                length + 1
            } else if length < 100 {
                length + 10
            } else if length < 1000 {
                length + 100
            } else {
                length + 1000
            };
        }
    }

    #[test]
    fn false_positive_rate_within_bound() {
        let num_keys = 10_000u32;
        let bits_per_key = 10u32;
        let probes = 6u32;
        let bound = theoretical_false_positive_rate(f64::from(bits_per_key), probes);

        for locality in [false, true] {
            let filter = BloomFilter::for_keys(num_keys, bits_per_key, locality, probes).unwrap();
            for i in 0..num_keys {
                filter.add(&key(i));
            }

            let samples = 10_000u32;
            let hits = (0..samples)
                .filter(|i| filter.may_contain(&key(i + 1_000_000_000)))
                .count();
            let rate = hits as f64 / f64::from(samples);

            // Blocking costs some accuracy; allow 3x the unblocked bound.
            assert!(
                rate <= bound * 3.0,
                "locality={locality} rate={rate} bound={bound}"
            );
        }
    }

    #[test]
    fn custom_hasher_is_used() {
        fn constant(_: &[u8]) -> u32 {
            42
        }
        let filter = BloomFilter::with_hasher(1024, false, 4, constant).unwrap();
        filter.add(b"a");
        // Every key shares the probe sequence.
        assert!(filter.may_contain(b"completely different"));
    }

    #[test]
    fn hash_entry_points_agree() {
        let filter = BloomFilter::new(4096, true, 5).unwrap();
        filter.add_hash(bloom_hash(b"precomputed"));
        assert!(filter.may_contain(b"precomputed"));
        filter.add(b"direct");
        assert!(filter.may_contain_hash(bloom_hash(b"direct")));
    }

    #[test]
    fn concurrent_inserts_have_no_false_negatives() {
        use std::sync::Arc;
        use std::thread;

        let filter = Arc::new(BloomFilter::new(64 * 1024, true, 6).unwrap());
        let mut handles = vec![];

        for t in 0..8u32 {
            let f = Arc::clone(&filter);
            handles.push(thread::spawn(move || {
                for i in 0..1000u32 {
                    f.add(&key(t * 1000 + i));
                }
            }));
        }

        for h in handles {
            h.join().unwrap();
        }

        for i in 0..8000u32 {
            assert!(filter.may_contain(&key(i)));
        }
    }

    #[test]
    fn theoretical_rate_decreases_with_bits() {
        let r10 = theoretical_false_positive_rate(10.0, 6);
        let r20 = theoretical_false_positive_rate(20.0, 6);
        assert!(r10 > r20);
        assert!((0.008..0.009).contains(&r10));
    }
}
