//! 32-bit key hash used for Bloom probes.

/// Seed used by [`bloom_hash`].
pub const BLOOM_HASH_SEED: u32 = 0xbc9f_1d34;

const MULTIPLIER: u32 = 0xc6a4_a793;

/// Murmur-style 32-bit hash over `data`.
///
/// Consumes the input four little-endian bytes at a time, then folds in the
/// 0-3 byte tail. The output is stable across platforms, so filters built on
/// one machine probe identically on another.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn hash(data: &[u8], seed: u32) -> u32 {
    let mut h = seed ^ (data.len() as u32).wrapping_mul(MULTIPLIER);

    let mut words = data.chunks_exact(4);
    for word in &mut words {
        let w = u32::from_le_bytes([word[0], word[1], word[2], word[3]]);
        h = h.wrapping_add(w);
        h = h.wrapping_mul(MULTIPLIER);
        h ^= h >> 16;
    }

    let tail = words.remainder();
    if !tail.is_empty() {
        if tail.len() == 3 {
            h = h.wrapping_add(u32::from(tail[2]) << 16);
        }
        if tail.len() >= 2 {
            h = h.wrapping_add(u32::from(tail[1]) << 8);
        }
        h = h.wrapping_add(u32::from(tail[0]));
        h = h.wrapping_mul(MULTIPLIER);
        h ^= h >> 24;
    }

    h
}

/// Default hash for Bloom filter keys.
#[must_use]
pub fn bloom_hash(key: &[u8]) -> u32 {
    hash(key, BLOOM_HASH_SEED)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_seed_dependent() {
        assert_eq!(hash(b"", 0), 0);
        assert_eq!(hash(b"", BLOOM_HASH_SEED), BLOOM_HASH_SEED);
    }

    #[test]
    fn known_vectors() {
        // Reference values from the engine's hash test suite.
        assert_eq!(hash(&[0x62], 0xbc9f_1d34), 0xef13_45c4);
        assert_eq!(hash(&[0xc3, 0x97], 0xbc9f_1d34), 0x5b66_3814);
        assert_eq!(hash(&[0xe2, 0x99, 0xa5], 0xbc9f_1d34), 0x323c_078f);
        assert_eq!(hash(&[0xe1, 0x80, 0xb9, 0x32], 0xbc9f_1d34), 0xed21_633a);
    }

    #[test]
    fn deterministic() {
        assert_eq!(bloom_hash(b"hello world"), bloom_hash(b"hello world"));
        assert_ne!(bloom_hash(b"hello world"), bloom_hash(b"hello worle"));
    }
}
