//! Property-based test generators using proptest.
//!
//! Keys are drawn from a small alphabet so generated batches touch the
//! same keys repeatedly and exercise version chains.

use batchlog_core::{ColumnFamilyId, OwnedRecord, SequenceNumber};
use proptest::prelude::*;

/// Strategy for keys from a small space (frequent collisions).
pub fn key_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(b'a'..=b'e', 1..3)
}

/// Strategy for arbitrary keys, empty included.
pub fn any_key_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..64)
}

/// Strategy for values and merge operands.
pub fn value_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..256)
}

/// Strategy for column family ids below `max_cf` (exclusive).
pub fn column_family_strategy(max_cf: u32) -> impl Strategy<Value = ColumnFamilyId> {
    prop_oneof![
        2 => Just(ColumnFamilyId::DEFAULT),
        1 => (0..max_cf.max(1)).prop_map(ColumnFamilyId::new),
    ]
}

/// Strategy for batch sequence numbers, away from the wrap point.
pub fn sequence_strategy() -> impl Strategy<Value = SequenceNumber> {
    (0u64..1 << 48).prop_map(SequenceNumber::new)
}

/// Strategy for one record in column families below `max_cf`.
pub fn record_strategy(max_cf: u32) -> impl Strategy<Value = OwnedRecord> {
    prop_oneof![
        4 => (column_family_strategy(max_cf), key_strategy(), value_strategy())
            .prop_map(|(cf, key, value)| OwnedRecord::Put { cf, key, value }),
        2 => (column_family_strategy(max_cf), key_strategy(), value_strategy())
            .prop_map(|(cf, key, value)| OwnedRecord::Merge { cf, key, value }),
        2 => (column_family_strategy(max_cf), key_strategy())
            .prop_map(|(cf, key)| OwnedRecord::Delete { cf, key }),
        1 => value_strategy().prop_map(|blob| OwnedRecord::LogData { blob }),
    ]
}

/// Strategy for a record list of `min..max` records.
pub fn record_list_strategy(
    max_cf: u32,
    min: usize,
    max: usize,
) -> impl Strategy<Value = Vec<OwnedRecord>> {
    prop::collection::vec(record_strategy(max_cf), min..max)
}

/// Strategy for records whose merge operands are 8-byte counters.
pub fn counter_record_strategy() -> impl Strategy<Value = OwnedRecord> {
    prop_oneof![
        1 => (key_strategy(), any::<u32>()).prop_map(|(key, n)| OwnedRecord::Put {
            cf: ColumnFamilyId::DEFAULT,
            key,
            value: u64::from(n).to_le_bytes().to_vec(),
        }),
        4 => (key_strategy(), any::<u32>()).prop_map(|(key, n)| OwnedRecord::Merge {
            cf: ColumnFamilyId::DEFAULT,
            key,
            value: u64::from(n).to_le_bytes().to_vec(),
        }),
        1 => key_strategy().prop_map(|key| OwnedRecord::Delete {
            cf: ColumnFamilyId::DEFAULT,
            key,
        }),
    ]
}

/// Strategy for distinct Bloom filter keys.
pub fn bloom_keys_strategy(max: usize) -> impl Strategy<Value = Vec<Vec<u8>>> {
    prop::collection::hash_set(prop::collection::vec(any::<u8>(), 1..32), 1..max)
        .prop_map(|keys| keys.into_iter().collect())
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Creates a configuration for thorough tests.
    #[must_use]
    pub fn thorough() -> Self {
        Self {
            cases: 1024,
            max_shrink_iters: 10000,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #![proptest_config(PropTestConfig::quick().to_proptest_config())]

        #[test]
        fn keys_are_short(key in key_strategy()) {
            prop_assert!(!key.is_empty() && key.len() <= 2);
            prop_assert!(key.iter().all(|b| (b'a'..=b'e').contains(b)));
        }

        #[test]
        fn column_families_in_range(cf in column_family_strategy(4)) {
            prop_assert!(cf.as_u32() < 4);
        }

        #[test]
        fn counter_operands_are_eight_bytes(record in counter_record_strategy()) {
            if let OwnedRecord::Merge { value, .. } = record {
                prop_assert_eq!(value.len(), 8);
            }
        }

        #[test]
        fn bloom_keys_are_distinct(keys in bloom_keys_strategy(64)) {
            let mut sorted = keys.clone();
            sorted.sort();
            sorted.dedup();
            prop_assert_eq!(sorted.len(), keys.len());
        }
    }
}
