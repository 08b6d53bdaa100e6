//! Test fixtures and replay helpers.
//!
//! Provides ready-made column family sets, batch builders and a reference
//! model of what a plain replay must produce.

use batchlog_core::{
    ColumnFamilyId, ColumnFamilyOptions, ColumnFamilySet, MemTableBloomOptions, OwnedRecord,
    SequenceNumber, StringAppendOperator, TableEntry, UInt64AddOperator, ValueType, WriteBatch,
};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Table contents keyed by column family and key, versions newest first.
pub type Contents = BTreeMap<(u32, Vec<u8>), Vec<TableEntry>>;

/// Builds a batch holding `records` in order.
pub fn build_batch(sequence: SequenceNumber, records: &[OwnedRecord]) -> WriteBatch {
    let mut batch = WriteBatch::new();
    batch.set_sequence(sequence);
    for record in records {
        let result = match record {
            OwnedRecord::Put { cf, key, value } => batch.put_cf(*cf, key, value),
            OwnedRecord::Merge { cf, key, value } => batch.merge_cf(*cf, key, value),
            OwnedRecord::Delete { cf, key } => batch.delete_cf(*cf, key),
            OwnedRecord::LogData { blob } => batch.put_log_data(blob),
        };
        result.expect("Failed to add record to batch");
    }
    batch
}

/// Creates a set with column families `1..count` next to the default one,
/// all using `options`.
pub fn families_with(count: u32, options: ColumnFamilyOptions) -> ColumnFamilySet {
    let set = ColumnFamilySet::with_default_options(options.clone())
        .expect("Failed to create column family set");
    for id in 1..count {
        set.create(ColumnFamilyId::new(id), format!("cf{id}"), options.clone())
            .expect("Failed to create column family");
    }
    set
}

/// Creates a set with `count` families and default options.
pub fn plain_families(count: u32) -> ColumnFamilySet {
    families_with(count, ColumnFamilyOptions::default())
}

/// Creates a single-family set with a string-append merge operator.
pub fn appending_families(max_successive_merges: usize) -> ColumnFamilySet {
    families_with(
        1,
        ColumnFamilyOptions::new()
            .merge_operator(Arc::new(StringAppendOperator::default()))
            .max_successive_merges(max_successive_merges),
    )
}

/// Creates a single-family set with a counter merge operator.
pub fn counter_families(max_successive_merges: usize) -> ColumnFamilySet {
    families_with(
        1,
        ColumnFamilyOptions::new()
            .merge_operator(Arc::new(UInt64AddOperator))
            .max_successive_merges(max_successive_merges),
    )
}

/// Creates a single-family set that filters deletes through a memtable
/// Bloom filter.
pub fn filtering_families() -> ColumnFamilySet {
    families_with(
        1,
        ColumnFamilyOptions::new()
            .filter_deletes(true)
            .memtable_bloom(MemTableBloomOptions::new().total_bits(1 << 14)),
    )
}

/// Captures every entry of every family in `set`.
pub fn contents(set: &ColumnFamilySet) -> Contents {
    let mut out = Contents::new();
    for family in set.families() {
        let id = family.id().as_u32();
        for (key, entry) in family.memtable().entries() {
            out.entry((id, key)).or_default().push(entry);
        }
    }
    out
}

/// What a plain replay (no in-place updates, collapsing or filtering)
/// of `records` starting at `sequence` must leave in the tables.
///
/// Records for families not in `live` are skipped but still consume a
/// sequence number.
pub fn expected_contents(
    sequence: SequenceNumber,
    records: &[OwnedRecord],
    live: impl Fn(ColumnFamilyId) -> bool,
) -> Contents {
    let mut out = Contents::new();
    let mut seq = sequence;
    for record in records {
        let (cf, key, kind, value) = match record {
            OwnedRecord::Put { cf, key, value } => (*cf, key, ValueType::Value, value.clone()),
            OwnedRecord::Merge { cf, key, value } => (*cf, key, ValueType::Merge, value.clone()),
            OwnedRecord::Delete { cf, key } => (*cf, key, ValueType::Deletion, Vec::new()),
            OwnedRecord::LogData { .. } => continue,
        };
        if live(cf) {
            out.entry((cf.as_u32(), key.clone()))
                .or_default()
                .insert(0, TableEntry { sequence: seq, kind, value });
        }
        seq = seq.next();
    }
    out
}

/// Number of records in `records` that consume a sequence number.
pub fn counted(records: &[OwnedRecord]) -> u32 {
    let n = records.iter().filter(|r| r.is_counted()).count();
    u32::try_from(n).expect("Too many records")
}

#[cfg(test)]
mod tests {
    use super::*;
    use batchlog_core::insert_into;
    use batchlog_core::ReplayOptions;

    fn put(cf: u32, key: &str, value: &str) -> OwnedRecord {
        OwnedRecord::Put {
            cf: ColumnFamilyId::new(cf),
            key: key.as_bytes().to_vec(),
            value: value.as_bytes().to_vec(),
        }
    }

    #[test]
    fn test_build_batch_counts() {
        let records = vec![
            put(0, "a", "1"),
            OwnedRecord::LogData { blob: b"x".to_vec() },
            put(2, "b", "2"),
        ];
        let batch = build_batch(SequenceNumber::new(9), &records);
        assert_eq!(batch.count(), 2);
        assert_eq!(counted(&records), 2);
        assert_eq!(batch.sequence(), SequenceNumber::new(9));
    }

    #[test]
    fn test_families_with() {
        let set = plain_families(3);
        assert_eq!(set.len(), 3);
        assert!(set.get_by_name("cf2").is_some());
    }

    #[test]
    fn test_expected_matches_replay() {
        let records = vec![put(0, "a", "1"), put(1, "a", "2"), put(5, "c", "3"), put(0, "a", "4")];
        let set = plain_families(2);
        let batch = build_batch(SequenceNumber::new(1), &records);
        insert_into(&batch, &set, ReplayOptions::recovery(0)).unwrap();

        let expected = expected_contents(SequenceNumber::new(1), &records, |cf| cf.as_u32() < 2);
        assert_eq!(contents(&set), expected);
        assert_eq!(expected[&(0, b"a".to_vec())][0].sequence, SequenceNumber::new(4));
    }
}
