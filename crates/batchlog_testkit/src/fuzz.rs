//! Fuzz testing harnesses for batchlog.
//!
//! These targets can be driven by cargo-fuzz or by the randomized loops
//! in this module's tests. None of them may panic on any input.

use batchlog_bloom::BloomFilter;
use batchlog_core::{
    insert_into, BatchView, ColumnFamilyOptions, MemTableBloomOptions, ReplayOptions,
    StringAppendOperator, WriteBatch,
};
use std::sync::Arc;

use crate::fixtures::{build_batch, families_with};

/// Fuzz target for batch decoding.
///
/// Arbitrary bytes must either decode or produce an error; after an
/// error the iterator must stop.
pub fn fuzz_batch_decode(data: &[u8]) {
    let Ok(view) = BatchView::new(data) else {
        return;
    };
    let mut iter = view.iter();
    while let Some(item) = iter.next() {
        if item.is_err() {
            assert!(iter.next().is_none(), "Iterator continued after an error");
            break;
        }
    }
}

/// Fuzz target for decode, re-encode.
///
/// A batch that decodes cleanly must rebuild into a batch with the same
/// header and records.
pub fn fuzz_batch_reencode(data: &[u8]) {
    let Ok(view) = BatchView::new(data) else {
        return;
    };
    let Ok(records) = view
        .iter()
        .map(|r| r.map(|r| r.to_owned_record()))
        .collect::<Result<Vec<_>, _>>()
    else {
        return;
    };

    let rebuilt = build_batch(view.sequence(), &records);
    assert_eq!(rebuilt.sequence(), view.sequence());
    assert_eq!(rebuilt.count(), view.count());
    let decoded: Vec<_> = rebuilt
        .iter()
        .map(|r| r.expect("Rebuilt batch failed to decode").to_owned_record())
        .collect();
    assert_eq!(decoded, records, "Re-encoded batch differs");
}

/// Fuzz target for replay.
///
/// Replays arbitrary bytes in recovery mode into families with every
/// write policy enabled. Errors are fine; panics are not.
pub fn fuzz_batch_replay(data: &[u8]) {
    let Ok(batch) = WriteBatch::from_data(data.to_vec()) else {
        return;
    };
    let options = ColumnFamilyOptions::new()
        .merge_operator(Arc::new(StringAppendOperator::default()))
        .max_successive_merges(2)
        .filter_deletes(true)
        .inplace_update_support(true)
        .memtable_bloom(MemTableBloomOptions::new().total_bits(4096));
    let families = families_with(3, options);
    let _ = insert_into(&batch, &families, ReplayOptions::recovery(1));
}

/// Fuzz target for the Bloom filter.
///
/// Splits the input into keys; every inserted key must be reported as
/// possibly present, with and without locality.
pub fn fuzz_bloom(data: &[u8]) {
    let keys: Vec<&[u8]> = data.chunks(7).collect();
    for locality in [false, true] {
        let filter = BloomFilter::new(2048, locality, 4).expect("Failed to create filter");
        for key in &keys {
            filter.add(key);
        }
        for key in &keys {
            assert!(filter.may_contain(key), "False negative for {key:?}");
        }
    }
}
