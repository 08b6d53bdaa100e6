//! Benchmark utilities.

use batchlog_core::{ColumnFamilyId, SequenceNumber, WriteBatch};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Generate random data of the specified size.
pub fn random_data(rng: &mut impl Rng, size: usize) -> Vec<u8> {
    (0..size).map(|_| rng.gen()).collect()
}

/// Generate `count` distinct keys.
pub fn generate_keys(count: usize) -> Vec<Vec<u8>> {
    (0..count)
        .map(|i| format!("key-{:08}", i).into_bytes())
        .collect()
}

/// Build a batch of puts (with every fourth record a merge and every
/// eighth a delete) over `key_space` keys in `families` column families.
pub fn mixed_batch(
    records: usize,
    key_space: usize,
    families: u32,
    value_size: usize,
) -> WriteBatch {
    let mut rng = StdRng::seed_from_u64(0xba7c);
    let keys = generate_keys(key_space.max(1));
    let mut batch = WriteBatch::with_capacity(records * (value_size + 24));
    batch.set_sequence(SequenceNumber::new(1));

    for i in 0..records {
        let key = &keys[rng.gen_range(0..keys.len())];
        let cf = ColumnFamilyId::new(rng.gen_range(0..families.max(1)));
        let result = match i % 8 {
            7 => batch.delete_cf(cf, key),
            3 => batch.merge_cf(cf, key, &random_data(&mut rng, 8)),
            _ => batch.put_cf(cf, key, &random_data(&mut rng, value_size)),
        };
        result.expect("Failed to build benchmark batch");
    }
    batch
}
