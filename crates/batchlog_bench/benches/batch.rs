//! Write batch benchmarks.

#![allow(missing_docs)]

use batchlog_bench::utils::{generate_keys, mixed_batch};
use batchlog_core::{
    insert_into, BatchView, ColumnFamilyId, ColumnFamilyOptions, ColumnFamilySet,
    MemTableBloomOptions, ReplayOptions, StringAppendOperator, WriteBatch,
};
use criterion::{
    black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput,
};
use std::sync::Arc;

fn families(count: u32, options: &ColumnFamilyOptions) -> ColumnFamilySet {
    let set = ColumnFamilySet::with_default_options(options.clone()).unwrap();
    for id in 1..count {
        set.create(ColumnFamilyId::new(id), format!("cf{id}"), options.clone())
            .unwrap();
    }
    set
}

/// Benchmark building batches.
fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build");
    let keys = generate_keys(1000);

    for value_size in [16usize, 256, 4096] {
        let value = vec![0xABu8; value_size];
        group.throughput(Throughput::Bytes((value_size * keys.len()) as u64));
        group.bench_with_input(
            BenchmarkId::new("put", value_size),
            &value,
            |b, value| {
                b.iter(|| {
                    let mut batch = WriteBatch::new();
                    for key in &keys {
                        batch.put(key, value).unwrap();
                    }
                    black_box(batch);
                });
            },
        );
    }

    group.bench_function("put_cf_1000", |b| {
        b.iter(|| {
            let mut batch = WriteBatch::new();
            for (i, key) in keys.iter().enumerate() {
                batch
                    .put_cf(ColumnFamilyId::new((i % 7) as u32), key, b"value")
                    .unwrap();
            }
            black_box(batch);
        });
    });

    group.bench_function("append_1000", |b| {
        let src = mixed_batch(1000, 1000, 1, 64);
        b.iter(|| {
            let mut batch = WriteBatch::new();
            batch.append(black_box(&src)).unwrap();
            black_box(batch);
        });
    });

    group.finish();
}

/// Benchmark decoding batches.
fn bench_iterate(c: &mut Criterion) {
    let mut group = c.benchmark_group("iterate");

    for records in [10usize, 1000, 10_000] {
        let batch = mixed_batch(records, records, 4, 64);
        group.throughput(Throughput::Elements(records as u64));
        group.bench_with_input(BenchmarkId::from_parameter(records), &batch, |b, batch| {
            b.iter(|| {
                let view = BatchView::new(black_box(batch.data())).unwrap();
                let mut n = 0usize;
                for record in view.iter() {
                    n += record.unwrap().key().map_or(0, <[u8]>::len);
                }
                black_box(n);
            });
        });
    }

    group.finish();
}

/// Benchmark replaying batches into memtables.
fn bench_replay(c: &mut Criterion) {
    let mut group = c.benchmark_group("replay");
    let records = 1000usize;
    let batch = mixed_batch(records, 200, 4, 64);
    group.throughput(Throughput::Elements(records as u64));

    let variants: Vec<(&str, ColumnFamilyOptions)> = vec![
        ("plain", ColumnFamilyOptions::default()),
        (
            "collapse_merges",
            ColumnFamilyOptions::new()
                .merge_operator(Arc::new(StringAppendOperator::default()))
                .max_successive_merges(2),
        ),
        ("inplace", ColumnFamilyOptions::new().inplace_update_support(true)),
        (
            "filter_deletes",
            ColumnFamilyOptions::new()
                .filter_deletes(true)
                .memtable_bloom(MemTableBloomOptions::new().total_bits(1 << 16)),
        ),
    ];

    for (name, options) in variants {
        group.bench_function(name, |b| {
            b.iter_batched(
                || families(4, &options),
                |set| {
                    insert_into(&batch, &set, ReplayOptions::new()).unwrap();
                    black_box(set);
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.bench_function("recovery_already_applied", |b| {
        let set = families(4, &ColumnFamilyOptions::default());
        for id in set.ids() {
            set.set_log_number(id, 10).unwrap();
        }
        b.iter(|| {
            let next = insert_into(&batch, &set, ReplayOptions::recovery(5)).unwrap();
            black_box(next);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_build, bench_iterate, bench_replay);
criterion_main!(benches);
