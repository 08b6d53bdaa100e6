//! Bloom filter benchmarks.

#![allow(missing_docs)]

use batchlog_bench::utils::generate_keys;
use batchlog_bloom::{bloom_hash, BloomFilter};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

const KEYS: usize = 100_000;

fn filled(locality: bool, keys: &[Vec<u8>]) -> BloomFilter {
    let filter = BloomFilter::for_keys(keys.len() as u32, 10, locality, 6).unwrap();
    for key in keys {
        filter.add(key);
    }
    filter
}

fn mode(locality: bool) -> &'static str {
    if locality {
        "locality"
    } else {
        "flat"
    }
}

/// Benchmark hashing.
fn bench_hash(c: &mut Criterion) {
    let mut group = c.benchmark_group("hash");
    for len in [8usize, 16, 64, 256] {
        let key = vec![0x5Au8; len];
        group.throughput(Throughput::Bytes(len as u64));
        group.bench_with_input(BenchmarkId::from_parameter(len), &key, |b, key| {
            b.iter(|| black_box(bloom_hash(black_box(key))));
        });
    }
    group.finish();
}

/// Benchmark inserts.
fn bench_add(c: &mut Criterion) {
    let mut group = c.benchmark_group("add");
    let keys = generate_keys(KEYS);
    group.throughput(Throughput::Elements(KEYS as u64));

    for locality in [false, true] {
        group.bench_function(mode(locality), |b| {
            b.iter(|| black_box(filled(locality, &keys)));
        });
    }
    group.finish();
}

/// Benchmark lookups of present and absent keys.
fn bench_may_contain(c: &mut Criterion) {
    let mut group = c.benchmark_group("may_contain");
    let keys = generate_keys(KEYS);
    let absent: Vec<Vec<u8>> = (0..KEYS)
        .map(|i| format!("absent-{:08}", i).into_bytes())
        .collect();
    group.throughput(Throughput::Elements(KEYS as u64));

    for locality in [false, true] {
        let filter = filled(locality, &keys);
        group.bench_function(BenchmarkId::new("present", mode(locality)), |b| {
            b.iter(|| keys.iter().filter(|k| filter.may_contain(k)).count());
        });
        group.bench_function(BenchmarkId::new("absent", mode(locality)), |b| {
            b.iter(|| absent.iter().filter(|k| filter.may_contain(k)).count());
        });
    }
    group.finish();
}

criterion_group!(benches, bench_hash, bench_add, bench_may_contain);
criterion_main!(benches);
