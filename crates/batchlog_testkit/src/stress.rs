//! Stress tests for batchlog.
//!
//! These tests verify behavior under heavy load and concurrent access.

use batchlog_bloom::BloomFilter;
use batchlog_core::{
    BatchApplier, ColumnFamilyId, ColumnFamilySet, ReplayOptions, ReplayStats, SequenceNumber,
    WriteBatch,
};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Result of a stress test run.
#[derive(Debug, Clone)]
pub struct StressTestResult {
    /// Total operations performed.
    pub total_ops: usize,
    /// Successful operations.
    pub successful_ops: usize,
    /// Failed operations.
    pub failed_ops: usize,
    /// Total duration.
    pub duration: Duration,
    /// Operations per second.
    pub ops_per_second: f64,
}

impl StressTestResult {
    /// Creates a new result.
    pub fn new(successful: usize, failed: usize, duration: Duration) -> Self {
        let total = successful + failed;
        let ops_per_second = if duration.as_secs_f64() > 0.0 {
            total as f64 / duration.as_secs_f64()
        } else {
            0.0
        };

        Self {
            total_ops: total,
            successful_ops: successful,
            failed_ops: failed,
            duration,
            ops_per_second,
        }
    }

    /// Prints a summary of the test.
    pub fn print_summary(&self, name: &str) {
        println!("\n=== {} ===", name);
        println!("Total operations: {}", self.total_ops);
        println!("Successful: {}", self.successful_ops);
        println!("Failed: {}", self.failed_ops);
        println!("Duration: {:?}", self.duration);
        println!("Throughput: {:.2} ops/sec", self.ops_per_second);
    }
}

/// Configuration for stress tests.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Number of batches (or filter keys) per thread.
    pub operations: usize,
    /// Number of concurrent threads.
    pub threads: usize,
    /// Records per batch.
    pub batch_size: usize,
    /// Size of values in bytes.
    pub value_size: usize,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            operations: 1_000,
            threads: 4,
            batch_size: 16,
            value_size: 64,
        }
    }
}

fn make_batch(thread: usize, round: usize, config: &StressConfig) -> WriteBatch {
    let cf = ColumnFamilyId::new(u32::try_from(thread).unwrap_or(u32::MAX));
    let value = vec![0xABu8; config.value_size];
    let mut batch = WriteBatch::with_capacity(config.batch_size * (config.value_size + 16));
    let first = (round * config.batch_size) as u64;
    batch.set_sequence(SequenceNumber::new(first));
    for i in 0..config.batch_size {
        let key = format!("key-{}", i % 64);
        let result = match i % 4 {
            3 => batch.delete_cf(cf, key.as_bytes()),
            _ => batch.put_cf(cf, key.as_bytes(), &value),
        };
        result.expect("Failed to build batch");
    }
    batch
}

/// Replays batches sequentially into the default family.
pub fn stress_sequential_replay(config: &StressConfig) -> (ColumnFamilySet, StressTestResult) {
    let families = ColumnFamilySet::new();
    let stats = Arc::new(ReplayStats::new());

    let start = Instant::now();
    let mut successful = 0usize;
    let mut failed = 0usize;

    for round in 0..config.operations {
        let batch = make_batch(0, round, config);
        let mut applier =
            BatchApplier::new(&families, ReplayOptions::new()).with_stats(Arc::clone(&stats));
        match applier.apply(&batch) {
            Ok(()) => successful += 1,
            Err(_) => failed += 1,
        }
    }

    (families, StressTestResult::new(successful, failed, start.elapsed()))
}

/// Replays batches from several threads, each into its own column family
/// of one shared set.
pub fn stress_concurrent_replay(config: &StressConfig) -> (Arc<ColumnFamilySet>, StressTestResult) {
    let families = Arc::new(ColumnFamilySet::new());
    for t in 1..config.threads {
        let id = u32::try_from(t).unwrap_or(u32::MAX);
        families
            .create(ColumnFamilyId::new(id), format!("thread{t}"), Default::default())
            .expect("Failed to create column family");
    }

    let start = Instant::now();
    let handles: Vec<_> = (0..config.threads)
        .map(|t| {
            let families = Arc::clone(&families);
            let config = config.clone();
            thread::spawn(move || {
                let mut successful = 0usize;
                let mut failed = 0usize;
                for round in 0..config.operations {
                    let batch = make_batch(t, round, &config);
                    let mut applier = BatchApplier::new(families.as_ref(), ReplayOptions::new());
                    match applier.apply(&batch) {
                        Ok(()) => successful += 1,
                        Err(_) => failed += 1,
                    }
                }
                (successful, failed)
            })
        })
        .collect();

    let (mut successful, mut failed) = (0usize, 0usize);
    for handle in handles {
        let (s, f) = handle.join().expect("Replay thread panicked");
        successful += s;
        failed += f;
    }

    (families, StressTestResult::new(successful, failed, start.elapsed()))
}

/// Inserts distinct keys into one filter from several threads.
///
/// A failed operation is an inserted key that later reads as absent.
pub fn stress_concurrent_bloom(config: &StressConfig, locality: bool) -> StressTestResult {
    let total_keys = config.operations * config.threads;
    let bits = u32::try_from(total_keys * 10).unwrap_or(u32::MAX);
    let filter = Arc::new(BloomFilter::new(bits.max(512), locality, 6).expect("Bad filter shape"));

    let start = Instant::now();
    let handles: Vec<_> = (0..config.threads)
        .map(|t| {
            let filter = Arc::clone(&filter);
            let operations = config.operations;
            thread::spawn(move || {
                for i in 0..operations {
                    filter.add(format!("t{t}-k{i}").as_bytes());
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("Bloom thread panicked");
    }

    let mut successful = 0usize;
    let mut failed = 0usize;
    for t in 0..config.threads {
        for i in 0..config.operations {
            if filter.may_contain(format!("t{t}-k{i}").as_bytes()) {
                successful += 1;
            } else {
                failed += 1;
            }
        }
    }

    StressTestResult::new(successful, failed, start.elapsed())
}
