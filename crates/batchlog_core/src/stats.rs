//! Replay statistics.
//!
//! Soft replay outcomes are not errors. They are counted here so callers
//! can tell how many records were skipped, filtered or collapsed.
//!
//! # Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use batchlog_core::{BatchApplier, ColumnFamilySet, ReplayOptions, ReplayStats, WriteBatch};
//!
//! let families = ColumnFamilySet::new();
//! let stats = Arc::new(ReplayStats::new());
//!
//! let mut batch = WriteBatch::new();
//! batch.put(b"k", b"v").unwrap();
//!
//! let mut applier = BatchApplier::new(&families, ReplayOptions::new()).with_stats(stats.clone());
//! applier.apply(&batch).unwrap();
//!
//! assert_eq!(stats.snapshot().records_applied, 1);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

/// Replay counters.
///
/// All counters are atomic, so one instance can be shared by appliers
/// running on several threads.
#[derive(Debug, Default)]
pub struct ReplayStats {
    /// Records that reached a table.
    records_applied: AtomicU64,
    /// New value entries written by the in-place callback path.
    keys_written: AtomicU64,
    /// In-place updates of resident values.
    keys_updated: AtomicU64,
    /// Merge operands resolved eagerly into a full value.
    merges_collapsed: AtomicU64,
    /// Eager merges that fell back to storing the operand.
    merge_failures: AtomicU64,
    /// Deletes dropped because the key did not exist.
    filtered_deletes: AtomicU64,
    /// Records for column families that no longer exist.
    dropped_family_skips: AtomicU64,
    /// Records for column families that already hold the log.
    already_applied_skips: AtomicU64,
    /// Log data blobs seen.
    log_blobs: AtomicU64,
}

impl ReplayStats {
    /// Creates a new stats instance.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_applied(&self) {
        self.records_applied.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_key_written(&self) {
        self.keys_written.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_key_updated(&self) {
        self.keys_updated.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_merge_collapsed(&self) {
        self.merges_collapsed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_merge_failure(&self) {
        self.merge_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_filtered_delete(&self) {
        self.filtered_deletes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dropped_family_skip(&self) {
        self.dropped_family_skips.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_already_applied_skip(&self) {
        self.already_applied_skips.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_log_blob(&self) {
        self.log_blobs.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the number of records that reached a table.
    pub fn records_applied(&self) -> u64 {
        self.records_applied.load(Ordering::Relaxed)
    }

    /// Returns the number of value entries written by the callback path.
    pub fn keys_written(&self) -> u64 {
        self.keys_written.load(Ordering::Relaxed)
    }

    /// Returns the number of in-place updates.
    pub fn keys_updated(&self) -> u64 {
        self.keys_updated.load(Ordering::Relaxed)
    }

    /// Returns the number of eagerly resolved merges.
    pub fn merges_collapsed(&self) -> u64 {
        self.merges_collapsed.load(Ordering::Relaxed)
    }

    /// Returns the number of failed eager merges.
    pub fn merge_failures(&self) -> u64 {
        self.merge_failures.load(Ordering::Relaxed)
    }

    /// Returns the number of filtered deletes.
    pub fn filtered_deletes(&self) -> u64 {
        self.filtered_deletes.load(Ordering::Relaxed)
    }

    /// Returns the number of records skipped for dropped column families.
    pub fn dropped_family_skips(&self) -> u64 {
        self.dropped_family_skips.load(Ordering::Relaxed)
    }

    /// Returns the number of records skipped as already applied.
    pub fn already_applied_skips(&self) -> u64 {
        self.already_applied_skips.load(Ordering::Relaxed)
    }

    /// Returns the number of log data blobs seen.
    pub fn log_blobs(&self) -> u64 {
        self.log_blobs.load(Ordering::Relaxed)
    }

    /// Returns a snapshot of all stats.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            records_applied: self.records_applied(),
            keys_written: self.keys_written(),
            keys_updated: self.keys_updated(),
            merges_collapsed: self.merges_collapsed(),
            merge_failures: self.merge_failures(),
            filtered_deletes: self.filtered_deletes(),
            dropped_family_skips: self.dropped_family_skips(),
            already_applied_skips: self.already_applied_skips(),
            log_blobs: self.log_blobs(),
        }
    }
}

/// A point-in-time snapshot of replay statistics.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    /// Records that reached a table.
    pub records_applied: u64,
    /// New value entries written by the callback path.
    pub keys_written: u64,
    /// In-place updates.
    pub keys_updated: u64,
    /// Eagerly resolved merges.
    pub merges_collapsed: u64,
    /// Failed eager merges.
    pub merge_failures: u64,
    /// Filtered deletes.
    pub filtered_deletes: u64,
    /// Records skipped for dropped column families.
    pub dropped_family_skips: u64,
    /// Records skipped as already applied.
    pub already_applied_skips: u64,
    /// Log data blobs seen.
    pub log_blobs: u64,
}

impl StatsSnapshot {
    /// Total records skipped without touching a table.
    #[must_use]
    pub fn skipped(&self) -> u64 {
        self.filtered_deletes + self.dropped_family_skips + self.already_applied_skips
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_stats_are_zero() {
        let stats = ReplayStats::new();
        assert_eq!(stats.snapshot(), StatsSnapshot::default());
    }

    #[test]
    fn snapshot() {
        let stats = ReplayStats::new();
        stats.record_applied();
        stats.record_applied();
        stats.record_filtered_delete();
        stats.record_dropped_family_skip();
        stats.record_merge_failure();

        let snap = stats.snapshot();
        assert_eq!(snap.records_applied, 2);
        assert_eq!(snap.merge_failures, 1);
        assert_eq!(snap.skipped(), 2);
    }

    #[test]
    fn concurrent_updates() {
        use std::sync::Arc;
        use std::thread;

        let stats = Arc::new(ReplayStats::new());
        let mut handles = vec![];

        for _ in 0..10 {
            let s = Arc::clone(&stats);
            handles.push(thread::spawn(move || {
                for _ in 0..100 {
                    s.record_applied();
                    s.record_log_blob();
                }
            }));
        }

        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(stats.records_applied(), 1000);
        assert_eq!(stats.log_blobs(), 1000);
    }
}
