//! Batch replay into tables.
//!
//! [`BatchApplier`] is a [`Handler`] that writes each record of a batch
//! into the table of its column family. It owns the sequence counter for
//! one replay pass: the counter starts at the batch's sequence number and
//! advances by exactly one per mutation, whether the mutation was applied,
//! skipped or rejected. Log data does not consume a sequence number.
//!
//! Replay is not transactional. Records before a failing one stay applied.

use crate::batch::{BatchView, Handler, WriteBatch};
use crate::config::ReplayOptions;
use crate::error::{CoreError, CoreResult};
use crate::stats::ReplayStats;
use crate::table::{ColumnFamilyResolver, ColumnFamilyTarget, UpdateOutcome, UpdateStatus};
use crate::types::{ColumnFamilyId, SequenceNumber, ValueType};
use std::sync::Arc;
use tracing::{debug, trace, warn};

type LogSink<'a> = Box<dyn FnMut(&[u8]) + 'a>;

/// Replays batches against the column families of a resolver.
pub struct BatchApplier<'a, R: ColumnFamilyResolver + ?Sized> {
    resolver: &'a R,
    options: ReplayOptions,
    sequence: SequenceNumber,
    stats: Arc<ReplayStats>,
    log_sink: Option<LogSink<'a>>,
}

impl<'a, R: ColumnFamilyResolver + ?Sized> BatchApplier<'a, R> {
    /// Creates an applier writing through `resolver`.
    pub fn new(resolver: &'a R, options: ReplayOptions) -> Self {
        Self {
            resolver,
            options,
            sequence: SequenceNumber::default(),
            stats: Arc::new(ReplayStats::new()),
            log_sink: None,
        }
    }

    /// Reports into `stats` instead of a private instance.
    #[must_use]
    pub fn with_stats(mut self, stats: Arc<ReplayStats>) -> Self {
        self.stats = stats;
        self
    }

    /// Forwards log data blobs to `sink`.
    #[must_use]
    pub fn with_log_sink(mut self, sink: impl FnMut(&[u8]) + 'a) -> Self {
        self.log_sink = Some(Box::new(sink));
        self
    }

    /// The replay options.
    pub fn options(&self) -> &ReplayOptions {
        &self.options
    }

    /// Sequence number the next mutation will receive.
    pub fn sequence(&self) -> SequenceNumber {
        self.sequence
    }

    /// Counters for this applier.
    pub fn stats(&self) -> &Arc<ReplayStats> {
        &self.stats
    }

    /// Replays `batch`, starting at its sequence number.
    ///
    /// # Errors
    ///
    /// Returns the first corruption, invalid argument or handler error.
    pub fn apply(&mut self, batch: &WriteBatch) -> CoreResult<()> {
        self.apply_view(batch.view())
    }

    /// Replays raw batch bytes, starting at their sequence number.
    ///
    /// # Errors
    ///
    /// See [`BatchApplier::apply`].
    pub fn apply_view(&mut self, view: BatchView<'_>) -> CoreResult<()> {
        self.sequence = view.sequence();
        debug!(
            sequence = self.sequence.as_u64(),
            count = view.count(),
            recovery = self.options.recovery,
            "replaying write batch"
        );
        view.iterate(self)
    }

    /// Finds the write target for `cf`, or `None` if the record should be
    /// skipped.
    fn seek(&self, cf: ColumnFamilyId) -> CoreResult<Option<ColumnFamilyTarget>> {
        let Some(target) = self.resolver.resolve(cf) else {
            if self.options.recovery {
                debug!(%cf, seq = self.sequence.as_u64(), "skipping record for dropped column family");
                self.stats.record_dropped_family_skip();
                return Ok(None);
            }
            return Err(CoreError::invalid_argument(format!(
                "invalid column family {cf} specified in write batch"
            )));
        };

        if self.options.recovery && self.options.log_number < target.log_number {
            trace!(
                %cf,
                log_number = self.options.log_number,
                cf_log_number = target.log_number,
                "skipping record already in column family"
            );
            self.stats.record_already_applied_skip();
            return Ok(None);
        }

        Ok(Some(target))
    }

    fn apply_put(&self, cf: ColumnFamilyId, key: &[u8], value: &[u8]) -> CoreResult<()> {
        let Some(target) = self.seek(cf)? else {
            return Ok(());
        };
        let seq = self.sequence;
        let options = &target.options;
        self.stats.record_applied();

        if !options.inplace_update_support {
            target.table.add(seq, ValueType::Value, key, value);
            return Ok(());
        }

        let Some(callback) = &options.inplace_callback else {
            target.table.update(seq, key, value);
            self.stats.record_key_updated();
            return Ok(());
        };

        match target.table.update_with_callback(seq, key, value, callback) {
            Some(UpdateOutcome::InPlace) => self.stats.record_key_updated(),
            Some(UpdateOutcome::Written) => self.stats.record_key_written(),
            Some(UpdateOutcome::Declined) => {}
            None => {
                // Not resident: read the current value and let the
                // callback decide what to write.
                let mut existing = target.table.get(key, seq).ok().flatten();
                match callback(existing.as_mut(), value) {
                    UpdateStatus::UpdatedInPlace => {
                        // No resident value means no buffer was mutated.
                        if let Some(buf) = existing {
                            target.table.add(seq, ValueType::Value, key, &buf);
                            self.stats.record_key_written();
                        }
                    }
                    UpdateStatus::Updated(merged) => {
                        target.table.add(seq, ValueType::Value, key, &merged);
                        self.stats.record_key_written();
                    }
                    UpdateStatus::Failed => {}
                }
            }
        }
        Ok(())
    }

    fn apply_merge(&self, cf: ColumnFamilyId, key: &[u8], value: &[u8]) -> CoreResult<()> {
        let Some(target) = self.seek(cf)? else {
            return Ok(());
        };
        let seq = self.sequence;
        let options = &target.options;
        self.stats.record_applied();

        let threshold = options.max_successive_merges;
        if threshold > 0 {
            if let Some(op) = &options.merge_operator {
                if target.table.count_successive_merge_entries(key, seq) >= threshold {
                    let merged = target
                        .table
                        .get(key, seq)
                        .ok()
                        .and_then(|existing| op.full_merge(key, existing.as_deref(), &[value]));
                    if let Some(merged) = merged {
                        target.table.add(seq, ValueType::Value, key, &merged);
                        self.stats.record_merge_collapsed();
                        return Ok(());
                    }
                    warn!(%cf, operator = op.name(), "eager merge failed, storing operand");
                    self.stats.record_merge_failure();
                }
            }
        }

        target.table.add(seq, ValueType::Merge, key, value);
        Ok(())
    }

    fn apply_delete(&self, cf: ColumnFamilyId, key: &[u8]) -> CoreResult<()> {
        let Some(target) = self.seek(cf)? else {
            return Ok(());
        };
        let seq = self.sequence;

        if target.options.filter_deletes
            && !self.options.ignore_filter_deletes
            && !target.table.key_may_exist(key, seq)
        {
            trace!(%cf, seq = seq.as_u64(), "filtered delete of absent key");
            self.stats.record_filtered_delete();
            return Ok(());
        }

        self.stats.record_applied();
        target.table.add(seq, ValueType::Deletion, key, &[]);
        Ok(())
    }

    fn advance(&mut self, result: CoreResult<()>) -> CoreResult<()> {
        self.sequence = self.sequence.next();
        result
    }
}

impl<R: ColumnFamilyResolver + ?Sized> Handler for BatchApplier<'_, R> {
    fn put_cf(&mut self, cf: ColumnFamilyId, key: &[u8], value: &[u8]) -> CoreResult<()> {
        let result = self.apply_put(cf, key, value);
        self.advance(result)
    }

    fn merge_cf(&mut self, cf: ColumnFamilyId, key: &[u8], value: &[u8]) -> CoreResult<()> {
        let result = self.apply_merge(cf, key, value);
        self.advance(result)
    }

    fn delete_cf(&mut self, cf: ColumnFamilyId, key: &[u8]) -> CoreResult<()> {
        let result = self.apply_delete(cf, key);
        self.advance(result)
    }

    fn log_data(&mut self, blob: &[u8]) {
        self.stats.record_log_blob();
        if let Some(sink) = self.log_sink.as_mut() {
            sink(blob);
        }
    }
}

/// Replays `batch` into `resolver` and returns the sequence number after
/// its last mutation.
///
/// # Errors
///
/// See [`BatchApplier::apply`].
pub fn insert_into<R: ColumnFamilyResolver + ?Sized>(
    batch: &WriteBatch,
    resolver: &R,
    options: ReplayOptions,
) -> CoreResult<SequenceNumber> {
    let mut applier = BatchApplier::new(resolver, options);
    applier.apply(batch)?;
    Ok(applier.sequence())
}
