//! Replay and column family configuration.

use crate::merge::MergeOperator;
use crate::table::InplaceCallback;
use std::fmt;
use std::sync::Arc;

/// Per column family write policy.
#[derive(Clone)]
pub struct ColumnFamilyOptions {
    /// Operator used to resolve merge operands.
    pub merge_operator: Option<Arc<dyn MergeOperator>>,

    /// Whether puts may overwrite the resident value instead of adding a
    /// new version.
    pub inplace_update_support: bool,

    /// Custom in-place update function. Only consulted when
    /// `inplace_update_support` is set.
    pub inplace_callback: Option<InplaceCallback>,

    /// Number of stacked merge operands that triggers eager resolution
    /// (0 = never).
    pub max_successive_merges: usize,

    /// Whether deletes of keys that certainly do not exist are dropped.
    pub filter_deletes: bool,

    /// Bloom filter over memtable keys (`None` = no filter).
    pub memtable_bloom: Option<MemTableBloomOptions>,
}

impl Default for ColumnFamilyOptions {
    fn default() -> Self {
        Self {
            merge_operator: None,
            inplace_update_support: false,
            inplace_callback: None,
            max_successive_merges: 0,
            filter_deletes: false,
            memtable_bloom: None,
        }
    }
}

impl fmt::Debug for ColumnFamilyOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnFamilyOptions")
            .field(
                "merge_operator",
                &self.merge_operator.as_ref().map(|op| op.name().to_string()),
            )
            .field("inplace_update_support", &self.inplace_update_support)
            .field("inplace_callback", &self.inplace_callback.is_some())
            .field("max_successive_merges", &self.max_successive_merges)
            .field("filter_deletes", &self.filter_deletes)
            .field("memtable_bloom", &self.memtable_bloom)
            .finish()
    }
}

impl ColumnFamilyOptions {
    /// Creates options with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the merge operator.
    #[must_use]
    pub fn merge_operator(mut self, op: Arc<dyn MergeOperator>) -> Self {
        self.merge_operator = Some(op);
        self
    }

    /// Enables or disables in-place updates.
    #[must_use]
    pub const fn inplace_update_support(mut self, value: bool) -> Self {
        self.inplace_update_support = value;
        self
    }

    /// Sets the in-place update callback. Also enables in-place updates.
    #[must_use]
    pub fn inplace_callback(mut self, callback: InplaceCallback) -> Self {
        self.inplace_update_support = true;
        self.inplace_callback = Some(callback);
        self
    }

    /// Sets the successive merge threshold.
    #[must_use]
    pub const fn max_successive_merges(mut self, value: usize) -> Self {
        self.max_successive_merges = value;
        self
    }

    /// Enables or disables delete filtering.
    #[must_use]
    pub const fn filter_deletes(mut self, value: bool) -> Self {
        self.filter_deletes = value;
        self
    }

    /// Attaches a Bloom filter to the memtable.
    #[must_use]
    pub const fn memtable_bloom(mut self, bloom: MemTableBloomOptions) -> Self {
        self.memtable_bloom = Some(bloom);
        self
    }
}

/// Sizing of the Bloom filter kept over memtable keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemTableBloomOptions {
    /// Total filter bits.
    pub total_bits: u32,
    /// Confine probes for one key to a single cache line.
    pub locality: bool,
    /// Probes per key.
    pub num_probes: u32,
}

impl Default for MemTableBloomOptions {
    fn default() -> Self {
        Self {
            total_bits: 1 << 20, // 128 KiB
            locality: true,
            num_probes: 6,
        }
    }
}

impl MemTableBloomOptions {
    /// Creates options with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the total bit count.
    #[must_use]
    pub const fn total_bits(mut self, bits: u32) -> Self {
        self.total_bits = bits;
        self
    }

    /// Sets cache-line locality.
    #[must_use]
    pub const fn locality(mut self, value: bool) -> Self {
        self.locality = value;
        self
    }

    /// Sets the probe count.
    #[must_use]
    pub const fn num_probes(mut self, probes: u32) -> Self {
        self.num_probes = probes;
        self
    }
}

/// Options for one replay pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayOptions {
    /// The batch is being replayed from a log after a restart.
    ///
    /// Unknown column families are skipped instead of rejected, and
    /// column families that already hold this log's data are skipped.
    pub recovery: bool,

    /// Number of the log the batch was read from.
    pub log_number: u64,

    /// Write every delete, even for column families with
    /// `filter_deletes` set.
    pub ignore_filter_deletes: bool,
}

impl ReplayOptions {
    /// Creates options for a live (non-recovery) write.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options for replaying log `log_number` during recovery.
    #[must_use]
    pub const fn recovery(log_number: u64) -> Self {
        Self {
            recovery: true,
            log_number,
            ignore_filter_deletes: false,
        }
    }

    /// Sets the log number.
    #[must_use]
    pub const fn log_number(mut self, log_number: u64) -> Self {
        self.log_number = log_number;
        self
    }

    /// Sets whether per-family delete filtering is overridden.
    #[must_use]
    pub const fn ignore_filter_deletes(mut self, value: bool) -> Self {
        self.ignore_filter_deletes = value;
        self
    }
}
