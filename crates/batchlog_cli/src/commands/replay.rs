//! Replay command implementation.

use super::render_bytes;
use batchlog_core::{
    BatchApplier, BatchView, ColumnFamilyId, ColumnFamilyOptions, ColumnFamilySet, MergeOperator,
    ReplayOptions, ReplayStats, StatsSnapshot, StringAppendOperator, UInt64AddOperator,
};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

/// Replay settings taken from the command line.
#[derive(Debug, Clone, Default)]
pub struct ReplayArgs {
    /// Replay in recovery mode.
    pub recovery: bool,
    /// Log number of the batch.
    pub log_number: u64,
    /// Merge chain length that triggers eager collapse.
    pub max_successive_merges: usize,
    /// Merge operator name.
    pub merge_operator: Option<String>,
    /// Overwrite resident values in place.
    pub inplace: bool,
    /// Drop deletes of absent keys.
    pub filter_deletes: bool,
    /// Extra column families to create.
    pub column_families: Vec<u32>,
}

impl ReplayArgs {
    fn column_family_options(&self) -> Result<ColumnFamilyOptions, String> {
        let mut options = ColumnFamilyOptions::new()
            .max_successive_merges(self.max_successive_merges)
            .inplace_update_support(self.inplace)
            .filter_deletes(self.filter_deletes);
        if let Some(name) = &self.merge_operator {
            let op: Arc<dyn MergeOperator> = match name.as_str() {
                "append" => Arc::new(StringAppendOperator::default()),
                "add" => Arc::new(UInt64AddOperator),
                other => return Err(format!("unknown merge operator '{other}'")),
            };
            options = options.merge_operator(op);
        }
        Ok(options)
    }

    fn replay_options(&self) -> ReplayOptions {
        if self.recovery {
            ReplayOptions::recovery(self.log_number)
        } else {
            ReplayOptions::new().log_number(self.log_number)
        }
    }
}

/// Replay outcome for output.
#[derive(Debug, Serialize)]
pub struct ReplayResult {
    /// Sequence number after the last mutation.
    pub next_sequence: u64,
    /// Column family contents after replay.
    pub column_families: Vec<FamilyContents>,
    /// Replay counters.
    pub stats: StatsInfo,
    /// Log data blobs in batch order.
    pub log_data: Vec<String>,
    /// Error that stopped replay, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Entries of one column family.
#[derive(Debug, Serialize)]
pub struct FamilyContents {
    /// Column family id.
    pub id: u32,
    /// Column family name.
    pub name: String,
    /// Entries in key order, newest version first.
    pub entries: Vec<EntryInfo>,
}

/// One table entry.
#[derive(Debug, Serialize)]
pub struct EntryInfo {
    /// Key.
    pub key: String,
    /// Sequence number.
    pub sequence: u64,
    /// Entry kind.
    pub kind: String,
    /// Value or operand (empty for deletions).
    pub value: String,
}

/// Serializable copy of [`StatsSnapshot`].
#[derive(Debug, Serialize)]
pub struct StatsInfo {
    /// Records that reached a table.
    pub records_applied: u64,
    /// Values written by the in-place callback path.
    pub keys_written: u64,
    /// Values rewritten in place.
    pub keys_updated: u64,
    /// Merge chains collapsed into a value.
    pub merges_collapsed: u64,
    /// Collapse attempts that stored the operand instead.
    pub merge_failures: u64,
    /// Deletes dropped for absent keys.
    pub filtered_deletes: u64,
    /// Records for column families that do not exist.
    pub dropped_family_skips: u64,
    /// Records already reflected in their column family.
    pub already_applied_skips: u64,
    /// Log data blobs seen.
    pub log_blobs: u64,
}

impl From<StatsSnapshot> for StatsInfo {
    fn from(s: StatsSnapshot) -> Self {
        Self {
            records_applied: s.records_applied,
            keys_written: s.keys_written,
            keys_updated: s.keys_updated,
            merges_collapsed: s.merges_collapsed,
            merge_failures: s.merge_failures,
            filtered_deletes: s.filtered_deletes,
            dropped_family_skips: s.dropped_family_skips,
            already_applied_skips: s.already_applied_skips,
            log_blobs: s.log_blobs,
        }
    }
}

/// Runs the replay command.
pub fn run(path: &Path, args: &ReplayArgs, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let data = std::fs::read(path)?;
    let result = replay(&data, args)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            print_text_output(&result);
        }
    }

    match result.error {
        Some(error) => Err(error.into()),
        None => Ok(()),
    }
}

/// Replays `data` into a fresh column family set built from `args`.
///
/// A replay error is reported in [`ReplayResult::error`] together with
/// whatever was applied before it.
///
/// # Errors
///
/// Returns an error for invalid arguments or a batch too short to hold a
/// header.
pub fn replay(data: &[u8], args: &ReplayArgs) -> Result<ReplayResult, Box<dyn std::error::Error>> {
    let options = args.column_family_options()?;
    let families = ColumnFamilySet::with_default_options(options.clone())?;
    for &id in &args.column_families {
        families.create(ColumnFamilyId::new(id), format!("cf{id}"), options.clone())?;
    }

    let view = BatchView::new(data)?;
    let stats = Arc::new(ReplayStats::new());
    let mut log_data = Vec::new();

    let (next_sequence, error) = {
        let mut applier = BatchApplier::new(&families, args.replay_options())
            .with_stats(Arc::clone(&stats))
            .with_log_sink(|blob| log_data.push(render_bytes(blob)));
        let outcome = applier.apply_view(view);
        (applier.sequence().as_u64(), outcome.err().map(|e| e.to_string()))
    };

    if let Some(ref e) = error {
        tracing::warn!(error = %e, "replay stopped early");
    }

    let column_families = families
        .families()
        .iter()
        .map(|cf| FamilyContents {
            id: cf.id().as_u32(),
            name: cf.name().to_string(),
            entries: cf
                .memtable()
                .entries()
                .into_iter()
                .map(|(key, entry)| EntryInfo {
                    key: render_bytes(&key),
                    sequence: entry.sequence.as_u64(),
                    kind: entry.kind.name().to_string(),
                    value: render_bytes(&entry.value),
                })
                .collect(),
        })
        .collect();

    Ok(ReplayResult {
        next_sequence,
        column_families,
        stats: stats.snapshot().into(),
        log_data,
        error,
    })
}

fn print_text_output(result: &ReplayResult) {
    println!("Replay finished: next sequence {}", result.next_sequence);
    println!("================");

    for family in &result.column_families {
        println!();
        println!(
            "Column family {} ({}): {} entries",
            family.id,
            family.name,
            family.entries.len()
        );
        for entry in &family.entries {
            println!(
                "  {} @{} {:6} {}",
                entry.key, entry.sequence, entry.kind, entry.value
            );
        }
    }

    if !result.log_data.is_empty() {
        println!();
        println!("Log data:");
        for blob in &result.log_data {
            println!("  {}", blob);
        }
    }

    let s = &result.stats;
    println!();
    println!("Stats:");
    println!("  Records applied:       {}", s.records_applied);
    println!("  Keys written:          {}", s.keys_written);
    println!("  Keys updated:          {}", s.keys_updated);
    println!("  Merges collapsed:      {}", s.merges_collapsed);
    println!("  Merge failures:        {}", s.merge_failures);
    println!("  Filtered deletes:      {}", s.filtered_deletes);
    println!("  Dropped family skips:  {}", s.dropped_family_skips);
    println!("  Already applied skips: {}", s.already_applied_skips);
    println!("  Log blobs:             {}", s.log_blobs);

    if let Some(ref error) = result.error {
        println!();
        println!("ERROR: {}", error);
    }
}
