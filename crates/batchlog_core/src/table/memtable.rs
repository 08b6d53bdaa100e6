//! In-memory versioned table.

use super::{InplaceCallback, MutableTable, TableEntry, UpdateOutcome, UpdateStatus};
use crate::config::ColumnFamilyOptions;
use crate::error::{CoreError, CoreResult};
use crate::merge::MergeOperator;
use crate::types::{SequenceNumber, ValueType};
use batchlog_bloom::BloomFilter;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

type Versions = Vec<TableEntry>;

/// Ordered map from key to its versions, newest first.
///
/// Keys are kept in byte order. Each key's versions are sorted by
/// descending sequence number, so the head of the chain is the latest
/// write. An optional Bloom filter over every key ever added answers
/// [`MutableTable::key_may_exist`] without taking the lock for keys that
/// were never written.
pub struct MemTable {
    entries: RwLock<BTreeMap<Vec<u8>, Versions>>,
    merge_operator: Option<Arc<dyn MergeOperator>>,
    bloom: Option<BloomFilter>,
}

impl MemTable {
    /// Creates an empty table without a merge operator or Bloom filter.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
            merge_operator: None,
            bloom: None,
        }
    }

    /// Creates an empty table configured from column family options.
    ///
    /// # Errors
    ///
    /// Returns an error if the Bloom filter options are invalid.
    pub fn with_options(options: &ColumnFamilyOptions) -> CoreResult<Self> {
        let bloom = match options.memtable_bloom {
            Some(bloom) => Some(BloomFilter::new(
                bloom.total_bits,
                bloom.locality,
                bloom.num_probes,
            )?),
            None => None,
        };
        Ok(Self {
            entries: RwLock::new(BTreeMap::new()),
            merge_operator: options.merge_operator.clone(),
            bloom,
        })
    }

    /// Returns true if a Bloom filter is attached.
    #[must_use]
    pub fn has_bloom(&self) -> bool {
        self.bloom.is_some()
    }

    /// Number of distinct keys.
    #[must_use]
    pub fn num_keys(&self) -> usize {
        self.entries.read().len()
    }

    /// Total number of versions across all keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().values().map(Vec::len).sum()
    }

    /// Returns true if nothing was ever added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// All versions of `key`, newest first.
    #[must_use]
    pub fn versions(&self, key: &[u8]) -> Vec<TableEntry> {
        self.entries.read().get(key).cloned().unwrap_or_default()
    }

    /// Every version of every key, in key order then newest first.
    #[must_use]
    pub fn entries(&self) -> Vec<(Vec<u8>, TableEntry)> {
        self.entries
            .read()
            .iter()
            .flat_map(|(key, versions)| versions.iter().map(|e| (key.clone(), e.clone())))
            .collect()
    }

    fn insert_version(
        versions: &mut Versions,
        seq: SequenceNumber,
        kind: ValueType,
        value: Vec<u8>,
    ) {
        // A later write at the same sequence sorts first.
        let pos = versions.partition_point(|e| e.sequence > seq);
        versions.insert(
            pos,
            TableEntry {
                sequence: seq,
                kind,
                value,
            },
        );
    }

    fn insert(&self, seq: SequenceNumber, kind: ValueType, key: &[u8], value: Vec<u8>) {
        if let Some(bloom) = &self.bloom {
            bloom.add(key);
        }
        let mut map = self.entries.write();
        let versions = map.entry(key.to_vec()).or_default();
        Self::insert_version(versions, seq, kind, value);
    }

    fn resolve(
        &self,
        key: &[u8],
        base: Option<&[u8]>,
        mut operands: Vec<&[u8]>,
    ) -> CoreResult<Option<Vec<u8>>> {
        if operands.is_empty() {
            return Ok(base.map(<[u8]>::to_vec));
        }
        let op = self.merge_operator.as_ref().ok_or_else(|| {
            CoreError::invalid_argument("merge operands found but no merge operator is configured")
        })?;
        // Collected newest first; operators take oldest first.
        operands.reverse();
        op.full_merge(key, base, &operands)
            .map(Some)
            .ok_or_else(|| CoreError::corruption(format!("merge operator {} failed", op.name())))
    }
}

impl Default for MemTable {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemTable")
            .field("num_keys", &self.num_keys())
            .field("merge_operator", &self.merge_operator)
            .field("bloom", &self.bloom)
            .finish()
    }
}

impl MutableTable for MemTable {
    fn add(&self, seq: SequenceNumber, kind: ValueType, key: &[u8], value: &[u8]) {
        self.insert(seq, kind, key, value.to_vec());
    }

    fn update(&self, seq: SequenceNumber, key: &[u8], value: &[u8]) {
        {
            let mut map = self.entries.write();
            if let Some(entry) = map
                .get_mut(key)
                .and_then(|versions| versions.iter_mut().find(|e| e.sequence <= seq))
            {
                if entry.kind == ValueType::Value {
                    entry.value.clear();
                    entry.value.extend_from_slice(value);
                    return;
                }
            }
        }
        self.insert(seq, ValueType::Value, key, value.to_vec());
    }

    fn update_with_callback(
        &self,
        seq: SequenceNumber,
        key: &[u8],
        value: &[u8],
        callback: &InplaceCallback,
    ) -> Option<UpdateOutcome> {
        let mut map = self.entries.write();
        let versions = map.get_mut(key)?;
        let entry = versions.iter_mut().find(|e| e.sequence <= seq)?;
        if entry.kind != ValueType::Value {
            return None;
        }

        let status = callback(Some(&mut entry.value), value);
        match status {
            UpdateStatus::UpdatedInPlace => Some(UpdateOutcome::InPlace),
            UpdateStatus::Updated(new_value) => {
                Self::insert_version(versions, seq, ValueType::Value, new_value);
                Some(UpdateOutcome::Written)
            }
            UpdateStatus::Failed => Some(UpdateOutcome::Declined),
        }
    }

    fn count_successive_merge_entries(&self, key: &[u8], seq: SequenceNumber) -> usize {
        let map = self.entries.read();
        map.get(key).map_or(0, |versions| {
            versions
                .iter()
                .filter(|e| e.sequence <= seq)
                .take_while(|e| e.kind == ValueType::Merge)
                .count()
        })
    }

    fn get(&self, key: &[u8], seq: SequenceNumber) -> CoreResult<Option<Vec<u8>>> {
        let map = self.entries.read();
        let Some(versions) = map.get(key) else {
            return Ok(None);
        };

        let mut operands = Vec::new();
        for entry in versions.iter().filter(|e| e.sequence <= seq) {
            match entry.kind {
                ValueType::Value => {
                    return self.resolve(key, Some(entry.value.as_slice()), operands);
                }
                ValueType::Deletion => return self.resolve(key, None, operands),
                ValueType::Merge => operands.push(entry.value.as_slice()),
            }
        }
        self.resolve(key, None, operands)
    }

    fn key_may_exist(&self, key: &[u8], seq: SequenceNumber) -> bool {
        if let Some(bloom) = &self.bloom {
            if !bloom.may_contain(key) {
                return false;
            }
        }
        let map = self.entries.read();
        map.get(key)
            .and_then(|versions| versions.iter().find(|e| e.sequence <= seq))
            .is_some_and(|e| e.kind != ValueType::Deletion)
    }
}
