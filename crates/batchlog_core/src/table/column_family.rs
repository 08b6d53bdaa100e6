//! Column family resolution.

use super::{MemTable, MutableTable};
use crate::config::ColumnFamilyOptions;
use crate::error::{CoreError, CoreResult};
use crate::types::ColumnFamilyId;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Everything the applier needs to write into one column family.
#[derive(Clone)]
pub struct ColumnFamilyTarget {
    /// The table receiving mutations.
    pub table: Arc<dyn MutableTable>,
    /// Write policy of the column family.
    pub options: Arc<ColumnFamilyOptions>,
    /// Number of the newest log whose contents the table already holds.
    pub log_number: u64,
}

impl fmt::Debug for ColumnFamilyTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnFamilyTarget")
            .field("options", &self.options)
            .field("log_number", &self.log_number)
            .finish_non_exhaustive()
    }
}

/// Maps column family ids to write targets.
pub trait ColumnFamilyResolver {
    /// Returns the target for `id`, or `None` if no such family exists.
    fn resolve(&self, id: ColumnFamilyId) -> Option<ColumnFamilyTarget>;
}

impl<F> ColumnFamilyResolver for F
where
    F: Fn(ColumnFamilyId) -> Option<ColumnFamilyTarget>,
{
    fn resolve(&self, id: ColumnFamilyId) -> Option<ColumnFamilyTarget> {
        self(id)
    }
}

/// A named column family backed by a [`MemTable`].
pub struct ColumnFamily {
    id: ColumnFamilyId,
    name: String,
    options: Arc<ColumnFamilyOptions>,
    memtable: Arc<MemTable>,
    log_number: AtomicU64,
}

impl ColumnFamily {
    /// Creates a column family with an empty memtable.
    ///
    /// # Errors
    ///
    /// Returns an error if the memtable options are invalid.
    pub fn new(
        id: ColumnFamilyId,
        name: impl Into<String>,
        options: ColumnFamilyOptions,
    ) -> CoreResult<Self> {
        let memtable = MemTable::with_options(&options)?;
        Ok(Self {
            id,
            name: name.into(),
            options: Arc::new(options),
            memtable: Arc::new(memtable),
            log_number: AtomicU64::new(0),
        })
    }

    /// Column family id.
    #[must_use]
    pub fn id(&self) -> ColumnFamilyId {
        self.id
    }

    /// Column family name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Write policy.
    #[must_use]
    pub fn options(&self) -> &ColumnFamilyOptions {
        &self.options
    }

    /// The backing memtable.
    #[must_use]
    pub fn memtable(&self) -> &Arc<MemTable> {
        &self.memtable
    }

    /// Number of the newest log already reflected in the memtable.
    #[must_use]
    pub fn log_number(&self) -> u64 {
        self.log_number.load(Ordering::Acquire)
    }

    /// Records that the memtable holds everything up to log `number`.
    pub fn set_log_number(&self, number: u64) {
        self.log_number.store(number, Ordering::Release);
    }

    /// Builds a replay target for this family.
    #[must_use]
    pub fn target(&self) -> ColumnFamilyTarget {
        ColumnFamilyTarget {
            table: Arc::clone(&self.memtable) as Arc<dyn MutableTable>,
            options: Arc::clone(&self.options),
            log_number: self.log_number(),
        }
    }
}

impl fmt::Debug for ColumnFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnFamily")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("log_number", &self.log_number())
            .field("memtable", &self.memtable)
            .finish()
    }
}

/// The set of live column families.
///
/// Always contains the default family (id 0, name `"default"`), which
/// cannot be dropped.
#[derive(Debug)]
pub struct ColumnFamilySet {
    families: RwLock<BTreeMap<ColumnFamilyId, Arc<ColumnFamily>>>,
}

impl ColumnFamilySet {
    /// Name of the default column family.
    pub const DEFAULT_NAME: &'static str = "default";

    /// Creates a set holding only the default family with default options.
    #[must_use]
    pub fn new() -> Self {
        let default = ColumnFamily {
            id: ColumnFamilyId::DEFAULT,
            name: Self::DEFAULT_NAME.to_string(),
            options: Arc::new(ColumnFamilyOptions::default()),
            memtable: Arc::new(MemTable::new()),
            log_number: AtomicU64::new(0),
        };
        Self::from_default(default)
    }

    /// Creates a set whose default family uses `options`.
    ///
    /// # Errors
    ///
    /// Returns an error if the memtable options are invalid.
    pub fn with_default_options(options: ColumnFamilyOptions) -> CoreResult<Self> {
        let default = ColumnFamily::new(ColumnFamilyId::DEFAULT, Self::DEFAULT_NAME, options)?;
        Ok(Self::from_default(default))
    }

    fn from_default(default: ColumnFamily) -> Self {
        let mut families = BTreeMap::new();
        families.insert(ColumnFamilyId::DEFAULT, Arc::new(default));
        Self {
            families: RwLock::new(families),
        }
    }

    /// Adds a column family.
    ///
    /// # Errors
    ///
    /// Returns an error if the id or name is taken, or the options are
    /// invalid.
    pub fn create(
        &self,
        id: ColumnFamilyId,
        name: impl Into<String>,
        options: ColumnFamilyOptions,
    ) -> CoreResult<Arc<ColumnFamily>> {
        let name = name.into();
        let mut families = self.families.write();
        if families.contains_key(&id) {
            return Err(CoreError::invalid_argument(format!(
                "column family {id} already exists"
            )));
        }
        if families.values().any(|cf| cf.name == name) {
            return Err(CoreError::invalid_argument(format!(
                "column family name '{name}' already in use"
            )));
        }

        let family = Arc::new(ColumnFamily::new(id, name, options)?);
        families.insert(id, Arc::clone(&family));
        tracing::debug!(%id, name = family.name(), "created column family");
        Ok(family)
    }

    /// Removes a column family. Later batches that reference it are
    /// rejected, or skipped during recovery.
    ///
    /// # Errors
    ///
    /// Returns an error for the default family or an unknown id.
    pub fn drop_family(&self, id: ColumnFamilyId) -> CoreResult<Arc<ColumnFamily>> {
        if id.is_default() {
            return Err(CoreError::invalid_argument(
                "the default column family cannot be dropped",
            ));
        }
        let family = self
            .families
            .write()
            .remove(&id)
            .ok_or_else(|| CoreError::invalid_argument(format!("unknown column family {id}")))?;
        tracing::debug!(%id, name = family.name(), "dropped column family");
        Ok(family)
    }

    /// Looks up a family by id.
    #[must_use]
    pub fn get(&self, id: ColumnFamilyId) -> Option<Arc<ColumnFamily>> {
        self.families.read().get(&id).cloned()
    }

    /// Looks up a family by name.
    #[must_use]
    pub fn get_by_name(&self, name: &str) -> Option<Arc<ColumnFamily>> {
        self.families
            .read()
            .values()
            .find(|cf| cf.name == name)
            .cloned()
    }

    /// The default family.
    #[must_use]
    pub fn default_family(&self) -> Option<Arc<ColumnFamily>> {
        self.get(ColumnFamilyId::DEFAULT)
    }

    /// Ids of all live families, ascending.
    #[must_use]
    pub fn ids(&self) -> Vec<ColumnFamilyId> {
        self.families.read().keys().copied().collect()
    }

    /// All live families, ascending by id.
    #[must_use]
    pub fn families(&self) -> Vec<Arc<ColumnFamily>> {
        self.families.read().values().cloned().collect()
    }

    /// Number of live families.
    #[must_use]
    pub fn len(&self) -> usize {
        self.families.read().len()
    }

    /// Always false: the default family is never removed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.families.read().is_empty()
    }

    /// Sets the log number of a family.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown id.
    pub fn set_log_number(&self, id: ColumnFamilyId, number: u64) -> CoreResult<()> {
        let family = self
            .get(id)
            .ok_or_else(|| CoreError::invalid_argument(format!("unknown column family {id}")))?;
        family.set_log_number(number);
        Ok(())
    }
}

impl Default for ColumnFamilySet {
    fn default() -> Self {
        Self::new()
    }
}

impl ColumnFamilyResolver for ColumnFamilySet {
    fn resolve(&self, id: ColumnFamilyId) -> Option<ColumnFamilyTarget> {
        self.families.read().get(&id).map(|cf| cf.target())
    }
}
