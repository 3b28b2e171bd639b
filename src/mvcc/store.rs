//! VersionStore - per-table version chains
//!
//! Each table is an ordered map from key to `VersionChain` behind its own
//! `RwLock`. Readers take read locks only; the commit path takes a write lock
//! per table while appending. Chains only grow.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use thiserror::Error;

use super::{ReadView, Version, VersionChain, VisibilityResult};
use crate::sync::{read, write};
use crate::timestamp::Timestamp;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("no such table '{0}'")]
    NoSuchTable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Outcome of a point lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Present(Vec<u8>),
    Deleted,
    Absent,
}

impl Lookup {
    pub fn into_value(self) -> Option<Vec<u8>> {
        match self {
            Lookup::Present(v) => Some(v),
            Lookup::Deleted | Lookup::Absent => None,
        }
    }
}

impl From<VisibilityResult<'_>> for Lookup {
    fn from(result: VisibilityResult<'_>) -> Self {
        match result {
            VisibilityResult::Visible(v) => {
                Lookup::Present(v.payload().value().map(<[u8]>::to_vec).unwrap_or_default())
            }
            VisibilityResult::Deleted(_) => Lookup::Deleted,
            VisibilityResult::Absent => Lookup::Absent,
        }
    }
}

/// A visible value together with the version metadata a checkpoint keeps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleEntry {
    pub key: Vec<u8>,
    pub version: Version,
}

type TableChains = BTreeMap<Vec<u8>, VersionChain>;

#[derive(Debug, Default)]
pub struct VersionStore {
    tables: RwLock<HashMap<String, Arc<RwLock<TableChains>>>>,
}

impl VersionStore {
    /// An empty store with no tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an empty table. Registering twice is a no-op.
    pub fn create_table(&self, name: &str) {
        write(&self.tables)
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(RwLock::new(BTreeMap::new())));
    }

    /// Whether `name` has been registered.
    pub fn has_table(&self, name: &str) -> bool {
        read(&self.tables).contains_key(name)
    }

    fn table(&self, name: &str) -> StoreResult<Arc<RwLock<TableChains>>> {
        read(&self.tables)
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::NoSuchTable(name.to_string()))
    }

    /// Appends a committed version to a key's chain.
    pub fn append(&self, table: &str, key: &[u8], version: Version) -> StoreResult<()> {
        let table = self.table(table)?;
        let mut chains = write(&table);
        chains.entry(key.to_vec()).or_default().push(version);
        Ok(())
    }

    /// Point lookup under `view`.
    pub fn get(&self, table: &str, key: &[u8], view: ReadView) -> StoreResult<Lookup> {
        let table = self.table(table)?;
        let chains = read(&table);
        Ok(chains
            .get(key)
            .map_or(Lookup::Absent, |chain| chain.visible_version(view).into()))
    }

    /// Every key with a visible value under `view`, in key order.
    pub fn scan(&self, table: &str, view: ReadView) -> StoreResult<Vec<(Vec<u8>, Vec<u8>)>> {
        Ok(self
            .visible_entries(table, view)?
            .into_iter()
            .filter_map(|entry| {
                let value = entry.version.payload().value()?.to_vec();
                Some((entry.key, value))
            })
            .collect())
    }

    /// Visible value versions under `view`, in key order. Deleted and absent
    /// keys are skipped.
    pub fn visible_entries(&self, table: &str, view: ReadView) -> StoreResult<Vec<VisibleEntry>> {
        let table = self.table(table)?;
        let chains = read(&table);
        Ok(chains
            .iter()
            .filter_map(|(key, chain)| {
                chain.visible_version(view).version().map(|v| VisibleEntry {
                    key: key.clone(),
                    version: v.clone(),
                })
            })
            .collect())
    }

    /// Largest commit timestamp recorded for a key.
    pub fn newest_timestamp(&self, table: &str, key: &[u8]) -> StoreResult<Option<Timestamp>> {
        let table = self.table(table)?;
        let chains = read(&table);
        Ok(chains.get(key).and_then(VersionChain::newest_timestamp))
    }

    /// Number of keys with at least one version.
    pub fn key_count(&self, table: &str) -> StoreResult<usize> {
        let table = self.table(table)?;
        let count = read(&table).len();
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mvcc::{CommitId, ReadPoint};

    fn view(point: ReadPoint) -> ReadView {
        ReadView::new(point, CommitId::new(u64::MAX))
    }

    fn ts(v: u64) -> Option<Timestamp> {
        Some(Timestamp::new(v))
    }

    #[test]
    fn test_missing_table() {
        let store = VersionStore::new();
        let err = store.get("nope", b"k", view(ReadPoint::Latest)).unwrap_err();
        assert_eq!(err, StoreError::NoSuchTable("nope".to_string()));
    }

    #[test]
    fn test_lookup_distinguishes_deleted_from_absent() {
        let store = VersionStore::new();
        store.create_table("t");
        store
            .append("t", b"k", Version::with_value(CommitId::new(1), None, b"v".to_vec()))
            .unwrap();
        store
            .append("t", b"k", Version::with_tombstone(CommitId::new(2), None))
            .unwrap();

        assert_eq!(store.get("t", b"k", view(ReadPoint::Latest)).unwrap(), Lookup::Deleted);
        assert_eq!(store.get("t", b"x", view(ReadPoint::Latest)).unwrap(), Lookup::Absent);
    }

    #[test]
    fn test_scan_and_get_agree() {
        let store = VersionStore::new();
        store.create_table("t");
        for k in 1..=10u64 {
            store
                .append(
                    "t",
                    &k.to_be_bytes(),
                    Version::with_value(CommitId::new(k), ts(k), b"v".to_vec()),
                )
                .unwrap();
        }

        let point = view(ReadPoint::AsOf(Timestamp::new(4)));
        let scanned = store.scan("t", point).unwrap();
        assert_eq!(scanned.len(), 4);
        for k in 1..=10u64 {
            let present = store.get("t", &k.to_be_bytes(), point).unwrap() != Lookup::Absent;
            assert_eq!(present, scanned.iter().any(|(key, _)| key == &k.to_be_bytes()));
        }
    }

    #[test]
    fn test_newest_timestamp() {
        let store = VersionStore::new();
        store.create_table("t");
        store
            .append("t", b"k", Version::with_value(CommitId::new(1), ts(7), vec![]))
            .unwrap();
        assert_eq!(store.newest_timestamp("t", b"k").unwrap(), ts(7));
        assert_eq!(store.newest_timestamp("t", b"other").unwrap(), None);
        assert_eq!(store.key_count("t").unwrap(), 1);
    }
}
