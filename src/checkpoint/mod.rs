//! Checkpoints
//!
//! A checkpoint is a set of per-table images plus the marker naming them.
//!
//! # Algorithm
//!
//! 1. Fix the fence under the commit lock: newest commit id, stable
//!    timestamp, last log lsn
//! 2. Flush and fsync the log through the fence
//! 3. Resolve each table's cutoff (see [`Cutoff`]) and write its image into
//!    `checkpoint/<generation>/`
//! 4. Write `checkpoint.json` (the commit point)
//! 5. Remove the previous generation directory
//!
//! # Crash Safety
//!
//! - Crash before the marker rename: the old marker still names the old,
//!   intact generation; the half-written directory is ignored
//! - Crash after the rename: the new generation is used; a leftover old
//!   directory is ignored
//!
//! Commits continue while images are written. Scans are bounded by the
//! fence's commit id, so each transaction is in a checkpoint entirely or not
//! at all.

mod errors;
mod image;
mod marker;
mod policy;

pub use errors::{CheckpointError, CheckpointResult};
pub use image::{image_path, read_image, write_image};
pub use marker::{marker_path, CheckpointMarker, MarkerTable, FORMAT_VERSION};
pub use policy::Cutoff;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{SecondsFormat, Utc};

use crate::catalog::Catalog;
use crate::config::CheckpointOptions;
use crate::mvcc::{ReadView, VersionStore};
use crate::observability::{log_event_with_fields, Event};
use crate::sync::lock;
use crate::txn::TransactionManager;
use crate::wal::LogWriter;

/// Directory holding one checkpoint generation's images.
pub fn generation_dir(home: &Path, generation: u64) -> PathBuf {
    home.join("checkpoint").join(generation.to_string())
}

/// Serializes checkpoints and tracks the current generation.
pub struct CheckpointManager {
    home: PathBuf,
    last_generation: Mutex<u64>,
}

/// Borrowed connection state a checkpoint reads.
pub struct CheckpointSources<'a> {
    pub catalog: &'a Catalog,
    pub store: &'a VersionStore,
    pub txns: &'a TransactionManager,
    pub log: Option<&'a Mutex<LogWriter>>,
}

impl CheckpointManager {
    /// `last` is the marker found at open, if any.
    pub fn new(home: &Path, last: Option<&CheckpointMarker>) -> Self {
        Self {
            home: home.to_path_buf(),
            last_generation: Mutex::new(last.map_or(0, |m| m.generation)),
        }
    }

    /// Generation named by the newest marker, 0 before the first checkpoint.
    pub fn last_generation(&self) -> u64 {
        *lock(&self.last_generation)
    }

    /// Writes a new generation and its marker, then removes the previous
    /// generation. Only one checkpoint runs at a time.
    pub fn create(
        &self,
        sources: CheckpointSources<'_>,
        options: &CheckpointOptions,
    ) -> CheckpointResult<CheckpointMarker> {
        let mut generation = lock(&self.last_generation);
        let next = *generation + 1;
        let next_str = next.to_string();
        log_event_with_fields(Event::CheckpointStart, &[("generation", &next_str)]);

        match self.write_generation(next, &sources, options) {
            Ok(marker) => {
                let previous = std::mem::replace(&mut *generation, next);
                // still under the generation lock, so no checkpoint reuses it
                if previous != 0 {
                    let dir = generation_dir(&self.home, previous);
                    if let Err(e) = fs::remove_dir_all(&dir) {
                        if e.kind() != std::io::ErrorKind::NotFound {
                            let path = dir.display().to_string();
                            let reason = e.to_string();
                            log_event_with_fields(
                                Event::CheckpointFailed,
                                &[("stale_generation", &path), ("reason", &reason)],
                            );
                        }
                    }
                }
                let lsn = marker.log_lsn.to_string();
                let tables = marker.tables.len().to_string();
                log_event_with_fields(
                    Event::CheckpointComplete,
                    &[("generation", &next_str), ("log_lsn", &lsn), ("tables", &tables)],
                );
                Ok(marker)
            }
            Err(e) => {
                let _ = fs::remove_dir_all(generation_dir(&self.home, next));
                let reason = e.to_string();
                log_event_with_fields(
                    Event::CheckpointFailed,
                    &[("generation", &next_str), ("reason", &reason)],
                );
                Err(e)
            }
        }
    }

    fn write_generation(
        &self,
        generation: u64,
        sources: &CheckpointSources<'_>,
        options: &CheckpointOptions,
    ) -> CheckpointResult<CheckpointMarker> {
        let fence = sources.txns.fence();

        if let Some(log) = sources.log {
            lock(log).flush(true)?;
        }

        let dir = generation_dir(&self.home, generation);
        fs::create_dir_all(&dir).map_err(|e| {
            CheckpointError::failed_with_source(format!("failed to create {}", dir.display()), e)
        })?;

        let mut tables = Vec::new();
        for entry in sources.catalog.entries() {
            let cutoff = Cutoff::resolve(&entry.options, options, fence.stable);
            let view = ReadView::new(cutoff.read_point(), fence.upper_bound);
            let visible = if sources.store.has_table(&entry.name) {
                sources.store.visible_entries(&entry.name, view)?
            } else {
                Vec::new()
            };
            write_image(&image_path(&dir, entry.id), &visible)?;
            tables.push(MarkerTable {
                name: entry.name,
                id: entry.id,
                cutoff,
                entries: visible.len() as u64,
            });
        }

        let marker = CheckpointMarker {
            generation,
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            log_lsn: fence.log_lsn,
            max_commit_id: fence.upper_bound,
            stable: fence.stable,
            tables,
            format_version: FORMAT_VERSION,
        };
        marker.write_to_file(&marker_path(&self.home))?;
        Ok(marker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BeginOptions, CommitOptions, TableOptions};
    use crate::mvcc::CommitId;
    use crate::timestamp::{Timestamp, TimestampOracle, TimestampUpdate};
    use std::sync::Arc;
    use tempfile::TempDir;

    struct Fixture {
        dir: TempDir,
        catalog: Arc<Catalog>,
        store: Arc<VersionStore>,
        oracle: Arc<TimestampOracle>,
        txns: TransactionManager,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let catalog = Arc::new(Catalog::open(dir.path()).unwrap());
            let store = Arc::new(VersionStore::new());
            let oracle = Arc::new(TimestampOracle::new());
            for (name, logged) in [("logged", true), ("unlogged", false)] {
                let options = TableOptions {
                    log_enabled: logged,
                    ..TableOptions::default()
                };
                catalog.create(name, options).unwrap();
                store.create_table(name);
            }
            let txns = TransactionManager::new(
                store.clone(),
                oracle.clone(),
                catalog.clone(),
                None,
                CommitId::NONE,
            );
            Self {
                dir,
                catalog,
                store,
                oracle,
                txns,
            }
        }

        fn commit(&self, key: u8, ts: u64) {
            let mut txn = self.txns.begin(BeginOptions::default()).unwrap();
            txn.put("logged", &[key], b"v");
            txn.put("unlogged", &[key], b"v");
            let options = CommitOptions {
                commit_timestamp: Some(Timestamp::new(ts)),
            };
            self.txns.commit(txn, options).unwrap();
        }

        fn sources(&self) -> CheckpointSources<'_> {
            CheckpointSources {
                catalog: &self.catalog,
                store: &self.store,
                txns: &self.txns,
                log: None,
            }
        }
    }

    #[test]
    fn test_stable_cutoff_applies_to_unlogged_table_only() {
        let f = Fixture::new();
        for k in 1..=10 {
            f.commit(k, k as u64);
        }
        f.oracle
            .set(TimestampUpdate {
                oldest: None,
                stable: Some(Timestamp::new(4)),
            })
            .unwrap();

        let manager = CheckpointManager::new(f.dir.path(), None);
        let marker = manager
            .create(f.sources(), &CheckpointOptions::default())
            .unwrap();

        assert_eq!(marker.generation, 1);
        assert_eq!(marker.table("logged").unwrap().entries, 10);
        assert_eq!(marker.table("unlogged").unwrap().entries, 4);
        assert_eq!(
            marker.table("unlogged").unwrap().cutoff,
            Cutoff::AsOf(Timestamp::new(4))
        );

        let dir = generation_dir(f.dir.path(), 1);
        let id = f.catalog.get("unlogged").unwrap().id;
        assert_eq!(read_image(&image_path(&dir, id)).unwrap().len(), 4);
    }

    #[test]
    fn test_new_generation_replaces_old() {
        let f = Fixture::new();
        f.commit(1, 1);
        let manager = CheckpointManager::new(f.dir.path(), None);
        manager.create(f.sources(), &CheckpointOptions::default()).unwrap();
        let marker = manager.create(f.sources(), &CheckpointOptions::default()).unwrap();

        assert_eq!(marker.generation, 2);
        assert_eq!(manager.last_generation(), 2);
        assert!(!generation_dir(f.dir.path(), 1).exists());
        assert!(generation_dir(f.dir.path(), 2).exists());
        assert_eq!(
            CheckpointMarker::load(f.dir.path()).unwrap().unwrap(),
            marker
        );
    }

    #[test]
    fn test_read_timestamp_checkpoint() {
        let f = Fixture::new();
        for k in 1..=10 {
            f.commit(k, k as u64 * 10);
        }
        let options = CheckpointOptions {
            use_timestamp: true,
            read_timestamp: Some(Timestamp::new(55)),
        };
        let manager = CheckpointManager::new(f.dir.path(), None);
        let marker = manager.create(f.sources(), &options).unwrap();
        assert_eq!(marker.table("unlogged").unwrap().entries, 5);
        assert_eq!(marker.max_commit_id, CommitId::new(10));
    }
}
