//! Startup recovery
//!
//! Strict order:
//! 1. Register every catalog table in an empty store
//! 2. Load the marker; if present, load each table's image from its
//!    generation, keeping original commit ids and timestamps
//! 3. If the log is enabled, replay records after the marker's lsn;
//!    otherwise only scan an existing log for its bounds
//! 4. Report the newest commit id and log lsn so new commits and checkpoints
//!    continue after them

use std::path::Path;

use crate::catalog::Catalog;
use crate::checkpoint::{generation_dir, image_path, read_image, CheckpointMarker};
use crate::mvcc::{CommitId, VersionStore};
use crate::observability::{log_event_with_fields, Event};
use crate::wal::{LogReader, LogWriter};

use super::adapters::RecoveryStorage;
use super::errors::{RecoveryError, RecoveryResult};
use super::replay::{LogReplayer, ReplayStats};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryStats {
    pub checkpoint_generation: Option<u64>,
    pub tables: usize,
    pub image_entries: u64,
    pub replay: ReplayStats,
}

/// Everything recovery rebuilt for a new connection.
pub struct RecoveredState {
    pub store: VersionStore,
    pub marker: Option<CheckpointMarker>,
    pub last_commit: CommitId,
    /// Last lsn in the log file, 0 without one
    pub log_lsn: u64,
    pub stats: RecoveryStats,
}

/// Rebuilds a home's in-memory state at open.
pub struct RecoveryManager;

impl RecoveryManager {
    /// Runs recovery, logging its start and outcome.
    pub fn recover(
        home: &Path,
        catalog: &Catalog,
        replay_log: bool,
    ) -> RecoveryResult<RecoveredState> {
        log_event_with_fields(
            Event::RecoveryStart,
            &[("home", &home.display().to_string())],
        );

        match Self::run(home, catalog, replay_log) {
            Ok(state) => {
                let entries = state.stats.image_entries.to_string();
                let replayed = state.stats.replay.records_replayed.to_string();
                let commit = state.last_commit.value().to_string();
                log_event_with_fields(
                    Event::RecoveryComplete,
                    &[
                        ("image_entries", &entries),
                        ("last_commit_id", &commit),
                        ("records_replayed", &replayed),
                    ],
                );
                Ok(state)
            }
            Err(e) => {
                let reason = e.to_string();
                log_event_with_fields(
                    Event::RecoveryFailed,
                    &[("code", e.code()), ("reason", &reason)],
                );
                Err(e)
            }
        }
    }

    fn run(home: &Path, catalog: &Catalog, replay_log: bool) -> RecoveryResult<RecoveredState> {
        let store = VersionStore::new();
        let tables = catalog.entries();
        for table in &tables {
            store.create_table(&table.name);
        }

        let mut stats = RecoveryStats {
            tables: tables.len(),
            ..RecoveryStats::default()
        };
        let mut last_commit = CommitId::NONE;

        let marker = CheckpointMarker::load(home)?;
        if let Some(marker) = &marker {
            stats.checkpoint_generation = Some(marker.generation);
            last_commit = last_commit.max(marker.max_commit_id);
            let dir = generation_dir(home, marker.generation);

            for table in &tables {
                // Tables created after the checkpoint have no image.
                let Some(entry) = marker.table(&table.name) else {
                    continue;
                };
                let path = image_path(&dir, entry.id);
                if !path.exists() {
                    return Err(RecoveryError::MissingImage {
                        generation: marker.generation,
                        table: table.name.clone(),
                    });
                }
                for visible in read_image(&path)? {
                    last_commit = last_commit.max(visible.version.commit_id());
                    store.append(&table.name, &visible.key, visible.version)?;
                    stats.image_entries += 1;
                }
            }
        }

        let log_path = LogWriter::log_path(home);
        if log_path.exists() {
            let mut reader = LogReader::open(&log_path)?;
            if replay_log {
                let checkpoint_lsn = marker.as_ref().map_or(0, |m| m.log_lsn);
                let mut storage = RecoveryStorage::new(&store, catalog);
                stats.replay = LogReplayer::replay(&mut reader, &mut storage, checkpoint_lsn)?;

                let replayed = stats.replay.records_replayed.to_string();
                let last_lsn = stats.replay.last_lsn.to_string();
                log_event_with_fields(
                    Event::RecoveryReplayComplete,
                    &[("last_lsn", &last_lsn), ("records_replayed", &replayed)],
                );
            } else {
                stats.replay = LogReplayer::scan(&mut reader)?;
            }
            last_commit = last_commit.max(CommitId::new(stats.replay.max_commit_id));
        }

        Ok(RecoveredState {
            store,
            marker,
            last_commit,
            log_lsn: stats.replay.last_lsn,
            stats,
        })
    }
}
