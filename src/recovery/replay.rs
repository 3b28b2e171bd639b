//! Log replay for recovery
//!
//! - Reads records sequentially in lsn order
//! - Skips records already covered by the checkpoint (`lsn <= checkpoint_lsn`)
//! - Skips records for tables missing from the catalog
//! - Corruption aborts replay; a torn tail ends it
//!
//! Replaying the same log onto the same checkpoint always yields the same
//! store.

use crate::wal::{LogRecord, RecordType};

use super::errors::{RecoveryError, RecoveryResult};

/// Applies replayed records to storage.
pub trait StorageApply {
    /// Whether records for `table` should be applied.
    fn accepts(&self, table: &str) -> bool;

    fn apply_log_record(&mut self, record: &LogRecord) -> RecoveryResult<()>;
}

/// Sequential source of log records.
pub trait LogRead {
    /// `None` at the end of the log or at a torn tail.
    fn read_next(&mut self) -> RecoveryResult<Option<LogRecord>>;

    fn current_offset(&self) -> u64;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayStats {
    pub records_read: u64,
    pub records_replayed: u64,
    /// Covered by the checkpoint
    pub records_skipped: u64,
    /// Table no longer in the catalog
    pub records_orphaned: u64,
    pub puts: u64,
    pub removes: u64,
    pub last_lsn: u64,
    pub max_commit_id: u64,
    pub final_offset: u64,
}

/// Drives a [`LogRead`] into a [`StorageApply`].
pub struct LogReplayer;

impl LogReplayer {
    /// Applies every record after `checkpoint_lsn`.
    pub fn replay<L: LogRead, S: StorageApply>(
        log: &mut L,
        storage: &mut S,
        checkpoint_lsn: u64,
    ) -> RecoveryResult<ReplayStats> {
        let mut stats = ReplayStats::default();

        while let Some(record) = log.read_next()? {
            stats.records_read += 1;
            if stats.last_lsn != 0 && record.lsn != stats.last_lsn + 1 {
                return Err(RecoveryError::LogGap {
                    expected: stats.last_lsn + 1,
                    found: record.lsn,
                });
            }
            stats.last_lsn = record.lsn;

            if record.lsn <= checkpoint_lsn {
                stats.records_skipped += 1;
                continue;
            }
            if !storage.accepts(&record.table) {
                stats.records_orphaned += 1;
                continue;
            }

            storage.apply_log_record(&record)?;
            stats.records_replayed += 1;
            stats.max_commit_id = stats.max_commit_id.max(record.commit_id.value());
            match record.record_type() {
                RecordType::Put => stats.puts += 1,
                RecordType::Remove => stats.removes += 1,
            }
        }

        stats.final_offset = log.current_offset();
        Ok(stats)
    }

    /// Walks the log without applying anything, for a connection opened
    /// with logging off. The last lsn and newest commit id still bound what
    /// that connection hands out and records in its checkpoints.
    pub fn scan<L: LogRead>(log: &mut L) -> RecoveryResult<ReplayStats> {
        let mut stats = ReplayStats::default();

        while let Some(record) = log.read_next()? {
            stats.records_read += 1;
            if stats.last_lsn != 0 && record.lsn != stats.last_lsn + 1 {
                return Err(RecoveryError::LogGap {
                    expected: stats.last_lsn + 1,
                    found: record.lsn,
                });
            }
            stats.last_lsn = record.lsn;
            stats.max_commit_id = stats.max_commit_id.max(record.commit_id.value());
        }

        stats.final_offset = log.current_offset();
        Ok(stats)
    }
}
