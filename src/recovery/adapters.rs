//! Bridges between the replay traits and the concrete log and store.

use crate::catalog::Catalog;
use crate::mvcc::VersionStore;
use crate::wal::{LogReader, LogRecord};

use super::errors::RecoveryResult;
use super::replay::{LogRead, StorageApply};

impl LogRead for LogReader {
    fn read_next(&mut self) -> RecoveryResult<Option<LogRecord>> {
        Ok(LogReader::read_next(self)?)
    }

    fn current_offset(&self) -> u64 {
        LogReader::current_offset(self)
    }
}

/// Store being rebuilt, restricted to tables in the catalog.
pub struct RecoveryStorage<'a> {
    store: &'a VersionStore,
    catalog: &'a Catalog,
}

impl<'a> RecoveryStorage<'a> {
    pub fn new(store: &'a VersionStore, catalog: &'a Catalog) -> Self {
        Self { store, catalog }
    }
}

impl StorageApply for RecoveryStorage<'_> {
    fn accepts(&self, table: &str) -> bool {
        self.catalog.contains(table)
    }

    fn apply_log_record(&mut self, record: &LogRecord) -> RecoveryResult<()> {
        self.store
            .append(&record.table, &record.key, record.to_version())?;
        Ok(())
    }
}
