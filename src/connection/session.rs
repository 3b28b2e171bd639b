//! Session - a single-threaded handle holding at most one transaction
//!
//! Inside a transaction, writes are buffered and reads see them first.
//! Outside one, `put` and `remove` commit immediately without a timestamp,
//! and reads see the newest committed data.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::ConnectionInner;
use crate::checkpoint::CheckpointMarker;
use crate::config::{BeginOptions, CommitOptions};
use crate::errors::{EngineError, EngineResult};
use crate::mvcc::VersionPayload;
use crate::txn::{CommitOutcome, Transaction};

/// A single-threaded handle for transactions and reads.
pub struct Session {
    conn: Arc<ConnectionInner>,
    txn: Option<Transaction>,
}

impl Session {
    pub(crate) fn new(conn: Arc<ConnectionInner>) -> Self {
        Self { conn, txn: None }
    }

    /// Whether a transaction is active.
    pub fn in_transaction(&self) -> bool {
        self.txn.is_some()
    }

    /// Options: `read_timestamp=<hex>`.
    pub fn begin_transaction(&mut self, config: &str) -> EngineResult<()> {
        if self.txn.is_some() {
            return Err(EngineError::TransactionActive);
        }
        let options = BeginOptions::parse(config)?;
        self.txn = Some(self.conn.txns.begin(options)?);
        Ok(())
    }

    /// Options: `commit_timestamp=<hex>`.
    ///
    /// A malformed config leaves the transaction active. Any other failure
    /// ends it with nothing applied.
    pub fn commit_transaction(&mut self, config: &str) -> EngineResult<CommitOutcome> {
        let options = CommitOptions::parse(config)?;
        let txn = self.txn.take().ok_or(EngineError::NoTransaction)?;
        Ok(self.conn.txns.commit(txn, options)?)
    }

    /// Ends the active transaction, discarding its writes.
    pub fn rollback_transaction(&mut self) -> EngineResult<()> {
        let txn = self.txn.take().ok_or(EngineError::NoTransaction)?;
        self.conn.txns.rollback(txn);
        Ok(())
    }

    /// Writes `value` under `key`: buffered inside a transaction, committed
    /// at once outside one.
    pub fn put(&mut self, table: &str, key: &[u8], value: &[u8]) -> EngineResult<()> {
        self.conn.check_writable("put")?;
        self.check_table(table)?;
        match self.txn.as_mut() {
            Some(txn) => {
                txn.put(table, key, value);
                Ok(())
            }
            None => self.autocommit(|txn| txn.put(table, key, value)),
        }
    }

    /// Deletes `key`, with the same transaction rules as [`Session::put`].
    pub fn remove(&mut self, table: &str, key: &[u8]) -> EngineResult<()> {
        self.conn.check_writable("remove")?;
        self.check_table(table)?;
        match self.txn.as_mut() {
            Some(txn) => {
                txn.remove(table, key);
                Ok(())
            }
            None => self.autocommit(|txn| txn.remove(table, key)),
        }
    }

    /// Point lookup. Deleted and absent keys are `None`.
    pub fn get(&self, table: &str, key: &[u8]) -> EngineResult<Option<Vec<u8>>> {
        self.check_table(table)?;
        if let Some(pending) = self.txn.as_ref().and_then(|t| t.pending(table, key)) {
            return Ok(pending.value().map(<[u8]>::to_vec));
        }
        let view = self.conn.txns.read_view(self.txn.as_ref());
        Ok(self.conn.store.get(table, key, view)?.into_value())
    }

    /// Every visible key/value in key order, including this session's
    /// pending writes.
    pub fn scan(&self, table: &str) -> EngineResult<Vec<(Vec<u8>, Vec<u8>)>> {
        self.check_table(table)?;
        let view = self.conn.txns.read_view(self.txn.as_ref());
        let committed = self.conn.store.scan(table, view)?;

        let Some(txn) = self.txn.as_ref() else {
            return Ok(committed);
        };
        let mut merged: BTreeMap<Vec<u8>, Vec<u8>> = committed.into_iter().collect();
        for (key, payload) in txn.pending_in(table) {
            match payload {
                VersionPayload::Value(v) => {
                    merged.insert(key.to_vec(), v.clone());
                }
                VersionPayload::Tombstone => {
                    merged.remove(key);
                }
            }
        }
        Ok(merged.into_iter().collect())
    }

    /// Same as [`Connection::checkpoint`].
    pub fn checkpoint(&self, config: &str) -> EngineResult<CheckpointMarker> {
        self.conn.checkpoint(config)
    }

    /// Same as [`Connection::log_flush`].
    pub fn log_flush(&self, config: &str) -> EngineResult<()> {
        self.conn.log_flush(config)
    }

    /// Same as [`Connection::create_table`].
    pub fn create(&self, table: &str, config: &str) -> EngineResult<()> {
        self.conn.create_table(table, config).map(|_| ())
    }

    fn check_table(&self, table: &str) -> EngineResult<()> {
        if self.conn.catalog.contains(table) {
            Ok(())
        } else {
            Err(EngineError::NoSuchTable(table.to_string()))
        }
    }

    fn autocommit(&self, write: impl FnOnce(&mut Transaction)) -> EngineResult<()> {
        let mut txn = self.conn.txns.begin(BeginOptions::default())?;
        write(&mut txn);
        self.conn.txns.commit(txn, CommitOptions::default())?;
        Ok(())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(txn) = self.txn.take() {
            self.conn.txns.rollback(txn);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::connection::Connection;
    use crate::errors::EngineError;
    use tempfile::TempDir;

    fn open() -> (TempDir, Connection) {
        let dir = TempDir::new().unwrap();
        let conn = Connection::open(dir.path(), "create").unwrap();
        conn.create_table("t", "").unwrap();
        (dir, conn)
    }

    #[test]
    fn test_reads_see_own_pending_writes() {
        let (_dir, conn) = open();
        let mut session = conn.open_session();
        session.put("t", b"a", b"committed").unwrap();

        session.begin_transaction("").unwrap();
        session.put("t", b"b", b"pending").unwrap();
        session.remove("t", b"a").unwrap();
        assert_eq!(session.get("t", b"b").unwrap(), Some(b"pending".to_vec()));
        assert_eq!(session.get("t", b"a").unwrap(), None);
        assert_eq!(
            session.scan("t").unwrap(),
            vec![(b"b".to_vec(), b"pending".to_vec())]
        );

        let other = conn.open_session();
        assert_eq!(other.get("t", b"a").unwrap(), Some(b"committed".to_vec()));
        assert_eq!(other.get("t", b"b").unwrap(), None);
    }

    #[test]
    fn test_rollback_discards_writes() {
        let (_dir, conn) = open();
        let mut session = conn.open_session();
        session.begin_transaction("").unwrap();
        session.put("t", b"k", b"v").unwrap();
        session.rollback_transaction().unwrap();
        assert!(!session.in_transaction());
        assert_eq!(session.get("t", b"k").unwrap(), None);
    }

    #[test]
    fn test_transaction_state_errors() {
        let (_dir, conn) = open();
        let mut session = conn.open_session();
        assert!(matches!(
            session.commit_transaction(""),
            Err(EngineError::NoTransaction)
        ));
        assert!(matches!(
            session.rollback_transaction(),
            Err(EngineError::NoTransaction)
        ));
        session.begin_transaction("").unwrap();
        assert!(matches!(
            session.begin_transaction(""),
            Err(EngineError::TransactionActive)
        ));
    }

    #[test]
    fn test_malformed_commit_config_keeps_transaction() {
        let (_dir, conn) = open();
        let mut session = conn.open_session();
        session.begin_transaction("").unwrap();
        session.put("t", b"k", b"v").unwrap();
        let err = session.commit_transaction("commit_timestamp=zz").unwrap_err();
        assert_eq!(err.code(), "EPOCH_MALFORMED_CONFIG");
        assert!(session.in_transaction());
        session.commit_transaction("commit_timestamp=0a").unwrap();
        assert_eq!(session.get("t", b"k").unwrap(), Some(b"v".to_vec()));
    }

    #[test]
    fn test_unknown_table() {
        let (_dir, conn) = open();
        let mut session = conn.open_session();
        assert!(matches!(
            session.put("missing", b"k", b"v"),
            Err(EngineError::NoSuchTable(_))
        ));
        assert!(matches!(session.get("missing", b"k"), Err(EngineError::NoSuchTable(_))));
    }

    #[test]
    fn test_read_timestamp_below_oldest_rejected() {
        let (_dir, conn) = open();
        conn.set_timestamp("oldest_timestamp=10").unwrap();
        let mut session = conn.open_session();
        let err = session.begin_transaction("read_timestamp=0f").unwrap_err();
        assert_eq!(err.code(), "EPOCH_TIMESTAMP_TOO_OLD");
        assert!(!session.in_transaction());
    }
}
