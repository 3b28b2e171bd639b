//! Transaction manager
//!
//! Commit protocol, under the commit mutex:
//! 1. pin `oldest` with an oracle read guard
//! 2. validate: commit timestamp not too old, tables exist, no key already
//!    holds a newer commit timestamp
//! 3. assign the next commit id
//! 4. buffer log records for logged tables (all or none)
//! 5. append versions to the store
//! 6. publish the commit id and record the commit timestamp
//!
//! Readers bound their views by the published commit id, so a transaction
//! becomes visible all at once. A checkpoint takes the commit mutex only to
//! fix its fence.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use super::errors::{TxnError, TxnResult};
use super::transaction::{Transaction, TxnId};
use crate::catalog::Catalog;
use crate::config::{BeginOptions, CommitOptions};
use crate::mvcc::{CommitId, ReadPoint, ReadView, StoreError, Version, VersionStore};
use crate::observability::{log_event_with_fields, Event};
use crate::sync::lock;
use crate::timestamp::{Timestamp, TimestampOracle};
use crate::wal::{AppendedRange, LogRecord, LogWriter};

/// Result of a successful commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitOutcome {
    pub txn_id: TxnId,
    /// `None` for a read-only transaction
    pub commit_id: Option<CommitId>,
    pub commit_ts: Option<Timestamp>,
    /// Log records written, if any table in the write set is logged
    pub logged: Option<AppendedRange>,
}

/// State fixed at the start of a checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitFence {
    /// Newest commit the checkpoint may include
    pub upper_bound: CommitId,
    pub stable: Option<Timestamp>,
    /// Last log record covered by the checkpoint
    pub log_lsn: u64,
}

#[derive(Debug)]
struct CommitState {
    last_assigned: CommitId,
}

/// Owns commit ordering for one connection.
pub struct TransactionManager {
    store: Arc<VersionStore>,
    oracle: Arc<TimestampOracle>,
    catalog: Arc<Catalog>,
    log: Option<Arc<Mutex<LogWriter>>>,
    /// End of a log left by an earlier session, used when `log` is None
    idle_log_lsn: u64,
    commit_state: Mutex<CommitState>,
    published: AtomicU64,
    next_txn: AtomicU64,
}

impl TransactionManager {
    /// `last_commit` is the newest commit id already in `store`.
    pub fn new(
        store: Arc<VersionStore>,
        oracle: Arc<TimestampOracle>,
        catalog: Arc<Catalog>,
        log: Option<Arc<Mutex<LogWriter>>>,
        last_commit: CommitId,
    ) -> Self {
        Self {
            store,
            oracle,
            catalog,
            log,
            idle_log_lsn: 0,
            commit_state: Mutex::new(CommitState {
                last_assigned: last_commit,
            }),
            published: AtomicU64::new(last_commit.value()),
            next_txn: AtomicU64::new(1),
        }
    }

    /// Sets the lsn checkpoints record while no log writer is attached, so
    /// a later logged session does not replay records those checkpoints
    /// already cover.
    pub fn with_idle_log_lsn(mut self, lsn: u64) -> Self {
        self.idle_log_lsn = lsn;
        self
    }

    /// Starts a transaction, rejecting a read timestamp older than `oldest`.
    pub fn begin(&self, options: BeginOptions) -> TxnResult<Transaction> {
        if let Some(read_ts) = options.read_timestamp {
            self.oracle.guard().check_not_too_old("read", read_ts)?;
        }
        let id = TxnId(self.next_txn.fetch_add(1, Ordering::Relaxed));
        Ok(Transaction::new(id, options.read_timestamp))
    }

    /// Newest fully applied commit.
    pub fn published(&self) -> CommitId {
        CommitId::new(self.published.load(Ordering::Acquire))
    }

    /// The view a read inside `txn` (or outside any transaction) uses.
    pub fn read_view(&self, txn: Option<&Transaction>) -> ReadView {
        let point = ReadPoint::from_timestamp(txn.and_then(Transaction::read_timestamp));
        ReadView::new(point, self.published())
    }

    /// Whether commits to `table` are written to the log.
    pub fn is_logged(&self, table: &str) -> bool {
        self.log.is_some()
            && self
                .catalog
                .get(table)
                .map_or(false, |entry| entry.options.log_enabled)
    }

    /// Applies `txn` atomically or not at all. The transaction is consumed
    /// either way.
    pub fn commit(&self, txn: Transaction, options: CommitOptions) -> TxnResult<CommitOutcome> {
        let result = self.apply_commit(&txn, options.commit_timestamp);
        match &result {
            Ok(outcome) => {
                let commit_id = outcome.commit_id.map_or(0, |c| c.value()).to_string();
                let commit_ts = outcome.commit_ts.map(|t| t.to_hex()).unwrap_or_default();
                let writes = txn.write_count().to_string();
                log_event_with_fields(
                    Event::TransactionCommit,
                    &[
                        ("commit_id", &commit_id),
                        ("commit_timestamp", &commit_ts),
                        ("writes", &writes),
                    ],
                );
            }
            Err(e) => {
                let reason = e.to_string();
                log_event_with_fields(Event::CommitRejected, &[("reason", &reason)]);
            }
        }
        result
    }

    fn apply_commit(
        &self,
        txn: &Transaction,
        commit_ts: Option<Timestamp>,
    ) -> TxnResult<CommitOutcome> {
        let mut state = lock(&self.commit_state);
        let oracle = self.oracle.guard();

        if let Some(ts) = commit_ts {
            oracle.check_not_too_old("commit", ts)?;
        }

        for (table, key) in txn.writes().keys() {
            if !self.catalog.contains(table) {
                return Err(StoreError::NoSuchTable(table.clone()).into());
            }
            if let Some(commit) = commit_ts {
                if let Some(newest) = self.store.newest_timestamp(table, key)? {
                    if commit < newest {
                        return Err(TxnError::OutOfOrder {
                            table: table.clone(),
                            commit,
                            newest,
                        });
                    }
                }
            }
        }

        if txn.is_read_only() {
            return Ok(CommitOutcome {
                txn_id: txn.id(),
                commit_id: None,
                commit_ts,
                logged: None,
            });
        }

        let commit_id = state.last_assigned.next();

        let logged = match &self.log {
            Some(log) => {
                let mut records: Vec<LogRecord> = txn
                    .writes()
                    .iter()
                    .filter(|((table, _), _)| self.is_logged(table))
                    .map(|((table, key), payload)| LogRecord {
                        lsn: 0,
                        commit_id,
                        commit_ts,
                        table: table.clone(),
                        key: key.clone(),
                        payload: payload.clone(),
                    })
                    .collect();
                lock(log).append_commit(&mut records)?
            }
            None => None,
        };

        for ((table, key), payload) in txn.writes() {
            self.store
                .append(table, key, Version::new(commit_id, commit_ts, payload.clone()))?;
        }

        state.last_assigned = commit_id;
        self.published.store(commit_id.value(), Ordering::Release);
        if let Some(ts) = commit_ts {
            self.oracle.record_commit(ts);
        }
        drop(oracle);

        Ok(CommitOutcome {
            txn_id: txn.id(),
            commit_id: Some(commit_id),
            commit_ts,
            logged,
        })
    }

    /// Discards `txn` and its pending writes.
    pub fn rollback(&self, txn: Transaction) {
        let txn_id = txn.id().0.to_string();
        let discarded = txn.write_count().to_string();
        log_event_with_fields(
            Event::TransactionRollback,
            &[("txn_id", &txn_id), ("discarded_writes", &discarded)],
        );
    }

    /// Fixes a checkpoint fence: no commit is in flight while it is read.
    pub fn fence(&self) -> CommitFence {
        let state = lock(&self.commit_state);
        let log_lsn = self
            .log
            .as_ref()
            .map_or(self.idle_log_lsn, |log| lock(log).last_lsn());
        CommitFence {
            upper_bound: state.last_assigned,
            stable: self.oracle.guard().stable(),
            log_lsn,
        }
    }
}
