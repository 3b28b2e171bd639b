//! Engine-level errors
//!
//! Every public `Connection` and `Session` call returns [`EngineError`].
//! Each variant has a stable code of the form `EPOCH_<CATEGORY>_<NAME>`.
//! Only corruption found while opening a home is fatal; every other error
//! leaves the connection usable and its state unchanged.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::backup::BackupError;
use crate::catalog::CatalogError;
use crate::checkpoint::CheckpointError;
use crate::config::ConfigError;
use crate::mvcc::StoreError;
use crate::recovery::RecoveryError;
use crate::timestamp::{Timestamp, TimestampError};
use crate::txn::TxnError;
use crate::wal::WalError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("timestamp too old: {0}")]
    TimestampTooOld(TimestampError),

    #[error("invalid timestamp order: {0}")]
    InvalidTimestampOrder(TimestampError),

    #[error("commit timestamp {commit} is older than {newest} already committed in table '{table}'")]
    CommitTimestampOutOfOrder {
        table: String,
        commit: Timestamp,
        newest: Timestamp,
    },

    #[error("malformed config: {0}")]
    MalformedConfig(#[from] ConfigError),

    #[error("no such table '{0}'")]
    NoSuchTable(String),

    #[error("table '{0}' already exists")]
    TableExists(String),

    #[error("a transaction is already active in this session")]
    TransactionActive,

    #[error("no transaction is active in this session")]
    NoTransaction,

    #[error("connection is read-only: {0} not allowed")]
    ReadOnly(&'static str),

    #[error(transparent)]
    Wal(#[from] WalError),

    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),

    #[error(transparent)]
    Recovery(#[from] RecoveryError),

    #[error(transparent)]
    Backup(#[from] BackupError),

    #[error("catalog error: {0}")]
    Catalog(CatalogError),

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl EngineError {
    /// Stable error code, `EPOCH_<CATEGORY>_<NAME>`.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::TimestampTooOld(_) => "EPOCH_TIMESTAMP_TOO_OLD",
            EngineError::InvalidTimestampOrder(_) => "EPOCH_INVALID_TIMESTAMP_ORDER",
            EngineError::CommitTimestampOutOfOrder { .. } => "EPOCH_COMMIT_OUT_OF_ORDER",
            EngineError::MalformedConfig(_) => "EPOCH_MALFORMED_CONFIG",
            EngineError::NoSuchTable(_) => "EPOCH_NO_SUCH_TABLE",
            EngineError::TableExists(_) => "EPOCH_TABLE_EXISTS",
            EngineError::TransactionActive => "EPOCH_TRANSACTION_ACTIVE",
            EngineError::NoTransaction => "EPOCH_NO_TRANSACTION",
            EngineError::ReadOnly(_) => "EPOCH_READ_ONLY",
            EngineError::Wal(e) => e.code(),
            EngineError::Checkpoint(e) => e.code(),
            EngineError::Recovery(e) => e.code(),
            EngineError::Backup(e) => e.code(),
            EngineError::Catalog(_) => "EPOCH_CATALOG_FAILED",
            EngineError::Io { .. } => "EPOCH_IO",
        }
    }

    /// True when the home cannot be used until repaired.
    pub fn is_fatal(&self) -> bool {
        match self {
            EngineError::Recovery(_) => true,
            EngineError::Wal(e) => e.is_fatal(),
            _ => false,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        EngineError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<TimestampError> for EngineError {
    fn from(e: TimestampError) -> Self {
        match e {
            TimestampError::Malformed { ref input } => EngineError::MalformedConfig(
                ConfigError::invalid("timestamp", input.as_str(), "1 to 16 hex digits"),
            ),
            TimestampError::TooOld { .. } => EngineError::TimestampTooOld(e),
            TimestampError::MovedBackward { .. } | TimestampError::OldestPastStable { .. } => {
                EngineError::InvalidTimestampOrder(e)
            }
        }
    }
}

impl From<StoreError> for EngineError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NoSuchTable(name) => EngineError::NoSuchTable(name),
        }
    }
}

impl From<CatalogError> for EngineError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::TableExists(name) => EngineError::TableExists(name),
            other => EngineError::Catalog(other),
        }
    }
}

impl From<TxnError> for EngineError {
    fn from(e: TxnError) -> Self {
        match e {
            TxnError::Timestamp(e) => e.into(),
            TxnError::OutOfOrder {
                table,
                commit,
                newest,
            } => EngineError::CommitTimestampOutOfOrder {
                table,
                commit,
                newest,
            },
            TxnError::Store(e) => e.into(),
            TxnError::Wal(e) => EngineError::Wal(e),
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
