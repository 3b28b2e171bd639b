//! Transaction errors
//!
//! A rejected begin or commit changes nothing: the version store, the log
//! and the oracle are exactly as they were before the call.

use thiserror::Error;

use crate::mvcc::StoreError;
use crate::timestamp::{Timestamp, TimestampError};
use crate::wal::WalError;

#[derive(Debug, Error)]
pub enum TxnError {
    #[error(transparent)]
    Timestamp(#[from] TimestampError),

    #[error("commit timestamp {commit} is older than timestamp {newest} already committed for a key in table '{table}'")]
    OutOfOrder {
        table: String,
        commit: Timestamp,
        newest: Timestamp,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Wal(#[from] WalError),
}

pub type TxnResult<T> = Result<T, TxnError>;
