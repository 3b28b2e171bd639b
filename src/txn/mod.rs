//! Transactions
//!
//! Snapshot selection is per read: a transaction with a read timestamp sees
//! the newest version at or before it; one without sees the newest commit.
//! Writes are private until an atomic commit stamps them with one commit id
//! and one (optional) commit timestamp.

mod errors;
mod manager;
mod transaction;

pub use errors::{TxnError, TxnResult};
pub use manager::{CommitFence, CommitOutcome, TransactionManager};
pub use transaction::{Transaction, TxnId};
