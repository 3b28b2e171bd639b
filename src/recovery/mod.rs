//! Recovery
//!
//! Opening a home directory rebuilds the version store from the last
//! checkpoint plus the log written after it.
//!
//! # Invariants
//!
//! - The marker decides which images are used; image directories it does not
//!   name are ignored
//! - Only records after the checkpoint's lsn are replayed, in lsn order
//! - Replayed and loaded versions keep their commit ids and timestamps
//! - Corruption halts the open; a torn log tail is the end of the log

mod adapters;
mod errors;
mod replay;
mod startup;

pub use adapters::RecoveryStorage;
pub use errors::{RecoveryError, RecoveryResult};
pub use replay::{LogRead, LogReplayer, ReplayStats, StorageApply};
pub use startup::{RecoveredState, RecoveryManager, RecoveryStats};
