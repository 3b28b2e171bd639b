//! Timestamps and the Timestamp Oracle
//!
//! This module provides:
//! - `Timestamp` - hex-encoded logical time
//! - `TimestampRole` - the named roles the oracle tracks
//! - `TimestampOracle` - connection-scoped oldest/stable/all-committed state

mod errors;
mod oracle;
#[allow(clippy::module_inception)]
mod timestamp;

pub use errors::{TimestampError, TimestampResult};
pub use oracle::{OracleGuard, TimestampOracle, TimestampUpdate};
pub use timestamp::Timestamp;

use std::fmt;

/// Named roles held by the oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimestampRole {
    /// Floor below which no read or commit timestamp may be requested
    Oldest,
    /// Default cutoff for timestamp-aware checkpoints
    Stable,
    /// Highest commit timestamp committed so far
    AllCommitted,
}

impl TimestampRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimestampRole::Oldest => "oldest",
            TimestampRole::Stable => "stable",
            TimestampRole::AllCommitted => "all_committed",
        }
    }
}

impl fmt::Display for TimestampRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
