//! Per-table checkpoint cutoff
//!
//! Resolution order, first match wins:
//! 1. table created with logging enabled: latest
//! 2. `use_timestamp=false`: latest
//! 3. `read_timestamp=T`: as of T
//! 4. stable timestamp set: as of stable, otherwise latest
//!
//! Versions committed without a timestamp pass every cutoff.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::{CheckpointOptions, TableOptions};
use crate::mvcc::ReadPoint;
use crate::timestamp::Timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "timestamp", rename_all = "snake_case")]
pub enum Cutoff {
    Latest,
    AsOf(Timestamp),
}

impl Cutoff {
    /// First match wins: logged table, `use_timestamp=false`, explicit
    /// `read_timestamp`, stable timestamp, else latest.
    pub fn resolve(
        table: &TableOptions,
        options: &CheckpointOptions,
        stable: Option<Timestamp>,
    ) -> Self {
        if table.log_enabled || !options.use_timestamp {
            return Cutoff::Latest;
        }
        match options.read_timestamp.or(stable) {
            Some(ts) => Cutoff::AsOf(ts),
            None => Cutoff::Latest,
        }
    }

    /// Read point images are scanned at.
    pub fn read_point(&self) -> ReadPoint {
        match self {
            Cutoff::Latest => ReadPoint::Latest,
            Cutoff::AsOf(ts) => ReadPoint::AsOf(*ts),
        }
    }
}

impl fmt::Display for Cutoff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cutoff::Latest => write!(f, "latest"),
            Cutoff::AsOf(ts) => write!(f, "as_of={}", ts),
        }
    }
}
