//! CommitId - commit sequence number
//!
//! Assigned under the commit path, strictly increasing, never reused.
//! It orders versions within a chain and fences checkpoint scans. It is
//! distinct from the caller-chosen commit timestamp, which only drives
//! point-in-time visibility.

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommitId(u64);

impl CommitId {
    /// No commit has happened yet.
    pub const NONE: CommitId = CommitId(0);

    #[inline]
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    #[inline]
    pub fn value(&self) -> u64 {
        self.0
    }

    #[inline]
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}
