//! Version - immutable value of one key at one commit
//!
//! A version carries:
//! - the commit sequence that created it
//! - the commit timestamp, or `None` for writes made without one
//! - a value or an explicit tombstone
//!
//! Versions are never mutated after creation.

use super::CommitId;
use crate::timestamp::Timestamp;

/// The payload of a version: a value or an explicit deletion marker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VersionPayload {
    Value(Vec<u8>),
    Tombstone,
}

impl VersionPayload {
    #[inline]
    pub fn is_tombstone(&self) -> bool {
        matches!(self, VersionPayload::Tombstone)
    }

    /// Returns the value bytes, `None` for a tombstone.
    #[inline]
    pub fn value(&self) -> Option<&[u8]> {
        match self {
            VersionPayload::Value(v) => Some(v),
            VersionPayload::Tombstone => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Version {
    commit_id: CommitId,
    commit_ts: Option<Timestamp>,
    payload: VersionPayload,
}

impl Version {
    /// A version with an explicit payload.
    pub fn new(commit_id: CommitId, commit_ts: Option<Timestamp>, payload: VersionPayload) -> Self {
        Self {
            commit_id,
            commit_ts,
            payload,
        }
    }

    pub fn with_value(commit_id: CommitId, commit_ts: Option<Timestamp>, value: Vec<u8>) -> Self {
        Self::new(commit_id, commit_ts, VersionPayload::Value(value))
    }

    pub fn with_tombstone(commit_id: CommitId, commit_ts: Option<Timestamp>) -> Self {
        Self::new(commit_id, commit_ts, VersionPayload::Tombstone)
    }

    #[inline]
    pub fn commit_id(&self) -> CommitId {
        self.commit_id
    }

    /// The commit timestamp; `None` means visible at every read point.
    #[inline]
    pub fn commit_ts(&self) -> Option<Timestamp> {
        self.commit_ts
    }

    #[inline]
    pub fn payload(&self) -> &VersionPayload {
        &self.payload
    }

    #[inline]
    pub fn is_tombstone(&self) -> bool {
        self.payload.is_tombstone()
    }
}
