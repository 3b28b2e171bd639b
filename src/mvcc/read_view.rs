//! ReadView - which versions a read may observe
//!
//! A view combines two bounds:
//! - a `ReadPoint`: the newest version, or the newest at or before a timestamp
//! - an upper commit id: commits after it are ignored, so a reader or a
//!   checkpoint never sees part of a transaction
//!
//! A view never changes once built.

use super::CommitId;
use crate::timestamp::Timestamp;

/// The timestamp bound of a read.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ReadPoint {
    /// Newest committed version, timestamps ignored
    Latest,
    /// Newest version whose commit timestamp is unset or at most this value
    AsOf(Timestamp),
}

impl ReadPoint {
    /// `Some(ts)` selects `AsOf`, `None` selects `Latest`.
    pub fn from_timestamp(ts: Option<Timestamp>) -> Self {
        ts.map_or(ReadPoint::Latest, ReadPoint::AsOf)
    }

    /// Whether a version stamped `commit_ts` passes this bound.
    #[inline]
    pub fn admits(&self, commit_ts: Option<Timestamp>) -> bool {
        match (self, commit_ts) {
            (ReadPoint::Latest, _) | (_, None) => true,
            (ReadPoint::AsOf(read), Some(commit)) => commit <= *read,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct ReadView {
    point: ReadPoint,
    upper_bound: CommitId,
}

impl ReadView {
    /// A view at `point` bounded by `upper_bound`.
    pub fn new(point: ReadPoint, upper_bound: CommitId) -> Self {
        Self { point, upper_bound }
    }

    #[inline]
    pub fn point(&self) -> ReadPoint {
        self.point
    }

    #[inline]
    pub fn upper_bound(&self) -> CommitId {
        self.upper_bound
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_admits_everything() {
        assert!(ReadPoint::Latest.admits(None));
        assert!(ReadPoint::Latest.admits(Some(Timestamp::new(u64::MAX))));
    }

    #[test]
    fn test_as_of_bound_is_inclusive() {
        let point = ReadPoint::AsOf(Timestamp::new(10));
        assert!(point.admits(Some(Timestamp::new(10))));
        assert!(!point.admits(Some(Timestamp::new(11))));
    }

    #[test]
    fn test_untimestamped_always_admitted() {
        assert!(ReadPoint::AsOf(Timestamp::ZERO).admits(None));
    }
}
