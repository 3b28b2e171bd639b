//! VersionChain - history of one key
//!
//! Versions are stored oldest first in commit order; readers walk the
//! slice backwards. A key with at least one write always has a non-empty
//! chain; deletes append tombstones.

use super::{CommitId, ReadView, Version, Visibility, VisibilityResult};
use crate::timestamp::Timestamp;

#[derive(Clone, Debug, Default)]
pub struct VersionChain {
    versions: Vec<Version>,
}

impl VersionChain {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.versions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    /// All versions, oldest first. No visibility filtering.
    #[inline]
    pub fn versions(&self) -> &[Version] {
        &self.versions
    }

    /// Appends a version. Commit ids must arrive in increasing order.
    pub fn push(&mut self, version: Version) {
        debug_assert!(
            self.versions
                .last()
                .map_or(true, |last| last.commit_id() < version.commit_id()),
            "versions must be appended in commit order"
        );
        self.versions.push(version);
    }

    /// Commit id of the newest version.
    pub fn newest_commit(&self) -> Option<CommitId> {
        self.versions.last().map(Version::commit_id)
    }

    /// Largest commit timestamp in the chain.
    pub fn newest_timestamp(&self) -> Option<Timestamp> {
        self.versions.iter().filter_map(Version::commit_ts).max()
    }

    /// See [`Visibility::visible_version`].
    pub fn visible_version(&self, view: ReadView) -> VisibilityResult<'_> {
        Visibility::visible_version(self, view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_len() {
        let mut chain = VersionChain::new();
        assert!(chain.is_empty());
        chain.push(Version::with_value(CommitId::new(1), None, b"a".to_vec()));
        chain.push(Version::with_tombstone(CommitId::new(2), None));
        assert_eq!(chain.len(), 2);
        assert_eq!(chain.newest_commit(), Some(CommitId::new(2)));
    }

    #[test]
    fn test_newest_timestamp_ignores_untimestamped() {
        let mut chain = VersionChain::new();
        chain.push(Version::with_value(CommitId::new(1), Some(Timestamp::new(9)), vec![]));
        chain.push(Version::with_value(CommitId::new(2), None, vec![]));
        assert_eq!(chain.newest_timestamp(), Some(Timestamp::new(9)));
    }
}
