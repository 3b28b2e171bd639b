//! Visibility - the version-selection rule
//!
//! Given a view `(point, upper_bound)` and a chain, walk the chain
//! newest-first and select the first version with:
//! 1. `commit_id <= upper_bound`, and
//! 2. a commit timestamp admitted by `point` (`Latest` admits all; `AsOf(R)`
//!    admits an unset timestamp or one `<= R`).
//!
//! If the selected version is a tombstone the key is deleted in this view;
//! if nothing qualifies the key is absent.
//!
//! Point lookups, scans and checkpoint images all go through this function,
//! so they cannot disagree.

use super::{ReadView, Version, VersionChain};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisibilityResult<'a> {
    /// A value version is visible
    Visible(&'a Version),
    /// The selected version is a tombstone
    Deleted(&'a Version),
    /// No version qualifies
    Absent,
}

impl<'a> VisibilityResult<'a> {
    /// The visible value version, if any.
    pub fn version(&self) -> Option<&'a Version> {
        match self {
            VisibilityResult::Visible(v) => Some(*v),
            _ => None,
        }
    }

    /// The visible value bytes, if any.
    pub fn value(&self) -> Option<&'a [u8]> {
        self.version().and_then(|v| v.payload().value())
    }
}

/// The one visibility rule shared by point reads, scans and checkpoint
/// images.
pub struct Visibility;

impl Visibility {
    /// Newest version at or below the view's commit bound that the read
    /// point admits. A tombstone hides everything older.
    pub fn visible_version(chain: &VersionChain, view: ReadView) -> VisibilityResult<'_> {
        let selected = chain
            .versions()
            .iter()
            .rev()
            .filter(|v| v.commit_id() <= view.upper_bound())
            .find(|v| view.point().admits(v.commit_ts()));

        match selected {
            Some(v) if v.is_tombstone() => VisibilityResult::Deleted(v),
            Some(v) => VisibilityResult::Visible(v),
            None => VisibilityResult::Absent,
        }
    }
}
