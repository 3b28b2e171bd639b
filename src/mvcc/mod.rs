//! Multi-version storage
//!
//! This module provides:
//! - `CommitId` - commit sequence ordering versions within a chain
//! - `Version` - immutable value or tombstone stamped with its commit
//! - `VersionChain` - history of one key
//! - `ReadView` / `ReadPoint` - what a read or checkpoint may observe
//! - `Visibility` - the single version-selection rule
//! - `VersionStore` - per-table chains

mod commit_id;
mod read_view;
mod store;
mod version;
mod version_chain;
mod visibility;

pub use commit_id::CommitId;
pub use read_view::{ReadPoint, ReadView};
pub use store::{Lookup, StoreError, StoreResult, VersionStore, VisibleEntry};
pub use version::{Version, VersionPayload};
pub use version_chain::VersionChain;
pub use visibility::{Visibility, VisibilityResult};
