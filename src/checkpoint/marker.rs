//! Checkpoint marker file handling
//!
//! The marker records what a checkpoint generation contains:
//! - generation: names the `checkpoint/<generation>/` image directory
//! - created_at: RFC3339 timestamp
//! - log_lsn: last log record covered; recovery replays records after it
//! - max_commit_id: newest commit included in any image
//! - stable: the stable timestamp when the checkpoint fixed its fence
//! - tables: per-table image file, cutoff and entry count
//! - format_version: always 1
//!
//! Location: `<home>/checkpoint.json`
//!
//! The marker is written after every image is fsynced, via temp file and
//! rename. Its rename is the commit point of the checkpoint.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::errors::{CheckpointError, CheckpointResult};
use super::policy::Cutoff;
use crate::mvcc::CommitId;
use crate::timestamp::Timestamp;

pub const FORMAT_VERSION: u8 = 1;

/// One table's entry in the marker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MarkerTable {
    pub name: String,
    pub id: u32,
    pub cutoff: Cutoff,
    pub entries: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckpointMarker {
    pub generation: u64,
    pub created_at: String,
    pub log_lsn: u64,
    pub max_commit_id: CommitId,
    pub stable: Option<Timestamp>,
    pub tables: Vec<MarkerTable>,
    pub format_version: u8,
}

impl CheckpointMarker {
    /// The marker entry for a table, if the checkpoint covered it.
    pub fn table(&self, name: &str) -> Option<&MarkerTable> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn to_json(&self) -> CheckpointResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| {
            CheckpointError::marker_invalid(format!("failed to serialize checkpoint marker: {}", e))
        })
    }

    pub fn from_json(json: &str) -> CheckpointResult<Self> {
        let marker: Self = serde_json::from_str(json).map_err(|e| {
            CheckpointError::marker_invalid(format!("failed to parse checkpoint marker: {}", e))
        })?;
        if marker.format_version != FORMAT_VERSION {
            return Err(CheckpointError::marker_invalid(format!(
                "unsupported checkpoint format version {}",
                marker.format_version
            )));
        }
        Ok(marker)
    }

    /// Writes the marker durably: temp file, fsync, rename, fsync directory.
    pub fn write_to_file(&self, path: &Path) -> CheckpointResult<()> {
        let json = self.to_json()?;
        let fail = |what: &str, e: io::Error| {
            CheckpointError::marker_failed(format!("{} {}", what, path.display()), e)
        };

        let tmp = path.with_extension("json.tmp");
        let mut file = File::create(&tmp).map_err(|e| fail("failed to create marker for", e))?;
        file.write_all(json.as_bytes())
            .map_err(|e| fail("failed to write marker", e))?;
        file.sync_all().map_err(|e| fail("failed to fsync marker", e))?;
        fs::rename(&tmp, path).map_err(|e| fail("failed to install marker", e))?;

        if let Some(parent) = path.parent() {
            let dir = OpenOptions::new()
                .read(true)
                .open(parent)
                .map_err(|e| fail("failed to open directory of marker", e))?;
            dir.sync_all()
                .map_err(|e| fail("failed to fsync directory of marker", e))?;
        }

        Ok(())
    }

    /// Reads and validates a marker file.
    pub fn read_from_file(path: &Path) -> CheckpointResult<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            CheckpointError::failed_with_source(
                format!("failed to read marker file: {}", path.display()),
                e,
            )
        })?;
        Self::from_json(&contents)
    }

    /// The marker of the last complete checkpoint in `home`, if any.
    pub fn load(home: &Path) -> CheckpointResult<Option<Self>> {
        let path = marker_path(home);
        if !path.exists() {
            return Ok(None);
        }
        Self::read_from_file(&path).map(Some)
    }
}

/// Path of `checkpoint.json` inside a home directory.
pub fn marker_path(home: &Path) -> PathBuf {
    home.join("checkpoint.json")
}
