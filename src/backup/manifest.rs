//! Backup manifest
//!
//! Written as `backup.json` at the root of the copy. Recovery ignores it.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::errors::{BackupError, BackupResult};

pub const MANIFEST_FILE: &str = "backup.json";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BackupManifest {
    pub source: PathBuf,
    pub created_at: String,
    /// Checkpoint generation named by the copied marker, if any
    pub checkpoint_generation: Option<u64>,
    pub files: u64,
    pub bytes: u64,
    pub format_version: u8,
}

impl BackupManifest {
    pub fn new(source: &Path, checkpoint_generation: Option<u64>, files: u64, bytes: u64) -> Self {
        Self {
            source: source.to_path_buf(),
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            checkpoint_generation,
            files,
            bytes,
            format_version: 1,
        }
    }

    /// Writes `backup.json` into `dir`.
    pub fn write_to(&self, dir: &Path) -> BackupResult<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| BackupError::Manifest(format!("failed to serialize manifest: {}", e)))?;
        let path = dir.join(MANIFEST_FILE);
        fs::write(&path, json).map_err(|e| BackupError::io_error_at_path(&path, e))
    }

    pub fn read_from(dir: &Path) -> BackupResult<Self> {
        let path = dir.join(MANIFEST_FILE);
        let json = fs::read_to_string(&path).map_err(|e| BackupError::io_error_at_path(&path, e))?;
        serde_json::from_str(&json)
            .map_err(|e| BackupError::Manifest(format!("failed to parse manifest: {}", e)))
    }
}
