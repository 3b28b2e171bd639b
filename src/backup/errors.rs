//! Backup error types
//!
//! Backup errors are ERROR severity: the source home is never modified, and
//! a failed copy removes what it wrote.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackupError {
    #[error("[ERROR] EPOCH_BACKUP_SOURCE_MISSING: {} is not a directory", .0.display())]
    SourceMissing(PathBuf),

    #[error("[ERROR] EPOCH_BACKUP_DESTINATION_NOT_EMPTY: {}", .0.display())]
    DestinationNotEmpty(PathBuf),

    #[error("[ERROR] EPOCH_BACKUP_IO: {message}")]
    Io {
        message: String,
        #[source]
        source: io::Error,
    },

    #[error("[ERROR] EPOCH_BACKUP_MANIFEST: {0}")]
    Manifest(String),
}

impl BackupError {
    pub fn io_error(message: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    pub fn io_error_at_path(path: &Path, source: io::Error) -> Self {
        Self::io_error(format!("I/O error at {}", path.display()), source)
    }

    pub fn code(&self) -> &'static str {
        match self {
            BackupError::SourceMissing(_) => "EPOCH_BACKUP_SOURCE_MISSING",
            BackupError::DestinationNotEmpty(_) => "EPOCH_BACKUP_DESTINATION_NOT_EMPTY",
            BackupError::Io { .. } => "EPOCH_BACKUP_IO",
            BackupError::Manifest(_) => "EPOCH_BACKUP_MANIFEST",
        }
    }
}

pub type BackupResult<T> = Result<T, BackupError>;
