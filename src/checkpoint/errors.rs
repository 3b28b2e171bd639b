//! Checkpoint error types
//!
//! All checkpoint errors are ERROR severity. A failed checkpoint leaves the
//! previous marker in place, so the last complete checkpoint stays usable and
//! the serving state is untouched.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::mvcc::StoreError;
use crate::wal::WalError;

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("[ERROR] EPOCH_CHECKPOINT_FAILED: {message}")]
    Failed {
        message: String,
        #[source]
        source: Option<io::Error>,
    },

    #[error("[ERROR] EPOCH_CHECKPOINT_MARKER_FAILED: {message}")]
    MarkerFailed {
        message: String,
        #[source]
        source: Option<io::Error>,
    },

    #[error("[ERROR] EPOCH_CHECKPOINT_IMAGE_CORRUPT: {} at byte {offset}: {message}", path.display())]
    ImageCorrupt {
        path: PathBuf,
        offset: u64,
        message: String,
    },

    #[error(transparent)]
    Wal(#[from] WalError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CheckpointError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
            source: None,
        }
    }

    pub fn failed_with_source(message: impl Into<String>, source: io::Error) -> Self {
        Self::Failed {
            message: message.into(),
            source: Some(source),
        }
    }

    pub fn marker_failed(message: impl Into<String>, source: io::Error) -> Self {
        Self::MarkerFailed {
            message: message.into(),
            source: Some(source),
        }
    }

    pub fn marker_invalid(message: impl Into<String>) -> Self {
        Self::MarkerFailed {
            message: message.into(),
            source: None,
        }
    }

    pub fn image_corrupt(path: &std::path::Path, offset: u64, message: impl Into<String>) -> Self {
        Self::ImageCorrupt {
            path: path.to_path_buf(),
            offset,
            message: message.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            CheckpointError::Failed { .. } | CheckpointError::Store(_) => {
                "EPOCH_CHECKPOINT_FAILED"
            }
            CheckpointError::MarkerFailed { .. } => "EPOCH_CHECKPOINT_MARKER_FAILED",
            CheckpointError::ImageCorrupt { .. } => "EPOCH_CHECKPOINT_IMAGE_CORRUPT",
            CheckpointError::Wal(e) => e.code(),
        }
    }

    /// Only a corrupt image is fatal, and only to the recovery reading it.
    pub fn is_fatal(&self) -> bool {
        match self {
            CheckpointError::ImageCorrupt { .. } => true,
            CheckpointError::Wal(e) => e.is_fatal(),
            _ => false,
        }
    }
}

pub type CheckpointResult<T> = Result<T, CheckpointError>;
