//! Recovery error types
//!
//! Every recovery error is FATAL for the open that hit it: the connection is
//! not created and nothing in the home directory is modified.

use thiserror::Error;

use crate::catalog::CatalogError;
use crate::checkpoint::CheckpointError;
use crate::mvcc::StoreError;
use crate::wal::WalError;

#[derive(Debug, Error)]
pub enum RecoveryError {
    #[error("[FATAL] EPOCH_RECOVERY_CATALOG: {0}")]
    Catalog(#[from] CatalogError),

    #[error("[FATAL] EPOCH_RECOVERY_CHECKPOINT: {0}")]
    Checkpoint(#[from] CheckpointError),

    #[error("[FATAL] EPOCH_RECOVERY_LOG: {0}")]
    Log(#[from] WalError),

    #[error("[FATAL] EPOCH_RECOVERY_APPLY: {0}")]
    Apply(#[from] StoreError),

    #[error("[FATAL] EPOCH_RECOVERY_MISSING_IMAGE: checkpoint generation {generation} has no image for table '{table}'")]
    MissingImage { generation: u64, table: String },

    #[error("[FATAL] EPOCH_RECOVERY_LOG_GAP: expected lsn {expected}, found {found}")]
    LogGap { expected: u64, found: u64 },
}

impl RecoveryError {
    pub fn code(&self) -> &'static str {
        match self {
            RecoveryError::Catalog(_) => "EPOCH_RECOVERY_CATALOG",
            RecoveryError::Checkpoint(_) => "EPOCH_RECOVERY_CHECKPOINT",
            RecoveryError::Log(_) => "EPOCH_RECOVERY_LOG",
            RecoveryError::Apply(_) => "EPOCH_RECOVERY_APPLY",
            RecoveryError::MissingImage { .. } => "EPOCH_RECOVERY_MISSING_IMAGE",
            RecoveryError::LogGap { .. } => "EPOCH_RECOVERY_LOG_GAP",
        }
    }

    /// True when the on-disk state is damaged rather than unreadable.
    pub fn is_corruption(&self) -> bool {
        match self {
            RecoveryError::Log(e) => matches!(e, WalError::Corruption { .. }),
            RecoveryError::Checkpoint(e) => e.is_fatal(),
            RecoveryError::MissingImage { .. } | RecoveryError::LogGap { .. } => true,
            _ => false,
        }
    }
}

pub type RecoveryResult<T> = Result<T, RecoveryError>;
