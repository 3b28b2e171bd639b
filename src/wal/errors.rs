//! Log error types
//!
//! Error codes:
//! - EPOCH_LOG_APPEND_FAILED (ERROR)
//! - EPOCH_LOG_FSYNC_FAILED (FATAL)
//! - EPOCH_LOG_CORRUPTION (FATAL)

use std::fmt;
use std::io;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Operation fails, connection continues
    Error,
    /// Connection must not continue
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

#[derive(Debug, Error)]
pub enum WalError {
    #[error("[ERROR] EPOCH_LOG_APPEND_FAILED: {message}")]
    AppendFailed {
        message: String,
        #[source]
        source: io::Error,
    },

    #[error("[FATAL] EPOCH_LOG_FSYNC_FAILED: {message}")]
    FsyncFailed {
        message: String,
        #[source]
        source: io::Error,
    },

    #[error("[FATAL] EPOCH_LOG_CORRUPTION: {message} (byte_offset: {offset})")]
    Corruption { offset: u64, message: String },
}

impl WalError {
    pub fn append_failed(message: impl Into<String>, source: io::Error) -> Self {
        Self::AppendFailed {
            message: message.into(),
            source,
        }
    }

    pub fn fsync_failed(message: impl Into<String>, source: io::Error) -> Self {
        Self::FsyncFailed {
            message: message.into(),
            source,
        }
    }

    pub fn corruption_at_offset(offset: u64, message: impl Into<String>) -> Self {
        Self::Corruption {
            offset,
            message: message.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            WalError::AppendFailed { .. } => "EPOCH_LOG_APPEND_FAILED",
            WalError::FsyncFailed { .. } => "EPOCH_LOG_FSYNC_FAILED",
            WalError::Corruption { .. } => "EPOCH_LOG_CORRUPTION",
        }
    }

    /// Error means the call failed; Fatal means the log cannot be trusted.
    pub fn severity(&self) -> Severity {
        match self {
            WalError::AppendFailed { .. } => Severity::Error,
            WalError::FsyncFailed { .. } | WalError::Corruption { .. } => Severity::Fatal,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

pub type WalResult<T> = Result<T, WalError>;
