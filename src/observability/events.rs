//! Observable lifecycle events
//!
//! Each event carries its own severity; routine per-commit events are
//! `Trace` so a default logger stays quiet on the hot path.

use std::fmt;

use super::logger::Severity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Connection
    ConnectionOpen,
    ConnectionClose,
    TableCreate,

    // Timestamps
    TimestampSet,
    TimestampRejected,

    // Transactions
    TransactionCommit,
    TransactionRollback,
    CommitRejected,

    // Log
    LogFlush,
    LogTornTail,
    LogWriterFailed,

    // Checkpoint
    CheckpointStart,
    CheckpointComplete,
    CheckpointFailed,

    // Recovery
    RecoveryStart,
    RecoveryReplayComplete,
    RecoveryComplete,
    RecoveryFailed,

    // Backup
    BackupComplete,
}

impl Event {
    /// The `event` field written to the log line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConnectionOpen => "CONNECTION_OPEN",
            Event::ConnectionClose => "CONNECTION_CLOSE",
            Event::TableCreate => "TABLE_CREATE",

            Event::TimestampSet => "TIMESTAMP_SET",
            Event::TimestampRejected => "TIMESTAMP_REJECTED",

            Event::TransactionCommit => "TXN_COMMIT",
            Event::TransactionRollback => "TXN_ROLLBACK",
            Event::CommitRejected => "TXN_COMMIT_REJECTED",

            Event::LogFlush => "LOG_FLUSH",
            Event::LogTornTail => "LOG_TORN_TAIL_TRUNCATED",
            Event::LogWriterFailed => "LOG_WRITER_FAILED",

            Event::CheckpointStart => "CHECKPOINT_BEGIN",
            Event::CheckpointComplete => "CHECKPOINT_COMPLETE",
            Event::CheckpointFailed => "CHECKPOINT_FAILED",

            Event::RecoveryStart => "RECOVERY_BEGIN",
            Event::RecoveryReplayComplete => "LOG_REPLAY_COMPLETE",
            Event::RecoveryComplete => "RECOVERY_COMPLETE",
            Event::RecoveryFailed => "RECOVERY_FAILED",

            Event::BackupComplete => "BACKUP_COMPLETE",
        }
    }

    /// Severity each event is logged at.
    pub fn severity(&self) -> Severity {
        match self {
            Event::TransactionCommit | Event::TransactionRollback | Event::LogFlush => {
                Severity::Trace
            }
            Event::TimestampRejected | Event::CommitRejected | Event::LogTornTail => Severity::Warn,
            Event::CheckpointFailed | Event::LogWriterFailed => Severity::Error,
            Event::RecoveryFailed => Severity::Fatal,
            _ => Severity::Info,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
