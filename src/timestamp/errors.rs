//! Timestamp and oracle errors
//!
//! Every oracle error is recoverable: the rejected call leaves the oracle
//! exactly as it was.

use thiserror::Error;

use super::{Timestamp, TimestampRole};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimestampError {
    /// Not a valid hexadecimal timestamp
    #[error("malformed timestamp '{input}'")]
    Malformed { input: String },

    /// A read or commit timestamp below the oldest timestamp
    #[error("{role} timestamp {requested} is older than oldest timestamp {oldest}")]
    TooOld {
        role: &'static str,
        requested: Timestamp,
        oldest: Timestamp,
    },

    /// A role would move backward
    #[error("{role} timestamp cannot move backward from {current} to {requested}")]
    MovedBackward {
        role: TimestampRole,
        current: Timestamp,
        requested: Timestamp,
    },

    /// oldest would pass stable
    #[error("oldest timestamp {oldest} would be newer than stable timestamp {stable}")]
    OldestPastStable { oldest: Timestamp, stable: Timestamp },
}

impl TimestampError {
    pub(crate) fn malformed(input: &str) -> Self {
        Self::Malformed {
            input: input.to_string(),
        }
    }

    /// Returns true for ordering violations raised by `set_timestamp`.
    pub fn is_invalid_order(&self) -> bool {
        matches!(
            self,
            TimestampError::MovedBackward { .. } | TimestampError::OldestPastStable { .. }
        )
    }

    /// Returns true when a begin/commit timestamp fell below `oldest`.
    pub fn is_too_old(&self) -> bool {
        matches!(self, TimestampError::TooOld { .. })
    }
}

pub type TimestampResult<T> = Result<T, TimestampError>;
