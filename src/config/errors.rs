//! Configuration string errors
//!
//! Every error here surfaces to the caller as `MalformedConfig`. A call whose
//! config fails to parse performs no state change.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("config syntax error at byte {position} in '{input}': {reason}")]
    Syntax {
        input: String,
        position: usize,
        reason: &'static str,
    },

    #[error("unknown configuration key '{key}' for {call}")]
    UnknownKey { call: &'static str, key: String },

    #[error("invalid value '{value}' for '{key}': expected {expected}")]
    InvalidValue {
        key: String,
        value: String,
        expected: &'static str,
    },
}

impl ConfigError {
    pub(crate) fn invalid(key: &str, value: impl Into<String>, expected: &'static str) -> Self {
        Self::InvalidValue {
            key: key.to_string(),
            value: value.into(),
            expected,
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;
