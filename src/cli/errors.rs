//! CLI error types
//!
//! Every CLI error ends the process with a non-zero exit status.

use std::io;

use thiserror::Error;

use crate::errors::EngineError;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("EPOCH_CLI_CONFIG_ERROR: {0}")]
    Config(String),

    #[error("EPOCH_CLI_IO_ERROR: {0}")]
    Io(#[from] io::Error),

    #[error("EPOCH_CLI_JSON_ERROR: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl CliError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn code(&self) -> &'static str {
        match self {
            CliError::Config(_) => "EPOCH_CLI_CONFIG_ERROR",
            CliError::Io(_) => "EPOCH_CLI_IO_ERROR",
            CliError::Json(_) => "EPOCH_CLI_JSON_ERROR",
            CliError::Engine(e) => e.code(),
        }
    }
}

pub type CliResult<T> = Result<T, CliError>;
