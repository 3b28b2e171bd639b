//! Configuration strings
//!
//! Every entry point takes a comma-separated `key=value` string. The string
//! is parsed once into a typed options struct; unknown keys are rejected.

mod errors;
mod options;
mod parser;

pub use errors::{ConfigError, ConfigResult};
pub use options::{
    parse_query_role, parse_timestamp_update, BeginOptions, CheckpointOptions, CommitOptions,
    ConnectionOptions, LogFlushOptions, TableOptions,
};
pub use parser::{ConfigList, ConfigValue};
