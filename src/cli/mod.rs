//! CLI module for epochkv
//!
//! Provides command-line inspection of a home directory:
//! - tables: list tables
//! - dump: print a table's visible data
//! - timestamps: print checkpoint and recovery details
//! - backup: copy a home directory

mod args;
mod commands;
mod config;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{dump, execute, run_command, tables, timestamps};
pub use config::CliConfig;
pub use errors::{CliError, CliResult};

/// Parses process arguments and runs the selected command.
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    let config = CliConfig::load(&cli.config, cli.home.as_deref())?;
    run_command(cli.command, &config)
}
