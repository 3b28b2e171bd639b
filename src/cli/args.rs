//! CLI argument definitions using clap
//!
//! Commands:
//! - epochkv tables --config <path>
//! - epochkv dump --config <path> --table <name> [--read-timestamp <hex>]
//! - epochkv timestamps --config <path>
//! - epochkv backup --config <path> --dest <dir>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// epochkv - inspect and copy a timestamped key-value home directory
#[derive(Parser, Debug)]
#[command(name = "epochkv")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, global = true, default_value = "./epochkv.json")]
    pub config: PathBuf,

    /// Home directory; overrides the configuration file
    #[arg(long, global = true)]
    pub home: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List tables and their logging setting
    Tables,

    /// Print every visible key/value of a table as JSON lines
    Dump {
        #[arg(long)]
        table: String,

        /// Read as of this timestamp (hex) instead of the newest data
        #[arg(long)]
        read_timestamp: Option<String>,
    },

    /// Print the checkpoint marker and what recovery replayed
    Timestamps,

    /// Copy the home directory to an empty destination
    Backup {
        #[arg(long)]
        dest: PathBuf,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dump_arguments() {
        let cli = Cli::try_parse_from([
            "epochkv",
            "--home",
            "/tmp/h",
            "dump",
            "--table",
            "t",
            "--read-timestamp",
            "64",
        ])
        .unwrap();
        assert_eq!(cli.home, Some(PathBuf::from("/tmp/h")));
        match cli.command {
            Command::Dump {
                table,
                read_timestamp,
            } => {
                assert_eq!(table, "t");
                assert_eq!(read_timestamp.as_deref(), Some("64"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_config_default() {
        let cli = Cli::try_parse_from(["epochkv", "tables"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("./epochkv.json"));
        assert!(cli.home.is_none());
    }
}
