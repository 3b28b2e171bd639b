//! CLI command implementations
//!
//! Every command opens the home directory read-only through the normal
//! connection path, so recovery runs first and the output reflects what a
//! restarted engine would see. Nothing in the home is created or cut.

use serde_json::{json, Value};

use crate::backup::copy_home;
use crate::checkpoint::CheckpointMarker;
use crate::connection::Connection;
use crate::errors::EngineError;
use crate::observability::Logger;

use super::args::Command;
use super::config::CliConfig;
use super::errors::CliResult;
use super::io::{bytes_to_json, write_stdout};

/// Runs a command and prints each output value as one JSON line.
pub fn run_command(command: Command, config: &CliConfig) -> CliResult<()> {
    Logger::set_threshold(config.log_level()?);
    for line in execute(command, config)? {
        write_stdout(&line)?;
    }
    Ok(())
}

/// Runs a command and returns its output lines.
pub fn execute(command: Command, config: &CliConfig) -> CliResult<Vec<Value>> {
    match command {
        Command::Tables => tables(config),
        Command::Dump {
            table,
            read_timestamp,
        } => dump(config, &table, read_timestamp.as_deref()),
        Command::Timestamps => timestamps(config),
        Command::Backup { dest } => {
            let manifest = copy_home(config.home()?, &dest).map_err(EngineError::from)?;
            Ok(vec![serde_json::to_value(manifest)?])
        }
    }
}

fn open(config: &CliConfig) -> CliResult<Connection> {
    Ok(Connection::open(config.home()?, &config.open_config())?)
}

/// Lists catalog tables.
pub fn tables(config: &CliConfig) -> CliResult<Vec<Value>> {
    let conn = open(config)?;
    Ok(conn
        .tables()
        .into_iter()
        .map(|t| {
            json!({
                "name": t.name,
                "id": t.id,
                "log_enabled": t.options.log_enabled,
            })
        })
        .collect())
}

/// Scans one table, optionally at a read timestamp.
pub fn dump(config: &CliConfig, table: &str, read_timestamp: Option<&str>) -> CliResult<Vec<Value>> {
    let conn = open(config)?;
    let mut session = conn.open_session();
    if let Some(ts) = read_timestamp {
        session.begin_transaction(&format!("read_timestamp={}", ts))?;
    }
    let rows = session.scan(table)?;
    if session.in_transaction() {
        session.rollback_transaction()?;
    }

    Ok(rows
        .into_iter()
        .map(|(k, v)| json!({ "key": bytes_to_json(&k), "value": bytes_to_json(&v) }))
        .collect())
}

/// Reports the current checkpoint marker and what recovery replayed.
pub fn timestamps(config: &CliConfig) -> CliResult<Vec<Value>> {
    let conn = open(config)?;
    let stats = conn.recovery_stats();
    let marker = CheckpointMarker::load(conn.home()).map_err(EngineError::from)?;

    let checkpoint = match marker {
        Some(m) => json!({
            "generation": m.generation,
            "created_at": m.created_at,
            "log_lsn": m.log_lsn,
            "max_commit_id": m.max_commit_id.value(),
            "stable_timestamp": m.stable.map(|t| t.to_hex()),
            "tables": m.tables.iter().map(|t| json!({
                "name": t.name,
                "cutoff": t.cutoff.to_string(),
                "entries": t.entries,
            })).collect::<Vec<_>>(),
        }),
        None => Value::Null,
    };

    Ok(vec![json!({
        "checkpoint": checkpoint,
        "recovery": {
            "image_entries": stats.image_entries,
            "records_replayed": stats.replay.records_replayed,
            "records_skipped": stats.replay.records_skipped,
            "last_lsn": stats.replay.last_lsn,
        },
    })])
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn populated_home() -> (TempDir, CliConfig) {
        let dir = TempDir::new().unwrap();
        {
            let conn = Connection::open(dir.path(), "create,log=(enabled)").unwrap();
            conn.create_table("t", "").unwrap();
            let mut session = conn.open_session();
            for (k, ts) in [("a", "0a"), ("b", "14")] {
                session.begin_transaction("").unwrap();
                session.put("t", k.as_bytes(), b"v").unwrap();
                session
                    .commit_transaction(&format!("commit_timestamp={}", ts))
                    .unwrap();
            }
            conn.close().unwrap();
        }
        let config = CliConfig {
            home: Some(dir.path().to_path_buf()),
            ..CliConfig::default()
        };
        (dir, config)
    }

    #[test]
    fn test_dump_respects_read_timestamp() {
        let (_dir, config) = populated_home();
        assert_eq!(dump(&config, "t", None).unwrap().len(), 2);

        let rows = dump(&config, "t", Some("0f")).unwrap();
        assert_eq!(rows, vec![json!({"key": "a", "value": "v"})]);
    }

    #[test]
    fn test_tables_and_timestamps() {
        let (_dir, config) = populated_home();
        let tables = tables(&config).unwrap();
        assert_eq!(tables[0]["name"], "t");
        assert_eq!(tables[0]["log_enabled"], true);

        let out = timestamps(&config).unwrap();
        assert!(out[0]["checkpoint"].is_null());
        assert_eq!(out[0]["recovery"]["records_replayed"], 2);
    }

    #[test]
    fn test_backup_command() {
        let (_dir, config) = populated_home();
        let dest = TempDir::new().unwrap();
        let target = dest.path().join("copy");
        let out = execute(Command::Backup { dest: target.clone() }, &config).unwrap();
        assert_eq!(out[0]["format_version"], 1);
        assert!(target.join("wal").join("wal.log").exists());
    }

    #[test]
    fn test_inspection_leaves_home_untouched() {
        let dir = TempDir::new().unwrap();
        {
            let conn = Connection::open(dir.path(), "create").unwrap();
            conn.create_table("t", "log=(enabled=false)").unwrap();
            conn.open_session().put("t", b"k", b"v").unwrap();
            conn.checkpoint("").unwrap();
        }
        let config = CliConfig {
            home: Some(dir.path().to_path_buf()),
            ..CliConfig::default()
        };

        assert_eq!(dump(&config, "t", None).unwrap().len(), 1);
        tables(&config).unwrap();
        timestamps(&config).unwrap();
        assert!(!dir.path().join("wal").exists());
    }
}
