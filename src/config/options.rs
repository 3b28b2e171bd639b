//! Typed options for each configurable entry point
//!
//! Each struct parses its own config string and rejects keys it does not
//! recognize, so callers never look options up by name.

use serde::{Deserialize, Serialize};

use super::errors::{ConfigError, ConfigResult};
use super::parser::{ConfigList, ConfigValue};
use crate::timestamp::{Timestamp, TimestampRole, TimestampUpdate};

fn parse_bool(key: &str, value: &ConfigValue) -> ConfigResult<bool> {
    match value {
        ConfigValue::Flag => Ok(true),
        ConfigValue::Scalar(s) => match s.as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(ConfigError::invalid(key, s.as_str(), "true or false")),
        },
        ConfigValue::Nested(_) => Err(ConfigError::invalid(key, value.describe(), "true or false")),
    }
}

fn parse_timestamp(key: &str, value: &ConfigValue) -> ConfigResult<Timestamp> {
    match value {
        ConfigValue::Scalar(s) => Timestamp::parse_hex(s)
            .map_err(|_| ConfigError::invalid(key, s.as_str(), "a hexadecimal timestamp")),
        _ => Err(ConfigError::invalid(key, value.describe(), "a hexadecimal timestamp")),
    }
}

fn optional_timestamp(list: &ConfigList, key: &str) -> ConfigResult<Option<Timestamp>> {
    list.get(key).map(|v| parse_timestamp(key, v)).transpose()
}

/// Reads `log=(enabled=...)`, returning `default` when absent.
fn log_enabled(list: &ConfigList, call: &'static str, default: bool) -> ConfigResult<bool> {
    match list.get("log") {
        None => Ok(default),
        Some(ConfigValue::Nested(inner)) => {
            inner.check_keys(call, &["enabled"])?;
            inner
                .get("enabled")
                .map(|v| parse_bool("log.enabled", v))
                .transpose()
                .map(|v| v.unwrap_or(true))
        }
        Some(other) => Err(ConfigError::invalid("log", other.describe(), "(enabled=...)")),
    }
}

fn optional_bool(list: &ConfigList, key: &str) -> ConfigResult<bool> {
    Ok(list
        .get(key)
        .map(|v| parse_bool(key, v))
        .transpose()?
        .unwrap_or(false))
}

/// Options for opening a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionOptions {
    /// Create the home directory if missing
    pub create: bool,
    /// Connection-wide write-ahead logging
    pub log_enabled: bool,
    /// Recover and read only: no log writer, no writes to the home
    pub readonly: bool,
}

impl ConnectionOptions {
    /// `compatibility=(release=...)` is accepted and ignored.
    pub fn parse(config: &str) -> ConfigResult<Self> {
        let list = ConfigList::parse(config)?;
        list.check_keys("open", &["create", "log", "readonly", "compatibility"])?;
        match list.get("compatibility") {
            None => {}
            Some(ConfigValue::Nested(inner)) => inner.check_keys("open", &["release"])?,
            Some(other) => {
                return Err(ConfigError::invalid(
                    "compatibility",
                    other.describe(),
                    "(release=...)",
                ))
            }
        }
        Ok(Self {
            create: optional_bool(&list, "create")?,
            log_enabled: log_enabled(&list, "open", false)?,
            readonly: optional_bool(&list, "readonly")?,
        })
    }
}

/// Options for creating a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableOptions {
    pub log_enabled: bool,
    pub key_format: Option<String>,
    pub value_format: Option<String>,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            log_enabled: true,
            key_format: None,
            value_format: None,
        }
    }
}

impl TableOptions {
    /// Parses a `TableOptions` config string, rejecting unknown keys.
    pub fn parse(config: &str) -> ConfigResult<Self> {
        let list = ConfigList::parse(config)?;
        list.check_keys("create", &["log", "key_format", "value_format"])?;

        let format = |key: &str| -> ConfigResult<Option<String>> {
            match list.get(key) {
                None => Ok(None),
                Some(ConfigValue::Scalar(s)) => Ok(Some(s.clone())),
                Some(other) => Err(ConfigError::invalid(key, other.describe(), "a format string")),
            }
        };

        Ok(Self {
            log_enabled: log_enabled(&list, "create", true)?,
            key_format: format("key_format")?,
            value_format: format("value_format")?,
        })
    }
}

/// Options for `begin_transaction`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BeginOptions {
    pub read_timestamp: Option<Timestamp>,
}

impl BeginOptions {
    pub fn parse(config: &str) -> ConfigResult<Self> {
        let list = ConfigList::parse(config)?;
        list.check_keys("begin_transaction", &["read_timestamp"])?;
        Ok(Self {
            read_timestamp: optional_timestamp(&list, "read_timestamp")?,
        })
    }
}

/// Options for `commit_transaction`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CommitOptions {
    pub commit_timestamp: Option<Timestamp>,
}

impl CommitOptions {
    pub fn parse(config: &str) -> ConfigResult<Self> {
        let list = ConfigList::parse(config)?;
        list.check_keys("commit_transaction", &["commit_timestamp"])?;
        Ok(Self {
            commit_timestamp: optional_timestamp(&list, "commit_timestamp")?,
        })
    }
}

/// Options for `checkpoint`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckpointOptions {
    pub use_timestamp: bool,
    pub read_timestamp: Option<Timestamp>,
}

impl Default for CheckpointOptions {
    fn default() -> Self {
        Self {
            use_timestamp: true,
            read_timestamp: None,
        }
    }
}

impl CheckpointOptions {
    /// An empty config checkpoints at the stable timestamp.
    pub fn parse(config: &str) -> ConfigResult<Self> {
        let list = ConfigList::parse(config)?;
        list.check_keys("checkpoint", &["use_timestamp", "read_timestamp"])?;
        Ok(Self {
            use_timestamp: list
                .get("use_timestamp")
                .map(|v| parse_bool("use_timestamp", v))
                .transpose()?
                .unwrap_or(true),
            read_timestamp: optional_timestamp(&list, "read_timestamp")?,
        })
    }
}

/// Parses `set_timestamp` options into an oracle update.
pub fn parse_timestamp_update(config: &str) -> ConfigResult<TimestampUpdate> {
    let list = ConfigList::parse(config)?;
    list.check_keys("set_timestamp", &["oldest_timestamp", "stable_timestamp"])?;
    Ok(TimestampUpdate {
        oldest: optional_timestamp(&list, "oldest_timestamp")?,
        stable: optional_timestamp(&list, "stable_timestamp")?,
    })
}

/// Parses `query_timestamp` options into the role to report.
pub fn parse_query_role(config: &str) -> ConfigResult<TimestampRole> {
    let list = ConfigList::parse(config)?;
    list.check_keys("query_timestamp", &["get"])?;
    match list.get("get") {
        None => Ok(TimestampRole::AllCommitted),
        Some(ConfigValue::Scalar(s)) => match s.as_str() {
            "all_committed" => Ok(TimestampRole::AllCommitted),
            "oldest" => Ok(TimestampRole::Oldest),
            "stable" => Ok(TimestampRole::Stable),
            _ => Err(ConfigError::invalid("get", s.as_str(), "all_committed, oldest or stable")),
        },
        Some(other) => Err(ConfigError::invalid(
            "get",
            other.describe(),
            "all_committed, oldest or stable",
        )),
    }
}

/// Options for `log_flush`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogFlushOptions {
    pub sync: bool,
}

impl Default for LogFlushOptions {
    fn default() -> Self {
        Self { sync: true }
    }
}

impl LogFlushOptions {
    pub fn parse(config: &str) -> ConfigResult<Self> {
        let list = ConfigList::parse(config)?;
        list.check_keys("log_flush", &["sync"])?;
        let sync = match list.get("sync") {
            None => true,
            Some(ConfigValue::Scalar(s)) => match s.as_str() {
                "on" => true,
                "off" => false,
                _ => return Err(ConfigError::invalid("sync", s.as_str(), "on or off")),
            },
            Some(other) => return Err(ConfigError::invalid("sync", other.describe(), "on or off")),
        };
        Ok(Self { sync })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_defaults() {
        let opts = ConnectionOptions::parse("create").unwrap();
        assert!(opts.create);
        assert!(!opts.log_enabled);

        let logged = ConnectionOptions::parse("create,log=(enabled)").unwrap();
        assert!(logged.log_enabled);
    }

    #[test]
    fn test_connection_accepts_compatibility_release() {
        let opts =
            ConnectionOptions::parse(r#"create,compatibility=(release="2.9"),log=(enabled)"#)
                .unwrap();
        assert!(opts.log_enabled);
        assert!(!opts.readonly);

        assert!(ConnectionOptions::parse("compatibility=2.9").is_err());
        assert!(ConnectionOptions::parse("compatibility=(level=3)").is_err());
        assert!(ConnectionOptions::parse("readonly,log=(enabled)").unwrap().readonly);
    }

    #[test]
    fn test_table_log_flag() {
        assert!(TableOptions::parse("key_format=i,value_format=S").unwrap().log_enabled);
        let unlogged =
            TableOptions::parse("key_format=i,value_format=S, log=(enabled=false)").unwrap();
        assert!(!unlogged.log_enabled);
        assert_eq!(unlogged.key_format.as_deref(), Some("i"));
    }

    #[test]
    fn test_begin_and_commit_timestamps() {
        let begin = BeginOptions::parse("read_timestamp=64").unwrap();
        assert_eq!(begin.read_timestamp, Some(Timestamp::new(100)));
        assert_eq!(BeginOptions::parse("").unwrap().read_timestamp, None);

        let commit = CommitOptions::parse("commit_timestamp=c8").unwrap();
        assert_eq!(commit.commit_timestamp, Some(Timestamp::new(200)));
        assert!(CommitOptions::parse("commit_timestamp=zz").is_err());
        assert!(CommitOptions::parse("read_timestamp=1").is_err());
    }

    #[test]
    fn test_checkpoint_options() {
        assert_eq!(CheckpointOptions::parse("").unwrap(), CheckpointOptions::default());
        assert!(!CheckpointOptions::parse("use_timestamp=false").unwrap().use_timestamp);
        assert!(CheckpointOptions::parse("use_timestamp=true").unwrap().use_timestamp);
        let explicit = CheckpointOptions::parse("read_timestamp=12c").unwrap();
        assert_eq!(explicit.read_timestamp, Some(Timestamp::new(300)));
        assert!(CheckpointOptions::parse("use_timestamp=maybe").is_err());
    }

    #[test]
    fn test_timestamp_update() {
        let update = parse_timestamp_update("oldest_timestamp=64,stable_timestamp=c8").unwrap();
        assert_eq!(update.oldest, Some(Timestamp::new(100)));
        assert_eq!(update.stable, Some(Timestamp::new(200)));
        assert!(parse_timestamp_update("commit_timestamp=1").is_err());
    }

    #[test]
    fn test_query_role() {
        assert_eq!(parse_query_role("").unwrap(), TimestampRole::AllCommitted);
        assert_eq!(parse_query_role("get=stable").unwrap(), TimestampRole::Stable);
        assert!(parse_query_role("get=newest").is_err());
    }

    #[test]
    fn test_log_flush_sync() {
        assert!(LogFlushOptions::parse("sync=on").unwrap().sync);
        assert!(!LogFlushOptions::parse("sync=off").unwrap().sync);
        assert!(LogFlushOptions::parse("sync=true").is_err());
    }
}
