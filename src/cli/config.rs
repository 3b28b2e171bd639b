//! CLI configuration file (`epochkv.json`)
//!
//! ```json
//! { "home": "./data", "log_enabled": true, "log_level": "warn" }
//! ```
//!
//! `home` is required unless `--home` is given. A missing file is allowed
//! when `--home` is given; every other field has a default.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::errors::{CliError, CliResult};
use crate::observability::Severity;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CliConfig {
    #[serde(default)]
    pub home: Option<PathBuf>,

    /// Must match how the home was written, or logged commits are not replayed
    #[serde(default = "default_log_enabled")]
    pub log_enabled: bool,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_enabled() -> bool {
    true
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            home: None,
            log_enabled: default_log_enabled(),
            log_level: default_log_level(),
        }
    }
}

impl CliConfig {
    /// Loads the config file; `home_override` replaces its `home`.
    pub fn load(path: &Path, home_override: Option<&Path>) -> CliResult<Self> {
        let mut config = match fs::read_to_string(path) {
            Ok(json) => serde_json::from_str(&json).map_err(|e| {
                CliError::config_error(format!("invalid config file {}: {}", path.display(), e))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && home_override.is_some() => {
                CliConfig::default()
            }
            Err(e) => {
                return Err(CliError::config_error(format!(
                    "cannot read config file {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        if let Some(home) = home_override {
            config.home = Some(home.to_path_buf());
        }
        Ok(config)
    }

    pub fn home(&self) -> CliResult<&Path> {
        self.home
            .as_deref()
            .ok_or_else(|| CliError::config_error("no home directory configured"))
    }

    pub fn log_level(&self) -> CliResult<Severity> {
        self.log_level.parse().map_err(CliError::config_error)
    }

    /// Config string for `Connection::open`. Commands only inspect the
    /// home, so the connection is read-only.
    pub fn open_config(&self) -> String {
        format!("readonly,log=(enabled={})", self.log_enabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_file_with_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("epochkv.json");
        fs::write(&path, r#"{"home": "/data"}"#).unwrap();

        let config = CliConfig::load(&path, None).unwrap();
        assert_eq!(config.home().unwrap(), Path::new("/data"));
        assert!(config.log_enabled);
        assert_eq!(config.log_level().unwrap(), Severity::Warn);
        assert_eq!(config.open_config(), "readonly,log=(enabled=true)");
    }

    #[test]
    fn test_home_override_without_file() {
        let dir = TempDir::new().unwrap();
        let config =
            CliConfig::load(&dir.path().join("missing.json"), Some(Path::new("/h"))).unwrap();
        assert_eq!(config.home().unwrap(), Path::new("/h"));
    }

    #[test]
    fn test_missing_file_without_home_fails() {
        let dir = TempDir::new().unwrap();
        assert!(CliConfig::load(&dir.path().join("missing.json"), None).is_err());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("epochkv.json");
        fs::write(&path, r#"{"home": "/data", "cache": 1}"#).unwrap();
        assert!(CliConfig::load(&path, None).is_err());
    }
}
