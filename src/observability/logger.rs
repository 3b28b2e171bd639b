//! Structured JSON logger
//!
//! - One log line = one event
//! - `event` and `severity` first, then fields in key order
//! - Synchronous, no buffering
//! - Written to stderr so tool output on stdout stays machine-readable
//!
//! Lines below the process-wide threshold are dropped. The default threshold
//! is `Warn`; `EPOCHKV_LOG` (`trace`, `info`, `warn`, `error`, `fatal`) or
//! [`Logger::set_threshold`] overrides it.

use std::fmt;
use std::io::{self, Write};
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Once;

use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Trace = 0,
    Info = 1,
    Warn = 2,
    Error = 3,
    Fatal = 4,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Trace => "TRACE",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => Severity::Trace,
            1 => Severity::Info,
            2 => Severity::Warn,
            3 => Severity::Error,
            _ => Severity::Fatal,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "trace" => Ok(Severity::Trace),
            "info" => Ok(Severity::Info),
            "warn" => Ok(Severity::Warn),
            "error" => Ok(Severity::Error),
            "fatal" => Ok(Severity::Fatal),
            other => Err(format!("unknown log level '{}'", other)),
        }
    }
}

static THRESHOLD: AtomicU8 = AtomicU8::new(Severity::Warn as u8);
static FROM_ENV: Once = Once::new();

/// Process-wide JSON-line logger writing to stderr.
pub struct Logger;

impl Logger {
    /// Sets the lowest severity written.
    pub fn set_threshold(severity: Severity) {
        FROM_ENV.call_once(|| {});
        THRESHOLD.store(severity as u8, Ordering::Relaxed);
    }

    pub fn threshold() -> Severity {
        FROM_ENV.call_once(|| {
            if let Some(level) = std::env::var("EPOCHKV_LOG")
                .ok()
                .and_then(|v| v.parse::<Severity>().ok())
            {
                THRESHOLD.store(level as u8, Ordering::Relaxed);
            }
        });
        Severity::from_u8(THRESHOLD.load(Ordering::Relaxed))
    }

    pub fn enabled(severity: Severity) -> bool {
        severity >= Self::threshold()
    }

    /// Writes one line if `severity` passes the threshold. Write errors are
    /// ignored.
    pub fn log(severity: Severity, event: &str, fields: &[(&str, &str)]) {
        if !Self::enabled(severity) {
            return;
        }
        Self::log_to_writer(severity, event, fields, &mut io::stderr());
    }

    fn log_to_writer<W: Write>(
        severity: Severity,
        event: &str,
        fields: &[(&str, &str)],
        writer: &mut W,
    ) {
        let line = Self::render(severity, event, fields);
        // one write per line
        let _ = writer.write_all(line.as_bytes());
        let _ = writer.flush();
    }

    fn render(severity: Severity, event: &str, fields: &[(&str, &str)]) -> String {
        let mut sorted: Vec<_> = fields.iter().collect();
        sorted.sort_by_key(|(k, _)| *k);

        let mut map = Map::new();
        map.insert("event".into(), Value::String(event.to_string()));
        map.insert("severity".into(), Value::String(severity.as_str().to_string()));
        let mut line = Value::Object(map).to_string();

        // fields go after the header keys
        line.pop();
        for (key, value) in sorted {
            line.push(',');
            line.push_str(&Value::String(key.to_string()).to_string());
            line.push(':');
            line.push_str(&Value::String(value.to_string()).to_string());
        }
        line.push_str("}\n");
        line
    }
}

#[cfg(test)]
pub fn capture_log(severity: Severity, event: &str, fields: &[(&str, &str)]) -> String {
    let mut buffer = Vec::new();
    Logger::log_to_writer(severity, event, fields, &mut buffer);
    String::from_utf8(buffer).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Trace < Severity::Info);
        assert!(Severity::Info < Severity::Warn);
        assert!(Severity::Warn < Severity::Error);
        assert!(Severity::Error < Severity::Fatal);
    }

    #[test]
    fn test_severity_parse() {
        assert_eq!("INFO".parse::<Severity>(), Ok(Severity::Info));
        assert_eq!("trace".parse::<Severity>(), Ok(Severity::Trace));
        assert!("verbose".parse::<Severity>().is_err());
    }

    #[test]
    fn test_log_json_format() {
        let output = capture_log(Severity::Info, "TEST_EVENT", &[]);
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["event"], "TEST_EVENT");
        assert_eq!(parsed["severity"], "INFO");
    }

    #[test]
    fn test_fields_are_sorted_after_header() {
        let output = capture_log(
            Severity::Warn,
            "CHECKPOINT_COMPLETE",
            &[("zeta", "1"), ("alpha", "two\"quoted\"")],
        );
        assert!(output.starts_with("{\"event\":\"CHECKPOINT_COMPLETE\",\"severity\":\"WARN\""));
        let alpha = output.find("alpha").unwrap();
        let zeta = output.find("zeta").unwrap();
        assert!(alpha < zeta);

        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["alpha"], "two\"quoted\"");
    }

    #[test]
    fn test_one_line_per_event() {
        let output = capture_log(Severity::Error, "X", &[("msg", "a\nb")]);
        assert_eq!(output.matches('\n').count(), 1);
        assert!(output.ends_with('\n'));
    }
}
