//! JSON output for CLI commands
//!
//! One JSON object per line on stdout, UTF-8 only. Logs go to stderr.

use std::io::{self, Write};

use serde_json::Value;

use super::errors::CliResult;

pub fn write_json<W: Write>(out: &mut W, value: &Value) -> CliResult<()> {
    serde_json::to_writer(&mut *out, value)?;
    out.write_all(b"\n")?;
    Ok(())
}

/// Writes `value` to stdout as one line.
pub fn write_stdout(value: &Value) -> CliResult<()> {
    let stdout = io::stdout();
    let mut lock = stdout.lock();
    write_json(&mut lock, value)?;
    lock.flush()?;
    Ok(())
}

/// Bytes as text when they are valid UTF-8, otherwise lowercase hex.
pub fn bytes_to_json(bytes: &[u8]) -> Value {
    match std::str::from_utf8(bytes) {
        Ok(s) => Value::String(s.to_string()),
        Err(_) => {
            let hex: String = bytes.iter().map(|b| format!("{:02x}", b)).collect();
            serde_json::json!({ "hex": hex })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_write_json_line() {
        let mut buf = Vec::new();
        write_json(&mut buf, &json!({"a": 1})).unwrap();
        assert_eq!(buf, b"{\"a\":1}\n");
    }

    #[test]
    fn test_bytes_to_json() {
        assert_eq!(bytes_to_json(b"abc"), json!("abc"));
        assert_eq!(bytes_to_json(&[0xff, 0x01]), json!({"hex": "ff01"}));
    }
}
