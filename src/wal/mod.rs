//! Write-ahead log
//!
//! Records every committed write to a logged table. The log is independent
//! of checkpoint cadence: a record flushed to disk survives a crash even if
//! no checkpoint ever covered it, and recovery replays it on top of the last
//! checkpoint.
//!
//! # Invariants
//!
//! - LSNs start at 1, are consecutive and never reused
//! - every record carries a CRC32 checksum
//! - one commit's records are buffered together or not at all
//! - `flush(sync)` is the only durability point

mod errors;
mod reader;
mod record;
mod writer;

pub use errors::{Severity, WalError, WalResult};
pub use reader::LogReader;
pub use record::{LogRecord, RecordType};
pub use writer::{AppendedRange, LogWriter};

pub(crate) use record::{read_bytes, read_u64, read_u8, write_bytes};
