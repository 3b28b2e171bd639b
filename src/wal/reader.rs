//! Log reader for recovery replay
//!
//! Reads records in LSN order, verifying every checksum. A record cut off by
//! the end of the file is a torn tail from an interrupted flush and ends the
//! log cleanly, as long as nothing valid follows it. A length that runs past
//! the end of the file while a complete frame still lies beyond it is a
//! damaged header, not a torn tail. Checksum failures, bad decodes and LSN
//! gaps are corruption and halt replay.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use super::errors::{WalError, WalResult};
use super::record::LogRecord;
use crate::checksum::{unframe, Unframed};

const MIN_RECORD_SIZE: u64 = 8;

/// Sequential, checksum-verifying reader over a log file.
pub struct LogReader {
    reader: BufReader<File>,
    current_offset: u64,
    file_size: u64,
    last_lsn: u64,
    torn_tail: bool,
}

impl LogReader {
    /// Opens a log for reading from its first record.
    pub fn open(wal_path: &Path) -> WalResult<Self> {
        let file = File::open(wal_path).map_err(|e| {
            WalError::corruption_at_offset(
                0,
                format!("failed to open log file {}: {}", wal_path.display(), e),
            )
        })?;
        let file_size = file
            .metadata()
            .map_err(|e| WalError::corruption_at_offset(0, format!("failed to stat log: {}", e)))?
            .len();

        Ok(Self {
            reader: BufReader::new(file),
            current_offset: 0,
            file_size,
            last_lsn: 0,
            torn_tail: false,
        })
    }

    /// Byte offset just past the last record returned.
    pub fn current_offset(&self) -> u64 {
        self.current_offset
    }

    /// Lsn of the last record returned, 0 before the first.
    pub fn last_lsn(&self) -> u64 {
        self.last_lsn
    }

    /// True once the reader stopped at an incomplete final record.
    pub fn hit_torn_tail(&self) -> bool {
        self.torn_tail
    }

    /// Returns the next record, `None` at end of log.
    pub fn read_next(&mut self) -> WalResult<Option<LogRecord>> {
        if self.torn_tail || self.current_offset >= self.file_size {
            return Ok(None);
        }

        let remaining = self.file_size - self.current_offset;
        if remaining < MIN_RECORD_SIZE {
            self.torn_tail = true;
            return Ok(None);
        }

        let mut len_buf = [0u8; 4];
        self.read_exact(&mut len_buf)?;
        let record_length = u64::from(u32::from_le_bytes(len_buf));

        if record_length < MIN_RECORD_SIZE {
            return Err(WalError::corruption_at_offset(
                self.current_offset,
                format!("invalid record length {}", record_length),
            ));
        }
        if record_length > remaining {
            let header_offset = self.current_offset;
            let mut rest = vec![0u8; (remaining - 4) as usize];
            self.read_exact(&mut rest)?;
            if let Some(at) = first_complete_frame(&rest) {
                return Err(WalError::corruption_at_offset(
                    header_offset,
                    format!(
                        "record length {} runs past end of log but a complete record follows at offset {}",
                        record_length,
                        header_offset + 4 + at as u64
                    ),
                ));
            }
            self.torn_tail = true;
            return Ok(None);
        }

        let mut record_buf = vec![0u8; record_length as usize];
        record_buf[..4].copy_from_slice(&len_buf);
        self.read_exact(&mut record_buf[4..])?;

        let body = match unframe(&record_buf) {
            Unframed::Frame(body, _) => body,
            Unframed::BadChecksum { expected, actual } => {
                return Err(WalError::corruption_at_offset(
                    self.current_offset,
                    format!("checksum mismatch: expected {:08x}, got {:08x}", expected, actual),
                ))
            }
            Unframed::Truncated | Unframed::BadLength(_) => {
                return Err(WalError::corruption_at_offset(
                    self.current_offset,
                    "malformed record frame",
                ))
            }
        };

        let record = LogRecord::deserialize_body(body)
            .map_err(|e| WalError::corruption_at_offset(self.current_offset, e.to_string()))?;

        if record.lsn != self.last_lsn + 1 {
            return Err(WalError::corruption_at_offset(
                self.current_offset,
                format!("non-sequential lsn: expected {}, got {}", self.last_lsn + 1, record.lsn),
            ));
        }

        self.current_offset += record_length;
        self.last_lsn = record.lsn;
        Ok(Some(record))
    }

    /// Reads every remaining record up to the end or a torn tail.
    pub fn read_all(&mut self) -> WalResult<Vec<LogRecord>> {
        let mut records = Vec::new();
        while let Some(record) = self.read_next()? {
            records.push(record);
        }
        Ok(records)
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> WalResult<()> {
        let offset = self.current_offset;
        self.reader.read_exact(buf).map_err(|e: io::Error| {
            WalError::corruption_at_offset(offset, format!("read failed: {}", e))
        })
    }
}

/// Offset of the first checksum-valid frame in `data`, if any.
///
/// An interrupted flush leaves a prefix of whole records followed by one
/// partial record, so a valid frame after an overrunning header means the
/// header itself is damaged.
fn first_complete_frame(data: &[u8]) -> Option<usize> {
    (0..data.len()).find(|&at| matches!(unframe(&data[at..]), Unframed::Frame(..)))
}
