//! Buffered log writer
//!
//! Commits append records to an in-memory buffer; nothing reaches the file
//! until `flush`. `flush(sync = true)` also fsyncs, which is the durability
//! point for every record appended so far. Records still buffered at a crash
//! are lost; the log file itself is append-only.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use super::errors::{WalError, WalResult};
use super::reader::LogReader;
use super::record::LogRecord;
use crate::observability::{log_event_with_fields, Event};

/// Buffered bytes that trigger a write-through on append.
const DEFAULT_BUFFER_LIMIT: usize = 1 << 20;

/// Lsn range assigned to one commit's records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppendedRange {
    pub first_lsn: u64,
    pub last_lsn: u64,
}

/// Appends commit records to `<home>/wal/wal.log`.
pub struct LogWriter {
    file: File,
    buffer: Vec<u8>,
    buffer_limit: usize,
    /// Next lsn to assign (starts at 1, never reused)
    next_lsn: u64,
    /// Highest lsn handed to the OS
    written_lsn: u64,
    /// File length through `written_lsn`
    written_offset: u64,
    /// Highest lsn fsynced
    synced_lsn: u64,
    /// Set when the file could not be restored after a failed write or
    /// fsync; every later append and flush fails
    failed: bool,
    #[cfg(test)]
    short_write_at: Option<usize>,
}

impl LogWriter {
    /// Path of the log inside a home directory.
    pub fn log_path(home: &Path) -> PathBuf {
        home.join("wal").join("wal.log")
    }

    /// Opens or creates `<home>/wal/wal.log`, positioning after the last
    /// complete record. A torn tail is cut off so new appends follow valid
    /// records.
    pub fn open(home: &Path) -> WalResult<Self> {
        let wal_path = Self::log_path(home);
        if let Some(dir) = wal_path.parent() {
            fs::create_dir_all(dir).map_err(|e| {
                WalError::append_failed(format!("failed to create {}", dir.display()), e)
            })?;
        }

        let (last_lsn, valid_len) = if wal_path.exists() {
            let mut reader = LogReader::open(&wal_path)?;
            while reader.read_next()?.is_some() {}
            (reader.last_lsn(), reader.current_offset())
        } else {
            (0, 0)
        };

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&wal_path)
            .map_err(|e| {
                WalError::append_failed(format!("failed to open {}", wal_path.display()), e)
            })?;

        let on_disk = file
            .metadata()
            .map_err(|e| WalError::append_failed("failed to stat log", e))?
            .len();
        if on_disk > valid_len {
            file.set_len(valid_len)
                .map_err(|e| WalError::append_failed("failed to cut torn log tail", e))?;
            file.sync_all()
                .map_err(|e| WalError::fsync_failed("fsync after cutting torn tail", e))?;
            let cut = (on_disk - valid_len).to_string();
            log_event_with_fields(Event::LogTornTail, &[("bytes_discarded", &cut)]);
        }

        Ok(Self {
            file,
            buffer: Vec::new(),
            buffer_limit: DEFAULT_BUFFER_LIMIT,
            next_lsn: last_lsn + 1,
            written_lsn: last_lsn,
            written_offset: valid_len,
            synced_lsn: last_lsn,
            failed: false,
            #[cfg(test)]
            short_write_at: None,
        })
    }

    /// Sets the buffered size that forces a write on append.
    pub fn with_buffer_limit(mut self, limit: usize) -> Self {
        self.buffer_limit = limit;
        self
    }

    /// Last lsn assigned, 0 if the log is empty.
    pub fn last_lsn(&self) -> u64 {
        self.next_lsn - 1
    }

    /// Highest lsn known to be on stable storage.
    pub fn synced_lsn(&self) -> u64 {
        self.synced_lsn
    }

    /// Bytes appended but not yet written to the file.
    pub fn buffered_bytes(&self) -> usize {
        self.buffer.len()
    }

    /// Appends one commit's records, stamping them with consecutive lsns.
    /// Either every record is buffered or none is.
    pub fn append_commit(&mut self, records: &mut [LogRecord]) -> WalResult<Option<AppendedRange>> {
        self.check_usable()?;
        if records.is_empty() {
            return Ok(None);
        }

        let first_lsn = self.next_lsn;
        let mut batch = Vec::new();
        for (lsn, record) in (first_lsn..).zip(records.iter_mut()) {
            record.lsn = lsn;
            batch.extend_from_slice(&record.serialize());
        }
        let last_lsn = first_lsn + records.len() as u64 - 1;

        if self.buffer.len() + batch.len() > self.buffer_limit {
            self.write_buffer()?;
        }
        self.buffer.extend_from_slice(&batch);
        self.next_lsn = last_lsn + 1;

        Ok(Some(AppendedRange {
            first_lsn,
            last_lsn,
        }))
    }

    fn check_usable(&self) -> WalResult<()> {
        if self.failed {
            return Err(WalError::append_failed(
                "log writer failed earlier and the log file may hold a partial record",
                io::Error::new(io::ErrorKind::Other, "log writer failed"),
            ));
        }
        Ok(())
    }

    /// Writes the buffer out. A failed write is cut back to the last
    /// complete flush so the buffer can be retried without leaving a partial
    /// record in the middle of the log.
    fn write_buffer(&mut self) -> WalResult<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        if let Err(e) = self.write_out() {
            if let Err(cut) = self.file.set_len(self.written_offset) {
                self.failed = true;
                let offset = self.written_offset.to_string();
                let reason = cut.to_string();
                log_event_with_fields(
                    Event::LogWriterFailed,
                    &[("offset", &offset), ("reason", &reason)],
                );
            }
            return Err(WalError::append_failed(
                format!("failed to write log through lsn {}", self.last_lsn()),
                e,
            ));
        }
        self.written_offset += self.buffer.len() as u64;
        self.buffer.clear();
        self.written_lsn = self.last_lsn();
        Ok(())
    }

    #[cfg(not(test))]
    fn write_out(&mut self) -> io::Result<()> {
        self.file.write_all(&self.buffer)
    }

    #[cfg(test)]
    fn write_out(&mut self) -> io::Result<()> {
        match self.short_write_at.take() {
            Some(at) => {
                let at = at.min(self.buffer.len());
                self.file.write_all(&self.buffer[..at])?;
                Err(io::Error::new(io::ErrorKind::Other, "no space left on device"))
            }
            None => self.file.write_all(&self.buffer),
        }
    }

    /// Writes buffered records to the file, fsyncing when `sync` is set.
    pub fn flush(&mut self, sync: bool) -> WalResult<()> {
        self.check_usable()?;
        self.write_buffer()?;
        if sync && self.synced_lsn < self.written_lsn {
            if let Err(e) = self.file.sync_all() {
                // written pages may have been dropped; nothing after this is trusted
                self.failed = true;
                return Err(WalError::fsync_failed(
                    format!("fsync failed through lsn {}", self.written_lsn),
                    e,
                ));
            }
            self.synced_lsn = self.written_lsn;
        }
        Ok(())
    }
}
