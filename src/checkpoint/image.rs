//! Table image files
//!
//! One file per table per checkpoint generation:
//! `<home>/checkpoint/<generation>/table-<id>.img`.
//!
//! Layout: 8-byte magic, then one framed entry per visible key in key order.
//! Entry body: `commit_id u64 | ts flag u8 | ts u64 | key | value` with
//! length-prefixed key and value. Frames use the log's `len | body | crc32`
//! encoding. Images are written to a temp file, fsynced, then renamed; a
//! partially written image never carries the final name.

use std::fs::{self, File};
use std::io::{self, Cursor, Write};
use std::path::{Path, PathBuf};

use super::errors::{CheckpointError, CheckpointResult};
use crate::checksum::{self, Unframed};
use crate::mvcc::{CommitId, Version, VisibleEntry};
use crate::timestamp::Timestamp;
use crate::wal::{read_bytes, read_u64, read_u8, write_bytes};

const MAGIC: &[u8; 8] = b"EKVIMG01";

/// Image file of one table inside a generation directory.
pub fn image_path(generation_dir: &Path, table_id: u32) -> PathBuf {
    generation_dir.join(format!("table-{}.img", table_id))
}

fn encode_entry(entry: &VisibleEntry) -> Vec<u8> {
    let value = entry.version.payload().value().unwrap_or_default();
    let mut body = Vec::with_capacity(8 + 9 + 8 + entry.key.len() + value.len());
    body.extend_from_slice(&entry.version.commit_id().value().to_le_bytes());
    let ts = entry.version.commit_ts();
    body.push(u8::from(ts.is_some()));
    body.extend_from_slice(&ts.map_or(0, |t| t.value()).to_le_bytes());
    write_bytes(&mut body, &entry.key);
    write_bytes(&mut body, value);
    body
}

fn decode_entry(body: &[u8]) -> io::Result<VisibleEntry> {
    let mut cursor = Cursor::new(body);
    let commit_id = CommitId::new(read_u64(&mut cursor)?);
    let has_ts = read_u8(&mut cursor)? != 0;
    let raw_ts = read_u64(&mut cursor)?;
    let key = read_bytes(&mut cursor)?;
    let value = read_bytes(&mut cursor)?;
    if cursor.position() as usize != body.len() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "trailing bytes after image entry",
        ));
    }
    Ok(VisibleEntry {
        key,
        version: Version::with_value(commit_id, has_ts.then(|| Timestamp::new(raw_ts)), value),
    })
}

/// Writes `entries` durably to `path`. Returns the byte size of the image.
pub fn write_image(path: &Path, entries: &[VisibleEntry]) -> CheckpointResult<u64> {
    let mut data = Vec::with_capacity(MAGIC.len() + entries.len() * 64);
    data.extend_from_slice(MAGIC);
    for entry in entries {
        data.extend_from_slice(&checksum::frame(&encode_entry(entry)));
    }

    let tmp = path.with_extension("img.tmp");
    let mut file = File::create(&tmp).map_err(|e| {
        CheckpointError::failed_with_source(format!("failed to create {}", tmp.display()), e)
    })?;
    file.write_all(&data).map_err(|e| {
        CheckpointError::failed_with_source(format!("failed to write {}", tmp.display()), e)
    })?;
    file.sync_all().map_err(|e| {
        CheckpointError::failed_with_source(format!("failed to fsync {}", tmp.display()), e)
    })?;
    fs::rename(&tmp, path).map_err(|e| {
        CheckpointError::failed_with_source(format!("failed to rename {}", tmp.display()), e)
    })?;

    Ok(data.len() as u64)
}

/// Reads every entry of an image. Any framing or checksum problem is
/// corruption: images are renamed into place only once complete.
pub fn read_image(path: &Path) -> CheckpointResult<Vec<VisibleEntry>> {
    let data = fs::read(path).map_err(|e| {
        CheckpointError::failed_with_source(format!("failed to read {}", path.display()), e)
    })?;

    if data.len() < MAGIC.len() || &data[..MAGIC.len()] != MAGIC {
        return Err(CheckpointError::image_corrupt(path, 0, "missing image header"));
    }

    let mut entries = Vec::new();
    let mut offset = MAGIC.len();
    while offset < data.len() {
        match checksum::unframe(&data[offset..]) {
            Unframed::Frame(body, consumed) => {
                let entry = decode_entry(body).map_err(|e| {
                    CheckpointError::image_corrupt(path, offset as u64, e.to_string())
                })?;
                entries.push(entry);
                offset += consumed;
            }
            Unframed::Truncated => {
                return Err(CheckpointError::image_corrupt(path, offset as u64, "truncated entry"))
            }
            Unframed::BadLength(len) => {
                return Err(CheckpointError::image_corrupt(
                    path,
                    offset as u64,
                    format!("invalid entry length {}", len),
                ))
            }
            Unframed::BadChecksum { expected, actual } => {
                return Err(CheckpointError::image_corrupt(
                    path,
                    offset as u64,
                    format!("checksum mismatch: expected {:08x}, got {:08x}", expected, actual),
                ))
            }
        }
    }
    Ok(entries)
}
