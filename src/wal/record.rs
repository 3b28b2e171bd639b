//! Log record types and encoding
//!
//! One record per committed write. Frame layout (see `checksum::frame`):
//! - Record Length (u32 LE)
//! - Record Type (u8): PUT / REMOVE
//! - LSN (u64 LE)
//! - Commit Id (u64 LE)
//! - Timestamp flag (u8) + Commit Timestamp (u64 LE)
//! - Table name (u32 LE length + bytes)
//! - Key (u32 LE length + bytes)
//! - Value (u32 LE length + bytes, empty for REMOVE)
//! - Checksum (u32 LE)
//!
//! Records always carry the full post-commit value, never a delta, so replay
//! is a plain append.

use std::io::{self, Cursor, Read};

use crate::checksum;
use crate::mvcc::{CommitId, Version, VersionPayload};
use crate::timestamp::Timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RecordType {
    Put = 1,
    Remove = 2,
}

impl RecordType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(RecordType::Put),
            2 => Some(RecordType::Remove),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// A committed write as it appears in the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// Log sequence number; starts at 1, consecutive, never reused
    pub lsn: u64,
    pub commit_id: CommitId,
    pub commit_ts: Option<Timestamp>,
    pub table: String,
    pub key: Vec<u8>,
    pub payload: VersionPayload,
}

impl LogRecord {
    /// Put or remove, from the payload.
    pub fn record_type(&self) -> RecordType {
        match self.payload {
            VersionPayload::Value(_) => RecordType::Put,
            VersionPayload::Tombstone => RecordType::Remove,
        }
    }

    /// The version this record re-creates on replay.
    pub fn to_version(&self) -> Version {
        Version::new(self.commit_id, self.commit_ts, self.payload.clone())
    }

    fn serialize_body(&self) -> Vec<u8> {
        let value: &[u8] = self.payload.value().unwrap_or_default();
        let mut buf =
            Vec::with_capacity(1 + 8 + 8 + 9 + 12 + self.table.len() + self.key.len() + value.len());

        buf.push(self.record_type().as_u8());
        buf.extend_from_slice(&self.lsn.to_le_bytes());
        buf.extend_from_slice(&self.commit_id.value().to_le_bytes());
        buf.push(u8::from(self.commit_ts.is_some()));
        buf.extend_from_slice(&self.commit_ts.map_or(0, |ts| ts.value()).to_le_bytes());
        write_bytes(&mut buf, self.table.as_bytes());
        write_bytes(&mut buf, &self.key);
        write_bytes(&mut buf, value);

        buf
    }

    /// Serializes the framed, checksummed record.
    pub fn serialize(&self) -> Vec<u8> {
        checksum::frame(&self.serialize_body())
    }

    /// Decodes a record body (the bytes between length and checksum).
    pub fn deserialize_body(body: &[u8]) -> io::Result<Self> {
        let mut cursor = Cursor::new(body);

        let record_type = RecordType::from_u8(read_u8(&mut cursor)?).ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidData, "unknown record type")
        })?;
        let lsn = read_u64(&mut cursor)?;
        let commit_id = CommitId::new(read_u64(&mut cursor)?);
        let has_ts = read_u8(&mut cursor)? != 0;
        let raw_ts = read_u64(&mut cursor)?;
        let table = String::from_utf8(read_bytes(&mut cursor)?).map_err(|e| {
            io::Error::new(io::ErrorKind::InvalidData, format!("invalid table name: {}", e))
        })?;
        let key = read_bytes(&mut cursor)?;
        let value = read_bytes(&mut cursor)?;

        if cursor.position() as usize != body.len() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "trailing bytes after record body",
            ));
        }

        let payload = match record_type {
            RecordType::Put => VersionPayload::Value(value),
            RecordType::Remove => VersionPayload::Tombstone,
        };

        Ok(Self {
            lsn,
            commit_id,
            commit_ts: has_ts.then(|| Timestamp::new(raw_ts)),
            table,
            key,
            payload,
        })
    }
}

pub(crate) fn write_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    buf.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
    buf.extend_from_slice(bytes);
}

pub(crate) fn read_u8<R: Read>(reader: &mut R) -> io::Result<u8> {
    let mut b = [0u8; 1];
    reader.read_exact(&mut b)?;
    Ok(b[0])
}

pub(crate) fn read_u64<R: Read>(reader: &mut R) -> io::Result<u64> {
    let mut b = [0u8; 8];
    reader.read_exact(&mut b)?;
    Ok(u64::from_le_bytes(b))
}

pub(crate) fn read_bytes<R: Read>(reader: &mut R) -> io::Result<Vec<u8>> {
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf)?;
    let len = u32::from_le_bytes(len_buf) as usize;
    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::{unframe, Unframed};

    fn sample(payload: VersionPayload, ts: Option<u64>) -> LogRecord {
        LogRecord {
            lsn: 7,
            commit_id: CommitId::new(3),
            commit_ts: ts.map(Timestamp::new),
            table: "ts03_ts_logged".to_string(),
            key: 42u64.to_be_bytes().to_vec(),
            payload,
        }
    }

    fn decode(bytes: &[u8]) -> LogRecord {
        match unframe(bytes) {
            Unframed::Frame(body, consumed) => {
                assert_eq!(consumed, bytes.len());
                LogRecord::deserialize_body(body).unwrap()
            }
            other => panic!("bad frame: {:?}", other),
        }
    }

    #[test]
    fn test_put_with_timestamp_survives_encoding() {
        let record = sample(VersionPayload::Value(b"\x01\x02abcd\x03\x04".to_vec()), Some(300));
        assert_eq!(decode(&record.serialize()), record);
    }

    #[test]
    fn test_remove_without_timestamp_survives_encoding() {
        let record = sample(VersionPayload::Tombstone, None);
        let decoded = decode(&record.serialize());
        assert_eq!(decoded.record_type(), RecordType::Remove);
        assert_eq!(decoded.commit_ts, None);
    }

    #[test]
    fn test_unknown_record_type_rejected() {
        let mut body = sample(VersionPayload::Tombstone, None).serialize_body();
        body[0] = 9;
        assert!(LogRecord::deserialize_body(&body).is_err());
    }

    #[test]
    fn test_to_version_keeps_stamp() {
        let record = sample(VersionPayload::Value(b"v".to_vec()), Some(5));
        let version = record.to_version();
        assert_eq!(version.commit_id(), CommitId::new(3));
        assert_eq!(version.commit_ts(), Some(Timestamp::new(5)));
    }
}
