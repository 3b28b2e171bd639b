//! CRC32 checksums for log records and checkpoint images
//!
//! Both on-disk formats frame a record as `len (u32 LE) | body | crc (u32 LE)`
//! with the checksum covering the length field and the body.

use crc32fast::Hasher;

/// CRC32 (IEEE) of `data`.
pub fn compute_checksum(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

/// Frames `body` with its length prefix and trailing checksum.
pub fn frame(body: &[u8]) -> Vec<u8> {
    let record_length = (4 + body.len() + 4) as u32;
    let mut out = Vec::with_capacity(record_length as usize);
    out.extend_from_slice(&record_length.to_le_bytes());
    out.extend_from_slice(body);
    let checksum = compute_checksum(&out);
    out.extend_from_slice(&checksum.to_le_bytes());
    out
}

/// Outcome of reading one frame from the front of `data`.
#[derive(Debug, PartialEq, Eq)]
pub enum Unframed<'a> {
    /// A complete, verified frame: body and total bytes consumed
    Frame(&'a [u8], usize),
    /// Fewer bytes than the frame header announces
    Truncated,
    /// Length field below the minimum frame size
    BadLength(u32),
    /// Checksum mismatch
    BadChecksum { expected: u32, actual: u32 },
}

/// Reads one frame from the front of `data` and verifies its checksum.
pub fn unframe(data: &[u8]) -> Unframed<'_> {
    if data.len() < 8 {
        return Unframed::Truncated;
    }
    let record_length = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);
    if record_length < 8 {
        return Unframed::BadLength(record_length);
    }
    let total = record_length as usize;
    if data.len() < total {
        return Unframed::Truncated;
    }
    let checksum_at = total - 4;
    let expected = u32::from_le_bytes([
        data[checksum_at],
        data[checksum_at + 1],
        data[checksum_at + 2],
        data[checksum_at + 3],
    ]);
    let actual = compute_checksum(&data[..checksum_at]);
    if expected != actual {
        return Unframed::BadChecksum { expected, actual };
    }
    Unframed::Frame(&data[4..checksum_at], total)
}
