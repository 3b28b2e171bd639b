//! epochkv - a timestamp-ordered multi-version key-value engine
//!
//! Writes are versioned by commit timestamp, readers pick a point in time
//! with a read timestamp, checkpoints freeze per-table images under a
//! stable-timestamp policy, and an optional per-table log recovers writes no
//! checkpoint covered.

pub mod backup;
pub mod catalog;
pub mod checkpoint;
pub mod checksum;
pub mod cli;
pub mod config;
pub mod connection;
pub mod errors;
pub mod mvcc;
pub mod observability;
pub mod recovery;
mod sync;
pub mod timestamp;
pub mod txn;
pub mod wal;

pub use connection::{Connection, Session};
pub use errors::{EngineError, EngineResult};
pub use timestamp::Timestamp;
