//! Timestamp Rule Tests
//!
//! Validates connection-wide timestamp behavior:
//! - oldest/stable only move forward and oldest never passes stable
//! - reads and commits older than oldest are rejected
//! - a rejected commit leaves no trace in the store, the log or the oracle
//! - a checkpoint at a read timestamp captures exactly the commits at or
//!   before it

use std::path::Path;

use epochkv::wal::{LogReader, LogWriter};
use epochkv::{Connection, EngineError, Session};
use tempfile::TempDir;

// =============================================================================
// Test Utilities
// =============================================================================

fn open(home: &Path) -> Connection {
    let conn = Connection::open(home, "create,log=(enabled)").expect("open failed");
    conn.create_table("t", "").unwrap();
    conn.create_table("u", "log=(enabled=false)").unwrap();
    conn
}

fn commit_put(session: &mut Session, table: &str, key: &[u8], ts: &str) -> Result<(), EngineError> {
    session.begin_transaction("").unwrap();
    session.put(table, key, b"v").unwrap();
    session
        .commit_transaction(&format!("commit_timestamp={}", ts))
        .map(|_| ())
}

fn logged_records(home: &Path, conn: &Connection) -> usize {
    conn.log_flush("sync=off").unwrap();
    LogReader::open(&LogWriter::log_path(home))
        .unwrap()
        .read_all()
        .unwrap()
        .len()
}

// =============================================================================
// Oracle Tests
// =============================================================================

#[test]
fn test_unset_timestamps_report_zero() {
    let dir = TempDir::new().unwrap();
    let conn = open(dir.path());
    assert_eq!(conn.query_timestamp("").unwrap(), "00");
    assert_eq!(conn.query_timestamp("get=oldest").unwrap(), "00");
    assert_eq!(conn.query_timestamp("get=stable").unwrap(), "00");
}

#[test]
fn test_timestamps_never_move_backward() {
    let dir = TempDir::new().unwrap();
    let conn = open(dir.path());

    conn.set_timestamp("oldest_timestamp=10,stable_timestamp=20")
        .unwrap();
    let err = conn.set_timestamp("stable_timestamp=18").unwrap_err();
    assert_eq!(err.code(), "EPOCH_INVALID_TIMESTAMP_ORDER");
    let err = conn.set_timestamp("oldest_timestamp=0f").unwrap_err();
    assert_eq!(err.code(), "EPOCH_INVALID_TIMESTAMP_ORDER");

    // Setting the same value again is allowed.
    conn.set_timestamp("stable_timestamp=20").unwrap();
    assert_eq!(conn.query_timestamp("get=stable").unwrap(), "20");
    assert_eq!(conn.query_timestamp("get=oldest").unwrap(), "10");
}

#[test]
fn test_oldest_cannot_pass_stable() {
    let dir = TempDir::new().unwrap();
    let conn = open(dir.path());

    conn.set_timestamp("stable_timestamp=20").unwrap();
    let err = conn.set_timestamp("oldest_timestamp=21").unwrap_err();
    assert_eq!(err.code(), "EPOCH_INVALID_TIMESTAMP_ORDER");
    assert_eq!(conn.query_timestamp("get=oldest").unwrap(), "00");

    // Both roles move together in one call.
    conn.set_timestamp("oldest_timestamp=30,stable_timestamp=30")
        .unwrap();
    assert_eq!(conn.query_timestamp("get=oldest").unwrap(), "30");
}

#[test]
fn test_malformed_timestamp_config() {
    let dir = TempDir::new().unwrap();
    let conn = open(dir.path());

    for config in ["stable_timestamp=xyz", "stable_timestamp=", "bogus=1"] {
        let err = conn.set_timestamp(config).unwrap_err();
        assert_eq!(err.code(), "EPOCH_MALFORMED_CONFIG", "config {:?}", config);
    }
    assert_eq!(conn.query_timestamp("get=stable").unwrap(), "00");
}

#[test]
fn test_all_committed_tracks_largest_commit() {
    let dir = TempDir::new().unwrap();
    let conn = open(dir.path());
    let mut session = conn.open_session();

    commit_put(&mut session, "t", b"a", "30").unwrap();
    commit_put(&mut session, "t", b"b", "10").unwrap();
    session.put("t", b"c", b"v").unwrap();
    assert_eq!(conn.query_timestamp("").unwrap(), "30");
}

#[test]
fn test_oracle_resets_on_reopen() {
    let dir = TempDir::new().unwrap();
    {
        let conn = open(dir.path());
        conn.set_timestamp("oldest_timestamp=10,stable_timestamp=20")
            .unwrap();
        conn.close().unwrap();
    }
    let conn = Connection::open(dir.path(), "log=(enabled)").unwrap();
    assert_eq!(conn.query_timestamp("get=stable").unwrap(), "00");
}

// =============================================================================
// Rejection Tests
// =============================================================================

#[test]
fn test_read_older_than_oldest_rejected() {
    let dir = TempDir::new().unwrap();
    let conn = open(dir.path());
    conn.set_timestamp("oldest_timestamp=10").unwrap();

    let mut session = conn.open_session();
    let err = session.begin_transaction("read_timestamp=09").unwrap_err();
    assert_eq!(err.code(), "EPOCH_TIMESTAMP_TOO_OLD");
    assert!(!session.in_transaction());

    session.begin_transaction("read_timestamp=10").unwrap();
    session.rollback_transaction().unwrap();
}

#[test]
fn test_rejected_commit_leaves_no_trace() {
    let dir = TempDir::new().unwrap();
    let conn = open(dir.path());
    let mut session = conn.open_session();

    commit_put(&mut session, "t", b"a", "20").unwrap();
    conn.set_timestamp("oldest_timestamp=20").unwrap();
    let before = logged_records(dir.path(), &conn);

    let err = commit_put(&mut session, "t", b"b", "15").unwrap_err();
    assert_eq!(err.code(), "EPOCH_TIMESTAMP_TOO_OLD");
    assert!(!session.in_transaction());

    assert_eq!(session.get("t", b"b").unwrap(), None);
    assert_eq!(logged_records(dir.path(), &conn), before);
    assert_eq!(conn.query_timestamp("").unwrap(), "20");
}

#[test]
fn test_out_of_order_commit_rejected() {
    let dir = TempDir::new().unwrap();
    let conn = open(dir.path());
    let mut session = conn.open_session();

    commit_put(&mut session, "u", b"k", "20").unwrap();
    let err = commit_put(&mut session, "u", b"k", "1f").unwrap_err();
    assert_eq!(err.code(), "EPOCH_COMMIT_OUT_OF_ORDER");

    // Equal timestamps and other keys are fine.
    commit_put(&mut session, "u", b"k", "20").unwrap();
    commit_put(&mut session, "u", b"other", "05").unwrap();
}

#[test]
fn test_malformed_commit_keeps_transaction_open() {
    let dir = TempDir::new().unwrap();
    let conn = open(dir.path());
    let mut session = conn.open_session();

    session.begin_transaction("").unwrap();
    session.put("t", b"a", b"v").unwrap();
    let err = session.commit_transaction("commit_timestamp=zz").unwrap_err();
    assert_eq!(err.code(), "EPOCH_MALFORMED_CONFIG");
    assert!(session.in_transaction());

    session.commit_transaction("commit_timestamp=05").unwrap();
    assert_eq!(session.get("t", b"a").unwrap().as_deref(), Some(&b"v"[..]));
}

#[test]
fn test_dropped_session_rolls_back() {
    let dir = TempDir::new().unwrap();
    let conn = open(dir.path());
    {
        let mut session = conn.open_session();
        session.begin_transaction("").unwrap();
        session.put("t", b"a", b"v").unwrap();
    }
    assert_eq!(conn.open_session().get("t", b"a").unwrap(), None);
}

// =============================================================================
// Checkpoint Cutoff Tests
// =============================================================================

#[test]
fn test_checkpoint_read_timestamp_is_exact() {
    let dir = TempDir::new().unwrap();
    {
        let conn = open(dir.path());
        let mut session = conn.open_session();
        for ts in 1..=20u32 {
            let key = ts.to_be_bytes();
            commit_put(&mut session, "u", &key, &format!("{:x}", ts)).unwrap();
        }
        let marker = session.checkpoint("read_timestamp=0c").unwrap();
        assert_eq!(marker.table("u").unwrap().entries, 12);
    }

    let conn = Connection::open(dir.path(), "log=(enabled)").unwrap();
    let rows = conn.open_session().scan("u").unwrap();
    let keys: Vec<u32> = rows
        .iter()
        .map(|(k, _)| u32::from_be_bytes([k[0], k[1], k[2], k[3]]))
        .collect();
    assert_eq!(keys, (1..=12).collect::<Vec<_>>());
}

#[test]
fn test_checkpoint_uses_stable_and_keeps_untimestamped_writes() {
    let dir = TempDir::new().unwrap();
    {
        let conn = open(dir.path());
        let mut session = conn.open_session();
        commit_put(&mut session, "u", b"early", "10").unwrap();
        commit_put(&mut session, "u", b"late", "30").unwrap();
        session.put("u", b"plain", b"v").unwrap();
        conn.set_timestamp("stable_timestamp=20").unwrap();
        conn.checkpoint("").unwrap();
    }

    let conn = Connection::open(dir.path(), "").unwrap();
    let session = conn.open_session();
    assert!(session.get("u", b"early").unwrap().is_some());
    assert!(session.get("u", b"late").unwrap().is_none());
    assert!(session.get("u", b"plain").unwrap().is_some());
}

#[test]
fn test_checkpoint_with_malformed_config_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let conn = open(dir.path());
    let err = conn.checkpoint("use_timestamp=maybe").unwrap_err();
    assert_eq!(err.code(), "EPOCH_MALFORMED_CONFIG");
    assert!(!dir.path().join("checkpoint.json").exists());
}
