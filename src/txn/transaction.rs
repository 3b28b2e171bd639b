//! Transaction - an in-flight unit of work
//!
//! Writes are buffered privately until commit; the last write to a key wins.
//! Nothing in the version store changes until the transaction commits.

use std::collections::BTreeMap;

use crate::mvcc::VersionPayload;
use crate::timestamp::Timestamp;

/// Unique identifier for a transaction within one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TxnId(pub u64);

#[derive(Debug, Clone)]
pub struct Transaction {
    id: TxnId,
    read_timestamp: Option<Timestamp>,
    writes: BTreeMap<(String, Vec<u8>), VersionPayload>,
}

impl Transaction {
    pub(crate) fn new(id: TxnId, read_timestamp: Option<Timestamp>) -> Self {
        Self {
            id,
            read_timestamp,
            writes: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> TxnId {
        self.id
    }

    /// Read point chosen at begin; `None` reads the newest commit.
    pub fn read_timestamp(&self) -> Option<Timestamp> {
        self.read_timestamp
    }

    /// Buffers a value for `key`, replacing any earlier pending write.
    pub fn put(&mut self, table: &str, key: &[u8], value: &[u8]) {
        self.writes.insert(
            (table.to_string(), key.to_vec()),
            VersionPayload::Value(value.to_vec()),
        );
    }

    /// Buffers a deletion of `key`.
    pub fn remove(&mut self, table: &str, key: &[u8]) {
        self.writes
            .insert((table.to_string(), key.to_vec()), VersionPayload::Tombstone);
    }

    /// The pending write for a key, if this transaction made one.
    pub fn pending(&self, table: &str, key: &[u8]) -> Option<&VersionPayload> {
        self.writes.get(&(table.to_string(), key.to_vec()))
    }

    /// Pending writes to one table, in key order.
    pub fn pending_in<'a>(
        &'a self,
        table: &'a str,
    ) -> impl Iterator<Item = (&'a [u8], &'a VersionPayload)> + 'a {
        self.writes
            .iter()
            .filter(move |((t, _), _)| t == table)
            .map(|((_, k), v)| (k.as_slice(), v))
    }

    /// Number of distinct keys written.
    pub fn write_count(&self) -> usize {
        self.writes.len()
    }

    pub fn is_read_only(&self) -> bool {
        self.writes.is_empty()
    }

    pub(crate) fn writes(&self) -> &BTreeMap<(String, Vec<u8>), VersionPayload> {
        &self.writes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_write_to_key_wins() {
        let mut txn = Transaction::new(TxnId(1), None);
        txn.put("t", b"k", b"one");
        txn.put("t", b"k", b"two");
        assert_eq!(txn.write_count(), 1);
        assert_eq!(
            txn.pending("t", b"k"),
            Some(&VersionPayload::Value(b"two".to_vec()))
        );

        txn.remove("t", b"k");
        assert_eq!(txn.pending("t", b"k"), Some(&VersionPayload::Tombstone));
    }

    #[test]
    fn test_pending_in_filters_by_table() {
        let mut txn = Transaction::new(TxnId(1), Some(Timestamp::new(5)));
        txn.put("a", b"1", b"x");
        txn.put("b", b"2", b"y");
        let keys: Vec<&[u8]> = txn.pending_in("a").map(|(k, _)| k).collect();
        assert_eq!(keys, vec![&b"1"[..]]);
        assert_eq!(txn.read_timestamp(), Some(Timestamp::new(5)));
    }

    #[test]
    fn test_new_transaction_is_read_only() {
        let txn = Transaction::new(TxnId(9), None);
        assert!(txn.is_read_only());
        assert_eq!(txn.id(), TxnId(9));
    }
}
