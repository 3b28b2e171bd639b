//! Timestamp Oracle - connection-wide oldest/stable/all-committed timestamps
//!
//! Invariants:
//! - `oldest` and `stable` never move backward
//! - when both are set, `oldest <= stable`
//! - a rejected update leaves every role untouched
//!
//! Updates take the write lock. Commit and begin validation hold a read guard
//! for the duration of the commit, so a concurrent `set` cannot slip an
//! `oldest` past a commit that was already accepted.

use std::sync::{Mutex, RwLock, RwLockReadGuard};

use crate::sync::{lock, read, write};

use super::errors::{TimestampError, TimestampResult};
use super::{Timestamp, TimestampRole};

#[derive(Debug, Default, Clone, Copy)]
struct OracleState {
    oldest: Option<Timestamp>,
    stable: Option<Timestamp>,
}

/// A requested change to the oracle. Both roles may move in one call.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TimestampUpdate {
    pub oldest: Option<Timestamp>,
    pub stable: Option<Timestamp>,
}

/// Holds process-wide timestamps for one connection.
#[derive(Debug, Default)]
pub struct TimestampOracle {
    state: RwLock<OracleState>,
    /// Highest commit timestamp of any committed transaction.
    all_committed: Mutex<Option<Timestamp>>,
}

/// Read guard pinning `oldest` while a begin or commit is validated and applied.
pub struct OracleGuard<'a> {
    state: RwLockReadGuard<'a, OracleState>,
}

impl OracleGuard<'_> {
    /// Rejects `requested` if it is older than the current oldest timestamp.
    pub fn check_not_too_old(&self, role: &'static str, requested: Timestamp) -> TimestampResult<()> {
        match self.state.oldest {
            Some(oldest) if requested < oldest => Err(TimestampError::TooOld {
                role,
                requested,
                oldest,
            }),
            _ => Ok(()),
        }
    }

    /// Stable timestamp as of when the guard was taken.
    pub fn stable(&self) -> Option<Timestamp> {
        self.state.stable
    }
}

impl TimestampOracle {
    /// An oracle with every role unset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies an update atomically.
    pub fn set(&self, update: TimestampUpdate) -> TimestampResult<()> {
        let mut state = write(&self.state);

        let oldest = Self::advance(TimestampRole::Oldest, state.oldest, update.oldest)?;
        let stable = Self::advance(TimestampRole::Stable, state.stable, update.stable)?;

        if let (Some(oldest), Some(stable)) = (oldest, stable) {
            if oldest > stable {
                return Err(TimestampError::OldestPastStable { oldest, stable });
            }
        }

        state.oldest = oldest;
        state.stable = stable;
        Ok(())
    }

    fn advance(
        role: TimestampRole,
        current: Option<Timestamp>,
        requested: Option<Timestamp>,
    ) -> TimestampResult<Option<Timestamp>> {
        match (current, requested) {
            (Some(current), Some(requested)) if requested < current => {
                Err(TimestampError::MovedBackward {
                    role,
                    current,
                    requested,
                })
            }
            (_, Some(requested)) => Ok(Some(requested)),
            (current, None) => Ok(current),
        }
    }

    /// Returns the current value of a role, `None` if never set.
    pub fn get(&self, role: TimestampRole) -> Option<Timestamp> {
        match role {
            TimestampRole::Oldest => read(&self.state).oldest,
            TimestampRole::Stable => read(&self.state).stable,
            TimestampRole::AllCommitted => *lock(&self.all_committed),
        }
    }

    /// Returns the hex form of a role; roles never set report zero.
    pub fn query(&self, role: TimestampRole) -> String {
        self.get(role).unwrap_or(Timestamp::ZERO).to_hex()
    }

    /// Pins `oldest` and `stable` until the guard is dropped. Setters wait
    /// for outstanding guards.
    pub fn guard(&self) -> OracleGuard<'_> {
        OracleGuard {
            state: read(&self.state),
        }
    }

    /// Records a committed timestamp for `all_committed`.
    pub fn record_commit(&self, ts: Timestamp) {
        let mut all = lock(&self.all_committed);
        if all.map_or(true, |current| ts > current) {
            *all = Some(ts);
        }
    }
}
