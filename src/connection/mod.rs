//! Connection
//!
//! A `Connection` owns everything opened from one home directory: the
//! catalog, the version store, the timestamp oracle, the log writer, the
//! transaction manager and the checkpoint manager. It is cheap to clone and
//! safe to share across threads; each thread works through its own
//! [`Session`].
//!
//! Opening a home runs recovery before anything else can touch it.

mod session;

pub use session::Session;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::catalog::{Catalog, TableEntry};
use crate::checkpoint::{CheckpointManager, CheckpointMarker, CheckpointSources};
use crate::config::{
    parse_query_role, parse_timestamp_update, CheckpointOptions, ConnectionOptions,
    LogFlushOptions, TableOptions,
};
use crate::errors::{EngineError, EngineResult};
use crate::mvcc::VersionStore;
use crate::observability::{log_event_with_fields, Event};
use crate::recovery::{RecoveryManager, RecoveryStats};
use crate::sync::lock;
use crate::timestamp::{TimestampOracle, TimestampRole};
use crate::txn::TransactionManager;
use crate::wal::LogWriter;

pub(crate) struct ConnectionInner {
    home: PathBuf,
    options: ConnectionOptions,
    oracle: Arc<TimestampOracle>,
    store: Arc<VersionStore>,
    catalog: Arc<Catalog>,
    log: Option<Arc<Mutex<LogWriter>>>,
    txns: TransactionManager,
    checkpoints: CheckpointManager,
    recovery: RecoveryStats,
}

#[derive(Clone)]
pub struct Connection {
    inner: Arc<ConnectionInner>,
}

impl Connection {
    /// Opens the engine in `home`.
    ///
    /// Recognized options: `create` (make `home` if missing),
    /// `log=(enabled=true|false)` (default false), `readonly` (recover and
    /// serve reads without touching the home) and `compatibility=(release=…)`
    /// (ignored).
    pub fn open(home: impl AsRef<Path>, config: &str) -> EngineResult<Self> {
        let home = home.as_ref().to_path_buf();
        let options = ConnectionOptions::parse(config)?;

        if !home.is_dir() {
            if options.create && !options.readonly {
                fs::create_dir_all(&home).map_err(|e| EngineError::io(&home, e))?;
            } else {
                return Err(EngineError::io(
                    &home,
                    std::io::Error::new(std::io::ErrorKind::NotFound, "home directory not found"),
                ));
            }
        }

        let catalog = Arc::new(Catalog::open(&home)?);
        let recovered = RecoveryManager::recover(&home, &catalog, options.log_enabled)?;

        let log = if options.log_enabled && !options.readonly {
            Some(Arc::new(Mutex::new(LogWriter::open(&home)?)))
        } else {
            None
        };

        let store = Arc::new(recovered.store);
        let oracle = Arc::new(TimestampOracle::new());
        let txns = TransactionManager::new(
            store.clone(),
            oracle.clone(),
            catalog.clone(),
            log.clone(),
            recovered.last_commit,
        )
        .with_idle_log_lsn(recovered.log_lsn);
        let checkpoints = CheckpointManager::new(&home, recovered.marker.as_ref());

        let tables = catalog.entries().len().to_string();
        log_event_with_fields(
            Event::ConnectionOpen,
            &[
                ("home", &home.display().to_string()),
                ("log_enabled", if options.log_enabled { "true" } else { "false" }),
                ("readonly", if options.readonly { "true" } else { "false" }),
                ("tables", &tables),
            ],
        );

        Ok(Self {
            inner: Arc::new(ConnectionInner {
                home,
                options,
                oracle,
                store,
                catalog,
                log,
                txns,
                checkpoints,
                recovery: recovered.stats,
            }),
        })
    }

    /// The home directory this connection was opened on.
    pub fn home(&self) -> &Path {
        &self.inner.home
    }

    /// Whether the connection was opened with `log=(enabled)`.
    pub fn is_logging(&self) -> bool {
        self.inner.options.log_enabled
    }

    /// Whether writes are refused.
    pub fn is_readonly(&self) -> bool {
        self.inner.options.readonly
    }

    /// What recovery did when this connection was opened.
    pub fn recovery_stats(&self) -> &RecoveryStats {
        &self.inner.recovery
    }

    /// A new session. Sessions are not shared between threads.
    pub fn open_session(&self) -> Session {
        Session::new(self.inner.clone())
    }

    /// Every table in the catalog, ordered by name.
    pub fn tables(&self) -> Vec<TableEntry> {
        self.inner.catalog.entries()
    }

    /// Options: `log=(enabled=…)`, `key_format`, `value_format`.
    pub fn create_table(&self, name: &str, config: &str) -> EngineResult<TableEntry> {
        self.inner.create_table(name, config)
    }

    /// Options: `oldest_timestamp=<hex>`, `stable_timestamp=<hex>`.
    pub fn set_timestamp(&self, config: &str) -> EngineResult<()> {
        let update = parse_timestamp_update(config)?;
        match self.inner.oracle.set(update) {
            Ok(()) => {
                log_event_with_fields(Event::TimestampSet, &[("config", config)]);
                Ok(())
            }
            Err(e) => {
                let reason = e.to_string();
                log_event_with_fields(
                    Event::TimestampRejected,
                    &[("config", config), ("reason", &reason)],
                );
                Err(e.into())
            }
        }
    }

    /// Options: `get=all_committed|oldest|stable` (default `all_committed`).
    /// Unset timestamps report `"00"`.
    pub fn query_timestamp(&self, config: &str) -> EngineResult<String> {
        let role = parse_query_role(config)?;
        Ok(self.inner.oracle.query(role))
    }

    /// Options: `use_timestamp=true|false`, `read_timestamp=<hex>`.
    ///
    /// Writes every table at its cutoff and returns the new marker.
    pub fn checkpoint(&self, config: &str) -> EngineResult<CheckpointMarker> {
        self.inner.checkpoint(config)
    }

    /// Options: `sync=on|off` (default on).
    pub fn log_flush(&self, config: &str) -> EngineResult<()> {
        self.inner.log_flush(config)
    }

    /// Flushes and syncs the log. The connection stays usable through
    /// other clones.
    pub fn close(self) -> EngineResult<()> {
        if let Some(log) = &self.inner.log {
            lock(log).flush(true)?;
        }
        let all_committed = self.inner.oracle.query(TimestampRole::AllCommitted);
        log_event_with_fields(
            Event::ConnectionClose,
            &[
                ("all_committed", &all_committed),
                ("home", &self.inner.home.display().to_string()),
            ],
        );
        Ok(())
    }
}

impl ConnectionInner {
    pub(crate) fn check_writable(&self, operation: &'static str) -> EngineResult<()> {
        if self.options.readonly {
            return Err(EngineError::ReadOnly(operation));
        }
        Ok(())
    }

    fn create_table(&self, name: &str, config: &str) -> EngineResult<TableEntry> {
        self.check_writable("create")?;
        let options = TableOptions::parse(config)?;
        let entry = self.catalog.create(name, options)?;
        self.store.create_table(name);

        let id = entry.id.to_string();
        log_event_with_fields(
            Event::TableCreate,
            &[
                ("id", &id),
                ("log_enabled", if entry.options.log_enabled { "true" } else { "false" }),
                ("table", name),
            ],
        );
        Ok(entry)
    }

    fn checkpoint(&self, config: &str) -> EngineResult<CheckpointMarker> {
        let options = CheckpointOptions::parse(config)?;
        self.check_writable("checkpoint")?;
        let sources = CheckpointSources {
            catalog: &self.catalog,
            store: &self.store,
            txns: &self.txns,
            log: self.log.as_deref(),
        };
        Ok(self.checkpoints.create(sources, &options)?)
    }

    /// Without logging there is nothing buffered; the call succeeds.
    fn log_flush(&self, config: &str) -> EngineResult<()> {
        let options = LogFlushOptions::parse(config)?;
        if let Some(log) = &self.log {
            let mut writer = lock(log);
            writer.flush(options.sync)?;
            let lsn = writer.last_lsn().to_string();
            log_event_with_fields(
                Event::LogFlush,
                &[("last_lsn", &lsn), ("sync", if options.sync { "on" } else { "off" })],
            );
        }
        Ok(())
    }
}
