//! SQLite-backed catalog store.
//!
//! Every mutation runs inside one IMMEDIATE transaction opened by
//! [`SqliteCatalogStore::write`]. Domain events emitted through the
//! transaction handle are published only after the commit succeeded.

use super::error::{CatalogError, CatalogResult};
use super::events::{
    ChangeOperation, DomainEvent, EntityKind, EventBuffer, EventSink, NoOpEventSink,
};
use super::schema::CATALOG_VERSIONED_SCHEMAS;
use crate::sqlite_persistence::migrate_if_needed;
use anyhow::{Context, Result};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::cell::RefCell;
use std::ops::Deref;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::{info, warn};

pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

/// A write transaction plus the events it produced so far.
///
/// Derefs to the underlying connection so read helpers taking `&Connection`
/// can be called with it directly.
pub struct CatalogTx<'conn> {
    tx: Transaction<'conn>,
    events: RefCell<EventBuffer>,
}

impl<'conn> CatalogTx<'conn> {
    pub fn emit(&self, entity: EntityKind, entity_id: impl Into<i64>, operation: ChangeOperation) {
        self.events.borrow_mut().push(DomainEvent {
            entity,
            entity_id: entity_id.into(),
            operation,
        });
    }

    pub fn pending_events(&self) -> usize {
        self.events.borrow().len()
    }
}

impl<'conn> Deref for CatalogTx<'conn> {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        &self.tx
    }
}

pub struct SqliteCatalogStore {
    conn: Arc<Mutex<Connection>>,
    sink: Arc<dyn EventSink>,
}

impl SqliteCatalogStore {
    /// Open (or create) the catalog database at `db_path`.
    pub fn open<P: AsRef<Path>>(db_path: P, busy_timeout: Duration) -> Result<Self> {
        let db_path = db_path.as_ref();
        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open catalog database {:?}", db_path))?;
        conn.busy_timeout(busy_timeout)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::from_connection(conn)
    }

    pub fn in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(mut conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        migrate_if_needed(&mut conn, CATALOG_VERSIONED_SCHEMAS)?;

        #[cfg(not(feature = "no_checks"))]
        {
            if let Some(schema) = CATALOG_VERSIONED_SCHEMAS.last() {
                schema.validate(&conn)?;
            }
        }

        let count = |table: &str| -> Result<i64> {
            conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))
                .with_context(|| format!("Failed to count rows of {}", table))
        };
        let release_count = count("releases")?;
        let recording_count = count("recordings")?;
        let group_count = count("track_groups")?;
        info!(
            "Opened edition catalog: {} releases, {} recordings, {} track groups",
            release_count, recording_count, group_count
        );

        Ok(SqliteCatalogStore {
            conn: Arc::new(Mutex::new(conn)),
            sink: Arc::new(NoOpEventSink),
        })
    }

    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    fn lock_conn(&self) -> CatalogResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| CatalogError::Unexpected("catalog connection mutex poisoned".into()))
    }

    /// Run `f` inside a single IMMEDIATE transaction.
    ///
    /// Commits and publishes the buffered events when `f` returns `Ok`,
    /// rolls back everything otherwise.
    pub fn write<T, F>(&self, f: F) -> CatalogResult<T>
    where
        F: FnOnce(&CatalogTx<'_>) -> CatalogResult<T>,
    {
        let (value, events) = {
            let mut conn = self.lock_conn()?;
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let catalog_tx = CatalogTx {
                tx,
                events: RefCell::new(EventBuffer::default()),
            };

            let result = f(&catalog_tx);
            match result {
                Ok(value) => {
                    let CatalogTx { tx, events } = catalog_tx;
                    tx.commit()?;
                    (value, events.into_inner())
                }
                Err(err) => {
                    warn!(
                        "Rolling back catalog transaction ({} pending events dropped): {}",
                        catalog_tx.pending_events(),
                        err
                    );
                    // Dropping the transaction rolls it back.
                    drop(catalog_tx);
                    return Err(err);
                }
            }
        };

        for event in events.into_events() {
            self.sink.publish(&event);
        }
        Ok(value)
    }

    pub fn read<T, F>(&self, f: F) -> CatalogResult<T>
    where
        F: FnOnce(&Connection) -> CatalogResult<T>,
    {
        let conn = self.lock_conn()?;
        f(&conn)
    }
}
