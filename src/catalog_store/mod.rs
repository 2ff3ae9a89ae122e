//! Catalog storage: models, schema, the SQLite store and its transaction
//! handle, domain events and resource locks.

mod error;
mod events;
mod locks;
mod models;
pub mod mutations;
pub mod queries;
mod schema;
mod store;

pub use error::{CatalogError, CatalogResult};
pub use events::{
    ChangeOperation, CollectingEventSink, DomainEvent, EntityKind, EventBuffer, EventSink,
    LoggingEventSink, NoOpEventSink,
};
pub use locks::{LockKey, ResourceGuard, ResourceLocks};
pub use models::*;
pub use schema::CATALOG_VERSIONED_SCHEMAS;
pub use store::{CatalogTx, SqliteCatalogStore, DEFAULT_BUSY_TIMEOUT};
