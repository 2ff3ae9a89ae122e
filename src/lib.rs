//! Edition & credit synchronization for a music catalog.
//!
//! This library exposes the engine modules for the command-line tool and for
//! integration tests.

pub mod catalog_store;
pub mod config;
pub mod credits;
pub mod editions;
pub mod integrity;
pub mod service;
pub mod sqlite_persistence;
pub mod sync;
pub mod track_groups;

// Re-export commonly used types for convenience
pub use catalog_store::{CatalogError, CatalogResult, SqliteCatalogStore};
pub use service::CatalogService;
