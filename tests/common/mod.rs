//! Common test infrastructure
//!
//! Tests should only import from this module, not from internal submodules.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::TestCatalog;
//!
//! #[test]
//! fn test_standalone_release() {
//!     let catalog = TestCatalog::new();
//!     let release = catalog.release("Some release");
//!     assert!(catalog.service.get_release(release).unwrap().be_master);
//! }
//! ```

mod constants;
mod fixtures;

// Public API - this is what tests import
#[allow(unused_imports)]
pub use constants::*;
#[allow(unused_imports)]
pub use fixtures::{credit, ComposedWork, CreditRow, TestCatalog, TrackRow};
