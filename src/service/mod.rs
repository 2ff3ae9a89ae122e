//! Catalog service: the call-site surface of the engine.
//!
//! Each operation takes the resource locks of the aggregates it touches, runs
//! in one transaction and honours the reconciliation obligations of its
//! mutation (every release reachable from a changed recording, work, track or
//! movement link gets its derived credits recomputed).

mod credits;
mod editions;
mod reference;
mod releases;
mod tracks;

use crate::catalog_store::{
    queries, CatalogResult, CatalogTx, LockKey, ReleaseId, ResourceLocks, SqliteCatalogStore,
};

pub struct CatalogService {
    store: SqliteCatalogStore,
    locks: ResourceLocks,
}

impl CatalogService {
    pub fn new(store: SqliteCatalogStore) -> Self {
        CatalogService {
            store,
            locks: ResourceLocks::new(),
        }
    }

    pub fn store(&self) -> &SqliteCatalogStore {
        &self.store
    }

    /// Run `f` in a write transaction while holding `keys`.
    fn locked_write<T, F>(&self, keys: impl IntoIterator<Item = LockKey>, f: F) -> CatalogResult<T>
    where
        F: FnOnce(&CatalogTx<'_>) -> CatalogResult<T>,
    {
        let _guard = self.locks.acquire(keys)?;
        self.store.write(f)
    }

    /// Lock keys for a release and every master it currently links to.
    fn release_and_masters_keys(&self, release: ReleaseId) -> CatalogResult<Vec<LockKey>> {
        let masters = self
            .store
            .read(|conn| match queries::find_release(conn, release)? {
                Some(found) => Ok(found.masters),
                None => Ok(Default::default()),
            })?;
        Ok(std::iter::once(LockKey::Release(release))
            .chain(masters.into_iter().map(LockKey::Release))
            .collect())
    }
}

fn release_keys(releases: impl IntoIterator<Item = ReleaseId>) -> Vec<LockKey> {
    releases.into_iter().map(LockKey::Release).collect()
}
