//! Coarse resource-keyed locks.
//!
//! A whole release (or release pair), recording or work is locked for the
//! duration of a mutation. All keys of one operation are taken at once, so
//! two operations never hold parts of each other's key set.

use super::error::{CatalogError, CatalogResult};
use super::models::{RecordingId, ReleaseId, WorkId};
use std::collections::HashSet;
use std::sync::{Condvar, Mutex, MutexGuard};
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LockKey {
    Release(ReleaseId),
    Recording(RecordingId),
    Work(WorkId),
}

#[derive(Default)]
pub struct ResourceLocks {
    held: Mutex<HashSet<LockKey>>,
    released: Condvar,
}

/// Holds a set of keys until dropped.
pub struct ResourceGuard<'a> {
    locks: &'a ResourceLocks,
    keys: Vec<LockKey>,
}

impl ResourceLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until none of `keys` is held, then take them all.
    pub fn acquire(
        &self,
        keys: impl IntoIterator<Item = LockKey>,
    ) -> CatalogResult<ResourceGuard<'_>> {
        let mut keys: Vec<LockKey> = keys.into_iter().collect();
        let mut unique = HashSet::new();
        keys.retain(|k| unique.insert(*k));

        let mut held = self.lock_held()?;
        while keys.iter().any(|k| held.contains(k)) {
            debug!("Waiting for resource locks {:?}", keys);
            held = self
                .released
                .wait(held)
                .map_err(|_| CatalogError::Unexpected("resource lock table poisoned".into()))?;
        }
        held.extend(keys.iter().copied());
        Ok(ResourceGuard { locks: self, keys })
    }

    pub fn is_held(&self, key: LockKey) -> bool {
        self.lock_held().map(|h| h.contains(&key)).unwrap_or(false)
    }

    fn lock_held(&self) -> CatalogResult<MutexGuard<'_, HashSet<LockKey>>> {
        self.held
            .lock()
            .map_err(|_| CatalogError::Unexpected("resource lock table poisoned".into()))
    }
}

impl Drop for ResourceGuard<'_> {
    fn drop(&mut self) {
        let mut held = match self.locks.held.lock() {
            Ok(held) => held,
            Err(poisoned) => poisoned.into_inner(),
        };
        for key in &self.keys {
            held.remove(key);
        }
        drop(held);
        self.locks.released.notify_all();
    }
}
