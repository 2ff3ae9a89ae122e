//! Keyed set reconciliation.
//!
//! Diffs an existing collection against a desired one and patches the
//! difference through callbacks. Used for derived release credits, recording
//! credit list edits, catalog numbers and issues.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::hash::Hash;

/// Counts of what a reconcile pass wrote.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PatchStats {
    pub removed: usize,
    pub added: usize,
    pub updated: usize,
}

impl PatchStats {
    pub fn writes(&self) -> usize {
        self.removed + self.added + self.updated
    }

    pub fn is_noop(&self) -> bool {
        self.writes() == 0
    }
}

impl std::ops::AddAssign for PatchStats {
    fn add_assign(&mut self, other: PatchStats) {
        self.removed += other.removed;
        self.added += other.added;
        self.updated += other.updated;
    }
}

/// Patch `existing` towards `desired`, matching elements by key.
///
/// - desired elements sharing a key collapse to the first one
/// - an existing element is kept per desired key, extra duplicates are removed
/// - removals run before additions, in input order
///
/// `on_update` is called for every matched pair and returns whether it wrote.
pub fn reconcile<E, D, K, Err>(
    existing: impl IntoIterator<Item = E>,
    desired: impl IntoIterator<Item = D>,
    existing_key: impl Fn(&E) -> K,
    desired_key: impl Fn(&D) -> K,
    mut on_remove: impl FnMut(E) -> Result<(), Err>,
    mut on_add: impl FnMut(D) -> Result<(), Err>,
    mut on_update: impl FnMut(&E, D) -> Result<bool, Err>,
) -> Result<PatchStats, Err>
where
    K: Eq + Hash + Clone,
{
    let mut stats = PatchStats::default();

    let mut desired_order = Vec::new();
    let mut desired_by_key = HashMap::new();
    for item in desired {
        let key = desired_key(&item);
        if let Entry::Vacant(slot) = desired_by_key.entry(key.clone()) {
            slot.insert(item);
            desired_order.push(key);
        }
    }

    let mut kept: HashMap<K, E> = HashMap::new();
    for item in existing {
        let key = existing_key(&item);
        if desired_by_key.contains_key(&key) && !kept.contains_key(&key) {
            kept.insert(key, item);
        } else {
            on_remove(item)?;
            stats.removed += 1;
        }
    }

    for key in desired_order {
        let Some(item) = desired_by_key.remove(&key) else {
            continue;
        };
        match kept.get(&key) {
            Some(current) => {
                if on_update(current, item)? {
                    stats.updated += 1;
                }
            }
            None => {
                on_add(item)?;
                stats.added += 1;
            }
        }
    }

    Ok(stats)
}
