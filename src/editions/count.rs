//! Edition cohorts and their denormalized counts.

use crate::catalog_store::{
    mutations, queries, CatalogResult, CatalogTx, DocumentStatus, Release, ReleaseId,
};
use rusqlite::Connection;
use std::collections::BTreeSet;
use tracing::debug;

fn keep(release: &Release, statuses: &[DocumentStatus]) -> bool {
    !release.deleted && statuses.contains(&release.status)
}

/// Releases sharing `release`'s master-set shape, ordered by id.
///
/// For a master these are its subjects linked to it alone. For a subject
/// these are the other releases linked to exactly the same masters, plus the
/// master itself when there is only one. `release` is never part of the
/// result. Deleted releases are skipped, the others filtered by `statuses`.
pub fn same_editions_of(
    conn: &Connection,
    release: &Release,
    statuses: &[DocumentStatus],
) -> CatalogResult<Vec<Release>> {
    let mut cohort = Vec::new();

    if release.be_master {
        let only_this = BTreeSet::from([release.id]);
        for subject in queries::subjects_of(conn, release.id)? {
            if subject.masters == only_this && keep(&subject, statuses) {
                cohort.push(subject);
            }
        }
    } else if let Some(first_master) = release.masters.iter().next().copied() {
        for sibling in queries::subjects_of(conn, first_master)? {
            if sibling.id != release.id
                && sibling.masters == release.masters
                && keep(&sibling, statuses)
            {
                cohort.push(sibling);
            }
        }
        if release.masters.len() == 1 {
            if let Some(master) = queries::find_release(conn, first_master)? {
                if keep(&master, statuses) {
                    cohort.push(master);
                }
            }
        }
    }

    cohort.sort_by_key(|r| r.id);
    Ok(cohort)
}

/// Id-level convenience over [`same_editions_of`].
pub fn same_editions(
    conn: &Connection,
    release: ReleaseId,
    statuses: &[DocumentStatus],
) -> CatalogResult<Vec<Release>> {
    let release = queries::get_release(conn, release)?;
    same_editions_of(conn, &release, statuses)
}

/// Write the cohort counts of `ids` onto every one of them.
///
/// `back_edition_count` counts the unarchived members, `front_edition_count`
/// the published ones. Only rows whose counts differ are written. Returns the
/// releases that changed.
pub fn refresh_edition_counts(
    tx: &CatalogTx,
    ids: &[ReleaseId],
) -> CatalogResult<Vec<ReleaseId>> {
    let unique: BTreeSet<ReleaseId> = ids.iter().copied().collect();
    let mut members = Vec::with_capacity(unique.len());
    for id in unique {
        if let Some(release) = queries::find_release(tx, id)? {
            members.push(release);
        }
    }

    let back = members.iter().filter(|r| !r.is_archived()).count() as i64;
    let front = members
        .iter()
        .filter(|r| r.status == DocumentStatus::Published)
        .count() as i64;

    let mut changed = Vec::new();
    for member in &members {
        if mutations::set_edition_counts(tx, member.id, back, front)? {
            changed.push(member.id);
        }
    }
    if !changed.is_empty() {
        debug!(
            "Edition counts back={} front={} written to releases {:?}",
            back, front, changed
        );
    }
    Ok(changed)
}

/// Recompute the counts of `release`'s cohort.
///
/// The cohort is every unarchived same-edition release plus `release` itself
/// when it is neither archived nor deleted. A missing release is ignored.
pub fn refresh_edition_count(tx: &CatalogTx, release: ReleaseId) -> CatalogResult<Vec<ReleaseId>> {
    let Some(release) = queries::find_release(tx, release)? else {
        return Ok(Vec::new());
    };
    let mut ids: Vec<ReleaseId> = same_editions_of(tx, &release, &DocumentStatus::UNARCHIVED)?
        .into_iter()
        .map(|r| r.id)
        .collect();
    if !release.is_archived() && !release.deleted {
        ids.push(release.id);
    }
    refresh_edition_counts(tx, &ids)
}

/// Refresh the cohorts of several releases at once.
pub fn refresh_edition_count_all(
    tx: &CatalogTx,
    releases: impl IntoIterator<Item = ReleaseId>,
) -> CatalogResult<()> {
    let mut done = BTreeSet::new();
    for release in releases {
        if done.insert(release) {
            refresh_edition_count(tx, release)?;
        }
    }
    Ok(())
}
