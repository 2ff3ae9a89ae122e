//! Edition graph: linking subjects to masters, unlinking, promotion and
//! pulling a master's track list into stale subjects.
//!
//! Every operation here runs inside the caller's transaction. A failure at
//! any step rolls back the whole mutation, fan-out writes included.

mod count;

pub use count::{
    refresh_edition_count, refresh_edition_count_all, refresh_edition_counts, same_editions,
    same_editions_of,
};

use crate::catalog_store::{
    mutations, queries, CatalogError, CatalogResult, CatalogTx, DocumentStatus, Freshness,
    Release, ReleaseId, TrackGroup,
};
use crate::credits;
use crate::track_groups;
use std::collections::BTreeSet;
use tracing::info;

fn dedupe(ids: &[ReleaseId]) -> Vec<ReleaseId> {
    let mut seen = BTreeSet::new();
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

/// Link `subject_id` to each of `master_ids`, copying every master's track
/// group onto the subject.
///
/// A standalone subject that already holds tracks of its own is only linked
/// with `force`, in which case its own group is discarded first. Returns the
/// inherited groups created.
pub fn relation_to_master(
    tx: &CatalogTx,
    subject_id: ReleaseId,
    master_ids: &[ReleaseId],
    force: bool,
) -> CatalogResult<Vec<TrackGroup>> {
    let subject = queries::get_unarchived_release(tx, subject_id)?;
    let master_ids = dedupe(master_ids);
    if master_ids.is_empty() {
        return Err(CatalogError::illegal("no master release given"));
    }
    if subject.be_master && !queries::subjects_of(tx, subject_id)?.is_empty() {
        return Err(CatalogError::illegal(format!(
            "release {} is a master with subjects and cannot become a subject",
            subject_id
        )));
    }

    let mut masters = Vec::with_capacity(master_ids.len());
    for master_id in &master_ids {
        if *master_id == subject_id {
            return Err(CatalogError::illegal(format!(
                "release {} cannot be its own master",
                subject_id
            )));
        }
        let master = queries::get_unarchived_release(tx, *master_id)?;
        if !master.be_master {
            return Err(CatalogError::illegal(format!(
                "release {} is not a master",
                master_id
            )));
        }
        if subject.masters.contains(master_id) {
            return Err(CatalogError::Conflict(format!(
                "release {} is already linked to master {}",
                subject_id, master_id
            )));
        }
        masters.push(master);
    }

    if subject.is_standalone() {
        discard_own_group(tx, &subject, force)?;
    }

    let old_masters = subject.masters.clone();
    mutations::set_be_master(tx, subject_id, false)?;
    let mut inherited = Vec::with_capacity(masters.len());
    for master in &masters {
        mutations::add_subject_master(tx, subject_id, master.id)?;
        let master_group = track_groups::master_group_or_create(tx, master.id)?;
        inherited.push(track_groups::copy(tx, master_group.id, subject_id)?);
    }
    info!(
        "Linked release {} to masters {:?} ({} groups copied)",
        subject_id,
        master_ids,
        inherited.len()
    );

    refresh_edition_count_all(
        tx,
        std::iter::once(subject_id)
            .chain(master_ids.iter().copied())
            .chain(old_masters),
    )?;
    credits::reconcile(tx, subject_id)?;
    Ok(inherited)
}

fn discard_own_group(tx: &CatalogTx, subject: &Release, force: bool) -> CatalogResult<()> {
    for group in queries::track_groups_of_release(tx, subject.id)? {
        if !group.is_own() {
            continue;
        }
        let tracks = queries::tracks_of_group(tx, group.id)?;
        if !tracks.is_empty() && !force {
            return Err(CatalogError::Conflict(format!(
                "release {} has its own tracks; link with force to replace them",
                subject.id
            )));
        }
        mutations::delete_track_group(tx, group.id)?;
        track_groups::retire_unused_recordings(tx, tracks.iter().map(|t| t.recording_id))?;
        info!(
            "Discarded own track group {} of release {} before linking",
            group.id, subject.id
        );
    }
    Ok(())
}

/// Unlink `subject_id` from each of `master_ids`, deleting the groups it
/// inherited from them. A subject left without masters is standalone again.
pub fn clear_relation_to_master(
    tx: &CatalogTx,
    subject_id: ReleaseId,
    master_ids: &[ReleaseId],
) -> CatalogResult<()> {
    let subject = queries::get_unarchived_release(tx, subject_id)?;
    let master_ids = dedupe(master_ids);
    if master_ids.is_empty() {
        return Err(CatalogError::illegal("no master release given"));
    }
    for master_id in &master_ids {
        if !subject.masters.contains(master_id) {
            return Err(CatalogError::illegal(format!(
                "release {} is not linked to master {}",
                subject_id, master_id
            )));
        }
    }

    // Everyone sharing a master loses a cohort member, snapshot before unlinking.
    let mut affected: Vec<ReleaseId> = vec![subject_id];
    for master_id in &master_ids {
        affected.push(*master_id);
        affected.extend(
            queries::subject_ids_of(tx, *master_id)?
                .into_iter()
                .filter(|id| *id != subject_id),
        );
    }

    for master_id in &master_ids {
        track_groups::clear_relation(tx, subject_id, *master_id)?;
        mutations::remove_subject_master(tx, subject_id, *master_id)?;
    }
    if queries::release_masters(tx, subject_id)?.is_empty() {
        mutations::set_be_master(tx, subject_id, true)?;
    }
    info!("Unlinked release {} from masters {:?}", subject_id, master_ids);

    refresh_edition_count_all(tx, affected)?;
    credits::reconcile(tx, subject_id)?;
    Ok(())
}

/// Promote a single-master subject to master of its edition cohort.
///
/// The old master and its other single-master subjects become subjects of
/// `release_id`, their inherited groups re-pointed to its group and marked
/// stale. Returns the cohort that now follows `release_id`.
pub fn set_as_master(tx: &CatalogTx, release_id: ReleaseId) -> CatalogResult<Vec<ReleaseId>> {
    let release = queries::get_unarchived_release(tx, release_id)?;
    if release.masters.len() != 1 {
        return Err(CatalogError::illegal(format!(
            "release {} links to {} masters; only a single-master subject can be promoted",
            release_id,
            release.masters.len()
        )));
    }
    let Some(old_master) = release.masters.iter().next().copied() else {
        return Err(CatalogError::Unexpected("masters set emptied".into()));
    };
    for subject in queries::subjects_of(tx, old_master)? {
        if subject.masters.len() > 1 {
            return Err(CatalogError::illegal(format!(
                "master {} has multi-master subject {}: promoting {} would leave it linked to \
                 a release that is no longer a master; unlink it first",
                old_master, subject.id, release_id
            )));
        }
    }

    let cohort: Vec<ReleaseId> = same_editions_of(tx, &release, &DocumentStatus::ALL)?
        .into_iter()
        .map(|r| r.id)
        .collect();
    if cohort.is_empty() {
        return Err(CatalogError::illegal(format!(
            "release {} has no editions to inherit from",
            release_id
        )));
    }

    // Soft-deleted subjects of the old master follow the promotion too, so no
    // release is left linked to a non-master.
    let mut deleted_followers = Vec::new();
    for id in queries::subject_ids_of(tx, old_master)? {
        if queries::find_release(tx, id)?.is_some_and(|r| r.deleted) {
            deleted_followers.push(id);
        }
    }

    let old_master_group = queries::track_groups_of_release(tx, old_master)?
        .into_iter()
        .next();

    let mut groups = queries::track_groups_of_release(tx, release_id)?;
    let survivor = match groups.len() {
        0 => {
            return Err(CatalogError::Unexpected(format!(
                "subject {} owns no track group",
                release_id
            )))
        }
        1 => groups.remove(0),
        _ => track_groups::merge(tx, groups)?.0,
    };
    mutations::set_group_origin(tx, survivor.id, None, Freshness::SelfAuthored)?;

    if let Some(old_group) = old_master_group {
        let mut repointed = vec![old_group.clone()];
        repointed.extend(queries::groups_linked_to(tx, old_group.id)?);
        for group in repointed {
            if group.id != survivor.id {
                mutations::set_group_origin(
                    tx,
                    group.id,
                    Some(survivor.id),
                    Freshness::InheritedStale,
                )?;
            }
        }
    }

    for member in &cohort {
        mutations::clear_subject_masters(tx, *member)?;
        mutations::set_be_master(tx, *member, false)?;
        mutations::add_subject_master(tx, *member, release_id)?;
    }
    for follower in &deleted_followers {
        mutations::remove_subject_master(tx, *follower, old_master)?;
        mutations::add_subject_master(tx, *follower, release_id)?;
    }
    mutations::clear_subject_masters(tx, release_id)?;
    mutations::set_be_master(tx, release_id, true)?;
    info!(
        "Promoted release {} to master of {:?} (was subject of {}, deleted followers {:?})",
        release_id, cohort, old_master, deleted_followers
    );

    refresh_edition_count(tx, release_id)?;
    credits::reconcile_releases(tx, std::iter::once(release_id).chain(cohort.iter().copied()))?;
    Ok(cohort)
}

/// Pull the master's current tracks into every stale inherited group.
///
/// Returns the distinct releases refreshed, empty when nothing was stale.
/// A master with no tracks has nothing to propagate and is rejected.
pub fn sync_subjects(tx: &CatalogTx, master_id: ReleaseId) -> CatalogResult<Vec<ReleaseId>> {
    let master = queries::get_unarchived_release(tx, master_id)?;
    if !master.be_master {
        return Err(CatalogError::illegal(format!(
            "release {} is not a master",
            master_id
        )));
    }
    let Some(master_group) = queries::track_groups_of_release(tx, master_id)?
        .into_iter()
        .next()
    else {
        return Err(CatalogError::illegal(format!(
            "master {} owns no tracks to propagate",
            master_id
        )));
    };

    let mut stale: Vec<TrackGroup> = Vec::new();
    for group in queries::groups_linked_to(tx, master_group.id)? {
        if group.freshness != Freshness::InheritedStale {
            continue;
        }
        if queries::find_release(tx, group.release_id)?.is_some_and(|r| !r.deleted) {
            stale.push(group);
        }
    }
    if stale.is_empty() {
        return Ok(Vec::new());
    }

    let tracks = queries::tracks_of_group(tx, master_group.id)?;
    if tracks.is_empty() {
        return Err(CatalogError::illegal(format!(
            "master {} owns no tracks to propagate",
            master_id
        )));
    }

    let mut touched = Vec::new();
    for group in &stale {
        track_groups::refresh_from(tx, group, &tracks)?;
        if !touched.contains(&group.release_id) {
            touched.push(group.release_id);
        }
    }
    info!(
        "Synced {} stale groups of master {} into releases {:?}",
        stale.len(),
        master_id,
        touched
    );

    credits::reconcile_releases(tx, touched.iter().copied())?;
    Ok(touched)
}
