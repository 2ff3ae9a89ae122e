//! Track group lifecycle: creation, copy, merge, teardown and staleness.
//!
//! A master release owns at most one group. A subject owns at most one group
//! of its own plus one inherited group per linked master, each pointing at
//! the master's group through `master_group_id`.

use crate::catalog_store::{
    mutations, queries, CatalogError, CatalogResult, CatalogTx, Freshness, RecordingId,
    ReleaseId, Track, TrackGroup, TrackGroupId,
};
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Create a group on `release`.
///
/// With `master_group = None` this is the release's own group; otherwise the
/// group inherits from `master_group`.
pub fn create(
    tx: &CatalogTx,
    release_id: ReleaseId,
    master_group: Option<TrackGroupId>,
    freshness: Freshness,
) -> CatalogResult<TrackGroup> {
    let release = queries::get_release(tx, release_id)?;
    let groups = queries::track_groups_of_release(tx, release_id)?;

    match master_group {
        None => {
            if groups.iter().any(TrackGroup::is_own) {
                return Err(CatalogError::illegal(format!(
                    "release {} already owns a track group",
                    release_id
                )));
            }
            if release.be_master && !groups.is_empty() {
                return Err(CatalogError::illegal(format!(
                    "master release {} can only own one track group",
                    release_id
                )));
            }
        }
        Some(origin) => {
            if release.be_master {
                return Err(CatalogError::illegal(format!(
                    "master release {} cannot inherit track group {}",
                    release_id, origin
                )));
            }
            if groups.iter().any(|g| g.master_group_id == Some(origin)) {
                return Err(CatalogError::illegal(format!(
                    "release {} already inherits track group {}",
                    release_id, origin
                )));
            }
        }
    }

    let position = groups.iter().map(|g| g.position).max().unwrap_or(0) + 1;
    let title = match master_group {
        Some(origin) => queries::get_track_group(tx, origin)?.title,
        None => None,
    };
    mutations::insert_track_group(
        tx,
        release_id,
        master_group,
        freshness,
        position,
        title.as_deref(),
    )
}

/// The release's own group, created on first use.
pub fn own_group_or_create(tx: &CatalogTx, release: ReleaseId) -> CatalogResult<TrackGroup> {
    if let Some(group) = queries::track_groups_of_release(tx, release)?
        .into_iter()
        .find(TrackGroup::is_own)
    {
        return Ok(group);
    }
    create(tx, release, None, Freshness::SelfAuthored)
}

/// The single group of a master release, created empty if it has none yet.
pub fn master_group_or_create(tx: &CatalogTx, master: ReleaseId) -> CatalogResult<TrackGroup> {
    let mut groups = queries::track_groups_of_release(tx, master)?;
    match groups.len() {
        0 => create(tx, master, None, Freshness::SelfAuthored),
        1 => Ok(groups.remove(0)),
        n => Err(CatalogError::Unexpected(format!(
            "master release {} owns {} track groups",
            master, n
        ))),
    }
}

fn clone_tracks(
    tx: &CatalogTx,
    tracks: &[Track],
    target_release: ReleaseId,
    target_group: TrackGroupId,
) -> CatalogResult<()> {
    for track in tracks {
        mutations::insert_track(
            tx,
            target_release,
            target_group,
            track.recording_id,
            track.position,
            track.side.as_deref(),
        )?;
    }
    Ok(())
}

/// Deep-copy `origin` onto `target_release` as an inherited, fresh group.
///
/// Tracks keep position, side and recording.
pub fn copy(
    tx: &CatalogTx,
    origin: TrackGroupId,
    target_release: ReleaseId,
) -> CatalogResult<TrackGroup> {
    let tracks = queries::tracks_of_group(tx, origin)?;
    let group = create(tx, target_release, Some(origin), Freshness::InheritedFresh)?;
    clone_tracks(tx, &tracks, target_release, group.id)?;
    debug!(
        "Copied {} tracks of group {} into group {} of release {}",
        tracks.len(),
        origin,
        group.id,
        target_release
    );
    Ok(group)
}

/// Merge `groups` into the single one among them with no origin.
///
/// Tracks of the other groups are reparented with their positions kept and
/// the emptied groups are deleted. Returns the survivor and the removed ids.
pub fn merge(
    tx: &CatalogTx,
    groups: Vec<TrackGroup>,
) -> CatalogResult<(TrackGroup, Vec<TrackGroupId>)> {
    if groups.len() <= 1 {
        return Err(CatalogError::illegal(
            "merging track groups requires more than one group",
        ));
    }
    let (mut own, donors): (Vec<TrackGroup>, Vec<TrackGroup>) =
        groups.into_iter().partition(TrackGroup::is_own);
    if own.len() != 1 {
        return Err(CatalogError::illegal(format!(
            "merging track groups requires exactly one own group, found {}",
            own.len()
        )));
    }
    let survivor = own.remove(0);

    let mut removed = Vec::with_capacity(donors.len());
    for donor in donors {
        let moved = mutations::reparent_tracks(tx, donor.id, survivor.id)?;
        mutations::delete_track_group(tx, donor.id)?;
        debug!(
            "Merged {} tracks of group {} into group {}",
            moved, donor.id, survivor.id
        );
        removed.push(donor.id);
    }
    Ok((survivor, removed))
}

/// Delete the subject's group inherited from `master`, with its tracks.
///
/// Returns the deleted group, `None` when the subject holds no such group.
pub fn clear_relation(
    tx: &CatalogTx,
    subject: ReleaseId,
    master: ReleaseId,
) -> CatalogResult<Option<TrackGroupId>> {
    let master_groups = queries::track_groups_of_release(tx, master)?;
    let Some(master_group) = master_groups.first() else {
        return Ok(None);
    };
    let inherited = queries::track_groups_of_release(tx, subject)?
        .into_iter()
        .find(|g| g.master_group_id == Some(master_group.id));
    match inherited {
        Some(group) => {
            mutations::delete_track_group(tx, group.id)?;
            info!(
                "Deleted track group {} of release {} inherited from release {}",
                group.id, subject, master
            );
            Ok(Some(group.id))
        }
        None => Ok(None),
    }
}

/// Soft delete those of `recordings` no track references any more.
pub fn retire_unused_recordings(
    tx: &CatalogTx,
    recordings: impl IntoIterator<Item = RecordingId>,
) -> CatalogResult<Vec<RecordingId>> {
    let mut retired = Vec::new();
    for recording in recordings.into_iter().collect::<BTreeSet<_>>() {
        if queries::track_count_of_recording(tx, recording)? == 0 {
            mutations::set_recording_deleted(tx, recording)?;
            retired.push(recording);
        }
    }
    if !retired.is_empty() {
        debug!("Soft deleted recordings {:?} left without tracks", retired);
    }
    Ok(retired)
}

/// Record that a group's tracks changed.
///
/// An own group marks every group inheriting from it stale; an inherited
/// group marks itself stale. Returns the groups whose freshness changed.
pub fn mark_stale(tx: &CatalogTx, group_id: TrackGroupId) -> CatalogResult<Vec<TrackGroupId>> {
    let group = queries::get_track_group(tx, group_id)?;
    let targets: Vec<TrackGroupId> = if group.is_own() {
        queries::groups_linked_to(tx, group_id)?
            .into_iter()
            .map(|g| g.id)
            .collect()
    } else {
        vec![group_id]
    };

    let mut changed = Vec::new();
    for target in targets {
        if mutations::set_group_freshness(tx, target, Freshness::InheritedStale)? {
            changed.push(target);
        }
    }
    Ok(changed)
}

/// Replace the tracks of an inherited group with a fresh copy of `tracks`.
pub fn refresh_from(
    tx: &CatalogTx,
    group: &TrackGroup,
    tracks: &[Track],
) -> CatalogResult<()> {
    mutations::delete_tracks_of_group(tx, group.id)?;
    clone_tracks(tx, tracks, group.release_id, group.id)?;
    mutations::set_group_freshness(tx, group.id, Freshness::InheritedFresh)?;
    Ok(())
}
