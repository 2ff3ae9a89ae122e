use super::CatalogService;
use crate::catalog_store::{
    mutations, queries, CatalogError, CatalogResult, CatalogTx, LockKey, Move, MovementId,
    NewRecording, RecordingId, ReleaseId, Track, TrackGroupId, TrackId, WorkId,
};
use crate::credits::{self, ReconcileOutcome};
use crate::track_groups;
use std::collections::BTreeSet;
use tracing::info;

/// Append a track for `recording` to the release's own group.
fn append_track(
    tx: &CatalogTx,
    release: ReleaseId,
    recording: RecordingId,
    side: Option<&str>,
) -> CatalogResult<Track> {
    queries::get_recording(tx, recording)?;
    let group = track_groups::own_group_or_create(tx, release)?;
    let position = queries::max_track_position(tx, release)? + 1;
    let track = mutations::insert_track(tx, release, group.id, recording, position, side)?;
    track_groups::mark_stale(tx, group.id)?;
    Ok(track)
}

fn track_of_release(tx: &CatalogTx, release: ReleaseId, track: TrackId) -> CatalogResult<Track> {
    let track = queries::get_track(tx, track)?;
    if track.release_id != release {
        return Err(CatalogError::not_found("Track", track.id));
    }
    Ok(track)
}

impl CatalogService {
    pub fn add_track(
        &self,
        release: ReleaseId,
        recording: RecordingId,
        side: Option<&str>,
    ) -> CatalogResult<Track> {
        self.locked_write(
            [LockKey::Release(release), LockKey::Recording(recording)],
            |tx| {
                queries::get_unarchived_release(tx, release)?;
                let track = append_track(tx, release, recording, side)?;
                credits::reconcile(tx, release)?;
                Ok(track)
            },
        )
    }

    /// Create a recording of `work` and append it as a track.
    pub fn add_track_by_work(
        &self,
        release: ReleaseId,
        work: WorkId,
        side: Option<&str>,
    ) -> CatalogResult<Track> {
        self.locked_write([LockKey::Release(release), LockKey::Work(work)], |tx| {
            queries::get_unarchived_release(tx, release)?;
            let work = queries::get_work(tx, work)?;
            let recording = mutations::insert_recording(
                tx,
                &NewRecording {
                    title: work.title,
                    work_id: Some(work.id),
                    movement_id: None,
                },
            )?;
            let track = append_track(tx, release, recording, side)?;
            credits::reconcile(tx, release)?;
            Ok(track)
        })
    }

    /// Create one recording per movement and append them in the given order.
    pub fn add_tracks_by_movements(
        &self,
        release: ReleaseId,
        movements: &[MovementId],
    ) -> CatalogResult<Vec<Track>> {
        self.locked_write([LockKey::Release(release)], |tx| {
            queries::get_unarchived_release(tx, release)?;
            let mut tracks = Vec::with_capacity(movements.len());
            for movement in movements {
                let movement = queries::get_movement(tx, *movement)?;
                let recording = mutations::insert_recording(
                    tx,
                    &NewRecording {
                        title: movement.title,
                        work_id: None,
                        movement_id: Some(movement.id),
                    },
                )?;
                tracks.push(append_track(tx, release, recording, None)?);
            }
            credits::reconcile(tx, release)?;
            Ok(tracks)
        })
    }

    /// Delete tracks of one release. Recordings left without any track are
    /// soft deleted.
    pub fn delete_tracks(
        &self,
        release: ReleaseId,
        tracks: &[TrackId],
    ) -> CatalogResult<ReconcileOutcome> {
        self.locked_write([LockKey::Release(release)], |tx| {
            queries::get_unarchived_release(tx, release)?;
            let mut groups = BTreeSet::new();
            let mut recordings = BTreeSet::new();
            for track in tracks {
                let track = track_of_release(tx, release, *track)?;
                mutations::delete_track(tx, &track)?;
                groups.insert(track.track_group_id);
                recordings.insert(track.recording_id);
            }
            track_groups::retire_unused_recordings(tx, recordings)?;
            for group in groups {
                track_groups::mark_stale(tx, group)?;
            }
            info!("Deleted {} tracks of release {}", tracks.len(), release);
            credits::reconcile(tx, release)
        })
    }

    pub fn update_track_side(&self, track: TrackId, side: Option<&str>) -> CatalogResult<()> {
        let release = self
            .store
            .read(|conn| Ok(queries::get_track(conn, track)?.release_id))?;
        self.locked_write([LockKey::Release(release)], |tx| {
            queries::get_unarchived_release(tx, release)?;
            let track = track_of_release(tx, release, track)?;
            if track.side.as_deref() == side {
                return Ok(());
            }
            mutations::set_track_side(tx, &track, side)?;
            track_groups::mark_stale(tx, track.track_group_id)?;
            Ok(())
        })
    }

    /// Swap the positions of two tracks of the same release.
    pub fn swap_track_order(&self, first: TrackId, second: TrackId) -> CatalogResult<()> {
        let release = self
            .store
            .read(|conn| Ok(queries::get_track(conn, first)?.release_id))?;
        self.locked_write([LockKey::Release(release)], |tx| {
            queries::get_unarchived_release(tx, release)?;
            let a = track_of_release(tx, release, first)?;
            let b = track_of_release(tx, release, second)?;
            mutations::set_track_position(tx, &a, b.position)?;
            mutations::set_track_position(tx, &b, a.position)?;
            track_groups::mark_stale(tx, a.track_group_id)?;
            if b.track_group_id != a.track_group_id {
                track_groups::mark_stale(tx, b.track_group_id)?;
            }
            Ok(())
        })
    }

    /// Move a group one slot up or down among its release's groups.
    /// Returns false when it already sits at that edge.
    pub fn update_track_group_order(
        &self,
        group: TrackGroupId,
        direction: Move,
    ) -> CatalogResult<bool> {
        let release = self
            .store
            .read(|conn| Ok(queries::get_track_group(conn, group)?.release_id))?;
        self.locked_write([LockKey::Release(release)], |tx| {
            queries::get_unarchived_release(tx, release)?;
            let groups = queries::track_groups_of_release(tx, release)?;
            let Some(index) = groups.iter().position(|g| g.id == group) else {
                return Err(CatalogError::not_found("TrackGroup", group));
            };
            let neighbour = match direction {
                Move::Up if index > 0 => index - 1,
                Move::Down if index + 1 < groups.len() => index + 1,
                _ => return Ok(false),
            };
            let (current, other) = (&groups[index], &groups[neighbour]);
            mutations::set_group_position(tx, current.id, other.position)?;
            mutations::set_group_position(tx, other.id, current.position)?;
            Ok(true)
        })
    }

    pub fn tracks_of_release(&self, release: ReleaseId) -> CatalogResult<Vec<Track>> {
        self.store
            .read(|conn| queries::tracks_of_release(conn, release))
    }
}
