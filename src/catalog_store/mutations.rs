//! Low-level row writes.
//!
//! Each helper touches one table and emits the domain event of the aggregate
//! root it belongs to. Invariants across tables are the business of the
//! engine modules calling these.

use super::error::CatalogResult;
use super::events::{ChangeOperation, EntityKind};
use super::models::*;
use super::store::CatalogTx;
use rusqlite::params;
use std::collections::BTreeSet;
use tracing::debug;

// =============================================================================
// Reference data
// =============================================================================

pub fn insert_artist(tx: &CatalogTx, name: &str) -> CatalogResult<ArtistId> {
    tx.execute("INSERT INTO artists (name) VALUES (?1)", params![name])?;
    Ok(ArtistId(tx.last_insert_rowid()))
}

pub fn insert_profession(tx: &CatalogTx, name: &str) -> CatalogResult<ProfessionId> {
    tx.execute("INSERT INTO professions (name) VALUES (?1)", params![name])?;
    Ok(ProfessionId(tx.last_insert_rowid()))
}

pub fn insert_label(tx: &CatalogTx, name: &str) -> CatalogResult<LabelId> {
    tx.execute("INSERT INTO labels (name) VALUES (?1)", params![name])?;
    Ok(LabelId(tx.last_insert_rowid()))
}

// =============================================================================
// Works and movements
// =============================================================================

pub fn insert_work(tx: &CatalogTx, title: &str) -> CatalogResult<WorkId> {
    tx.execute("INSERT INTO works (title) VALUES (?1)", params![title])?;
    let id = WorkId(tx.last_insert_rowid());
    tx.emit(EntityKind::Work, id, ChangeOperation::Create);
    Ok(id)
}

pub fn set_work_deleted(tx: &CatalogTx, work: WorkId) -> CatalogResult<()> {
    tx.execute("UPDATE works SET deleted = 1 WHERE id = ?1", params![work])?;
    tx.emit(EntityKind::Work, work, ChangeOperation::Delete);
    Ok(())
}

pub fn insert_movement(
    tx: &CatalogTx,
    work: WorkId,
    title: &str,
    position: i64,
) -> CatalogResult<MovementId> {
    tx.execute(
        "INSERT INTO movements (work_id, title, position) VALUES (?1, ?2, ?3)",
        params![work, title, position],
    )?;
    tx.emit(EntityKind::Work, work, ChangeOperation::Update);
    Ok(MovementId(tx.last_insert_rowid()))
}

pub fn set_movement_work(
    tx: &CatalogTx,
    movement: MovementId,
    from: WorkId,
    to: WorkId,
) -> CatalogResult<()> {
    tx.execute(
        "UPDATE movements SET work_id = ?2 WHERE id = ?1",
        params![movement, to],
    )?;
    tx.emit(EntityKind::Work, from, ChangeOperation::Update);
    tx.emit(EntityKind::Work, to, ChangeOperation::Update);
    Ok(())
}

pub fn set_movement_deleted(tx: &CatalogTx, movement: &Movement) -> CatalogResult<()> {
    tx.execute(
        "UPDATE movements SET deleted = 1 WHERE id = ?1",
        params![movement.id],
    )?;
    tx.emit(EntityKind::Work, movement.work_id, ChangeOperation::Update);
    Ok(())
}

pub fn insert_work_artist(
    tx: &CatalogTx,
    work: WorkId,
    credit: &CreditInput,
) -> CatalogResult<WorkArtistId> {
    tx.execute(
        "INSERT INTO work_artists (work_id, artist_id, profession_id, position, main)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            work,
            credit.artist_id,
            credit.profession_id,
            credit.position,
            credit.main
        ],
    )?;
    tx.emit(EntityKind::Work, work, ChangeOperation::Update);
    Ok(WorkArtistId(tx.last_insert_rowid()))
}

pub fn delete_work_artist(tx: &CatalogTx, credit: &WorkArtist) -> CatalogResult<()> {
    tx.execute("DELETE FROM work_artists WHERE id = ?1", params![credit.id])?;
    tx.emit(EntityKind::Work, credit.work_id, ChangeOperation::Update);
    Ok(())
}

// =============================================================================
// Recordings
// =============================================================================

pub fn insert_recording(tx: &CatalogTx, recording: &NewRecording) -> CatalogResult<RecordingId> {
    tx.execute(
        "INSERT INTO recordings (title, work_id, movement_id) VALUES (?1, ?2, ?3)",
        params![recording.title, recording.work_id, recording.movement_id],
    )?;
    let id = RecordingId(tx.last_insert_rowid());
    tx.emit(EntityKind::Recording, id, ChangeOperation::Create);
    Ok(id)
}

pub fn set_recording_deleted(tx: &CatalogTx, recording: RecordingId) -> CatalogResult<()> {
    tx.execute(
        "UPDATE recordings SET deleted = 1 WHERE id = ?1",
        params![recording],
    )?;
    tx.emit(EntityKind::Recording, recording, ChangeOperation::Delete);
    Ok(())
}

pub fn insert_recording_artist(
    tx: &CatalogTx,
    recording: RecordingId,
    credit: &CreditInput,
) -> CatalogResult<RecordingArtistId> {
    tx.execute(
        "INSERT INTO recording_artists (recording_id, artist_id, profession_id, position, main)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            recording,
            credit.artist_id,
            credit.profession_id,
            credit.position,
            credit.main
        ],
    )?;
    tx.emit(EntityKind::Recording, recording, ChangeOperation::Update);
    Ok(RecordingArtistId(tx.last_insert_rowid()))
}

pub fn update_recording_artist(
    tx: &CatalogTx,
    credit: &RecordingArtist,
    position: i64,
    main: bool,
) -> CatalogResult<()> {
    tx.execute(
        "UPDATE recording_artists SET position = ?2, main = ?3 WHERE id = ?1",
        params![credit.id, position, main],
    )?;
    tx.emit(EntityKind::Recording, credit.recording_id, ChangeOperation::Update);
    Ok(())
}

pub fn delete_recording_artist(tx: &CatalogTx, credit: &RecordingArtist) -> CatalogResult<()> {
    tx.execute(
        "DELETE FROM recording_artists WHERE id = ?1",
        params![credit.id],
    )?;
    tx.emit(EntityKind::Recording, credit.recording_id, ChangeOperation::Update);
    Ok(())
}

// =============================================================================
// Releases and the edition graph
// =============================================================================

pub fn insert_release(tx: &CatalogTx, release: &NewRelease) -> CatalogResult<ReleaseId> {
    tx.execute(
        "INSERT INTO releases (title, status, be_master) VALUES (?1, ?2, 1)",
        params![release.title, release.status],
    )?;
    let id = ReleaseId(tx.last_insert_rowid());
    tx.emit(EntityKind::Release, id, ChangeOperation::Create);
    Ok(id)
}

pub fn set_release_status(
    tx: &CatalogTx,
    release: ReleaseId,
    status: DocumentStatus,
) -> CatalogResult<()> {
    tx.execute(
        "UPDATE releases SET status = ?2 WHERE id = ?1",
        params![release, status],
    )?;
    tx.emit(EntityKind::Release, release, ChangeOperation::Update);
    Ok(())
}

pub fn set_be_master(tx: &CatalogTx, release: ReleaseId, be_master: bool) -> CatalogResult<()> {
    tx.execute(
        "UPDATE releases SET be_master = ?2 WHERE id = ?1",
        params![release, be_master],
    )?;
    tx.emit(EntityKind::Release, release, ChangeOperation::Update);
    Ok(())
}

pub fn add_subject_master(
    tx: &CatalogTx,
    subject: ReleaseId,
    master: ReleaseId,
) -> CatalogResult<()> {
    tx.execute(
        "INSERT INTO subject_master (subject_id, master_id) VALUES (?1, ?2)",
        params![subject, master],
    )?;
    tx.emit(EntityKind::Release, subject, ChangeOperation::Update);
    Ok(())
}

pub fn remove_subject_master(
    tx: &CatalogTx,
    subject: ReleaseId,
    master: ReleaseId,
) -> CatalogResult<()> {
    tx.execute(
        "DELETE FROM subject_master WHERE subject_id = ?1 AND master_id = ?2",
        params![subject, master],
    )?;
    tx.emit(EntityKind::Release, subject, ChangeOperation::Update);
    Ok(())
}

pub fn clear_subject_masters(tx: &CatalogTx, subject: ReleaseId) -> CatalogResult<()> {
    tx.execute(
        "DELETE FROM subject_master WHERE subject_id = ?1",
        params![subject],
    )?;
    tx.emit(EntityKind::Release, subject, ChangeOperation::Update);
    Ok(())
}

pub fn set_release_deleted(tx: &CatalogTx, release: ReleaseId) -> CatalogResult<()> {
    tx.execute(
        "UPDATE releases SET deleted = 1 WHERE id = ?1",
        params![release],
    )?;
    tx.emit(EntityKind::Release, release, ChangeOperation::Delete);
    Ok(())
}

/// Hard delete. Tracks, groups, credits, catalog numbers and issues cascade.
pub fn delete_release_row(tx: &CatalogTx, release: ReleaseId) -> CatalogResult<()> {
    tx.execute("DELETE FROM releases WHERE id = ?1", params![release])?;
    tx.emit(EntityKind::Release, release, ChangeOperation::Delete);
    Ok(())
}

/// Returns whether the stored counts changed.
pub fn set_edition_counts(
    tx: &CatalogTx,
    release: ReleaseId,
    back: i64,
    front: i64,
) -> CatalogResult<bool> {
    let changed = tx.execute(
        "UPDATE releases SET back_edition_count = ?2, front_edition_count = ?3
         WHERE id = ?1 AND (back_edition_count != ?2 OR front_edition_count != ?3)",
        params![release, back, front],
    )?;
    if changed > 0 {
        tx.emit(EntityKind::Release, release, ChangeOperation::Update);
    }
    Ok(changed > 0)
}

// =============================================================================
// Track groups and tracks
// =============================================================================

pub fn insert_track_group(
    tx: &CatalogTx,
    release: ReleaseId,
    master_group: Option<TrackGroupId>,
    freshness: Freshness,
    position: i64,
    title: Option<&str>,
) -> CatalogResult<TrackGroup> {
    tx.execute(
        "INSERT INTO track_groups (release_id, master_group_id, freshness, position, title)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![release, master_group, freshness, position, title],
    )?;
    let id = TrackGroupId(tx.last_insert_rowid());
    tx.emit(EntityKind::TrackGroup, id, ChangeOperation::Create);
    Ok(TrackGroup {
        id,
        release_id: release,
        master_group_id: master_group,
        freshness,
        position,
        title: title.map(str::to_string),
    })
}

pub fn set_group_origin(
    tx: &CatalogTx,
    group: TrackGroupId,
    master_group: Option<TrackGroupId>,
    freshness: Freshness,
) -> CatalogResult<()> {
    tx.execute(
        "UPDATE track_groups SET master_group_id = ?2, freshness = ?3 WHERE id = ?1",
        params![group, master_group, freshness],
    )?;
    tx.emit(EntityKind::TrackGroup, group, ChangeOperation::Update);
    Ok(())
}

/// Returns whether the stored freshness changed.
pub fn set_group_freshness(
    tx: &CatalogTx,
    group: TrackGroupId,
    freshness: Freshness,
) -> CatalogResult<bool> {
    let changed = tx.execute(
        "UPDATE track_groups SET freshness = ?2 WHERE id = ?1 AND freshness != ?2",
        params![group, freshness],
    )?;
    if changed > 0 {
        tx.emit(EntityKind::TrackGroup, group, ChangeOperation::Update);
    }
    Ok(changed > 0)
}

pub fn set_group_position(
    tx: &CatalogTx,
    group: TrackGroupId,
    position: i64,
) -> CatalogResult<()> {
    tx.execute(
        "UPDATE track_groups SET position = ?2 WHERE id = ?1",
        params![group, position],
    )?;
    tx.emit(EntityKind::TrackGroup, group, ChangeOperation::Update);
    Ok(())
}

/// Deletes the group; its tracks cascade.
pub fn delete_track_group(tx: &CatalogTx, group: TrackGroupId) -> CatalogResult<()> {
    tx.execute("DELETE FROM track_groups WHERE id = ?1", params![group])?;
    tx.emit(EntityKind::TrackGroup, group, ChangeOperation::Delete);
    Ok(())
}

pub fn insert_track(
    tx: &CatalogTx,
    release: ReleaseId,
    group: TrackGroupId,
    recording: RecordingId,
    position: i64,
    side: Option<&str>,
) -> CatalogResult<Track> {
    tx.execute(
        "INSERT INTO tracks (release_id, track_group_id, recording_id, position, side)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![release, group, recording, position, side],
    )?;
    let id = TrackId(tx.last_insert_rowid());
    tx.emit(EntityKind::TrackGroup, group, ChangeOperation::Update);
    Ok(Track {
        id,
        release_id: release,
        track_group_id: group,
        recording_id: recording,
        position,
        side: side.map(str::to_string),
    })
}

pub fn delete_track(tx: &CatalogTx, track: &Track) -> CatalogResult<()> {
    tx.execute("DELETE FROM tracks WHERE id = ?1", params![track.id])?;
    tx.emit(EntityKind::TrackGroup, track.track_group_id, ChangeOperation::Update);
    Ok(())
}

pub fn delete_tracks_of_group(tx: &CatalogTx, group: TrackGroupId) -> CatalogResult<usize> {
    let deleted = tx.execute(
        "DELETE FROM tracks WHERE track_group_id = ?1",
        params![group],
    )?;
    tx.emit(EntityKind::TrackGroup, group, ChangeOperation::Update);
    Ok(deleted)
}

/// Moves every track of `from` onto `to`, keeping positions.
pub fn reparent_tracks(tx: &CatalogTx, from: TrackGroupId, to: TrackGroupId) -> CatalogResult<usize> {
    let moved = tx.execute(
        "UPDATE tracks SET track_group_id = ?2 WHERE track_group_id = ?1",
        params![from, to],
    )?;
    tx.emit(EntityKind::TrackGroup, to, ChangeOperation::Update);
    Ok(moved)
}

pub fn set_track_position(tx: &CatalogTx, track: &Track, position: i64) -> CatalogResult<()> {
    tx.execute(
        "UPDATE tracks SET position = ?2 WHERE id = ?1",
        params![track.id, position],
    )?;
    tx.emit(EntityKind::TrackGroup, track.track_group_id, ChangeOperation::Update);
    Ok(())
}

pub fn set_track_side(tx: &CatalogTx, track: &Track, side: Option<&str>) -> CatalogResult<()> {
    tx.execute(
        "UPDATE tracks SET side = ?2 WHERE id = ?1",
        params![track.id, side],
    )?;
    tx.emit(EntityKind::TrackGroup, track.track_group_id, ChangeOperation::Update);
    Ok(())
}

// =============================================================================
// Release credits
// =============================================================================

#[allow(clippy::too_many_arguments)]
pub fn insert_release_artist(
    tx: &CatalogTx,
    release: ReleaseId,
    artist: ArtistId,
    profession: ProfessionId,
    position: i64,
    main: bool,
    source_type: SourceType,
    sources: &BTreeSet<RecordingArtistId>,
) -> CatalogResult<ReleaseArtistId> {
    tx.execute(
        "INSERT INTO release_artists
            (release_id, artist_id, profession_id, position, main, source_type)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![release, artist, profession, position, main, source_type],
    )?;
    let id = ReleaseArtistId(tx.last_insert_rowid());
    insert_release_artist_sources(tx, id, sources)?;
    debug!(
        "Inserted release artist {} on release {}: artist {} profession {} ({})",
        id,
        release,
        artist,
        profession,
        source_type.to_db_str()
    );
    tx.emit(EntityKind::ReleaseArtist, id, ChangeOperation::Create);
    Ok(id)
}

fn insert_release_artist_sources<'a>(
    tx: &CatalogTx,
    id: ReleaseArtistId,
    sources: impl IntoIterator<Item = &'a RecordingArtistId>,
) -> CatalogResult<usize> {
    let mut stmt = tx.prepare_cached(
        "INSERT OR IGNORE INTO release_artist_sources (release_artist_id, recording_artist_id)
         VALUES (?1, ?2)",
    )?;
    let mut inserted = 0;
    for source in sources {
        inserted += stmt.execute(params![id, source])?;
    }
    Ok(inserted)
}

/// Adds provenance ids to a recording-derived row. Returns how many were new.
pub fn add_release_artist_sources(
    tx: &CatalogTx,
    id: ReleaseArtistId,
    sources: &BTreeSet<RecordingArtistId>,
) -> CatalogResult<usize> {
    let inserted = insert_release_artist_sources(tx, id, sources)?;
    if inserted > 0 {
        debug!("Added {} sources to release artist {}", inserted, id);
        tx.emit(EntityKind::ReleaseArtist, id, ChangeOperation::Update);
    }
    Ok(inserted)
}

pub fn set_release_artist_main(
    tx: &CatalogTx,
    id: ReleaseArtistId,
    main: bool,
) -> CatalogResult<()> {
    tx.execute(
        "UPDATE release_artists SET main = ?2 WHERE id = ?1",
        params![id, main],
    )?;
    tx.emit(EntityKind::ReleaseArtist, id, ChangeOperation::Update);
    Ok(())
}

pub fn delete_release_artist(tx: &CatalogTx, id: ReleaseArtistId) -> CatalogResult<()> {
    tx.execute("DELETE FROM release_artists WHERE id = ?1", params![id])?;
    debug!("Deleted release artist {}", id);
    tx.emit(EntityKind::ReleaseArtist, id, ChangeOperation::Delete);
    Ok(())
}

// =============================================================================
// Catalog numbers and issues
// =============================================================================

pub fn insert_catalog(
    tx: &CatalogTx,
    release: ReleaseId,
    catalog: &CatalogNumberInput,
) -> CatalogResult<CatalogNumberId> {
    tx.execute(
        "INSERT INTO release_catalogs (release_id, label_id, prefix, number)
         VALUES (?1, ?2, ?3, ?4)",
        params![release, catalog.label_id, catalog.prefix, catalog.number],
    )?;
    tx.emit(EntityKind::Release, release, ChangeOperation::Update);
    Ok(CatalogNumberId(tx.last_insert_rowid()))
}

pub fn set_catalog_prefix(
    tx: &CatalogTx,
    catalog: &CatalogNumber,
    prefix: Option<&str>,
) -> CatalogResult<()> {
    tx.execute(
        "UPDATE release_catalogs SET prefix = ?2 WHERE id = ?1",
        params![catalog.id, prefix],
    )?;
    tx.emit(EntityKind::Release, catalog.release_id, ChangeOperation::Update);
    Ok(())
}

pub fn delete_catalog(tx: &CatalogTx, catalog: &CatalogNumber) -> CatalogResult<()> {
    tx.execute(
        "DELETE FROM release_catalogs WHERE id = ?1",
        params![catalog.id],
    )?;
    tx.emit(EntityKind::Release, catalog.release_id, ChangeOperation::Update);
    Ok(())
}

pub fn insert_issue(
    tx: &CatalogTx,
    release: ReleaseId,
    issue: &IssueInput,
) -> CatalogResult<IssueId> {
    tx.execute(
        "INSERT INTO release_issues (release_id, issue_time, regions) VALUES (?1, ?2, ?3)",
        params![release, issue.issue_time, serde_json::to_string(&issue.regions)?],
    )?;
    tx.emit(EntityKind::Release, release, ChangeOperation::Update);
    Ok(IssueId(tx.last_insert_rowid()))
}

pub fn set_issue_regions(tx: &CatalogTx, issue: &Issue, regions: &[String]) -> CatalogResult<()> {
    tx.execute(
        "UPDATE release_issues SET regions = ?2 WHERE id = ?1",
        params![issue.id, serde_json::to_string(regions)?],
    )?;
    tx.emit(EntityKind::Release, issue.release_id, ChangeOperation::Update);
    Ok(())
}

pub fn delete_issue(tx: &CatalogTx, issue: &Issue) -> CatalogResult<()> {
    tx.execute("DELETE FROM release_issues WHERE id = ?1", params![issue.id])?;
    tx.emit(EntityKind::Release, issue.release_id, ChangeOperation::Update);
    Ok(())
}
