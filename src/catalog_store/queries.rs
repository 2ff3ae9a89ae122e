//! Read-side lookups shared by the engine modules.
//!
//! `get_*` helpers fail with `NotFound` on missing or soft-deleted rows,
//! `find_*` helpers return whatever is stored.

use super::error::{CatalogError, CatalogResult};
use super::models::*;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::BTreeSet;

// =============================================================================
// Row mappers
// =============================================================================

const RELEASE_COLUMNS: &str =
    "id, title, status, be_master, deleted, back_edition_count, front_edition_count";

fn release_from_row(row: &Row) -> rusqlite::Result<Release> {
    Ok(Release {
        id: row.get(0)?,
        title: row.get(1)?,
        status: row.get(2)?,
        be_master: row.get(3)?,
        deleted: row.get(4)?,
        back_edition_count: row.get(5)?,
        front_edition_count: row.get(6)?,
        masters: BTreeSet::new(),
    })
}

const TRACK_GROUP_COLUMNS: &str = "id, release_id, master_group_id, freshness, position, title";

fn track_group_from_row(row: &Row) -> rusqlite::Result<TrackGroup> {
    Ok(TrackGroup {
        id: row.get(0)?,
        release_id: row.get(1)?,
        master_group_id: row.get(2)?,
        freshness: row.get(3)?,
        position: row.get(4)?,
        title: row.get(5)?,
    })
}

const TRACK_COLUMNS: &str = "id, release_id, track_group_id, recording_id, position, side";

fn track_from_row(row: &Row) -> rusqlite::Result<Track> {
    Ok(Track {
        id: row.get(0)?,
        release_id: row.get(1)?,
        track_group_id: row.get(2)?,
        recording_id: row.get(3)?,
        position: row.get(4)?,
        side: row.get(5)?,
    })
}

const RECORDING_COLUMNS: &str = "id, title, work_id, movement_id, deleted";

fn recording_from_row(row: &Row) -> rusqlite::Result<Recording> {
    Ok(Recording {
        id: row.get(0)?,
        title: row.get(1)?,
        work_id: row.get(2)?,
        movement_id: row.get(3)?,
        deleted: row.get(4)?,
    })
}

fn work_artist_from_row(row: &Row) -> rusqlite::Result<WorkArtist> {
    Ok(WorkArtist {
        id: row.get(0)?,
        work_id: row.get(1)?,
        artist_id: row.get(2)?,
        profession_id: row.get(3)?,
        position: row.get(4)?,
        main: row.get(5)?,
    })
}

fn recording_artist_from_row(row: &Row) -> rusqlite::Result<RecordingArtist> {
    Ok(RecordingArtist {
        id: row.get(0)?,
        recording_id: row.get(1)?,
        artist_id: row.get(2)?,
        profession_id: row.get(3)?,
        position: row.get(4)?,
        main: row.get(5)?,
    })
}

fn release_artist_from_row(row: &Row) -> rusqlite::Result<ReleaseArtist> {
    Ok(ReleaseArtist {
        id: row.get(0)?,
        release_id: row.get(1)?,
        artist_id: row.get(2)?,
        profession_id: row.get(3)?,
        position: row.get(4)?,
        main: row.get(5)?,
        source_type: row.get(6)?,
        sources: BTreeSet::new(),
    })
}

fn ids<T: rusqlite::types::FromSql>(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> CatalogResult<Vec<T>> {
    let mut stmt = conn.prepare_cached(sql)?;
    let rows = stmt
        .query_map(params, |r| r.get(0))?
        .collect::<rusqlite::Result<Vec<T>>>()?;
    Ok(rows)
}

// =============================================================================
// Reference data
// =============================================================================

pub fn get_artist(conn: &Connection, id: ArtistId) -> CatalogResult<Artist> {
    conn.query_row(
        "SELECT id, name FROM artists WHERE id = ?1",
        params![id],
        |r| {
            Ok(Artist {
                id: r.get(0)?,
                name: r.get(1)?,
            })
        },
    )
    .optional()?
    .ok_or_else(|| CatalogError::not_found("Artist", id))
}

pub fn get_profession(conn: &Connection, id: ProfessionId) -> CatalogResult<Profession> {
    conn.query_row(
        "SELECT id, name FROM professions WHERE id = ?1",
        params![id],
        |r| {
            Ok(Profession {
                id: r.get(0)?,
                name: r.get(1)?,
            })
        },
    )
    .optional()?
    .ok_or_else(|| CatalogError::not_found("Profession", id))
}

pub fn get_label(conn: &Connection, id: LabelId) -> CatalogResult<Label> {
    conn.query_row(
        "SELECT id, name FROM labels WHERE id = ?1",
        params![id],
        |r| {
            Ok(Label {
                id: r.get(0)?,
                name: r.get(1)?,
            })
        },
    )
    .optional()?
    .ok_or_else(|| CatalogError::not_found("Label", id))
}

// =============================================================================
// Works and movements
// =============================================================================

pub fn find_work(conn: &Connection, id: WorkId) -> CatalogResult<Option<Work>> {
    Ok(conn
        .query_row(
            "SELECT id, title, deleted FROM works WHERE id = ?1",
            params![id],
            |r| {
                Ok(Work {
                    id: r.get(0)?,
                    title: r.get(1)?,
                    deleted: r.get(2)?,
                })
            },
        )
        .optional()?)
}

pub fn get_work(conn: &Connection, id: WorkId) -> CatalogResult<Work> {
    find_work(conn, id)?
        .filter(|w| !w.deleted)
        .ok_or_else(|| CatalogError::not_found("Work", id))
}

pub fn find_movement(conn: &Connection, id: MovementId) -> CatalogResult<Option<Movement>> {
    Ok(conn
        .query_row(
            "SELECT id, work_id, title, position, deleted FROM movements WHERE id = ?1",
            params![id],
            |r| {
                Ok(Movement {
                    id: r.get(0)?,
                    work_id: r.get(1)?,
                    title: r.get(2)?,
                    position: r.get(3)?,
                    deleted: r.get(4)?,
                })
            },
        )
        .optional()?)
}

pub fn get_movement(conn: &Connection, id: MovementId) -> CatalogResult<Movement> {
    find_movement(conn, id)?
        .filter(|m| !m.deleted)
        .ok_or_else(|| CatalogError::not_found("Movement", id))
}

pub fn work_artists_of(conn: &Connection, work: WorkId) -> CatalogResult<Vec<WorkArtist>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, work_id, artist_id, profession_id, position, main
         FROM work_artists WHERE work_id = ?1 ORDER BY position, id",
    )?;
    let rows = stmt
        .query_map(params![work], work_artist_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

pub fn find_work_artist(conn: &Connection, id: WorkArtistId) -> CatalogResult<WorkArtist> {
    conn.query_row(
        "SELECT id, work_id, artist_id, profession_id, position, main
         FROM work_artists WHERE id = ?1",
        params![id],
        work_artist_from_row,
    )
    .optional()?
    .ok_or_else(|| CatalogError::not_found("WorkArtist", id))
}

// =============================================================================
// Recordings
// =============================================================================

pub fn find_recording(conn: &Connection, id: RecordingId) -> CatalogResult<Option<Recording>> {
    Ok(conn
        .query_row(
            &format!("SELECT {} FROM recordings WHERE id = ?1", RECORDING_COLUMNS),
            params![id],
            recording_from_row,
        )
        .optional()?)
}

pub fn get_recording(conn: &Connection, id: RecordingId) -> CatalogResult<Recording> {
    find_recording(conn, id)?
        .filter(|r| !r.deleted)
        .ok_or_else(|| CatalogError::not_found("Recording", id))
}

pub fn recording_artists_of(
    conn: &Connection,
    recording: RecordingId,
) -> CatalogResult<Vec<RecordingArtist>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, recording_id, artist_id, profession_id, position, main
         FROM recording_artists WHERE recording_id = ?1 ORDER BY position, id",
    )?;
    let rows = stmt
        .query_map(params![recording], recording_artist_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

pub fn find_recording_artist(
    conn: &Connection,
    id: RecordingArtistId,
) -> CatalogResult<RecordingArtist> {
    conn.query_row(
        "SELECT id, recording_id, artist_id, profession_id, position, main
         FROM recording_artists WHERE id = ?1",
        params![id],
        recording_artist_from_row,
    )
    .optional()?
    .ok_or_else(|| CatalogError::not_found("RecordingArtist", id))
}

/// Distinct non-deleted recordings referenced by the release's tracks, in
/// track order.
pub fn active_recordings_of_release(
    conn: &Connection,
    release: ReleaseId,
) -> CatalogResult<Vec<Recording>> {
    let mut stmt = conn.prepare_cached(
        "SELECT r.id, r.title, r.work_id, r.movement_id, r.deleted
         FROM recordings r
         JOIN (SELECT recording_id, MIN(position) AS first_position
               FROM tracks WHERE release_id = ?1 GROUP BY recording_id) t
           ON t.recording_id = r.id
         WHERE r.deleted = 0
         ORDER BY t.first_position, r.id",
    )?;
    let rows = stmt
        .query_map(params![release], recording_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

/// Recordings pointing at the work directly or through one of its movements.
pub fn recordings_of_work(conn: &Connection, work: WorkId) -> CatalogResult<Vec<RecordingId>> {
    ids(
        conn,
        "SELECT id FROM recordings
         WHERE work_id = ?1
            OR movement_id IN (SELECT id FROM movements WHERE work_id = ?1)
         ORDER BY id",
        params![work],
    )
}

pub fn recordings_of_movement(
    conn: &Connection,
    movement: MovementId,
) -> CatalogResult<Vec<RecordingId>> {
    ids(
        conn,
        "SELECT id FROM recordings WHERE movement_id = ?1 ORDER BY id",
        params![movement],
    )
}

pub fn track_count_of_recording(conn: &Connection, recording: RecordingId) -> CatalogResult<i64> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM tracks WHERE recording_id = ?1",
        params![recording],
        |r| r.get(0),
    )?)
}

/// Non-deleted, unarchived releases with a track on one of `recordings`.
///
/// These are the releases whose derived credits depend on the recordings.
pub fn releases_reachable_from_recordings(
    conn: &Connection,
    recordings: &[RecordingId],
) -> CatalogResult<Vec<ReleaseId>> {
    let mut reachable = BTreeSet::new();
    let mut stmt = conn.prepare_cached(
        "SELECT DISTINCT t.release_id FROM tracks t
         JOIN releases rel ON rel.id = t.release_id
         WHERE t.recording_id = ?1 AND rel.deleted = 0 AND rel.status != 'ARCHIVED'",
    )?;
    for recording in recordings {
        let rows = stmt
            .query_map(params![recording], |r| r.get::<_, ReleaseId>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        reachable.extend(rows);
    }
    Ok(reachable.into_iter().collect())
}

// =============================================================================
// Releases and the edition graph
// =============================================================================

pub fn release_masters(conn: &Connection, release: ReleaseId) -> CatalogResult<BTreeSet<ReleaseId>> {
    let masters: Vec<ReleaseId> = ids(
        conn,
        "SELECT master_id FROM subject_master WHERE subject_id = ?1",
        params![release],
    )?;
    Ok(masters.into_iter().collect())
}

/// Any stored release, including deleted and archived ones.
pub fn find_release(conn: &Connection, id: ReleaseId) -> CatalogResult<Option<Release>> {
    let release = conn
        .query_row(
            &format!("SELECT {} FROM releases WHERE id = ?1", RELEASE_COLUMNS),
            params![id],
            release_from_row,
        )
        .optional()?;
    match release {
        Some(mut release) => {
            release.masters = release_masters(conn, id)?;
            Ok(Some(release))
        }
        None => Ok(None),
    }
}

pub fn get_release(conn: &Connection, id: ReleaseId) -> CatalogResult<Release> {
    find_release(conn, id)?
        .filter(|r| !r.deleted)
        .ok_or_else(|| CatalogError::not_found("Release", id))
}

/// Release that may be mutated: neither deleted nor archived.
pub fn get_unarchived_release(conn: &Connection, id: ReleaseId) -> CatalogResult<Release> {
    let release = get_release(conn, id)?;
    if release.is_archived() {
        return Err(CatalogError::not_found("Release", id));
    }
    Ok(release)
}

/// Every release linked to `master` as a subject, deleted ones included.
pub fn subject_ids_of(conn: &Connection, master: ReleaseId) -> CatalogResult<Vec<ReleaseId>> {
    ids(
        conn,
        "SELECT subject_id FROM subject_master WHERE master_id = ?1 ORDER BY subject_id",
        params![master],
    )
}

/// Non-deleted subjects of `master`.
pub fn subjects_of(conn: &Connection, master: ReleaseId) -> CatalogResult<Vec<Release>> {
    let mut subjects = Vec::new();
    for id in subject_ids_of(conn, master)? {
        if let Some(release) = find_release(conn, id)?.filter(|r| !r.deleted) {
            subjects.push(release);
        }
    }
    Ok(subjects)
}

pub fn all_release_ids(conn: &Connection) -> CatalogResult<Vec<ReleaseId>> {
    ids(
        conn,
        "SELECT id FROM releases WHERE deleted = 0 ORDER BY id",
        [],
    )
}

pub fn deleted_release_ids(conn: &Connection) -> CatalogResult<Vec<ReleaseId>> {
    ids(
        conn,
        "SELECT id FROM releases WHERE deleted = 1 ORDER BY id",
        [],
    )
}

// =============================================================================
// Track groups and tracks
// =============================================================================

pub fn get_track_group(conn: &Connection, id: TrackGroupId) -> CatalogResult<TrackGroup> {
    conn.query_row(
        &format!("SELECT {} FROM track_groups WHERE id = ?1", TRACK_GROUP_COLUMNS),
        params![id],
        track_group_from_row,
    )
    .optional()?
    .ok_or_else(|| CatalogError::not_found("TrackGroup", id))
}

pub fn track_groups_of_release(
    conn: &Connection,
    release: ReleaseId,
) -> CatalogResult<Vec<TrackGroup>> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {} FROM track_groups WHERE release_id = ?1 ORDER BY position, id",
        TRACK_GROUP_COLUMNS
    ))?;
    let rows = stmt
        .query_map(params![release], track_group_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

/// Groups inheriting from `master_group`.
pub fn groups_linked_to(
    conn: &Connection,
    master_group: TrackGroupId,
) -> CatalogResult<Vec<TrackGroup>> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {} FROM track_groups WHERE master_group_id = ?1 ORDER BY id",
        TRACK_GROUP_COLUMNS
    ))?;
    let rows = stmt
        .query_map(params![master_group], track_group_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

pub fn get_track(conn: &Connection, id: TrackId) -> CatalogResult<Track> {
    conn.query_row(
        &format!("SELECT {} FROM tracks WHERE id = ?1", TRACK_COLUMNS),
        params![id],
        track_from_row,
    )
    .optional()?
    .ok_or_else(|| CatalogError::not_found("Track", id))
}

pub fn tracks_of_group(conn: &Connection, group: TrackGroupId) -> CatalogResult<Vec<Track>> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {} FROM tracks WHERE track_group_id = ?1 ORDER BY position, id",
        TRACK_COLUMNS
    ))?;
    let rows = stmt
        .query_map(params![group], track_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

pub fn tracks_of_release(conn: &Connection, release: ReleaseId) -> CatalogResult<Vec<Track>> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {} FROM tracks WHERE release_id = ?1 ORDER BY position, id",
        TRACK_COLUMNS
    ))?;
    let rows = stmt
        .query_map(params![release], track_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

pub fn max_track_position(conn: &Connection, release: ReleaseId) -> CatalogResult<i64> {
    Ok(conn.query_row(
        "SELECT COALESCE(MAX(position), 0) FROM tracks WHERE release_id = ?1",
        params![release],
        |r| r.get(0),
    )?)
}

// =============================================================================
// Release satellites
// =============================================================================

pub fn release_artists_of(
    conn: &Connection,
    release: ReleaseId,
) -> CatalogResult<Vec<ReleaseArtist>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, release_id, artist_id, profession_id, position, main, source_type
         FROM release_artists WHERE release_id = ?1 ORDER BY position, id",
    )?;
    let mut rows = stmt
        .query_map(params![release], release_artist_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    for row in rows.iter_mut() {
        row.sources = release_artist_sources(conn, row.id)?;
    }
    Ok(rows)
}

pub fn find_release_artist(
    conn: &Connection,
    id: ReleaseArtistId,
) -> CatalogResult<ReleaseArtist> {
    let mut row = conn
        .query_row(
            "SELECT id, release_id, artist_id, profession_id, position, main, source_type
             FROM release_artists WHERE id = ?1",
            params![id],
            release_artist_from_row,
        )
        .optional()?
        .ok_or_else(|| CatalogError::not_found("ReleaseArtist", id))?;
    row.sources = release_artist_sources(conn, id)?;
    Ok(row)
}

fn release_artist_sources(
    conn: &Connection,
    id: ReleaseArtistId,
) -> CatalogResult<BTreeSet<RecordingArtistId>> {
    let sources: Vec<RecordingArtistId> = ids(
        conn,
        "SELECT recording_artist_id FROM release_artist_sources WHERE release_artist_id = ?1",
        params![id],
    )?;
    Ok(sources.into_iter().collect())
}

pub fn catalogs_of(conn: &Connection, release: ReleaseId) -> CatalogResult<Vec<CatalogNumber>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, release_id, label_id, prefix, number
         FROM release_catalogs WHERE release_id = ?1 ORDER BY id",
    )?;
    let rows = stmt
        .query_map(params![release], |r| {
            Ok(CatalogNumber {
                id: r.get(0)?,
                release_id: r.get(1)?,
                label_id: r.get(2)?,
                prefix: r.get(3)?,
                number: r.get(4)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

pub fn issues_of(conn: &Connection, release: ReleaseId) -> CatalogResult<Vec<Issue>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, release_id, issue_time, regions
         FROM release_issues WHERE release_id = ?1 ORDER BY issue_time, id",
    )?;
    let rows = stmt
        .query_map(params![release], |r| {
            Ok((
                r.get::<_, IssueId>(0)?,
                r.get::<_, ReleaseId>(1)?,
                r.get::<_, i64>(2)?,
                r.get::<_, String>(3)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    rows.into_iter()
        .map(|(id, release_id, issue_time, regions)| -> CatalogResult<Issue> {
            Ok(Issue {
                id,
                release_id,
                issue_time,
                regions: serde_json::from_str(&regions)?,
            })
        })
        .collect()
}
