use super::sources::{ArtistCredit, CreditKey, HasCredits};
use crate::catalog_store::{
    mutations, queries, CatalogResult, CatalogTx, Recording, RecordingArtistId, RecordingId,
    ReleaseArtist, ReleaseId, SourceType, WorkId,
};
use crate::sync::{self, PatchStats};
use rusqlite::Connection;
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::debug;

/// What one reconcile pass wrote on a release's derived credits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub normal_removed: usize,
    pub from_work: PatchStats,
    pub from_recording: PatchStats,
}

impl ReconcileOutcome {
    pub fn writes(&self) -> usize {
        self.normal_removed + self.from_work.writes() + self.from_recording.writes()
    }

    pub fn is_noop(&self) -> bool {
        self.writes() == 0
    }
}

impl std::ops::AddAssign for ReconcileOutcome {
    fn add_assign(&mut self, other: ReconcileOutcome) {
        self.normal_removed += other.normal_removed;
        self.from_work += other.from_work;
        self.from_recording += other.from_recording;
    }
}

/// A recording-derived credit with every recording credit contributing to it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordingDerivedCredit {
    pub key: CreditKey,
    pub sources: BTreeSet<RecordingArtistId>,
}

/// Works a recording draws credits from: its own work and its movement's work.
/// Deleted works and movements contribute nothing.
fn contributing_works(conn: &Connection, recording: &Recording) -> CatalogResult<Vec<WorkId>> {
    let mut works = Vec::with_capacity(2);
    if let Some(work_id) = recording.work_id {
        works.push(work_id);
    }
    if let Some(movement_id) = recording.movement_id {
        if let Some(movement) = queries::find_movement(conn, movement_id)?.filter(|m| !m.deleted) {
            works.push(movement.work_id);
        }
    }
    Ok(works)
}

/// Union of the work credits reachable from `recordings`, one per key.
pub fn derive_work_credits(
    conn: &Connection,
    recordings: &[Recording],
) -> CatalogResult<Vec<ArtistCredit>> {
    let mut visited = HashSet::new();
    let mut seen_keys = HashSet::new();
    let mut credits = Vec::new();
    for recording in recordings {
        for work_id in contributing_works(conn, recording)? {
            if !visited.insert(work_id) {
                continue;
            }
            let Some(work) = queries::find_work(conn, work_id)?.filter(|w| !w.deleted) else {
                continue;
            };
            for credit in work.credits(conn)? {
                if seen_keys.insert(credit.key()) {
                    credits.push(credit);
                }
            }
        }
    }
    Ok(credits)
}

/// Union of the recordings' own credits, one per key, remembering which
/// recording credits produced each key.
pub fn derive_recording_credits(
    conn: &Connection,
    recordings: &[Recording],
) -> CatalogResult<Vec<RecordingDerivedCredit>> {
    let mut index: HashMap<CreditKey, usize> = HashMap::new();
    let mut derived: Vec<RecordingDerivedCredit> = Vec::new();
    for recording in recordings {
        for credit in recording.credits(conn)? {
            let source = RecordingArtistId(credit.credit_id);
            let slot = *index.entry(credit.key()).or_insert_with(|| {
                derived.push(RecordingDerivedCredit {
                    key: credit.key(),
                    sources: BTreeSet::new(),
                });
                derived.len() - 1
            });
            derived[slot].sources.insert(source);
        }
    }
    Ok(derived)
}

fn row_key(row: &ReleaseArtist) -> CreditKey {
    (row.artist_id, row.profession_id)
}

/// Recompute the release's derived credit rows from its active recordings.
///
/// Legacy manual rows are dropped. Work-derived rows are inserted as
/// `position = 1, main = true`; recording-derived rows as `main = false`.
/// Rows present on both sides keep their editable fields and only gain new
/// provenance ids. A second run without intervening changes writes nothing.
pub fn reconcile(tx: &CatalogTx, release: ReleaseId) -> CatalogResult<ReconcileOutcome> {
    let recordings = queries::active_recordings_of_release(tx, release)?;
    let work_credits = derive_work_credits(tx, &recordings)?;
    let recording_credits = derive_recording_credits(tx, &recordings)?;

    let mut outcome = ReconcileOutcome::default();
    let mut existing_from_work = Vec::new();
    let mut existing_from_recording = Vec::new();
    for row in queries::release_artists_of(tx, release)? {
        match row.source_type {
            SourceType::Normal => {
                mutations::delete_release_artist(tx, row.id)?;
                outcome.normal_removed += 1;
            }
            SourceType::SyncFromWork => existing_from_work.push(row),
            SourceType::SyncFromRecording => existing_from_recording.push(row),
        }
    }

    let no_sources = BTreeSet::new();
    outcome.from_work = sync::reconcile(
        existing_from_work,
        work_credits,
        row_key,
        ArtistCredit::key,
        |row| mutations::delete_release_artist(tx, row.id),
        |credit| {
            mutations::insert_release_artist(
                tx,
                release,
                credit.artist_id,
                credit.profession_id,
                1,
                true,
                SourceType::SyncFromWork,
                &no_sources,
            )
            .map(|_| ())
        },
        |_, _| Ok(false),
    )?;

    outcome.from_recording = sync::reconcile(
        existing_from_recording,
        recording_credits,
        row_key,
        |derived: &RecordingDerivedCredit| derived.key,
        |row| mutations::delete_release_artist(tx, row.id),
        |derived| {
            mutations::insert_release_artist(
                tx,
                release,
                derived.key.0,
                derived.key.1,
                1,
                false,
                SourceType::SyncFromRecording,
                &derived.sources,
            )
            .map(|_| ())
        },
        |row, derived| {
            let missing: BTreeSet<RecordingArtistId> =
                derived.sources.difference(&row.sources).copied().collect();
            if missing.is_empty() {
                return Ok(false);
            }
            mutations::add_release_artist_sources(tx, row.id, &missing)?;
            Ok(true)
        },
    )?;

    if !outcome.is_noop() {
        debug!(
            "Reconciled credits of release {}: {} legacy removed, work {:?}, recording {:?}",
            release, outcome.normal_removed, outcome.from_work, outcome.from_recording
        );
    }
    Ok(outcome)
}

pub fn reconcile_releases(
    tx: &CatalogTx,
    releases: impl IntoIterator<Item = ReleaseId>,
) -> CatalogResult<ReconcileOutcome> {
    let mut total = ReconcileOutcome::default();
    let mut done = HashSet::new();
    for release in releases {
        if done.insert(release) {
            total += reconcile(tx, release)?;
        }
    }
    Ok(total)
}

/// Reconcile every live release holding a track on one of `recordings`.
pub fn reconcile_reachable_from_recordings(
    tx: &CatalogTx,
    recordings: &[RecordingId],
) -> CatalogResult<ReconcileOutcome> {
    let releases = queries::releases_reachable_from_recordings(tx, recordings)?;
    reconcile_releases(tx, releases)
}

/// Reconcile every live release reachable from the work, directly or
/// through one of its movements.
pub fn reconcile_reachable_from_work(
    tx: &CatalogTx,
    work: WorkId,
) -> CatalogResult<ReconcileOutcome> {
    let recordings = queries::recordings_of_work(tx, work)?;
    reconcile_reachable_from_recordings(tx, &recordings)
}
