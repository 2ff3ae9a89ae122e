use super::CatalogService;
use crate::catalog_store::{
    mutations, queries, CatalogError, CatalogResult, CreditInput, LockKey, MovementId,
    NewRecording, Recording, RecordingArtist, RecordingArtistId, RecordingId, ReleaseArtist,
    ReleaseArtistId, ReleaseId, SourceType, WorkArtistId, WorkId,
};
use crate::credits::{self, ReconcileOutcome};
use crate::sync::{self, PatchStats};
use tracing::{info, warn};

fn validate_credit(conn: &rusqlite::Connection, credit: &CreditInput) -> CatalogResult<()> {
    queries::get_artist(conn, credit.artist_id)?;
    queries::get_profession(conn, credit.profession_id)?;
    Ok(())
}

impl CatalogService {
    // =========================================================================
    // Release credits
    // =========================================================================

    pub fn release_artists(&self, release: ReleaseId) -> CatalogResult<Vec<ReleaseArtist>> {
        self.store.read(|conn| {
            queries::get_release(conn, release)?;
            queries::release_artists_of(conn, release)
        })
    }

    /// Set the user-editable `main` flag on rows of one release.
    pub fn set_release_artists_main(
        &self,
        release: ReleaseId,
        rows: &[ReleaseArtistId],
        main: bool,
    ) -> CatalogResult<()> {
        self.locked_write([LockKey::Release(release)], |tx| {
            queries::get_unarchived_release(tx, release)?;
            for id in rows {
                let row = queries::find_release_artist(tx, *id)?;
                if row.release_id != release {
                    return Err(CatalogError::not_found("ReleaseArtist", *id));
                }
                if row.main != main {
                    mutations::set_release_artist_main(tx, row.id, main)?;
                }
            }
            Ok(())
        })
    }

    /// Remove a release credit.
    ///
    /// Work-derived rows cannot be removed here, the work credit has to go.
    /// Recording-derived rows are removed at their source: the contributing
    /// recording credits are deleted and every reachable release reconciled.
    pub fn remove_release_artist(&self, id: ReleaseArtistId) -> CatalogResult<ReconcileOutcome> {
        let (row, source_credits) = self.store.read(|conn| {
            let row = queries::find_release_artist(conn, id)?;
            let mut source_credits = Vec::new();
            for source in &row.sources {
                match queries::find_recording_artist(conn, *source) {
                    Ok(credit)
                        if credit.artist_id == row.artist_id
                            && credit.profession_id == row.profession_id =>
                    {
                        source_credits.push(credit)
                    }
                    Ok(credit) => warn!(
                        "Release artist {} lists recording credit {} of another artist or profession",
                        id, credit.id
                    ),
                    Err(err) if err.is_not_found() => {}
                    Err(err) => return Err(err),
                }
            }
            Ok((row, source_credits))
        })?;

        let mut keys = vec![LockKey::Release(row.release_id)];
        keys.extend(
            source_credits
                .iter()
                .map(|c| LockKey::Recording(c.recording_id)),
        );
        self.locked_write(keys, |tx| {
            queries::get_unarchived_release(tx, row.release_id)?;
            match row.source_type {
                SourceType::SyncFromWork => Err(CatalogError::illegal(format!(
                    "release artist {} is derived from a work credit",
                    id
                ))),
                SourceType::Normal => {
                    mutations::delete_release_artist(tx, id)?;
                    Ok(ReconcileOutcome::default())
                }
                SourceType::SyncFromRecording => {
                    let mut recordings = Vec::with_capacity(source_credits.len());
                    for credit in &source_credits {
                        mutations::delete_recording_artist(tx, credit)?;
                        recordings.push(credit.recording_id);
                    }
                    info!(
                        "Removed {} recording credits behind release artist {}",
                        source_credits.len(),
                        id
                    );
                    let mut outcome = credits::reconcile(tx, row.release_id)?;
                    outcome += credits::reconcile_reachable_from_recordings(tx, &recordings)?;
                    Ok(outcome)
                }
            }
        })
    }

    // =========================================================================
    // Recording credits
    // =========================================================================

    pub fn recording_artists(&self, recording: RecordingId) -> CatalogResult<Vec<RecordingArtist>> {
        self.store.read(|conn| {
            queries::get_recording(conn, recording)?;
            queries::recording_artists_of(conn, recording)
        })
    }

    /// Add a credit to a recording; an existing (artist, profession) pair is
    /// returned unchanged.
    pub fn add_recording_artist(
        &self,
        recording: RecordingId,
        credit: CreditInput,
    ) -> CatalogResult<RecordingArtist> {
        self.locked_write([LockKey::Recording(recording)], |tx| {
            queries::get_recording(tx, recording)?;
            validate_credit(tx, &credit)?;
            let existing = queries::recording_artists_of(tx, recording)?
                .into_iter()
                .find(|c| c.artist_id == credit.artist_id && c.profession_id == credit.profession_id);
            if let Some(existing) = existing {
                return Ok(existing);
            }
            let id = mutations::insert_recording_artist(tx, recording, &credit)?;
            credits::reconcile_reachable_from_recordings(tx, &[recording])?;
            queries::find_recording_artist(tx, id)
        })
    }

    /// Replace a recording's credit list, matched by (artist, profession).
    pub fn update_recording_artists(
        &self,
        recording: RecordingId,
        credits_wanted: Vec<CreditInput>,
    ) -> CatalogResult<PatchStats> {
        self.locked_write([LockKey::Recording(recording)], |tx| {
            queries::get_recording(tx, recording)?;
            for credit in &credits_wanted {
                validate_credit(tx, credit)?;
            }
            let stats = sync::reconcile(
                queries::recording_artists_of(tx, recording)?,
                credits_wanted,
                |c| (c.artist_id, c.profession_id),
                |c| (c.artist_id, c.profession_id),
                |c| mutations::delete_recording_artist(tx, &c),
                |c| mutations::insert_recording_artist(tx, recording, &c).map(|_| ()),
                |current, wanted| {
                    if current.position == wanted.position && current.main == wanted.main {
                        return Ok(false);
                    }
                    mutations::update_recording_artist(tx, current, wanted.position, wanted.main)?;
                    Ok(true)
                },
            )?;
            if !stats.is_noop() {
                credits::reconcile_reachable_from_recordings(tx, &[recording])?;
            }
            Ok(stats)
        })
    }

    pub fn remove_recording_artist(&self, id: RecordingArtistId) -> CatalogResult<()> {
        let recording = self
            .store
            .read(|conn| Ok(queries::find_recording_artist(conn, id)?.recording_id))?;
        self.locked_write([LockKey::Recording(recording)], |tx| {
            let credit = queries::find_recording_artist(tx, id)?;
            mutations::delete_recording_artist(tx, &credit)?;
            credits::reconcile_reachable_from_recordings(tx, &[recording])?;
            Ok(())
        })
    }

    /// Copy a recording with its work or movement link and its credits.
    pub fn copy_recording(&self, origin: RecordingId) -> CatalogResult<Recording> {
        self.locked_write([LockKey::Recording(origin)], |tx| {
            let source = queries::get_recording(tx, origin)?;
            let copy = mutations::insert_recording(
                tx,
                &NewRecording {
                    title: source.title,
                    work_id: source.work_id,
                    movement_id: source.movement_id,
                },
            )?;
            for credit in queries::recording_artists_of(tx, origin)? {
                mutations::insert_recording_artist(
                    tx,
                    copy,
                    &CreditInput {
                        artist_id: credit.artist_id,
                        profession_id: credit.profession_id,
                        position: credit.position,
                        main: credit.main,
                    },
                )?;
            }
            credits::reconcile_reachable_from_recordings(tx, &[copy])?;
            queries::get_recording(tx, copy)
        })
    }

    pub fn soft_delete_recording(&self, recording: RecordingId) -> CatalogResult<()> {
        self.locked_write([LockKey::Recording(recording)], |tx| {
            queries::get_recording(tx, recording)?;
            mutations::set_recording_deleted(tx, recording)?;
            credits::reconcile_reachable_from_recordings(tx, &[recording])?;
            Ok(())
        })
    }

    // =========================================================================
    // Work credits
    // =========================================================================

    /// Add a credit to a work; an existing (artist, profession) pair is kept.
    pub fn add_work_artist(&self, work: WorkId, credit: CreditInput) -> CatalogResult<WorkArtistId> {
        self.locked_write([LockKey::Work(work)], |tx| {
            queries::get_work(tx, work)?;
            validate_credit(tx, &credit)?;
            let existing = queries::work_artists_of(tx, work)?
                .into_iter()
                .find(|c| c.artist_id == credit.artist_id && c.profession_id == credit.profession_id);
            if let Some(existing) = existing {
                return Ok(existing.id);
            }
            let id = mutations::insert_work_artist(tx, work, &credit)?;
            credits::reconcile_reachable_from_work(tx, work)?;
            Ok(id)
        })
    }

    pub fn remove_work_artist(&self, id: WorkArtistId) -> CatalogResult<()> {
        let work = self
            .store
            .read(|conn| Ok(queries::find_work_artist(conn, id)?.work_id))?;
        self.locked_write([LockKey::Work(work)], |tx| {
            let credit = queries::find_work_artist(tx, id)?;
            mutations::delete_work_artist(tx, &credit)?;
            credits::reconcile_reachable_from_work(tx, work)?;
            Ok(())
        })
    }

    /// Move a movement under another work.
    pub fn reassign_movement(&self, movement: MovementId, to: WorkId) -> CatalogResult<()> {
        let from = self
            .store
            .read(|conn| Ok(queries::get_movement(conn, movement)?.work_id))?;
        self.locked_write([LockKey::Work(from), LockKey::Work(to)], |tx| {
            let current = queries::get_movement(tx, movement)?;
            queries::get_work(tx, to)?;
            if current.work_id == to {
                return Ok(());
            }
            mutations::set_movement_work(tx, movement, current.work_id, to)?;
            let recordings = queries::recordings_of_movement(tx, movement)?;
            credits::reconcile_reachable_from_recordings(tx, &recordings)?;
            Ok(())
        })
    }

    pub fn soft_delete_work(&self, work: WorkId) -> CatalogResult<()> {
        self.locked_write([LockKey::Work(work)], |tx| {
            queries::get_work(tx, work)?;
            mutations::set_work_deleted(tx, work)?;
            credits::reconcile_reachable_from_work(tx, work)?;
            Ok(())
        })
    }

    pub fn soft_delete_movement(&self, movement: MovementId) -> CatalogResult<()> {
        let work = self
            .store
            .read(|conn| Ok(queries::get_movement(conn, movement)?.work_id))?;
        self.locked_write([LockKey::Work(work)], |tx| {
            let current = queries::get_movement(tx, movement)?;
            mutations::set_movement_deleted(tx, &current)?;
            let recordings = queries::recordings_of_movement(tx, movement)?;
            credits::reconcile_reachable_from_recordings(tx, &recordings)?;
            Ok(())
        })
    }
}
