//! Catalog fixtures backed by an on-disk temporary database

#![allow(dead_code)]

use super::constants::*;
use edition_sync::catalog_store::{
    ArtistId, CollectingEventSink, CreditInput, DocumentStatus, NewRecording, NewRelease,
    ProfessionId, RecordingId, ReleaseId, SourceType, WorkId, DEFAULT_BUSY_TIMEOUT,
};
use edition_sync::{integrity, CatalogService, SqliteCatalogStore};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

/// A release credit reduced to the fields reconciliation decides.
pub type CreditRow = (ArtistId, ProfessionId, SourceType, i64, bool, Vec<i64>);

/// A track reduced to (position, side, recording).
pub type TrackRow = (i64, Option<String>, RecordingId);

pub fn credit(artist: ArtistId, profession: ProfessionId, main: bool) -> CreditInput {
    CreditInput {
        artist_id: artist,
        profession_id: profession,
        position: 1,
        main,
    }
}

/// A work credited to its composer.
pub struct ComposedWork {
    pub work: WorkId,
    pub composer: ArtistId,
    pub profession: ProfessionId,
}

pub struct TestCatalog {
    pub service: CatalogService,
    pub events: Arc<CollectingEventSink>,
    pub db_path: PathBuf,
    _dir: TempDir,
}

impl TestCatalog {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("catalog.db");
        let events = Arc::new(CollectingEventSink::new());
        let store = SqliteCatalogStore::open(&db_path, DEFAULT_BUSY_TIMEOUT)
            .unwrap()
            .with_event_sink(events.clone());
        TestCatalog {
            service: CatalogService::new(store),
            events,
            db_path,
            _dir: dir,
        }
    }

    pub fn release(&self, title: &str) -> ReleaseId {
        self.release_with_status(title, DocumentStatus::Draft)
    }

    pub fn release_with_status(&self, title: &str, status: DocumentStatus) -> ReleaseId {
        self.service
            .create_release(NewRelease {
                title: title.to_string(),
                status,
            })
            .unwrap()
            .id
    }

    /// The fixture work with its composer credit.
    pub fn composed_work(&self) -> ComposedWork {
        let composer = self.service.create_artist(COMPOSER_NAME).unwrap();
        let profession = self.service.create_profession(COMPOSER_PROFESSION).unwrap();
        let work = self.service.create_work(WORK_TITLE).unwrap().id;
        self.service
            .add_work_artist(work, credit(composer, profession, true))
            .unwrap();
        ComposedWork {
            work,
            composer,
            profession,
        }
    }

    pub fn recording_of(&self, work: WorkId, title: &str) -> RecordingId {
        self.service
            .create_recording(NewRecording {
                title: title.to_string(),
                work_id: Some(work),
                movement_id: None,
            })
            .unwrap()
            .id
    }

    pub fn plain_recording(&self, title: &str) -> RecordingId {
        self.service
            .create_recording(NewRecording {
                title: title.to_string(),
                ..Default::default()
            })
            .unwrap()
            .id
    }

    /// A master release holding one track of the fixture work on side A.
    pub fn master_with_track(&self) -> (ReleaseId, ComposedWork, RecordingId) {
        let master = self.release(MASTER_TITLE);
        let work = self.composed_work();
        let recording = self.recording_of(work.work, WORK_TITLE);
        self.service
            .add_track(master, recording, Some(SIDE_A))
            .unwrap();
        (master, work, recording)
    }

    pub fn credits(&self, release: ReleaseId) -> Vec<CreditRow> {
        let mut rows: Vec<CreditRow> = self
            .service
            .release_artists(release)
            .unwrap()
            .into_iter()
            .map(|r| {
                (
                    r.artist_id,
                    r.profession_id,
                    r.source_type,
                    r.position,
                    r.main,
                    r.sources.into_iter().map(i64::from).collect(),
                )
            })
            .collect();
        rows.sort_by_key(|r| (r.0, r.1));
        rows
    }

    pub fn track_sequence(&self, release: ReleaseId) -> Vec<TrackRow> {
        self.service
            .tracks_of_release(release)
            .unwrap()
            .into_iter()
            .map(|t| (t.position, t.side, t.recording_id))
            .collect()
    }

    pub fn counts(&self, release: ReleaseId) -> (i64, i64) {
        let release = self.service.get_release(release).unwrap();
        (release.back_edition_count, release.front_edition_count)
    }

    pub fn assert_consistent(&self) {
        let report = self.service.store().read(integrity::check).unwrap();
        assert!(report.is_clean(), "{:?}", report.violations);
    }
}
