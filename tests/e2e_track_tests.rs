//! End-to-end tests for track editing and subject synchronization

mod common;

use common::{TestCatalog, SIDE_A, SIDE_B, SUBJECT_TITLE};
use edition_sync::catalog_store::{DocumentStatus, Freshness, Move, SourceType};
use edition_sync::CatalogError;
use std::thread;

#[test]
fn test_first_track_creates_own_group() {
    let catalog = TestCatalog::new();
    let release = catalog.release("Fresh");
    let first = catalog.plain_recording("One");
    let second = catalog.plain_recording("Two");

    let a = catalog.service.add_track(release, first, Some(SIDE_A)).unwrap();
    let b = catalog.service.add_track(release, second, None).unwrap();

    assert_eq!(a.track_group_id, b.track_group_id);
    assert_eq!((a.position, b.position), (1, 2));
    assert_eq!(b.side, None);
    catalog.assert_consistent();
}

#[test]
fn test_add_track_by_work_records_the_work() {
    let catalog = TestCatalog::new();
    let work = catalog.composed_work();
    let release = catalog.release("By work");

    let track = catalog
        .service
        .add_track_by_work(release, work.work, Some(SIDE_A))
        .unwrap();

    assert_eq!(track.position, 1);
    assert_eq!(track.side.as_deref(), Some(SIDE_A));
    assert!(catalog.service.recording_artists(track.recording_id).unwrap().is_empty());
    let rows = catalog.credits(release);
    assert_eq!(rows.len(), 1);
    assert_eq!((rows[0].0, rows[0].2), (work.composer, SourceType::SyncFromWork));
    catalog.assert_consistent();
}

#[test]
fn test_sync_subjects_pulls_master_edits() {
    let catalog = TestCatalog::new();
    let (master, work, _) = catalog.master_with_track();
    let subject = catalog.release(SUBJECT_TITLE);
    catalog
        .service
        .relation_to_master(subject, &[master], false)
        .unwrap();
    assert!(catalog.service.sync_subjects(master).unwrap().is_empty());

    let added = catalog.recording_of(work.work, "Encore");
    catalog.service.add_track(master, added, Some(SIDE_B)).unwrap();
    let stale = catalog.service.tracks_of_release(subject).unwrap();
    assert_eq!(stale.len(), 1);

    let touched = catalog.service.sync_subjects(master).unwrap();

    assert_eq!(touched, vec![subject]);
    assert_eq!(catalog.track_sequence(subject), catalog.track_sequence(master));
    assert_eq!(catalog.credits(subject), catalog.credits(master));
    assert!(catalog.service.sync_subjects(master).unwrap().is_empty());
    catalog.assert_consistent();
}

#[test]
fn test_side_change_on_master_marks_subject_stale() {
    let catalog = TestCatalog::new();
    let (master, _, recording) = catalog.master_with_track();
    let subject = catalog.release(SUBJECT_TITLE);
    let inherited = catalog
        .service
        .relation_to_master(subject, &[master], false)
        .unwrap()
        .remove(0);
    assert_eq!(inherited.freshness, Freshness::InheritedFresh);
    let track = catalog.service.tracks_of_release(master).unwrap().remove(0);

    catalog
        .service
        .update_track_side(track.id, Some(SIDE_B))
        .unwrap();
    catalog.assert_consistent();
    catalog.service.sync_subjects(master).unwrap();

    assert_eq!(
        catalog.track_sequence(subject),
        vec![(1, Some(SIDE_B.to_string()), recording)]
    );
}

#[test]
fn test_sync_from_master_without_tracks_is_rejected() {
    let catalog = TestCatalog::new();
    let (master, _, _) = catalog.master_with_track();
    let subject = catalog.release(SUBJECT_TITLE);
    catalog
        .service
        .relation_to_master(subject, &[master], false)
        .unwrap();
    let track = catalog.service.tracks_of_release(master).unwrap().remove(0);
    catalog.service.delete_tracks(master, &[track.id]).unwrap();

    let result = catalog.service.sync_subjects(master);

    assert!(matches!(result, Err(CatalogError::IllegalOperation(_))));
    // The subject keeps its last copy
    assert_eq!(catalog.track_sequence(subject).len(), 1);
}

#[test]
fn test_sync_subjects_requires_a_master() {
    let catalog = TestCatalog::new();
    let master = catalog.release("Master");
    let subject = catalog.release(SUBJECT_TITLE);
    catalog
        .service
        .relation_to_master(subject, &[master], false)
        .unwrap();

    let result = catalog.service.sync_subjects(subject);

    assert!(matches!(result, Err(CatalogError::IllegalOperation(_))));
}

#[test]
fn test_delete_last_track_soft_deletes_recording() {
    let catalog = TestCatalog::new();
    let (release, _, recording) = catalog.master_with_track();
    let track = catalog.service.tracks_of_release(release).unwrap().remove(0);

    let outcome = catalog.service.delete_tracks(release, &[track.id]).unwrap();

    assert_eq!(outcome.from_work.removed, 1);
    assert!(catalog.credits(release).is_empty());
    assert!(matches!(
        catalog.service.recording_artists(recording),
        Err(CatalogError::NotFound { .. })
    ));
}

#[test]
fn test_delete_track_keeps_recording_used_elsewhere() {
    let catalog = TestCatalog::new();
    let (release, _, recording) = catalog.master_with_track();
    let other = catalog.release("Compilation");
    catalog.service.add_track(other, recording, None).unwrap();
    let track = catalog.service.tracks_of_release(release).unwrap().remove(0);

    catalog.service.delete_tracks(release, &[track.id]).unwrap();

    assert!(catalog.service.recording_artists(recording).is_ok());
    assert_eq!(catalog.credits(other).len(), 1);
}

#[test]
fn test_delete_tracks_rejects_foreign_track() {
    let catalog = TestCatalog::new();
    let (release, _, _) = catalog.master_with_track();
    let other = catalog.release("Other");
    let track = catalog.service.tracks_of_release(release).unwrap().remove(0);

    let result = catalog.service.delete_tracks(other, &[track.id]);

    assert!(matches!(result, Err(CatalogError::NotFound { .. })));
    assert_eq!(catalog.service.tracks_of_release(release).unwrap().len(), 1);
}

#[test]
fn test_swap_track_order() {
    let catalog = TestCatalog::new();
    let (release, work, first) = catalog.master_with_track();
    let second = catalog.recording_of(work.work, "Second");
    catalog.service.add_track(release, second, None).unwrap();
    let tracks = catalog.service.tracks_of_release(release).unwrap();

    catalog
        .service
        .swap_track_order(tracks[0].id, tracks[1].id)
        .unwrap();

    let order: Vec<_> = catalog
        .track_sequence(release)
        .into_iter()
        .map(|(_, _, recording)| recording)
        .collect();
    assert_eq!(order, vec![second, first]);
}

#[test]
fn test_track_group_order() {
    let catalog = TestCatalog::new();
    let first = catalog.release("First master");
    let second = catalog.release("Second master");
    let subject = catalog.release(SUBJECT_TITLE);
    let groups = catalog
        .service
        .relation_to_master(subject, &[first, second], false)
        .unwrap();

    assert!(catalog
        .service
        .update_track_group_order(groups[1].id, Move::Up)
        .unwrap());
    assert!(!catalog
        .service
        .update_track_group_order(groups[1].id, Move::Up)
        .unwrap());
    assert!(!catalog
        .service
        .update_track_group_order(groups[0].id, Move::Down)
        .unwrap());
}

#[test]
fn test_add_track_to_archived_release_is_rejected() {
    let catalog = TestCatalog::new();
    let release = catalog.release_with_status("Gone", DocumentStatus::Archived);
    let recording = catalog.plain_recording("Lost");

    let result = catalog.service.add_track(release, recording, None);

    assert!(matches!(result, Err(CatalogError::NotFound { .. })));
}

#[test]
fn test_concurrent_appends_get_distinct_positions() {
    let catalog = TestCatalog::new();
    let release = catalog.release("Busy");
    let recordings: Vec<Vec<_>> = (0..4)
        .map(|t| {
            (0..5)
                .map(|i| catalog.plain_recording(&format!("take {}-{}", t, i)))
                .collect()
        })
        .collect();

    thread::scope(|scope| {
        for batch in &recordings {
            let service = &catalog.service;
            scope.spawn(move || {
                for recording in batch {
                    service.add_track(release, *recording, None).unwrap();
                }
            });
        }
    });

    let positions: Vec<i64> = catalog
        .service
        .tracks_of_release(release)
        .unwrap()
        .into_iter()
        .map(|t| t.position)
        .collect();
    assert_eq!(positions, (1..=20).collect::<Vec<_>>());
    catalog.assert_consistent();
}
