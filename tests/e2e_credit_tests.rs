//! End-to-end tests for credit reconciliation
//!
//! Work-derived and recording-derived release credits, their provenance and
//! the operations that edit credits at their source.

mod common;

use common::{credit, TestCatalog, MOVEMENT_1_TITLE, MOVEMENT_2_TITLE, PERFORMER_NAME};
use edition_sync::catalog_store::{CreditInput, SourceType};
use edition_sync::CatalogError;

// =============================================================================
// Work credits
// =============================================================================

#[test]
fn test_work_credit_flows_to_standalone_release() {
    let catalog = TestCatalog::new();
    let (release, work, _) = catalog.master_with_track();

    assert_eq!(
        catalog.credits(release),
        vec![(
            work.composer,
            work.profession,
            SourceType::SyncFromWork,
            1,
            true,
            vec![]
        )]
    );
}

#[test]
fn test_reconcile_is_idempotent() {
    let catalog = TestCatalog::new();
    let (release, _, recording) = catalog.master_with_track();
    let performer = catalog.service.create_artist(PERFORMER_NAME).unwrap();
    let violin = catalog.service.create_profession("violin").unwrap();
    catalog
        .service
        .add_recording_artist(recording, credit(performer, violin, false))
        .unwrap();

    let before = catalog.credits(release);
    assert!(catalog.service.reconcile_release(release).unwrap().is_noop());
    assert!(catalog.service.reconcile_all().unwrap().is_noop());
    assert_eq!(catalog.credits(release), before);
}

#[test]
fn test_movement_recordings_draw_credits_from_their_work() {
    let catalog = TestCatalog::new();
    let work = catalog.composed_work();
    let first = catalog
        .service
        .create_movement(work.work, MOVEMENT_1_TITLE)
        .unwrap();
    let second = catalog
        .service
        .create_movement(work.work, MOVEMENT_2_TITLE)
        .unwrap();
    assert_eq!((first.position, second.position), (1, 2));

    let release = catalog.release("Movements");
    let tracks = catalog
        .service
        .add_tracks_by_movements(release, &[first.id, second.id])
        .unwrap();
    assert_eq!(tracks.len(), 2);
    assert_eq!(tracks[1].position, 2);

    // Two recordings of one work still yield a single row
    let rows = catalog.credits(release);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].0, work.composer);
    assert_eq!(rows[0].2, SourceType::SyncFromWork);
}

#[test]
fn test_reassign_movement_moves_credits() {
    let catalog = TestCatalog::new();
    let original = catalog.composed_work();
    let movement = catalog
        .service
        .create_movement(original.work, MOVEMENT_1_TITLE)
        .unwrap();
    let release = catalog.release("Reassigned");
    catalog
        .service
        .add_tracks_by_movements(release, &[movement.id])
        .unwrap();

    let arranger = catalog.service.create_artist("Arranger").unwrap();
    let other = catalog.service.create_work("Arrangement").unwrap();
    catalog
        .service
        .add_work_artist(other.id, credit(arranger, original.profession, true))
        .unwrap();

    catalog
        .service
        .reassign_movement(movement.id, other.id)
        .unwrap();

    let rows = catalog.credits(release);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].0, arranger);
}

#[test]
fn test_soft_deleted_work_stops_contributing() {
    let catalog = TestCatalog::new();
    let (release, work, _) = catalog.master_with_track();

    catalog.service.soft_delete_work(work.work).unwrap();

    assert!(catalog.credits(release).is_empty());
}

#[test]
fn test_soft_deleted_movement_stops_contributing() {
    let catalog = TestCatalog::new();
    let work = catalog.composed_work();
    let movement = catalog
        .service
        .create_movement(work.work, MOVEMENT_1_TITLE)
        .unwrap();
    let release = catalog.release("Movements");
    catalog
        .service
        .add_tracks_by_movements(release, &[movement.id])
        .unwrap();
    assert_eq!(catalog.credits(release).len(), 1);

    catalog.service.soft_delete_movement(movement.id).unwrap();

    assert!(catalog.credits(release).is_empty());
}

#[test]
fn test_work_artist_edits_reach_every_release() {
    let catalog = TestCatalog::new();
    let (first, work, recording) = catalog.master_with_track();
    let second = catalog.release("Compilation");
    catalog.service.add_track(second, recording, None).unwrap();

    let lyricist = catalog.service.create_profession("lyricist").unwrap();
    let added = catalog
        .service
        .add_work_artist(work.work, credit(work.composer, lyricist, true))
        .unwrap();
    assert_eq!(catalog.credits(first).len(), 2);
    assert_eq!(catalog.credits(second).len(), 2);

    // The same pair is not credited twice
    let again = catalog
        .service
        .add_work_artist(work.work, credit(work.composer, lyricist, false))
        .unwrap();
    assert_eq!(added, again);

    catalog.service.remove_work_artist(added).unwrap();
    assert_eq!(catalog.credits(first).len(), 1);
    assert_eq!(catalog.credits(second).len(), 1);
}

// =============================================================================
// Recording credits
// =============================================================================

#[test]
fn test_recording_credit_added_then_removed() {
    let catalog = TestCatalog::new();
    let (release, work, recording) = catalog.master_with_track();
    let performer = catalog.service.create_artist(PERFORMER_NAME).unwrap();
    let violin = catalog.service.create_profession("violin").unwrap();

    let added = catalog
        .service
        .add_recording_artist(recording, credit(performer, violin, true))
        .unwrap();

    assert_eq!(
        catalog.credits(release),
        vec![
            (
                work.composer,
                work.profession,
                SourceType::SyncFromWork,
                1,
                true,
                vec![]
            ),
            (
                performer,
                violin,
                SourceType::SyncFromRecording,
                1,
                false,
                vec![added.id.get()]
            ),
        ]
    );

    catalog.service.remove_recording_artist(added.id).unwrap();
    let rows = catalog.credits(release);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].2, SourceType::SyncFromWork);
}

#[test]
fn test_adding_existing_recording_credit_is_noop() {
    let catalog = TestCatalog::new();
    let (_, _, recording) = catalog.master_with_track();
    let performer = catalog.service.create_artist(PERFORMER_NAME).unwrap();
    let violin = catalog.service.create_profession("violin").unwrap();

    let first = catalog
        .service
        .add_recording_artist(recording, credit(performer, violin, true))
        .unwrap();
    let second = catalog
        .service
        .add_recording_artist(
            recording,
            CreditInput {
                position: 9,
                ..credit(performer, violin, false)
            },
        )
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(catalog.service.recording_artists(recording).unwrap().len(), 1);
}

#[test]
fn test_shared_credit_collects_every_source() {
    let catalog = TestCatalog::new();
    let (release, work, first) = catalog.master_with_track();
    let second = catalog.recording_of(work.work, "Take 2");
    catalog.service.add_track(release, second, None).unwrap();

    let performer = catalog.service.create_artist(PERFORMER_NAME).unwrap();
    let violin = catalog.service.create_profession("violin").unwrap();
    let a = catalog
        .service
        .add_recording_artist(first, credit(performer, violin, false))
        .unwrap();
    let b = catalog
        .service
        .add_recording_artist(second, credit(performer, violin, false))
        .unwrap();

    let row = catalog
        .service
        .release_artists(release)
        .unwrap()
        .into_iter()
        .find(|r| r.source_type == SourceType::SyncFromRecording)
        .unwrap();
    assert_eq!(row.sources.into_iter().collect::<Vec<_>>(), vec![a.id, b.id]);
}

#[test]
fn test_shared_credit_outlives_one_contributor() {
    let catalog = TestCatalog::new();
    let (release, work, first) = catalog.master_with_track();
    let second = catalog.recording_of(work.work, "Take 2");
    catalog.service.add_track(release, second, None).unwrap();
    let performer = catalog.service.create_artist(PERFORMER_NAME).unwrap();
    let violin = catalog.service.create_profession("violin").unwrap();
    let kept = catalog
        .service
        .add_recording_artist(first, credit(performer, violin, false))
        .unwrap();
    let dropped = catalog
        .service
        .add_recording_artist(second, credit(performer, violin, false))
        .unwrap();

    catalog.service.remove_recording_artist(dropped.id).unwrap();

    let row = catalog
        .service
        .release_artists(release)
        .unwrap()
        .into_iter()
        .find(|r| r.source_type == SourceType::SyncFromRecording)
        .unwrap();
    assert_eq!(row.sources.iter().copied().collect::<Vec<_>>(), vec![kept.id]);
    assert!(catalog.service.reconcile_release(release).unwrap().is_noop());

    // A credit elsewhere never takes over the freed id
    let elsewhere = catalog.release("Elsewhere");
    let third = catalog.plain_recording("Unrelated take");
    catalog.service.add_track(elsewhere, third, None).unwrap();
    let pianist = catalog.service.create_artist("Pianist").unwrap();
    let piano = catalog.service.create_profession("piano").unwrap();
    let unrelated = catalog
        .service
        .add_recording_artist(third, credit(pianist, piano, false))
        .unwrap();
    assert_ne!(unrelated.id, dropped.id);

    let outcome = catalog.service.remove_release_artist(row.id).unwrap();

    assert_eq!(outcome.from_recording.removed, 1);
    assert!(catalog.service.recording_artists(first).unwrap().is_empty());
    assert_eq!(catalog.service.recording_artists(third).unwrap(), vec![unrelated]);
    assert_eq!(catalog.credits(elsewhere).len(), 1);
    let rows = catalog.credits(release);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].2, SourceType::SyncFromWork);
}

#[test]
fn test_update_recording_artists_patches_the_list() {
    let catalog = TestCatalog::new();
    let (release, _, recording) = catalog.master_with_track();
    let soloist = catalog.service.create_artist(PERFORMER_NAME).unwrap();
    let pianist = catalog.service.create_artist("Pianist").unwrap();
    let violin = catalog.service.create_profession("violin").unwrap();
    let piano = catalog.service.create_profession("piano").unwrap();

    let stats = catalog
        .service
        .update_recording_artists(
            recording,
            vec![credit(soloist, violin, true), credit(pianist, piano, false)],
        )
        .unwrap();
    assert_eq!((stats.removed, stats.added, stats.updated), (0, 2, 0));
    assert_eq!(catalog.credits(release).len(), 3);

    let stats = catalog
        .service
        .update_recording_artists(
            recording,
            vec![CreditInput {
                position: 2,
                ..credit(pianist, piano, false)
            }],
        )
        .unwrap();
    assert_eq!((stats.removed, stats.added, stats.updated), (1, 0, 1));

    let credits = catalog.service.recording_artists(recording).unwrap();
    assert_eq!(credits.len(), 1);
    assert_eq!(credits[0].position, 2);
    let rows = catalog.credits(release);
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.0 != soloist));

    let unchanged = catalog
        .service
        .update_recording_artists(
            recording,
            vec![CreditInput {
                position: 2,
                ..credit(pianist, piano, false)
            }],
        )
        .unwrap();
    assert!(unchanged.is_noop());
}

#[test]
fn test_soft_deleted_recording_drops_its_credits() {
    let catalog = TestCatalog::new();
    let (release, _, recording) = catalog.master_with_track();
    let performer = catalog.service.create_artist(PERFORMER_NAME).unwrap();
    let violin = catalog.service.create_profession("violin").unwrap();
    catalog
        .service
        .add_recording_artist(recording, credit(performer, violin, false))
        .unwrap();
    assert_eq!(catalog.credits(release).len(), 2);

    catalog.service.soft_delete_recording(recording).unwrap();

    assert!(catalog.credits(release).is_empty());
    assert!(matches!(
        catalog.service.recording_artists(recording),
        Err(CatalogError::NotFound { .. })
    ));
}

#[test]
fn test_copy_recording_keeps_work_and_credits() {
    let catalog = TestCatalog::new();
    let (_, work, recording) = catalog.master_with_track();
    let performer = catalog.service.create_artist(PERFORMER_NAME).unwrap();
    let violin = catalog.service.create_profession("violin").unwrap();
    catalog
        .service
        .add_recording_artist(recording, credit(performer, violin, false))
        .unwrap();

    let copy = catalog.service.copy_recording(recording).unwrap();

    assert_ne!(copy.id, recording);
    assert_eq!(copy.work_id, Some(work.work));
    let credits = catalog.service.recording_artists(copy.id).unwrap();
    assert_eq!(credits.len(), 1);
    assert_eq!(credits[0].artist_id, performer);
}

// =============================================================================
// Release credits
// =============================================================================

#[test]
fn test_work_derived_release_credit_cannot_be_removed() {
    let catalog = TestCatalog::new();
    let (release, _, _) = catalog.master_with_track();
    let row = catalog.service.release_artists(release).unwrap().remove(0);

    let result = catalog.service.remove_release_artist(row.id);

    assert!(matches!(result, Err(CatalogError::IllegalOperation(_))));
    assert_eq!(catalog.credits(release).len(), 1);
}

#[test]
fn test_removing_recording_derived_credit_removes_its_sources() {
    let catalog = TestCatalog::new();
    let (release, work, recording) = catalog.master_with_track();
    let other_release = catalog.release("Compilation");
    catalog
        .service
        .add_track(other_release, recording, None)
        .unwrap();
    let performer = catalog.service.create_artist(PERFORMER_NAME).unwrap();
    let violin = catalog.service.create_profession("violin").unwrap();
    catalog
        .service
        .add_recording_artist(recording, credit(performer, violin, false))
        .unwrap();
    let row = catalog
        .service
        .release_artists(release)
        .unwrap()
        .into_iter()
        .find(|r| r.source_type == SourceType::SyncFromRecording)
        .unwrap();

    let outcome = catalog.service.remove_release_artist(row.id).unwrap();

    assert_eq!(outcome.from_recording.removed, 2);
    assert!(catalog.service.recording_artists(recording).unwrap().is_empty());
    for release in [release, other_release] {
        let rows = catalog.credits(release);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].0, work.composer);
    }
}

#[test]
fn test_main_flag_is_user_editable_and_survives_reconcile() {
    let catalog = TestCatalog::new();
    let (release, _, _) = catalog.master_with_track();
    let row = catalog.service.release_artists(release).unwrap().remove(0);
    assert!(row.main);

    catalog
        .service
        .set_release_artists_main(release, &[row.id], false)
        .unwrap();
    assert!(catalog.service.reconcile_release(release).unwrap().is_noop());

    let row = catalog.service.release_artists(release).unwrap().remove(0);
    assert!(!row.main);
}
