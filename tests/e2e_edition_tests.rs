//! End-to-end tests for the edition graph
//!
//! Linking subjects to masters, unlinking, promotion and edition counts.

mod common;

use common::{TestCatalog, SIDE_A, SIDE_B, SUBJECT_TITLE};
use edition_sync::catalog_store::{queries, DocumentStatus, Freshness, Release, ReleaseId};
use edition_sync::CatalogError;

fn ids(releases: Vec<Release>) -> Vec<ReleaseId> {
    releases.into_iter().map(|r| r.id).collect()
}

// =============================================================================
// relation_to_master
// =============================================================================

#[test]
fn test_subject_inherits_master_tracks_and_credits() {
    let catalog = TestCatalog::new();
    let (master, work, _) = catalog.master_with_track();
    let second = catalog.recording_of(work.work, "Rondo");
    catalog
        .service
        .add_track(master, second, Some(SIDE_B))
        .unwrap();
    let subject = catalog.release(SUBJECT_TITLE);

    let groups = catalog
        .service
        .relation_to_master(subject, &[master], false)
        .unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].freshness, Freshness::InheritedFresh);
    let subject_release = catalog.service.get_release(subject).unwrap();
    assert!(!subject_release.be_master);
    assert_eq!(
        subject_release.masters.into_iter().collect::<Vec<_>>(),
        vec![master]
    );
    assert_eq!(catalog.track_sequence(subject), catalog.track_sequence(master));
    assert_eq!(
        catalog.track_sequence(subject)[1],
        (2, Some(SIDE_B.to_string()), second)
    );
    assert_eq!(catalog.credits(subject), catalog.credits(master));
    catalog.assert_consistent();
}

#[test]
fn test_link_to_empty_master_creates_its_group() {
    let catalog = TestCatalog::new();
    let master = catalog.release("Empty master");
    let subject = catalog.release(SUBJECT_TITLE);

    let groups = catalog
        .service
        .relation_to_master(subject, &[master], false)
        .unwrap();

    assert_eq!(groups.len(), 1);
    assert!(catalog.track_sequence(subject).is_empty());
    catalog.assert_consistent();
}

#[test]
fn test_link_to_several_masters() {
    let catalog = TestCatalog::new();
    let (first, _, _) = catalog.master_with_track();
    let second = catalog.release("Second master");
    let bonus = catalog.plain_recording("Bonus");
    catalog.service.add_track(second, bonus, None).unwrap();
    let subject = catalog.release(SUBJECT_TITLE);

    let groups = catalog
        .service
        .relation_to_master(subject, &[first, second], false)
        .unwrap();

    assert_eq!(groups.len(), 2);
    assert_eq!((groups[0].position, groups[1].position), (1, 2));
    assert_eq!(catalog.service.get_masters(subject).unwrap().len(), 2);
    // Multi-master subjects have no single-master cohort
    assert_eq!(
        catalog
            .service
            .same_editions(subject, &DocumentStatus::ALL)
            .unwrap(),
        vec![]
    );
    catalog.assert_consistent();
}

#[test]
fn test_link_rejects_invalid_graphs() {
    let catalog = TestCatalog::new();
    let master = catalog.release("Master");
    let subject = catalog.release(SUBJECT_TITLE);
    let other = catalog.release("Other");
    catalog
        .service
        .relation_to_master(subject, &[master], false)
        .unwrap();

    let self_link = catalog.service.relation_to_master(other, &[other], false);
    assert!(matches!(self_link, Err(CatalogError::IllegalOperation(_))));

    let to_subject = catalog.service.relation_to_master(other, &[subject], false);
    assert!(matches!(to_subject, Err(CatalogError::IllegalOperation(_))));

    let master_as_subject = catalog.service.relation_to_master(master, &[other], false);
    assert!(matches!(
        master_as_subject,
        Err(CatalogError::IllegalOperation(_))
    ));

    let twice = catalog.service.relation_to_master(subject, &[master], false);
    assert!(matches!(twice, Err(CatalogError::Conflict(_))));

    let missing = catalog
        .service
        .relation_to_master(other, &[ReleaseId(9999)], false);
    assert!(matches!(missing, Err(CatalogError::NotFound { .. })));

    catalog.assert_consistent();
}

#[test]
fn test_link_requires_force_to_replace_own_tracks() {
    let catalog = TestCatalog::new();
    let (master, _, master_recording) = catalog.master_with_track();
    let subject = catalog.release(SUBJECT_TITLE);
    let own = catalog.plain_recording("Own bonus track");
    catalog.service.add_track(subject, own, Some(SIDE_B)).unwrap();

    let refused = catalog.service.relation_to_master(subject, &[master], false);
    assert!(matches!(refused, Err(CatalogError::Conflict(_))));
    assert_eq!(
        catalog.track_sequence(subject),
        vec![(1, Some(SIDE_B.to_string()), own)]
    );
    assert!(catalog.service.get_release(subject).unwrap().be_master);

    catalog
        .service
        .relation_to_master(subject, &[master], true)
        .unwrap();
    assert_eq!(
        catalog.track_sequence(subject),
        vec![(1, Some(SIDE_A.to_string()), master_recording)]
    );
    // The discarded track was the bonus recording's only use
    assert!(matches!(
        catalog.service.recording_artists(own),
        Err(CatalogError::NotFound { .. })
    ));
    catalog.assert_consistent();
}

#[test]
fn test_force_link_keeps_recordings_used_elsewhere() {
    let catalog = TestCatalog::new();
    let (master, _, _) = catalog.master_with_track();
    let subject = catalog.release(SUBJECT_TITLE);
    let compilation = catalog.release("Compilation");
    let shared = catalog.plain_recording("Shared take");
    catalog.service.add_track(subject, shared, None).unwrap();
    catalog.service.add_track(compilation, shared, None).unwrap();

    catalog
        .service
        .relation_to_master(subject, &[master], true)
        .unwrap();

    assert!(catalog.service.recording_artists(shared).is_ok());
    assert_eq!(catalog.track_sequence(compilation), vec![(1, None, shared)]);
}

#[test]
fn test_link_subjects_to_master_in_bulk() {
    let catalog = TestCatalog::new();
    let (master, _, _) = catalog.master_with_track();
    let first = catalog.release("First reissue");
    let second = catalog.release("Second reissue");

    let groups = catalog
        .service
        .link_subjects_to_master(master, &[first, second], false)
        .unwrap();

    assert_eq!(groups.len(), 2);
    assert_eq!(
        ids(catalog.service.subjects_of_master(master).unwrap()),
        vec![first, second]
    );
    assert_eq!(catalog.counts(master), (3, 0));
    catalog.assert_consistent();
}

// =============================================================================
// Cohorts and counts
// =============================================================================

#[test]
fn test_unlink_shrinks_the_cohort() {
    let catalog = TestCatalog::new();
    let master = catalog.release("Master");
    let r3 = catalog.release("Third");
    let r4 = catalog.release("Fourth");
    catalog
        .service
        .relation_to_master(r3, &[master], false)
        .unwrap();
    catalog
        .service
        .relation_to_master(r4, &[master], false)
        .unwrap();

    assert_eq!(
        ids(catalog
            .service
            .same_editions(r3, &DocumentStatus::UNARCHIVED)
            .unwrap()),
        vec![master, r4]
    );
    assert_eq!(catalog.counts(master).0, 3);
    assert_eq!(catalog.counts(r3).0, 3);

    catalog
        .service
        .clear_relation_to_master(r4, &[master])
        .unwrap();

    assert_eq!(
        ids(catalog
            .service
            .same_editions(r3, &DocumentStatus::UNARCHIVED)
            .unwrap()),
        vec![master]
    );
    assert_eq!(catalog.counts(master).0, 2);
    assert_eq!(catalog.counts(r3).0, 2);
    assert_eq!(catalog.counts(r4).0, 1);

    let r4_release = catalog.service.get_release(r4).unwrap();
    assert!(r4_release.be_master);
    assert!(r4_release.masters.is_empty());
    assert!(catalog.track_sequence(r4).is_empty());
    catalog.assert_consistent();
}

#[test]
fn test_unlink_from_unlinked_master_is_rejected() {
    let catalog = TestCatalog::new();
    let master = catalog.release("Master");
    let subject = catalog.release(SUBJECT_TITLE);

    let result = catalog.service.clear_relation_to_master(subject, &[master]);

    assert!(matches!(result, Err(CatalogError::IllegalOperation(_))));
}

#[test]
fn test_counts_follow_status_changes() {
    let catalog = TestCatalog::new();
    let master = catalog.release_with_status("Master", DocumentStatus::Published);
    let subject = catalog.release(SUBJECT_TITLE);
    let archived = catalog.release("Withdrawn");
    catalog
        .service
        .link_subjects_to_master(master, &[subject, archived], false)
        .unwrap();
    assert_eq!(catalog.counts(master), (3, 1));

    catalog
        .service
        .update_status(subject, DocumentStatus::Published)
        .unwrap();
    assert_eq!(catalog.counts(master), (3, 2));
    assert_eq!(catalog.counts(subject), (3, 2));

    catalog
        .service
        .update_status(archived, DocumentStatus::Archived)
        .unwrap();
    assert_eq!(catalog.counts(master), (2, 2));
    assert_eq!(catalog.counts(subject), (2, 2));
    assert_eq!(
        ids(catalog
            .service
            .same_editions(subject, &DocumentStatus::UNARCHIVED)
            .unwrap()),
        vec![master]
    );
    assert_eq!(
        catalog
            .service
            .same_editions(subject, &DocumentStatus::ALL)
            .unwrap()
            .len(),
        2
    );

    // Counts already match, nothing to write
    assert!(catalog.service.refresh_edition_count(subject).unwrap().is_empty());
    catalog.assert_consistent();
}

#[test]
fn test_archived_release_rejects_graph_operations() {
    let catalog = TestCatalog::new();
    let master = catalog.release("Master");
    let subject = catalog.release_with_status(SUBJECT_TITLE, DocumentStatus::Archived);

    let result = catalog.service.relation_to_master(subject, &[master], false);

    assert!(matches!(result, Err(CatalogError::NotFound { .. })));
}

// =============================================================================
// set_as_master
// =============================================================================

#[test]
fn test_set_as_master_flips_the_cohort() {
    let catalog = TestCatalog::new();
    let (master, _, _) = catalog.master_with_track();
    let s1 = catalog.release("S1");
    let s2 = catalog.release("S2");
    let promoted = catalog.release("Promoted");
    catalog
        .service
        .link_subjects_to_master(master, &[s1, s2, promoted], false)
        .unwrap();
    let sequence = catalog.track_sequence(master);

    let cohort = catalog.service.set_as_master(promoted).unwrap();

    assert_eq!(cohort, vec![master, s1, s2]);
    assert_eq!(
        ids(catalog
            .service
            .same_editions(promoted, &DocumentStatus::ALL)
            .unwrap()),
        vec![master, s1, s2]
    );
    for member in [master, s1, s2] {
        assert_eq!(ids(catalog.service.get_masters(member).unwrap()), vec![promoted]);
        assert_eq!(catalog.counts(member).0, 4);
    }
    let promoted_release = catalog.service.get_release(promoted).unwrap();
    assert!(promoted_release.be_master);
    assert!(promoted_release.masters.is_empty());
    assert_eq!(catalog.track_sequence(promoted), sequence);
    catalog.assert_consistent();

    // Everyone now waits for the new master's tracks
    let touched = catalog.service.sync_subjects(promoted).unwrap();
    assert_eq!(touched.len(), 3);
    for member in [master, s1, s2] {
        assert_eq!(catalog.track_sequence(member), sequence);
    }
    catalog.assert_consistent();
}

#[test]
fn test_set_as_master_rejects_multi_master_subjects() {
    let catalog = TestCatalog::new();
    let first = catalog.release("First master");
    let second = catalog.release("Second master");
    let subject = catalog.release(SUBJECT_TITLE);
    catalog
        .service
        .relation_to_master(subject, &[first, second], false)
        .unwrap();

    let result = catalog.service.set_as_master(subject);
    assert!(matches!(result, Err(CatalogError::IllegalOperation(_))));

    let standalone = catalog.release("Standalone");
    let result = catalog.service.set_as_master(standalone);
    assert!(matches!(result, Err(CatalogError::IllegalOperation(_))));
}

#[test]
fn test_set_as_master_rejects_when_sibling_has_several_masters() {
    let catalog = TestCatalog::new();
    let master = catalog.release("Master");
    let other = catalog.release("Other master");
    let single = catalog.release("Single");
    let double = catalog.release("Double");
    catalog
        .service
        .relation_to_master(single, &[master], false)
        .unwrap();
    catalog
        .service
        .relation_to_master(double, &[master, other], false)
        .unwrap();

    let result = catalog.service.set_as_master(single);

    assert!(matches!(
        result,
        Err(CatalogError::IllegalOperation(ref reason)) if reason.contains("no longer a master")
    ));
    assert_eq!(ids(catalog.service.get_masters(single).unwrap()), vec![master]);
}

#[test]
fn test_set_as_master_carries_deleted_subjects_along() {
    let catalog = TestCatalog::new();
    let (master, _, _) = catalog.master_with_track();
    let promoted = catalog.release("Promoted");
    let deleted = catalog.release("Withdrawn");
    catalog
        .service
        .link_subjects_to_master(master, &[promoted, deleted], false)
        .unwrap();
    catalog.service.soft_delete_release(deleted).unwrap();

    let cohort = catalog.service.set_as_master(promoted).unwrap();
    assert_eq!(cohort, vec![master]);

    let touched = catalog.service.sync_subjects(promoted).unwrap();
    assert_eq!(touched, vec![master]);

    let withdrawn = catalog
        .service
        .store()
        .read(|conn| queries::find_release(conn, deleted))
        .unwrap()
        .unwrap();
    assert_eq!(withdrawn.masters.into_iter().collect::<Vec<_>>(), vec![promoted]);
    assert_eq!(catalog.counts(promoted), (2, 0));
    catalog.assert_consistent();
}

#[test]
fn test_failed_operation_rolls_back_and_publishes_nothing() {
    let catalog = TestCatalog::new();
    let (master, _, _) = catalog.master_with_track();
    let subject = catalog.release(SUBJECT_TITLE);
    let own = catalog.plain_recording("Own");
    catalog.service.add_track(subject, own, None).unwrap();
    catalog.events.drain();

    assert!(catalog
        .service
        .relation_to_master(subject, &[master], false)
        .is_err());

    assert!(catalog.events.drain().is_empty());
    assert!(catalog.service.get_release(subject).unwrap().be_master);
    assert_eq!(catalog.track_sequence(subject).len(), 1);
}
