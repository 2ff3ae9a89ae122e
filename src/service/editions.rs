use super::{release_keys, CatalogService};
use crate::catalog_store::{
    queries, CatalogResult, DocumentStatus, LockKey, Release, ReleaseId, TrackGroup,
};
use crate::editions;

impl CatalogService {
    pub fn relation_to_master(
        &self,
        subject: ReleaseId,
        masters: &[ReleaseId],
        force: bool,
    ) -> CatalogResult<Vec<TrackGroup>> {
        let mut keys = self.release_and_masters_keys(subject)?;
        keys.extend(release_keys(masters.iter().copied()));
        self.locked_write(keys, |tx| {
            editions::relation_to_master(tx, subject, masters, force)
        })
    }

    /// Link several subjects to one master.
    pub fn link_subjects_to_master(
        &self,
        master: ReleaseId,
        subjects: &[ReleaseId],
        force: bool,
    ) -> CatalogResult<Vec<TrackGroup>> {
        let keys = release_keys(std::iter::once(master).chain(subjects.iter().copied()));
        self.locked_write(keys, |tx| {
            let mut created = Vec::new();
            for subject in subjects {
                created.extend(editions::relation_to_master(tx, *subject, &[master], force)?);
            }
            Ok(created)
        })
    }

    pub fn clear_relation_to_master(
        &self,
        subject: ReleaseId,
        masters: &[ReleaseId],
    ) -> CatalogResult<()> {
        let mut keys = self.release_and_masters_keys(subject)?;
        keys.extend(release_keys(masters.iter().copied()));
        self.locked_write(keys, |tx| {
            editions::clear_relation_to_master(tx, subject, masters)
        })
    }

    pub fn set_as_master(&self, release: ReleaseId) -> CatalogResult<Vec<ReleaseId>> {
        let keys = self.release_and_masters_keys(release)?;
        self.locked_write(keys, |tx| editions::set_as_master(tx, release))
    }

    pub fn sync_subjects(&self, master: ReleaseId) -> CatalogResult<Vec<ReleaseId>> {
        self.locked_write([LockKey::Release(master)], |tx| {
            editions::sync_subjects(tx, master)
        })
    }

    pub fn same_editions(
        &self,
        release: ReleaseId,
        statuses: &[DocumentStatus],
    ) -> CatalogResult<Vec<Release>> {
        self.store
            .read(|conn| editions::same_editions(conn, release, statuses))
    }

    pub fn refresh_edition_count(&self, release: ReleaseId) -> CatalogResult<Vec<ReleaseId>> {
        self.locked_write([LockKey::Release(release)], |tx| {
            editions::refresh_edition_count(tx, release)
        })
    }

    pub fn get_masters(&self, release: ReleaseId) -> CatalogResult<Vec<Release>> {
        self.store.read(|conn| {
            let release = queries::get_release(conn, release)?;
            let mut masters = Vec::with_capacity(release.masters.len());
            for master in &release.masters {
                masters.push(queries::get_release(conn, *master)?);
            }
            Ok(masters)
        })
    }

    pub fn subjects_of_master(&self, master: ReleaseId) -> CatalogResult<Vec<Release>> {
        self.store.read(|conn| {
            queries::get_release(conn, master)?;
            queries::subjects_of(conn, master)
        })
    }
}
