use super::CatalogService;
use crate::catalog_store::{
    mutations, queries, CatalogError, CatalogNumberInput, CatalogResult, CatalogTx,
    DocumentStatus, IssueInput, LockKey, NewRelease, Release, ReleaseId,
};
use crate::credits::{self, ReconcileOutcome};
use crate::editions;
use crate::sync::{self, PatchStats};
use tracing::info;

/// Every release whose cohort counts may move when `release` changes.
fn cohort_with_self(tx: &CatalogTx, release: &Release) -> CatalogResult<Vec<ReleaseId>> {
    let mut ids: Vec<ReleaseId> = editions::same_editions_of(tx, release, &DocumentStatus::ALL)?
        .into_iter()
        .map(|r| r.id)
        .collect();
    ids.push(release.id);
    Ok(ids)
}

fn copy_release_row(tx: &CatalogTx, origin: ReleaseId) -> CatalogResult<Release> {
    let origin = queries::get_release(tx, origin)?;
    let copy = mutations::insert_release(
        tx,
        &NewRelease {
            title: origin.title.clone(),
            status: DocumentStatus::Draft,
        },
    )?;
    for catalog in queries::catalogs_of(tx, origin.id)? {
        mutations::insert_catalog(
            tx,
            copy,
            &CatalogNumberInput {
                label_id: catalog.label_id,
                prefix: catalog.prefix,
                number: catalog.number,
            },
        )?;
    }
    for issue in queries::issues_of(tx, origin.id)? {
        mutations::insert_issue(
            tx,
            copy,
            &IssueInput {
                issue_time: issue.issue_time,
                regions: issue.regions,
            },
        )?;
    }
    editions::refresh_edition_count(tx, copy)?;
    credits::reconcile(tx, copy)?;
    info!("Copied release {} into {}", origin.id, copy);
    queries::get_release(tx, copy)
}

impl CatalogService {
    pub fn create_release(&self, release: NewRelease) -> CatalogResult<Release> {
        self.store.write(|tx| {
            let id = mutations::insert_release(tx, &release)?;
            editions::refresh_edition_count(tx, id)?;
            queries::get_release(tx, id)
        })
    }

    pub fn get_release(&self, release: ReleaseId) -> CatalogResult<Release> {
        self.store.read(|conn| queries::get_release(conn, release))
    }

    /// Change the status and refresh the cohort counts, which depend on it.
    pub fn update_status(&self, release: ReleaseId, status: DocumentStatus) -> CatalogResult<()> {
        let keys = self.release_and_masters_keys(release)?;
        self.locked_write(keys, |tx| {
            let current = queries::get_release(tx, release)?;
            if current.status == status {
                return Ok(());
            }
            mutations::set_release_status(tx, release, status)?;
            let updated = queries::get_release(tx, release)?;
            editions::refresh_edition_count_all(tx, cohort_with_self(tx, &updated)?)?;
            Ok(())
        })
    }

    /// Soft delete. A master still followed by subjects cannot go.
    pub fn soft_delete_release(&self, release: ReleaseId) -> CatalogResult<()> {
        let keys = self.release_and_masters_keys(release)?;
        self.locked_write(keys, |tx| {
            let current = queries::get_release(tx, release)?;
            if current.be_master && !queries::subjects_of(tx, release)?.is_empty() {
                return Err(CatalogError::illegal(format!(
                    "master release {} still has subjects",
                    release
                )));
            }
            let former_cohort = cohort_with_self(tx, &current)?;
            mutations::set_release_deleted(tx, release)?;
            editions::refresh_edition_count_all(tx, former_cohort)?;
            info!("Soft deleted release {}", release);
            Ok(())
        })
    }

    /// Hard delete. Derived credits, tracks and groups go with the row.
    pub fn delete_release(&self, release: ReleaseId) -> CatalogResult<()> {
        let keys = self.release_and_masters_keys(release)?;
        self.locked_write(keys, |tx| {
            let current = queries::find_release(tx, release)?
                .ok_or_else(|| CatalogError::not_found("Release", release))?;
            if !queries::subject_ids_of(tx, release)?.is_empty() {
                return Err(CatalogError::illegal(format!(
                    "master release {} still has subjects",
                    release
                )));
            }
            let former_cohort = if current.deleted {
                Vec::new()
            } else {
                cohort_with_self(tx, &current)?
            };
            mutations::delete_release_row(tx, release)?;
            editions::refresh_edition_count_all(tx, former_cohort)?;
            info!("Deleted release {}", release);
            Ok(())
        })
    }

    /// Copy base fields, catalog numbers and issues into a new standalone
    /// draft. Tracks are not copied.
    pub fn copy_release(&self, origin: ReleaseId) -> CatalogResult<Release> {
        self.locked_write([LockKey::Release(origin)], |tx| copy_release_row(tx, origin))
    }

    /// Copy `origin` and link the copy as one more edition of it: to `origin`
    /// itself when it is a master, to its masters otherwise.
    pub fn copy_as_same_edition(&self, origin: ReleaseId) -> CatalogResult<Release> {
        let keys = self.release_and_masters_keys(origin)?;
        self.locked_write(keys, |tx| {
            let source = queries::get_unarchived_release(tx, origin)?;
            let masters: Vec<ReleaseId> = if source.be_master {
                vec![origin]
            } else {
                source.masters.iter().copied().collect()
            };
            let copy = copy_release_row(tx, origin)?;
            editions::relation_to_master(tx, copy.id, &masters, false)?;
            queries::get_release(tx, copy.id)
        })
    }

    /// Replace the release's catalog numbers, matched by (label, number).
    pub fn update_catalogs(
        &self,
        release: ReleaseId,
        catalogs: Vec<CatalogNumberInput>,
    ) -> CatalogResult<PatchStats> {
        self.locked_write([LockKey::Release(release)], |tx| {
            queries::get_unarchived_release(tx, release)?;
            for catalog in &catalogs {
                if let Some(label) = catalog.label_id {
                    queries::get_label(tx, label)?;
                }
            }
            sync::reconcile(
                queries::catalogs_of(tx, release)?,
                catalogs,
                |c| (c.label_id, c.number.clone()),
                |c| (c.label_id, c.number.clone()),
                |c| mutations::delete_catalog(tx, &c),
                |c| mutations::insert_catalog(tx, release, &c).map(|_| ()),
                |current, wanted| {
                    if current.prefix == wanted.prefix {
                        return Ok(false);
                    }
                    mutations::set_catalog_prefix(tx, current, wanted.prefix.as_deref())?;
                    Ok(true)
                },
            )
        })
    }

    /// Replace the release's issues, matched by issue time.
    pub fn update_issues(
        &self,
        release: ReleaseId,
        issues: Vec<IssueInput>,
    ) -> CatalogResult<PatchStats> {
        self.locked_write([LockKey::Release(release)], |tx| {
            queries::get_unarchived_release(tx, release)?;
            sync::reconcile(
                queries::issues_of(tx, release)?,
                issues,
                |i| i.issue_time,
                |i| i.issue_time,
                |i| mutations::delete_issue(tx, &i),
                |i| mutations::insert_issue(tx, release, &i).map(|_| ()),
                |current, wanted| {
                    if current.regions == wanted.regions {
                        return Ok(false);
                    }
                    mutations::set_issue_regions(tx, current, &wanted.regions)?;
                    Ok(true)
                },
            )
        })
    }

    pub fn reconcile_release(&self, release: ReleaseId) -> CatalogResult<ReconcileOutcome> {
        self.locked_write([LockKey::Release(release)], |tx| {
            queries::get_unarchived_release(tx, release)?;
            credits::reconcile(tx, release)
        })
    }

    /// Reconcile every live, unarchived release.
    pub fn reconcile_all(&self) -> CatalogResult<ReconcileOutcome> {
        let releases = self.store.read(queries::all_release_ids)?;
        let mut total = ReconcileOutcome::default();
        for release in releases {
            match self.reconcile_release(release) {
                Ok(outcome) => total += outcome,
                Err(err) if err.is_not_found() => {}
                Err(err) => return Err(err),
            }
        }
        Ok(total)
    }
}
