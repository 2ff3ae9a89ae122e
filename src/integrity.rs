//! Catalog-wide consistency check of the edition graph.
//!
//! Read only. Scans every live release and reports each broken invariant;
//! fixing is left to the operator.

use crate::catalog_store::{
    queries, CatalogResult, DocumentStatus, Freshness, ReleaseId, TrackGroupId,
};
use crate::editions;
use rusqlite::Connection;
use std::fmt;
use tracing::{info, warn};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Violation {
    /// `be_master` and a non-empty masters set must be exclusive, and one of
    /// them must hold.
    MasterFlagMismatch {
        release: ReleaseId,
        be_master: bool,
        masters: usize,
    },
    MasterOwnsManyGroups {
        release: ReleaseId,
        groups: usize,
    },
    SubjectOwnsManyGroups {
        release: ReleaseId,
        own_groups: usize,
    },
    LinkedToNonMaster {
        release: ReleaseId,
        master: ReleaseId,
    },
    InheritedGroupCount {
        release: ReleaseId,
        master: ReleaseId,
        groups: usize,
    },
    OrphanInheritedGroup {
        release: ReleaseId,
        group: TrackGroupId,
    },
    FreshnessMismatch {
        group: TrackGroupId,
        freshness: Freshness,
        has_origin: bool,
    },
    EditionCountMismatch {
        release: ReleaseId,
        stored: (i64, i64),
        expected: (i64, i64),
    },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::MasterFlagMismatch {
                release,
                be_master,
                masters,
            } => write!(
                f,
                "release {}: be_master={} with {} masters",
                release, be_master, masters
            ),
            Violation::MasterOwnsManyGroups { release, groups } => {
                write!(f, "master release {} owns {} track groups", release, groups)
            }
            Violation::SubjectOwnsManyGroups {
                release,
                own_groups,
            } => write!(
                f,
                "subject release {} owns {} own track groups",
                release, own_groups
            ),
            Violation::LinkedToNonMaster { release, master } => write!(
                f,
                "release {} links to {} which is not a master",
                release, master
            ),
            Violation::InheritedGroupCount {
                release,
                master,
                groups,
            } => write!(
                f,
                "release {} holds {} groups inherited from master {}",
                release, groups, master
            ),
            Violation::OrphanInheritedGroup { release, group } => write!(
                f,
                "release {} group {} inherits from a release it is not linked to",
                release, group
            ),
            Violation::FreshnessMismatch {
                group,
                freshness,
                has_origin,
            } => write!(
                f,
                "track group {} is {} but has_origin={}",
                group,
                freshness.to_db_str(),
                has_origin
            ),
            Violation::EditionCountMismatch {
                release,
                stored,
                expected,
            } => write!(
                f,
                "release {} edition counts {:?}, expected {:?}",
                release, stored, expected
            ),
        }
    }
}

#[derive(Debug, Default)]
pub struct IntegrityReport {
    pub releases_checked: usize,
    pub violations: Vec<Violation>,
}

impl IntegrityReport {
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }
}

pub fn check(conn: &Connection) -> CatalogResult<IntegrityReport> {
    let mut report = IntegrityReport::default();

    for release_id in queries::all_release_ids(conn)? {
        let release = queries::get_release(conn, release_id)?;
        report.releases_checked += 1;
        let violations = &mut report.violations;

        if release.be_master == !release.masters.is_empty() {
            violations.push(Violation::MasterFlagMismatch {
                release: release.id,
                be_master: release.be_master,
                masters: release.masters.len(),
            });
        }

        let groups = queries::track_groups_of_release(conn, release.id)?;
        for group in &groups {
            let has_origin = group.master_group_id.is_some();
            if has_origin == (group.freshness == Freshness::SelfAuthored) {
                violations.push(Violation::FreshnessMismatch {
                    group: group.id,
                    freshness: group.freshness,
                    has_origin,
                });
            }
        }

        if release.be_master {
            if groups.len() > 1 {
                violations.push(Violation::MasterOwnsManyGroups {
                    release: release.id,
                    groups: groups.len(),
                });
            }
        } else {
            let own_groups = groups.iter().filter(|g| g.is_own()).count();
            if own_groups > 1 {
                violations.push(Violation::SubjectOwnsManyGroups {
                    release: release.id,
                    own_groups,
                });
            }

            let mut master_groups = Vec::new();
            for master_id in &release.masters {
                let Some(master) = queries::find_release(conn, *master_id)? else {
                    continue;
                };
                if !master.be_master {
                    violations.push(Violation::LinkedToNonMaster {
                        release: release.id,
                        master: master.id,
                    });
                }
                let master_group = queries::track_groups_of_release(conn, master.id)?
                    .into_iter()
                    .next()
                    .map(|g| g.id);
                let inherited = match master_group {
                    Some(origin) => groups
                        .iter()
                        .filter(|g| g.master_group_id == Some(origin))
                        .count(),
                    None => 0,
                };
                if inherited != 1 {
                    violations.push(Violation::InheritedGroupCount {
                        release: release.id,
                        master: master.id,
                        groups: inherited,
                    });
                }
                master_groups.extend(master_group);
            }
            for group in groups.iter().filter(|g| !g.is_own()) {
                if let Some(origin) = group.master_group_id {
                    if !master_groups.contains(&origin) {
                        violations.push(Violation::OrphanInheritedGroup {
                            release: release.id,
                            group: group.id,
                        });
                    }
                }
            }
        }

        if !release.is_archived() {
            let cohort =
                editions::same_editions_of(conn, &release, &DocumentStatus::UNARCHIVED)?;
            let back = cohort.len() as i64 + 1;
            let front = cohort
                .iter()
                .chain(std::iter::once(&release))
                .filter(|r| r.status == DocumentStatus::Published)
                .count() as i64;
            let stored = (release.back_edition_count, release.front_edition_count);
            if stored != (back, front) {
                violations.push(Violation::EditionCountMismatch {
                    release: release.id,
                    stored,
                    expected: (back, front),
                });
            }
        }
    }

    // Deleted releases keep their links and must not point at a non-master.
    for release_id in queries::deleted_release_ids(conn)? {
        let Some(release) = queries::find_release(conn, release_id)? else {
            continue;
        };
        for master_id in &release.masters {
            let Some(master) = queries::find_release(conn, *master_id)? else {
                continue;
            };
            if !master.be_master {
                report.violations.push(Violation::LinkedToNonMaster {
                    release: release.id,
                    master: master.id,
                });
            }
        }
    }

    if report.is_clean() {
        info!(
            "Integrity check passed for {} releases",
            report.releases_checked
        );
    } else {
        for violation in &report.violations {
            warn!("Integrity violation: {}", violation);
        }
    }
    Ok(report)
}
