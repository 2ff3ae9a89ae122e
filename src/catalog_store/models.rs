//! Catalog models for the edition and credit store.
//!
//! Entities are addressed by opaque integer ids; relations between them
//! (subject to master, inherited track group to its origin) are explicit id
//! columns rather than embedded references.

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

// =============================================================================
// Identifiers
// =============================================================================

macro_rules! entity_id {
    ($name:ident) => {
        #[derive(
            Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            pub fn get(self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                $name(value)
            }
        }

        impl From<$name> for i64 {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.0))
            }
        }

        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                i64::column_result(value).map($name)
            }
        }
    };
}

entity_id!(ArtistId);
entity_id!(ProfessionId);
entity_id!(LabelId);
entity_id!(WorkId);
entity_id!(MovementId);
entity_id!(WorkArtistId);
entity_id!(RecordingId);
entity_id!(RecordingArtistId);
entity_id!(ReleaseId);
entity_id!(TrackGroupId);
entity_id!(TrackId);
entity_id!(ReleaseArtistId);
entity_id!(CatalogNumberId);
entity_id!(IssueId);

// =============================================================================
// Enumerations
// =============================================================================

/// Editorial status of a release.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentStatus {
    Draft,
    Checking,
    Waiting,
    Published,
    Archived,
}

impl DocumentStatus {
    pub const ALL: [DocumentStatus; 5] = [
        DocumentStatus::Draft,
        DocumentStatus::Checking,
        DocumentStatus::Waiting,
        DocumentStatus::Published,
        DocumentStatus::Archived,
    ];

    /// Every status except `Archived`, used to compute edition cohorts.
    pub const UNARCHIVED: [DocumentStatus; 4] = [
        DocumentStatus::Draft,
        DocumentStatus::Checking,
        DocumentStatus::Waiting,
        DocumentStatus::Published,
    ];

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "DRAFT" => Some(DocumentStatus::Draft),
            "CHECKING" => Some(DocumentStatus::Checking),
            "WAITING" => Some(DocumentStatus::Waiting),
            "PUBLISHED" => Some(DocumentStatus::Published),
            "ARCHIVED" => Some(DocumentStatus::Archived),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            DocumentStatus::Draft => "DRAFT",
            DocumentStatus::Checking => "CHECKING",
            DocumentStatus::Waiting => "WAITING",
            DocumentStatus::Published => "PUBLISHED",
            DocumentStatus::Archived => "ARCHIVED",
        }
    }
}

/// Provenance of a release credit row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceType {
    /// Manually entered. Legacy rows, removed by reconciliation.
    Normal,
    SyncFromWork,
    SyncFromRecording,
}

impl SourceType {
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "NORMAL" => Some(SourceType::Normal),
            "SYNC_FROM_WORK" => Some(SourceType::SyncFromWork),
            "SYNC_FROM_RECORDING" => Some(SourceType::SyncFromRecording),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            SourceType::Normal => "NORMAL",
            SourceType::SyncFromWork => "SYNC_FROM_WORK",
            SourceType::SyncFromRecording => "SYNC_FROM_RECORDING",
        }
    }
}

/// Whether a track group's tracks are authored locally or inherited, and if
/// inherited, whether they still mirror the origin group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Freshness {
    SelfAuthored,
    InheritedFresh,
    InheritedStale,
}

impl Freshness {
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "SELF_AUTHORED" => Some(Freshness::SelfAuthored),
            "INHERITED_FRESH" => Some(Freshness::InheritedFresh),
            "INHERITED_STALE" => Some(Freshness::InheritedStale),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            Freshness::SelfAuthored => "SELF_AUTHORED",
            Freshness::InheritedFresh => "INHERITED_FRESH",
            Freshness::InheritedStale => "INHERITED_STALE",
        }
    }
}

macro_rules! db_str_sql {
    ($name:ident) => {
        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.to_db_str()))
            }
        }

        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                let s = value.as_str()?;
                $name::from_db_str(s).ok_or_else(|| {
                    FromSqlError::Other(
                        format!("unknown {} value '{}'", stringify!($name), s).into(),
                    )
                })
            }
        }
    };
}

db_str_sql!(DocumentStatus);
db_str_sql!(SourceType);
db_str_sql!(Freshness);

/// Direction for reordering a track group within its release.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Move {
    Up,
    Down,
}

// =============================================================================
// Reference data
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artist {
    pub id: ArtistId,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profession {
    pub id: ProfessionId,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub id: LabelId,
    pub name: String,
}

// =============================================================================
// Works and recordings
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Work {
    pub id: WorkId,
    pub title: String,
    pub deleted: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    pub id: MovementId,
    pub work_id: WorkId,
    pub title: String,
    pub position: i64,
    pub deleted: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkArtist {
    pub id: WorkArtistId,
    pub work_id: WorkId,
    pub artist_id: ArtistId,
    pub profession_id: ProfessionId,
    pub position: i64,
    pub main: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recording {
    pub id: RecordingId,
    pub title: String,
    pub work_id: Option<WorkId>,
    pub movement_id: Option<MovementId>,
    pub deleted: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordingArtist {
    pub id: RecordingArtistId,
    pub recording_id: RecordingId,
    pub artist_id: ArtistId,
    pub profession_id: ProfessionId,
    pub position: i64,
    pub main: bool,
}

// =============================================================================
// Releases
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    pub id: ReleaseId,
    pub title: String,
    pub status: DocumentStatus,
    pub be_master: bool,
    pub deleted: bool,
    pub back_edition_count: i64,
    pub front_edition_count: i64,
    pub masters: BTreeSet<ReleaseId>,
}

impl Release {
    pub fn is_archived(&self) -> bool {
        self.status == DocumentStatus::Archived
    }

    /// A release with no masters. Standalone releases are masters of nobody yet.
    pub fn is_standalone(&self) -> bool {
        self.masters.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackGroup {
    pub id: TrackGroupId,
    pub release_id: ReleaseId,
    pub master_group_id: Option<TrackGroupId>,
    pub freshness: Freshness,
    pub position: i64,
    pub title: Option<String>,
}

impl TrackGroup {
    /// The release's own group, not inherited from anyone.
    pub fn is_own(&self) -> bool {
        self.master_group_id.is_none()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub id: TrackId,
    pub release_id: ReleaseId,
    pub track_group_id: TrackGroupId,
    pub recording_id: RecordingId,
    pub position: i64,
    pub side: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseArtist {
    pub id: ReleaseArtistId,
    pub release_id: ReleaseId,
    pub artist_id: ArtistId,
    pub profession_id: ProfessionId,
    pub position: i64,
    pub main: bool,
    pub source_type: SourceType,
    /// Contributing recording credits, only populated for `SyncFromRecording`.
    pub sources: BTreeSet<RecordingArtistId>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogNumber {
    pub id: CatalogNumberId,
    pub release_id: ReleaseId,
    pub label_id: Option<LabelId>,
    pub prefix: Option<String>,
    pub number: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub id: IssueId,
    pub release_id: ReleaseId,
    /// Unix timestamp, seconds.
    pub issue_time: i64,
    pub regions: Vec<String>,
}

// =============================================================================
// Inputs
// =============================================================================

#[derive(Clone, Debug)]
pub struct NewRelease {
    pub title: String,
    pub status: DocumentStatus,
}

#[derive(Clone, Debug, Default)]
pub struct NewRecording {
    pub title: String,
    pub work_id: Option<WorkId>,
    pub movement_id: Option<MovementId>,
}

/// One credit in a list edit of recording artists.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreditInput {
    pub artist_id: ArtistId,
    pub profession_id: ProfessionId,
    pub position: i64,
    pub main: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatalogNumberInput {
    pub label_id: Option<LabelId>,
    pub prefix: Option<String>,
    pub number: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IssueInput {
    pub issue_time: i64,
    pub regions: Vec<String>,
}
