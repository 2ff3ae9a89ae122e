//! SQLite schema definitions for the edition catalog database.
//!
//! Every relation is an explicit id column: releases point at their masters
//! through `subject_master`, inherited track groups point at their origin
//! group through `master_group_id`.

use crate::sqlite_column;
use crate::sqlite_persistence::{
    ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema,
};

const ARTISTS_FK: ForeignKey = ForeignKey {
    foreign_table: "artists",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Cascade,
};

const PROFESSIONS_FK: ForeignKey = ForeignKey {
    foreign_table: "professions",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Cascade,
};

const LABELS_FK: ForeignKey = ForeignKey {
    foreign_table: "labels",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::SetNull,
};

const WORKS_FK: ForeignKey = ForeignKey {
    foreign_table: "works",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Cascade,
};

const WORKS_NULLABLE_FK: ForeignKey = ForeignKey {
    foreign_table: "works",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::SetNull,
};

const MOVEMENTS_NULLABLE_FK: ForeignKey = ForeignKey {
    foreign_table: "movements",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::SetNull,
};

const RECORDINGS_FK: ForeignKey = ForeignKey {
    foreign_table: "recordings",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Cascade,
};

const RECORDINGS_RESTRICT_FK: ForeignKey = ForeignKey {
    foreign_table: "recordings",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Restrict,
};

const RELEASES_FK: ForeignKey = ForeignKey {
    foreign_table: "releases",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Cascade,
};

const TRACK_GROUPS_FK: ForeignKey = ForeignKey {
    foreign_table: "track_groups",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Cascade,
};

const MASTER_GROUP_FK: ForeignKey = ForeignKey {
    foreign_table: "track_groups",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::SetNull,
};

const RECORDING_ARTISTS_FK: ForeignKey = ForeignKey {
    foreign_table: "recording_artists",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Cascade,
};

const RELEASE_ARTISTS_FK: ForeignKey = ForeignKey {
    foreign_table: "release_artists",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Cascade,
};

// =============================================================================
// Reference data
// =============================================================================

const ARTISTS_TABLE: Table = Table {
    name: "artists",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
    ],
    indices: &[],
    unique_constraints: &[],
};

const PROFESSIONS_TABLE: Table = Table {
    name: "professions",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
    ],
    indices: &[],
    unique_constraints: &[&["name"]],
};

const LABELS_TABLE: Table = Table {
    name: "labels",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
    ],
    indices: &[],
    unique_constraints: &[],
};

// =============================================================================
// Works, movements, recordings and their credits
// =============================================================================

const WORKS_TABLE: Table = Table {
    name: "works",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("title", &SqlType::Text, non_null = true),
        sqlite_column!(
            "deleted",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
    ],
    indices: &[],
    unique_constraints: &[],
};

const MOVEMENTS_TABLE: Table = Table {
    name: "movements",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!(
            "work_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&WORKS_FK)
        ),
        sqlite_column!("title", &SqlType::Text, non_null = true),
        sqlite_column!(
            "position",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
        sqlite_column!(
            "deleted",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
    ],
    indices: &[("idx_movements_work", "work_id")],
    unique_constraints: &[],
};

const WORK_ARTISTS_TABLE: Table = Table {
    name: "work_artists",
    columns: &[
        sqlite_column!(
            "id",
            &SqlType::Integer,
            is_primary_key = true,
            autoincrement = true
        ),
        sqlite_column!(
            "work_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&WORKS_FK)
        ),
        sqlite_column!(
            "artist_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ARTISTS_FK)
        ),
        sqlite_column!(
            "profession_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&PROFESSIONS_FK)
        ),
        sqlite_column!(
            "position",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("1")
        ),
        sqlite_column!(
            "main",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
    ],
    indices: &[("idx_work_artists_work", "work_id")],
    unique_constraints: &[&["work_id", "artist_id", "profession_id"]],
};

const RECORDINGS_TABLE: Table = Table {
    name: "recordings",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("title", &SqlType::Text, non_null = true),
        sqlite_column!(
            "work_id",
            &SqlType::Integer,
            foreign_key = Some(&WORKS_NULLABLE_FK)
        ),
        sqlite_column!(
            "movement_id",
            &SqlType::Integer,
            foreign_key = Some(&MOVEMENTS_NULLABLE_FK)
        ),
        sqlite_column!(
            "deleted",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
    ],
    indices: &[
        ("idx_recordings_work", "work_id"),
        ("idx_recordings_movement", "movement_id"),
    ],
    unique_constraints: &[],
};

const RECORDING_ARTISTS_TABLE: Table = Table {
    name: "recording_artists",
    columns: &[
        sqlite_column!(
            "id",
            &SqlType::Integer,
            is_primary_key = true,
            autoincrement = true
        ),
        sqlite_column!(
            "recording_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&RECORDINGS_FK)
        ),
        sqlite_column!(
            "artist_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ARTISTS_FK)
        ),
        sqlite_column!(
            "profession_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&PROFESSIONS_FK)
        ),
        sqlite_column!(
            "position",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("1")
        ),
        sqlite_column!(
            "main",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
    ],
    indices: &[("idx_recording_artists_recording", "recording_id")],
    unique_constraints: &[&["recording_id", "artist_id", "profession_id"]],
};

// =============================================================================
// Releases and the edition graph
// =============================================================================

const RELEASES_TABLE: Table = Table {
    name: "releases",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("title", &SqlType::Text, non_null = true),
        sqlite_column!(
            "status",
            &SqlType::Text,
            non_null = true,
            default_value = Some("'DRAFT'")
        ),
        sqlite_column!(
            "be_master",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("1")
        ),
        sqlite_column!(
            "deleted",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
        sqlite_column!(
            "back_edition_count",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
        sqlite_column!(
            "front_edition_count",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
    ],
    indices: &[("idx_releases_status", "status")],
    unique_constraints: &[],
};

/// Subject release -> master release link.
const SUBJECT_MASTER_TABLE: Table = Table {
    name: "subject_master",
    columns: &[
        sqlite_column!(
            "subject_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&RELEASES_FK)
        ),
        sqlite_column!(
            "master_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&RELEASES_FK)
        ),
    ],
    indices: &[
        ("idx_subject_master_subject", "subject_id"),
        ("idx_subject_master_master", "master_id"),
    ],
    unique_constraints: &[&["subject_id", "master_id"]],
};

const TRACK_GROUPS_TABLE: Table = Table {
    name: "track_groups",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!(
            "release_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&RELEASES_FK)
        ),
        sqlite_column!(
            "master_group_id",
            &SqlType::Integer,
            foreign_key = Some(&MASTER_GROUP_FK)
        ),
        sqlite_column!("freshness", &SqlType::Text, non_null = true), // SELF_AUTHORED, INHERITED_FRESH, INHERITED_STALE
        sqlite_column!("position", &SqlType::Integer, non_null = true),
        sqlite_column!("title", &SqlType::Text),
    ],
    indices: &[
        ("idx_track_groups_release", "release_id"),
        ("idx_track_groups_master", "master_group_id"),
    ],
    unique_constraints: &[],
};

const TRACKS_TABLE: Table = Table {
    name: "tracks",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!(
            "release_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&RELEASES_FK)
        ),
        sqlite_column!(
            "track_group_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&TRACK_GROUPS_FK)
        ),
        sqlite_column!(
            "recording_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&RECORDINGS_RESTRICT_FK)
        ),
        sqlite_column!("position", &SqlType::Integer, non_null = true),
        sqlite_column!("side", &SqlType::Text),
    ],
    indices: &[
        ("idx_tracks_release", "release_id"),
        ("idx_tracks_group", "track_group_id"),
        ("idx_tracks_recording", "recording_id"),
    ],
    unique_constraints: &[],
};

// =============================================================================
// Release satellites
// =============================================================================

const RELEASE_ARTISTS_TABLE: Table = Table {
    name: "release_artists",
    columns: &[
        sqlite_column!(
            "id",
            &SqlType::Integer,
            is_primary_key = true,
            autoincrement = true
        ),
        sqlite_column!(
            "release_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&RELEASES_FK)
        ),
        sqlite_column!(
            "artist_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ARTISTS_FK)
        ),
        sqlite_column!(
            "profession_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&PROFESSIONS_FK)
        ),
        sqlite_column!(
            "position",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("1")
        ),
        sqlite_column!(
            "main",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
        sqlite_column!("source_type", &SqlType::Text, non_null = true), // NORMAL, SYNC_FROM_WORK, SYNC_FROM_RECORDING
    ],
    indices: &[("idx_release_artists_release", "release_id")],
    unique_constraints: &[],
};

/// Provenance of SYNC_FROM_RECORDING rows. A source goes away with the
/// recording credit it names.
const RELEASE_ARTIST_SOURCES_TABLE: Table = Table {
    name: "release_artist_sources",
    columns: &[
        sqlite_column!(
            "release_artist_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&RELEASE_ARTISTS_FK)
        ),
        sqlite_column!(
            "recording_artist_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&RECORDING_ARTISTS_FK)
        ),
    ],
    indices: &[
        ("idx_release_artist_sources_row", "release_artist_id"),
        ("idx_release_artist_sources_credit", "recording_artist_id"),
    ],
    unique_constraints: &[&["release_artist_id", "recording_artist_id"]],
};

const RELEASE_CATALOGS_TABLE: Table = Table {
    name: "release_catalogs",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!(
            "release_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&RELEASES_FK)
        ),
        sqlite_column!(
            "label_id",
            &SqlType::Integer,
            foreign_key = Some(&LABELS_FK)
        ),
        sqlite_column!("prefix", &SqlType::Text),
        sqlite_column!("number", &SqlType::Text, non_null = true),
    ],
    indices: &[("idx_release_catalogs_release", "release_id")],
    unique_constraints: &[],
};

const RELEASE_ISSUES_TABLE: Table = Table {
    name: "release_issues",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!(
            "release_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&RELEASES_FK)
        ),
        sqlite_column!("issue_time", &SqlType::Integer, non_null = true),
        sqlite_column!("regions", &SqlType::Text, non_null = true), // JSON array of region codes
    ],
    indices: &[("idx_release_issues_release", "release_id")],
    unique_constraints: &[],
};

pub const CATALOG_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[
        ARTISTS_TABLE,
        PROFESSIONS_TABLE,
        LABELS_TABLE,
        WORKS_TABLE,
        MOVEMENTS_TABLE,
        WORK_ARTISTS_TABLE,
        RECORDINGS_TABLE,
        RECORDING_ARTISTS_TABLE,
        RELEASES_TABLE,
        SUBJECT_MASTER_TABLE,
        TRACK_GROUPS_TABLE,
        TRACKS_TABLE,
        RELEASE_ARTISTS_TABLE,
        RELEASE_ARTIST_SOURCES_TABLE,
        RELEASE_CATALOGS_TABLE,
        RELEASE_ISSUES_TABLE,
    ],
    migration: None,
}];
