//! Shared constants for end-to-end tests
//!
//! Names and titles used by the fixture builders. When test data changes,
//! update only this file.

// ============================================================================
// Reference data
// ============================================================================

/// Composer credited on the fixture work
pub const COMPOSER_NAME: &str = "Ludwig van Beethoven";

/// Performer credited on fixture recordings
pub const PERFORMER_NAME: &str = "Artist X";

pub const COMPOSER_PROFESSION: &str = "composer";

pub const VIOLIN_PROFESSION: &str = "violin";

pub const LABEL_NAME: &str = "Deutsche Test Grammophon";

// ============================================================================
// Catalog titles
// ============================================================================

/// Work every fixture recording is linked to by default
pub const WORK_TITLE: &str = "Violin Sonata No. 5";

pub const MOVEMENT_1_TITLE: &str = "I. Allegro";

pub const MOVEMENT_2_TITLE: &str = "II. Adagio molto espressivo";

pub const MASTER_TITLE: &str = "Spring Sonata (Original Release)";

pub const SUBJECT_TITLE: &str = "Spring Sonata (Reissue)";

pub const SIDE_A: &str = "A";

pub const SIDE_B: &str = "B";
