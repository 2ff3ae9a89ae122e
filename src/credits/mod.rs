//! Credit reconciliation engine.
//!
//! A release's `SYNC_FROM_WORK` and `SYNC_FROM_RECORDING` credit rows are
//! derived data: they are recomputed from the credits reachable through the
//! release's live recordings. Nothing tracks those dependencies backwards, so
//! every mutation of a recording credit, work credit, track or movement link
//! must call into this module for each reachable release.

mod engine;
mod sources;

pub use engine::{
    derive_recording_credits, derive_work_credits, reconcile, reconcile_reachable_from_recordings,
    reconcile_reachable_from_work, reconcile_releases, ReconcileOutcome, RecordingDerivedCredit,
};
pub use sources::{ArtistCredit, CreditKey, CreditSource, HasCredits};
