//! Credit sources: the entities that carry (artist, profession) credits.

use crate::catalog_store::queries;
use crate::catalog_store::{
    ArtistId, CatalogResult, ProfessionId, Recording, RecordingId, Release, ReleaseId, Work,
    WorkId,
};
use rusqlite::Connection;

/// One credit as seen by reconciliation, whatever entity it is attached to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArtistCredit {
    /// Row id in the owning credit table.
    pub credit_id: i64,
    pub artist_id: ArtistId,
    pub profession_id: ProfessionId,
    pub position: i64,
    pub main: bool,
}

pub type CreditKey = (ArtistId, ProfessionId);

impl ArtistCredit {
    pub fn key(&self) -> CreditKey {
        (self.artist_id, self.profession_id)
    }
}

/// Which credit table an entity's credits live in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CreditSource {
    Work(WorkId),
    Recording(RecordingId),
    Release(ReleaseId),
}

impl CreditSource {
    pub fn credits(&self, conn: &Connection) -> CatalogResult<Vec<ArtistCredit>> {
        let credits = match self {
            CreditSource::Work(id) => queries::work_artists_of(conn, *id)?
                .into_iter()
                .map(|c| ArtistCredit {
                    credit_id: c.id.get(),
                    artist_id: c.artist_id,
                    profession_id: c.profession_id,
                    position: c.position,
                    main: c.main,
                })
                .collect(),
            CreditSource::Recording(id) => queries::recording_artists_of(conn, *id)?
                .into_iter()
                .map(|c| ArtistCredit {
                    credit_id: c.id.get(),
                    artist_id: c.artist_id,
                    profession_id: c.profession_id,
                    position: c.position,
                    main: c.main,
                })
                .collect(),
            CreditSource::Release(id) => queries::release_artists_of(conn, *id)?
                .into_iter()
                .map(|c| ArtistCredit {
                    credit_id: c.id.get(),
                    artist_id: c.artist_id,
                    profession_id: c.profession_id,
                    position: c.position,
                    main: c.main,
                })
                .collect(),
        };
        Ok(credits)
    }
}

/// Entities exposing a credit list.
pub trait HasCredits {
    fn credit_source(&self) -> CreditSource;

    fn credits(&self, conn: &Connection) -> CatalogResult<Vec<ArtistCredit>> {
        self.credit_source().credits(conn)
    }
}

impl HasCredits for Work {
    fn credit_source(&self) -> CreditSource {
        CreditSource::Work(self.id)
    }
}

impl HasCredits for Recording {
    fn credit_source(&self) -> CreditSource {
        CreditSource::Recording(self.id)
    }
}

impl HasCredits for Release {
    fn credit_source(&self) -> CreditSource {
        CreditSource::Release(self.id)
    }
}
