use super::CatalogService;
use crate::catalog_store::{
    mutations, queries, ArtistId, CatalogError, CatalogResult, LabelId, Movement, MovementId,
    NewRecording, ProfessionId, Recording, Work, WorkId,
};

impl CatalogService {
    pub fn create_artist(&self, name: &str) -> CatalogResult<ArtistId> {
        self.store.write(|tx| mutations::insert_artist(tx, name))
    }

    pub fn create_profession(&self, name: &str) -> CatalogResult<ProfessionId> {
        self.store.write(|tx| mutations::insert_profession(tx, name))
    }

    pub fn create_label(&self, name: &str) -> CatalogResult<LabelId> {
        self.store.write(|tx| mutations::insert_label(tx, name))
    }

    pub fn create_work(&self, title: &str) -> CatalogResult<Work> {
        self.store.write(|tx| {
            let id = mutations::insert_work(tx, title)?;
            queries::get_work(tx, id)
        })
    }

    /// Append a movement to a work.
    pub fn create_movement(&self, work: WorkId, title: &str) -> CatalogResult<Movement> {
        self.store.write(|tx| {
            queries::get_work(tx, work)?;
            let position: i64 = tx.query_row(
                "SELECT COALESCE(MAX(position), 0) + 1 FROM movements WHERE work_id = ?1",
                [work],
                |r| r.get(0),
            )?;
            let id: MovementId = mutations::insert_movement(tx, work, title, position)?;
            queries::get_movement(tx, id)
        })
    }

    /// A recording points at a work directly or through a movement, not both.
    pub fn create_recording(&self, recording: NewRecording) -> CatalogResult<Recording> {
        self.store.write(|tx| {
            if recording.work_id.is_some() && recording.movement_id.is_some() {
                return Err(CatalogError::illegal(
                    "a recording links to either a work or a movement",
                ));
            }
            if let Some(work) = recording.work_id {
                queries::get_work(tx, work)?;
            }
            if let Some(movement) = recording.movement_id {
                queries::get_movement(tx, movement)?;
            }
            let id = mutations::insert_recording(tx, &recording)?;
            queries::get_recording(tx, id)
        })
    }
}
