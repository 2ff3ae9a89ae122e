use thiserror::Error;

/// Errors raised by catalog operations.
///
/// `NotFound`, `IllegalOperation` and `Conflict` are caller errors: nothing was
/// written and the request can be resubmitted once the precondition holds.
/// `Unexpected` signals an internal invariant breach found mid-operation.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("Illegal operation: {0}")]
    IllegalOperation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unexpected catalog state: {0}")]
    Unexpected(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

impl CatalogError {
    pub fn not_found(entity: &'static str, id: impl Into<i64>) -> Self {
        CatalogError::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn illegal(message: impl Into<String>) -> Self {
        CatalogError::IllegalOperation(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CatalogError::NotFound { .. })
    }
}
