use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors surfaced by the storage layer.
///
/// A missing entity is not an error: point lookups return `Ok(None)` and
/// deletes return `Ok(false)`. `Validation` is raised by the input types'
/// `validate` helpers at the boundary, never by the stores themselves.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("validation error: {0}")]
    Validation(String),
}
