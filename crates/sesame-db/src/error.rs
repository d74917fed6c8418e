//! Database-specific error types and conversions.

use sesame_core::error::SesameError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Malformed record: {0}")]
    Decode(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },
}

impl From<DbError> for SesameError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => SesameError::NotFound { entity, id },
            other => SesameError::Database(other.to_string()),
        }
    }
}
