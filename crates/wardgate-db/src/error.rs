//! Database-specific error types and conversions.

use wardgate_core::error::WardgateError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Could not {stage} at {url}: {source}")]
    Connect {
        url: String,
        stage: &'static str,
        #[source]
        source: surrealdb::Error,
    },

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Invalid stored value: {0}")]
    Decode(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Unique constraint violated on {entity}.{field}")]
    Duplicate { entity: String, field: String },
}

impl DbError {
    /// Classify a failed write. Unique-index violations on `index`
    /// become [`DbError::Duplicate`]; anything else stays a raw
    /// SurrealDB error message.
    pub(crate) fn from_write(err: surrealdb::Error, entity: &str, field: &str, index: &str) -> Self {
        let msg = err.to_string();
        if msg.contains(index) && msg.contains("already contains") {
            DbError::Duplicate {
                entity: entity.into(),
                field: field.into(),
            }
        } else {
            DbError::Surreal(err)
        }
    }
}

impl From<DbError> for WardgateError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => WardgateError::NotFound { entity, id },
            DbError::Duplicate { entity, field } => WardgateError::AlreadyExists { entity, field },
            DbError::Surreal(e) => WardgateError::Database(e.to_string()),
            other => WardgateError::Database(other.to_string()),
        }
    }
}
