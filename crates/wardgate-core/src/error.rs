//! Error types for the Wardgate system.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WardgateError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Entity already exists: {entity} ({field} is taken)")]
    AlreadyExists { entity: String, field: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Authentication failed: {reason}")]
    AuthenticationFailed { reason: String },

    #[error("Authorization denied: {reason}")]
    AuthorizationDenied { reason: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Cryptography error: {0}")]
    Crypto(String),

    #[error("Identity provider error: {0}")]
    IdentityProvider(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl WardgateError {
    /// Short message suitable for inline display next to the action that
    /// triggered it.
    ///
    /// Authentication, conflict and validation failures carry their bare
    /// reason; store errors pass their raw message through.
    pub fn user_message(&self) -> String {
        match self {
            WardgateError::AuthenticationFailed { reason }
            | WardgateError::AuthorizationDenied { reason } => reason.clone(),
            WardgateError::Conflict { message } | WardgateError::Validation { message } => {
                message.clone()
            }
            WardgateError::Database(msg) | WardgateError::IdentityProvider(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

pub type WardgateResult<T> = Result<T, WardgateError>;
