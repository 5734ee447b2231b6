//! Authentication error types.

use thiserror::Error;
use wardgate_core::error::WardgateError;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("account is locked")]
    AccountLocked,

    #[error("account is inactive")]
    AccountInactive,

    #[error("email address has not been confirmed")]
    AccountPendingVerification,

    #[error("password must be at least {min} characters")]
    WeakPassword { min: usize },

    #[error("session has expired")]
    TokenExpired,

    #[error("invalid token: {0}")]
    TokenInvalid(String),

    #[error("cryptography error: {0}")]
    Crypto(String),
}

impl From<AuthError> for WardgateError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials
            | AuthError::AccountLocked
            | AuthError::AccountInactive
            | AuthError::AccountPendingVerification
            | AuthError::TokenExpired
            | AuthError::TokenInvalid(_) => WardgateError::AuthenticationFailed {
                reason: err.to_string(),
            },
            AuthError::WeakPassword { .. } => WardgateError::Validation {
                message: err.to_string(),
            },
            AuthError::Crypto(msg) => WardgateError::Crypto(msg),
        }
    }
}
