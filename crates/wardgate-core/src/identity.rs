//! Identity-provider seam.
//!
//! The provider owns credentials and sessions; the rest of the system
//! only sees [`IdentitySession`]s and the [`SessionEvent`] stream.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::error::WardgateResult;
use crate::models::role::RoleSet;

/// An authenticated session as handed out by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentitySession {
    pub session_id: Uuid,
    pub account_id: Uuid,
    pub email: String,
    /// Signed access token.
    pub access_token: String,
    /// Opaque refresh token. Only its hash is persisted.
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

/// Session lifecycle notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    SignedIn(IdentitySession),
    TokenRefreshed(IdentitySession),
    SignedOut,
}

impl SessionEvent {
    /// The session carried by the event, if any.
    pub fn session(&self) -> Option<&IdentitySession> {
        match self {
            SessionEvent::SignedIn(s) | SessionEvent::TokenRefreshed(s) => Some(s),
            SessionEvent::SignedOut => None,
        }
    }
}

/// Profile attributes attached to a sign-up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignUpAttributes {
    pub first_name: String,
    pub last_name: String,
    pub hospital_id: Uuid,
    pub roles: RoleSet,
    pub department: String,
    pub phone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignUp {
    pub email: String,
    pub password: String,
    pub attributes: SignUpAttributes,
}

pub trait IdentityProvider: Send + Sync {
    /// Exchange credentials for a session. Emits
    /// [`SessionEvent::SignedIn`] on success.
    fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = WardgateResult<IdentitySession>> + Send;

    /// Create an unconfirmed account and its profile. Returns the new
    /// account id. Does not establish a session.
    fn sign_up(&self, input: SignUp) -> impl Future<Output = WardgateResult<Uuid>> + Send;

    /// Invalidate the current session. Emits [`SessionEvent::SignedOut`].
    fn sign_out(&self) -> impl Future<Output = WardgateResult<()>> + Send;

    /// The session restored from storage, if any.
    fn current_session(
        &self,
    ) -> impl Future<Output = WardgateResult<Option<IdentitySession>>> + Send;

    fn subscribe(&self) -> broadcast::Receiver<SessionEvent>;
}
