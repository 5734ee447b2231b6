//! Local identity provider backed by the account, session and profile
//! repositories.
//!
//! Keeps at most one current session in memory and announces every
//! change on a broadcast channel, in the same order the changes were
//! made.

use chrono::{Duration, Utc};
use tokio::sync::{RwLock, broadcast};
use tracing::{info, warn};
use uuid::Uuid;
use wardgate_core::error::{WardgateError, WardgateResult};
use wardgate_core::identity::{IdentityProvider, IdentitySession, SessionEvent, SignUp};
use wardgate_core::models::account::{Account, AccountStatus, CreateAccount, UpdateAccount};
use wardgate_core::models::profile::CreateProfile;
use wardgate_core::models::session::CreateSession;
use wardgate_core::repository::{AccountRepository, ProfileRepository, SessionRepository};

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::password;
use crate::token;

fn ensure_active(status: AccountStatus) -> Result<(), AuthError> {
    match status {
        AccountStatus::Active => Ok(()),
        AccountStatus::Locked => Err(AuthError::AccountLocked),
        AccountStatus::Inactive => Err(AuthError::AccountInactive),
        AccountStatus::PendingVerification => Err(AuthError::AccountPendingVerification),
    }
}

/// Identity provider that authenticates against the local account store.
///
/// Generic over repository implementations so that the auth layer has
/// no dependency on the database crate.
pub struct LocalIdentityProvider<A, S, P> {
    accounts: A,
    sessions: S,
    profiles: P,
    config: AuthConfig,
    current: RwLock<Option<IdentitySession>>,
    events: broadcast::Sender<SessionEvent>,
}

impl<A, S, P> LocalIdentityProvider<A, S, P>
where
    A: AccountRepository,
    S: SessionRepository,
    P: ProfileRepository,
{
    pub fn new(accounts: A, sessions: S, profiles: P, config: AuthConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_buffer.max(1));
        Self {
            accounts,
            sessions,
            profiles,
            config,
            current: RwLock::new(None),
            events,
        }
    }

    /// Activate an account created by sign-up.
    pub async fn confirm_account(&self, account_id: Uuid) -> WardgateResult<Account> {
        let account = self.accounts.get_by_id(account_id).await?;
        match account.status {
            AccountStatus::Active => Ok(account),
            AccountStatus::PendingVerification => {
                let account = self
                    .accounts
                    .update(
                        account_id,
                        UpdateAccount {
                            status: Some(AccountStatus::Active),
                            ..Default::default()
                        },
                    )
                    .await?;
                info!(account_id = %account_id, "account confirmed");
                Ok(account)
            }
            other => Err(WardgateError::Validation {
                message: format!("account in status {other:?} cannot be confirmed"),
            }),
        }
    }

    /// Rotate a refresh token: consume the old session and issue a new
    /// token pair. Emits [`SessionEvent::TokenRefreshed`].
    ///
    /// Each refresh token is single-use; the old session is invalidated
    /// before the new one is created.
    pub async fn refresh(&self, raw_refresh_token: &str) -> WardgateResult<IdentitySession> {
        let session = self.rotate(raw_refresh_token).await?;
        *self.current.write().await = Some(session.clone());
        self.emit(SessionEvent::TokenRefreshed(session.clone()));
        Ok(session)
    }

    async fn rotate(&self, raw_refresh_token: &str) -> WardgateResult<IdentitySession> {
        let token_hash = token::hash_refresh_token(raw_refresh_token);
        let stored = self
            .sessions
            .get_by_token_hash(&token_hash)
            .await
            .map_err(|e| match e {
                WardgateError::NotFound { .. } => {
                    AuthError::TokenInvalid("refresh token not found or already used".into())
                        .into()
                }
                other => other,
            })?;

        if stored.expires_at <= Utc::now() {
            if let Err(e) = self.sessions.invalidate(stored.id).await {
                warn!(session_id = %stored.id, error = %e, "failed to drop expired session");
            }
            return Err(AuthError::TokenExpired.into());
        }

        self.sessions.invalidate(stored.id).await?;

        let account = self.accounts.get_by_id(stored.account_id).await?;
        ensure_active(account.status)?;

        self.open_session(&account).await
    }

    async fn open_session(&self, account: &Account) -> WardgateResult<IdentitySession> {
        let refresh_token = token::generate_refresh_token();
        let expires_at =
            Utc::now() + Duration::seconds(self.config.refresh_token_lifetime_secs as i64);

        let session = self
            .sessions
            .create(CreateSession {
                account_id: account.id,
                token_hash: token::hash_refresh_token(&refresh_token),
                expires_at,
            })
            .await?;

        let access_token = token::issue_access_token(account.id, &account.email, &self.config)?;

        Ok(IdentitySession {
            session_id: session.id,
            account_id: account.id,
            email: account.email.clone(),
            access_token,
            refresh_token,
            expires_at,
        })
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is not an error.
        let _ = self.events.send(event);
    }
}

impl<A, S, P> IdentityProvider for LocalIdentityProvider<A, S, P>
where
    A: AccountRepository,
    S: SessionRepository,
    P: ProfileRepository,
{
    async fn sign_in(&self, email: &str, password: &str) -> WardgateResult<IdentitySession> {
        let account = match self.accounts.get_by_email(email).await {
            Ok(a) => a,
            Err(WardgateError::NotFound { .. }) => {
                return Err(AuthError::InvalidCredentials.into());
            }
            Err(e) => return Err(e),
        };

        let valid = password::verify_password(
            password,
            &account.password_hash,
            self.config.pepper.as_deref(),
        )?;
        if !valid {
            return Err(AuthError::InvalidCredentials.into());
        }
        ensure_active(account.status)?;

        let session = self.open_session(&account).await?;
        *self.current.write().await = Some(session.clone());
        info!(account_id = %account.id, session_id = %session.session_id, "signed in");
        self.emit(SessionEvent::SignedIn(session.clone()));
        Ok(session)
    }

    async fn sign_up(&self, input: SignUp) -> WardgateResult<Uuid> {
        password::check_policy(&input.password, self.config.min_password_length)?;

        let account = self
            .accounts
            .create(CreateAccount {
                email: input.email,
                password: input.password,
            })
            .await?;

        let attrs = input.attributes;
        let profile = self
            .profiles
            .create(CreateProfile {
                id: account.id,
                hospital_id: attrs.hospital_id,
                first_name: attrs.first_name,
                last_name: attrs.last_name,
                phone: attrs.phone,
                department: attrs.department,
                roles: attrs.roles,
            })
            .await;

        if let Err(e) = profile {
            if let Err(del) = self.accounts.delete(account.id).await {
                warn!(account_id = %account.id, error = %del, "failed to remove account after profile error");
            }
            return Err(e);
        }

        info!(account_id = %account.id, hospital_id = %attrs.hospital_id, "account signed up");
        Ok(account.id)
    }

    async fn sign_out(&self) -> WardgateResult<()> {
        let previous = self.current.write().await.take();
        let result = match &previous {
            Some(session) => self.sessions.invalidate(session.session_id).await,
            None => Ok(()),
        };
        if let Some(session) = previous {
            info!(account_id = %session.account_id, "signed out");
        }
        self.emit(SessionEvent::SignedOut);
        result
    }

    async fn current_session(&self) -> WardgateResult<Option<IdentitySession>> {
        let Some(session) = self.current.read().await.clone() else {
            return Ok(None);
        };

        match token::decode_access_token(&session.access_token, &self.config) {
            Ok(_) => Ok(Some(session)),
            Err(AuthError::TokenExpired) => match self.refresh(&session.refresh_token).await {
                Ok(renewed) => Ok(Some(renewed)),
                Err(e) => {
                    warn!(account_id = %session.account_id, error = %e, "stored session could not be renewed");
                    *self.current.write().await = None;
                    Ok(None)
                }
            },
            Err(e) => Err(e.into()),
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }
}
