//! Session resolver: turns identity-provider session events into the
//! published [`AuthContext`].
//!
//! Every event that may change the context (startup check, provider
//! event, login, logout) takes a ticket from a monotonic counter. A
//! resolution is published only if its ticket is still the newest one
//! issued; the check and the write happen together under the watch
//! channel's lock. A profile lookup that started before a logout can
//! therefore never bring the cleared session back.
//!
//! Tickets order resolutions by when they are handled, not by when the
//! provider sent the event. Logout therefore also records the session it
//! ended; that session is never resolved again, even if the provider
//! failed to drop it.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{Mutex, broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use wardgate_core::error::{WardgateError, WardgateResult};
use wardgate_core::identity::{
    IdentityProvider, IdentitySession, SessionEvent, SignUp, SignUpAttributes,
};
use wardgate_core::models::hospital::{CreateHospital, Hospital};
use wardgate_core::models::profile::Principal;
use wardgate_core::models::role::{Role, RoleSet};
use uuid::Uuid;
use wardgate_core::repository::{HospitalRepository, ProfileRepository};

use crate::config::ResolverConfig;

/// Shown when a hospital registers with a license number already on file.
pub const DUPLICATE_LICENSE_MESSAGE: &str =
    "This medical license number is already registered. Please use a different one.";

/// Department assigned to the administrator created at registration.
pub const ADMIN_DEPARTMENT: &str = "Administration";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    Authenticating,
    Authenticated,
}

/// The published authentication context.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthContext {
    pub principal: Option<Principal>,
    pub hospital: Option<Hospital>,
    pub state: AuthState,
    /// Provider session the principal was resolved from.
    pub session_id: Option<Uuid>,
    /// True during the startup check and while a login or logout is in
    /// flight.
    pub loading: bool,
    /// Ticket of the event that produced this context.
    pub version: u64,
}

impl AuthContext {
    fn initial() -> Self {
        Self {
            principal: None,
            hospital: None,
            state: AuthState::Unauthenticated,
            session_id: None,
            loading: true,
            version: 0,
        }
    }

    fn clear(&mut self) {
        self.principal = None;
        self.hospital = None;
        self.state = AuthState::Unauthenticated;
        self.session_id = None;
        self.loading = false;
    }

    pub fn is_authenticated(&self) -> bool {
        self.state == AuthState::Authenticated && self.principal.is_some()
    }
}

/// Administrator account created together with a hospital.
#[derive(Debug, Clone)]
pub struct NewAdmin {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct RegisterHospital {
    pub hospital: CreateHospital,
    pub admin: NewAdmin,
}

pub struct SessionResolver<I, P, H> {
    provider: Arc<I>,
    profiles: P,
    hospitals: H,
    config: ResolverConfig,
    ticket: AtomicU64,
    context: watch::Sender<AuthContext>,
    /// Sessions closed by [`SessionResolver::logout`].
    ended: Mutex<HashSet<Uuid>>,
}

impl<I, P, H> SessionResolver<I, P, H>
where
    I: IdentityProvider,
    P: ProfileRepository,
    H: HospitalRepository,
{
    pub fn new(provider: Arc<I>, profiles: P, hospitals: H, config: ResolverConfig) -> Self {
        let (context, _) = watch::channel(AuthContext::initial());
        Self {
            provider,
            profiles,
            hospitals,
            config,
            ticket: AtomicU64::new(0),
            context,
            ended: Mutex::new(HashSet::new()),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthContext> {
        self.context.subscribe()
    }

    /// Snapshot of the current context.
    pub fn context(&self) -> AuthContext {
        self.context.borrow().clone()
    }

    pub fn provider(&self) -> &Arc<I> {
        &self.provider
    }

    /// One-time startup resolution from the provider's stored session.
    pub async fn start(&self) {
        let ticket = self.next_ticket();
        self.resolve_current(ticket).await;
    }

    /// Apply one provider event.
    ///
    /// Events may be handled well after they were sent, so an
    /// established-session event is resolved against the provider's
    /// current session rather than the session it carries.
    pub async fn handle_event(&self, event: SessionEvent) {
        let ticket = self.next_ticket();
        match event {
            SessionEvent::SignedIn(session) | SessionEvent::TokenRefreshed(session) => {
                debug!(ticket, session_id = %session.session_id, "session established");
                self.resolve_current(ticket).await;
            }
            SessionEvent::SignedOut => {
                debug!(ticket, "session cleared");
                self.publish(ticket, AuthContext::clear);
            }
        }
    }

    /// Exchange credentials for a session.
    ///
    /// On failure the error's [`WardgateError::user_message`] is the
    /// reason to show next to the login form.
    pub async fn login(&self, email: &str, password: &str) -> WardgateResult<()> {
        let ticket = self.next_ticket();
        self.publish(ticket, |ctx| {
            ctx.state = AuthState::Authenticating;
            ctx.loading = true;
        });

        match self.provider.sign_in(email, password).await {
            Ok(session) => {
                self.resolve(ticket, Some(session)).await;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "login failed");
                self.publish(ticket, |ctx| {
                    ctx.state = if ctx.principal.is_some() {
                        AuthState::Authenticated
                    } else {
                        AuthState::Unauthenticated
                    };
                    ctx.loading = false;
                });
                Err(e)
            }
        }
    }

    /// End the session. Always leaves the context cleared, whether the
    /// provider answers, fails or hangs past `sign_out_timeout`.
    pub async fn logout(&self) {
        let ticket = self.next_ticket();
        let published = self.context.borrow().session_id;
        if let Some(session_id) = published {
            self.ended.lock().await.insert(session_id);
        }
        self.publish(ticket, |ctx| ctx.loading = true);

        let timeout = self.config.sign_out_timeout;
        let signed_out = match tokio::time::timeout(timeout, self.provider.sign_out()).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                warn!(error = %e, "provider sign-out failed; clearing session locally");
                false
            }
            Err(_) => {
                warn!(timeout = ?timeout, "provider sign-out timed out; clearing session locally");
                false
            }
        };

        if !signed_out {
            // The provider may still hold a session that was never
            // published here; end it locally as well.
            if let Ok(Ok(Some(session))) =
                tokio::time::timeout(timeout, self.provider.current_session()).await
            {
                self.ended.lock().await.insert(session.session_id);
            }
        }

        // Skipped when the provider's SignedOut event has already been
        // applied under a newer ticket.
        self.publish(ticket, AuthContext::clear);
    }

    /// Create a hospital and its administrator account.
    ///
    /// The two steps are not atomic. If the administrator cannot be
    /// created the hospital is deleted again on a best-effort basis; a
    /// failed delete leaves an orphan `Pending` hospital behind.
    pub async fn register_hospital(&self, input: RegisterHospital) -> WardgateResult<()> {
        let phone = input.hospital.phone.clone();
        let hospital = self
            .hospitals
            .create(input.hospital)
            .await
            .map_err(|e| match e {
                WardgateError::AlreadyExists { ref field, .. } if field == "license_number" => {
                    WardgateError::Conflict {
                        message: DUPLICATE_LICENSE_MESSAGE.into(),
                    }
                }
                other => other,
            })?;

        let admin = input.admin;
        let sign_up = SignUp {
            email: admin.email,
            password: admin.password,
            attributes: SignUpAttributes {
                first_name: admin.first_name,
                last_name: admin.last_name,
                hospital_id: hospital.id,
                roles: RoleSet::single(Role::Admin),
                department: ADMIN_DEPARTMENT.into(),
                phone,
            },
        };

        if let Err(e) = self.provider.sign_up(sign_up).await {
            warn!(hospital_id = %hospital.id, error = %e, "admin sign-up failed; removing hospital");
            if let Err(del) = self.hospitals.delete(hospital.id).await {
                error!(hospital_id = %hospital.id, error = %del, "failed to remove hospital after sign-up error");
            }
            return Err(e);
        }

        info!(hospital_id = %hospital.id, license = %hospital.license_number, "hospital registered");
        Ok(())
    }

    fn next_ticket(&self) -> u64 {
        self.ticket.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Apply `update` if `ticket` is still the newest issued ticket.
    fn publish(&self, ticket: u64, update: impl FnOnce(&mut AuthContext)) -> bool {
        self.context.send_if_modified(|ctx| {
            if self.ticket.load(Ordering::SeqCst) != ticket {
                return false;
            }
            update(ctx);
            ctx.version = ticket;
            true
        })
    }

    async fn resolve_current(&self, ticket: u64) {
        let session = match self.provider.current_session().await {
            Ok(session) => session,
            Err(e) => {
                error!(error = %e, "could not read current session");
                None
            }
        };
        self.resolve(ticket, session).await;
    }

    async fn resolve(&self, ticket: u64, session: Option<IdentitySession>) {
        let Some(session) = session else {
            self.publish(ticket, AuthContext::clear);
            return;
        };
        if self.ended.lock().await.contains(&session.session_id) {
            debug!(ticket, session_id = %session.session_id, "ignoring session ended by logout");
            self.publish(ticket, AuthContext::clear);
            return;
        }

        let profile = match self.profiles.get_by_id(session.account_id).await {
            Ok(profile) => profile,
            Err(e) => {
                error!(account_id = %session.account_id, error = %e, "failed to load profile");
                self.publish(ticket, AuthContext::clear);
                return;
            }
        };

        let hospital = match self.hospitals.get_by_id(profile.hospital_id).await {
            Ok(hospital) => Some(hospital),
            Err(e) => {
                error!(hospital_id = %profile.hospital_id, error = %e, "failed to load hospital");
                None
            }
        };

        let principal = Principal::from_profile(profile, session.email);
        let published = self.publish(ticket, |ctx| {
            ctx.principal = Some(principal);
            ctx.hospital = hospital;
            ctx.state = AuthState::Authenticated;
            ctx.session_id = Some(session.session_id);
            ctx.loading = false;
        });
        if !published {
            debug!(ticket, "discarded stale session resolution");
        }
    }
}

impl<I, P, H> SessionResolver<I, P, H>
where
    I: IdentityProvider + 'static,
    P: ProfileRepository + 'static,
    H: HospitalRepository + 'static,
{
    /// Resolve every provider event on a background task.
    ///
    /// The subscription is taken before this returns, so no event sent
    /// afterwards is missed.
    pub fn spawn_listener(self: &Arc<Self>) -> JoinHandle<()> {
        let mut events = self.provider.subscribe();
        let this = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => this.handle_event(event).await,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "session events lagged; re-reading current session");
                        this.start().await;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}
