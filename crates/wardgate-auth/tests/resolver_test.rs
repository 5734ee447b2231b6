//! Session resolver tests: startup, login/logout, and ordering of
//! concurrent resolutions.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{FakeProvider, MemHospitals, MemProfiles, PASSWORD, SignOutMode, hospital_input};
use uuid::Uuid;
use wardgate_auth::config::ResolverConfig;
use wardgate_auth::resolver::{AuthContext, AuthState, SessionResolver};
use wardgate_core::identity::{IdentityProvider, SessionEvent};
use wardgate_core::models::hospital::Hospital;
use wardgate_core::models::role::{Role, RoleSet};
use wardgate_core::repository::HospitalRepository;

const EMAIL: &str = "grace@st-mary.org";

type Resolver = SessionResolver<FakeProvider, MemProfiles, MemHospitals>;

struct Fixture {
    resolver: Arc<Resolver>,
    provider: Arc<FakeProvider>,
    profiles: MemProfiles,
    hospital: Hospital,
    account_id: Uuid,
}

async fn setup_with(config: ResolverConfig) -> Fixture {
    let provider = Arc::new(FakeProvider::new());
    let profiles = MemProfiles::default();
    let hospitals = MemHospitals::default();

    let hospital = hospitals.create(hospital_input("LIC-001")).await.unwrap();
    let account_id = Uuid::new_v4();
    profiles.insert(
        account_id,
        hospital.id,
        RoleSet::from([Role::Doctor, Role::Pharmacist]),
    );
    provider.add_account(EMAIL, account_id);

    let resolver = Arc::new(SessionResolver::new(
        Arc::clone(&provider),
        profiles.clone(),
        hospitals,
        config,
    ));

    Fixture {
        resolver,
        provider,
        profiles,
        hospital,
        account_id,
    }
}

async fn setup() -> Fixture {
    setup_with(ResolverConfig::default()).await
}

fn assert_cleared(ctx: &AuthContext) {
    assert_eq!(ctx.principal, None);
    assert_eq!(ctx.hospital, None);
    assert_eq!(ctx.state, AuthState::Unauthenticated);
    assert!(!ctx.loading);
}

#[tokio::test]
async fn context_starts_loading() {
    let f = setup().await;
    let ctx = f.resolver.context();
    assert!(ctx.loading);
    assert_eq!(ctx.version, 0);
}

#[tokio::test]
async fn startup_without_session_clears_loading() {
    let f = setup().await;
    f.resolver.start().await;
    assert_cleared(&f.resolver.context());
}

#[tokio::test]
async fn startup_restores_principal_and_hospital() {
    let f = setup().await;
    f.provider.restore(f.account_id, EMAIL);

    f.resolver.start().await;

    let ctx = f.resolver.context();
    let principal = ctx.principal.expect("principal");
    assert_eq!(principal.id, f.account_id);
    assert_eq!(principal.email, EMAIL);
    assert_eq!(principal.hospital_id, f.hospital.id);
    assert!(principal.roles.contains(Role::Pharmacist));
    assert_eq!(ctx.hospital, Some(f.hospital));
    assert_eq!(ctx.state, AuthState::Authenticated);
    assert!(!ctx.loading);
}

#[tokio::test]
async fn missing_profile_publishes_signed_out() {
    let f = setup().await;
    f.provider.restore(Uuid::new_v4(), "ghost@st-mary.org");

    f.resolver.start().await;

    assert_cleared(&f.resolver.context());
}

#[tokio::test]
async fn missing_hospital_keeps_principal() {
    let f = setup().await;
    let orphan = Uuid::new_v4();
    f.profiles
        .insert(orphan, Uuid::new_v4(), RoleSet::single(Role::Nurse));
    f.provider.restore(orphan, "orphan@st-mary.org");

    f.resolver.start().await;

    let ctx = f.resolver.context();
    assert_eq!(ctx.principal.map(|p| p.id), Some(orphan));
    assert_eq!(ctx.hospital, None);
    assert!(!ctx.loading);
}

#[tokio::test]
async fn login_publishes_principal() {
    let f = setup().await;
    f.resolver.start().await;

    f.resolver.login(EMAIL, PASSWORD).await.unwrap();

    let ctx = f.resolver.context();
    assert!(ctx.is_authenticated());
    assert_eq!(ctx.hospital.map(|h| h.id), Some(f.hospital.id));
    assert!(!ctx.loading);
}

#[tokio::test]
async fn login_failure_reports_reason_and_stops_loading() {
    let f = setup().await;
    f.resolver.start().await;

    let err = f.resolver.login(EMAIL, "wrong").await.unwrap_err();

    assert_eq!(err.user_message(), "invalid email or password");
    assert_cleared(&f.resolver.context());
}

#[tokio::test]
async fn versions_increase_with_each_event() {
    let f = setup().await;
    f.resolver.start().await;
    let after_start = f.resolver.context().version;

    f.resolver.login(EMAIL, PASSWORD).await.unwrap();
    let after_login = f.resolver.context().version;

    f.resolver.logout().await;
    let after_logout = f.resolver.context().version;

    assert!(after_start < after_login);
    assert!(after_login < after_logout);
}

#[tokio::test]
async fn listener_follows_provider_events() {
    let f = setup().await;
    f.resolver.start().await;
    let _listener = f.resolver.spawn_listener();
    let mut rx = f.resolver.subscribe();

    f.provider.sign_in(EMAIL, PASSWORD).await.unwrap();
    let ctx = tokio::time::timeout(
        Duration::from_secs(2),
        rx.wait_for(|c| c.is_authenticated()),
    )
    .await
    .unwrap()
    .unwrap()
    .clone();
    assert_eq!(ctx.principal.map(|p| p.id), Some(f.account_id));

    f.provider.sign_out().await.unwrap();
    let ctx = tokio::time::timeout(
        Duration::from_secs(2),
        rx.wait_for(|c| c.principal.is_none()),
    )
    .await
    .unwrap()
    .unwrap()
    .clone();
    assert_cleared(&ctx);
}

#[tokio::test]
async fn stale_resolution_after_logout_is_discarded() {
    let f = setup().await;
    f.resolver.start().await;
    let session = f.provider.restore(f.account_id, EMAIL);

    // Hold the profile lookup of an established-session event.
    f.profiles.close_gate();
    let resolver = Arc::clone(&f.resolver);
    let pending = tokio::spawn(async move {
        resolver
            .handle_event(SessionEvent::SignedIn(session))
            .await
    });
    f.profiles.entered.notified().await;

    f.resolver.logout().await;
    let logged_out = f.resolver.context();
    assert_cleared(&logged_out);

    f.profiles.open_gate();
    pending.await.unwrap();

    let ctx = f.resolver.context();
    assert_cleared(&ctx);
    assert_eq!(ctx.version, logged_out.version);
}

#[tokio::test]
async fn late_event_for_ended_session_does_not_resurrect_it() {
    let f = setup().await;
    f.resolver.start().await;
    f.resolver.login(EMAIL, PASSWORD).await.unwrap();
    let session = f.provider.current_session().await.unwrap().unwrap();

    f.resolver.logout().await;
    // The SignedIn notification is only processed now.
    f.resolver
        .handle_event(SessionEvent::SignedIn(session))
        .await;

    assert_cleared(&f.resolver.context());
}

#[tokio::test]
async fn late_event_after_failed_sign_out_does_not_resurrect_session() {
    let f = setup().await;
    f.resolver.start().await;
    f.resolver.login(EMAIL, PASSWORD).await.unwrap();
    let session = f.provider.current_session().await.unwrap().unwrap();
    f.provider.set_sign_out(SignOutMode::Fail);

    f.resolver.logout().await;
    // The provider still holds the session it failed to drop.
    assert!(f.provider.current_session().await.unwrap().is_some());
    f.resolver
        .handle_event(SessionEvent::SignedIn(session.clone()))
        .await;
    f.resolver
        .handle_event(SessionEvent::TokenRefreshed(session))
        .await;

    assert_cleared(&f.resolver.context());
}

#[tokio::test]
async fn late_event_after_hung_sign_out_does_not_resurrect_session() {
    let f = setup_with(ResolverConfig {
        sign_out_timeout: Duration::from_millis(50),
    })
    .await;
    f.resolver.start().await;
    f.resolver.login(EMAIL, PASSWORD).await.unwrap();
    let session = f.provider.current_session().await.unwrap().unwrap();
    f.provider.set_sign_out(SignOutMode::Hang);

    f.resolver.logout().await;
    f.resolver
        .handle_event(SessionEvent::SignedIn(session))
        .await;
    // A restart re-reads the provider's stored session.
    f.resolver.start().await;

    assert_cleared(&f.resolver.context());
}

#[tokio::test]
async fn new_login_after_failed_sign_out_is_published() {
    let f = setup().await;
    f.resolver.start().await;
    f.resolver.login(EMAIL, PASSWORD).await.unwrap();
    let first = f.resolver.context().session_id;
    f.provider.set_sign_out(SignOutMode::Fail);
    f.resolver.logout().await;

    f.resolver.login(EMAIL, PASSWORD).await.unwrap();

    let ctx = f.resolver.context();
    assert!(ctx.is_authenticated());
    assert!(ctx.session_id.is_some());
    assert_ne!(ctx.session_id, first);
}

#[tokio::test]
async fn logout_clears_even_when_provider_fails() {
    let f = setup().await;
    f.resolver.start().await;
    f.resolver.login(EMAIL, PASSWORD).await.unwrap();
    f.provider.set_sign_out(SignOutMode::Fail);

    f.resolver.logout().await;

    assert_cleared(&f.resolver.context());
}

#[tokio::test]
async fn logout_clears_even_when_provider_hangs() {
    let f = setup_with(ResolverConfig {
        sign_out_timeout: Duration::from_millis(50),
    })
    .await;
    f.resolver.start().await;
    f.resolver.login(EMAIL, PASSWORD).await.unwrap();
    f.provider.set_sign_out(SignOutMode::Hang);

    tokio::time::timeout(Duration::from_secs(2), f.resolver.logout())
        .await
        .expect("logout must not wait on a hung provider");

    assert_cleared(&f.resolver.context());
}
