//! In-process fakes for resolver and registration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{Duration, Utc};
use tokio::sync::{Notify, broadcast};
use uuid::Uuid;
use wardgate_core::error::{WardgateError, WardgateResult};
use wardgate_core::identity::{IdentityProvider, IdentitySession, SessionEvent, SignUp};
use wardgate_core::models::hospital::{CreateHospital, Hospital, HospitalStatus, UpdateHospital};
use wardgate_core::models::profile::{CreateProfile, Profile, UpdateProfile};
use wardgate_core::models::role::RoleSet;
use wardgate_core::repository::{HospitalRepository, ProfileRepository};

pub const PASSWORD: &str = "correct-horse-battery";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignOutMode {
    Succeed,
    Fail,
    Hang,
}

/// Identity provider with scripted behavior.
pub struct FakeProvider {
    accounts: Mutex<HashMap<String, Uuid>>,
    current: Mutex<Option<IdentitySession>>,
    events: broadcast::Sender<SessionEvent>,
    pub sign_out_mode: Mutex<SignOutMode>,
    pub sign_up_error: Mutex<Option<String>>,
    pub sign_ups: Mutex<Vec<SignUp>>,
}

impl FakeProvider {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            accounts: Mutex::new(HashMap::new()),
            current: Mutex::new(None),
            events,
            sign_out_mode: Mutex::new(SignOutMode::Succeed),
            sign_up_error: Mutex::new(None),
            sign_ups: Mutex::new(Vec::new()),
        }
    }

    pub fn add_account(&self, email: &str, id: Uuid) {
        self.accounts.lock().unwrap().insert(email.into(), id);
    }

    /// Install a stored session without emitting an event.
    pub fn restore(&self, account_id: Uuid, email: &str) -> IdentitySession {
        let session = session_for(account_id, email);
        *self.current.lock().unwrap() = Some(session.clone());
        session
    }

    pub fn set_sign_out(&self, mode: SignOutMode) {
        *self.sign_out_mode.lock().unwrap() = mode;
    }

    pub fn fail_sign_up(&self, message: &str) {
        *self.sign_up_error.lock().unwrap() = Some(message.into());
    }
}

pub fn session_for(account_id: Uuid, email: &str) -> IdentitySession {
    IdentitySession {
        session_id: Uuid::new_v4(),
        account_id,
        email: email.into(),
        access_token: "access".into(),
        refresh_token: "refresh".into(),
        expires_at: Utc::now() + Duration::hours(1),
    }
}

impl IdentityProvider for FakeProvider {
    async fn sign_in(&self, email: &str, password: &str) -> WardgateResult<IdentitySession> {
        let id = self.accounts.lock().unwrap().get(email).copied();
        match id {
            Some(id) if password == PASSWORD => {
                let session = self.restore(id, email);
                let _ = self.events.send(SessionEvent::SignedIn(session.clone()));
                Ok(session)
            }
            _ => Err(WardgateError::AuthenticationFailed {
                reason: "invalid email or password".into(),
            }),
        }
    }

    async fn sign_up(&self, input: SignUp) -> WardgateResult<Uuid> {
        let failure = self.sign_up_error.lock().unwrap().clone();
        if let Some(message) = failure {
            return Err(WardgateError::IdentityProvider(message));
        }
        self.sign_ups.lock().unwrap().push(input);
        Ok(Uuid::new_v4())
    }

    async fn sign_out(&self) -> WardgateResult<()> {
        let mode = *self.sign_out_mode.lock().unwrap();
        match mode {
            SignOutMode::Succeed => {
                *self.current.lock().unwrap() = None;
                let _ = self.events.send(SessionEvent::SignedOut);
                Ok(())
            }
            SignOutMode::Fail => Err(WardgateError::IdentityProvider("network unreachable".into())),
            SignOutMode::Hang => std::future::pending().await,
        }
    }

    async fn current_session(&self) -> WardgateResult<Option<IdentitySession>> {
        Ok(self.current.lock().unwrap().clone())
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }
}

/// Profile store whose lookups can be held at a gate.
#[derive(Clone, Default)]
pub struct MemProfiles {
    rows: Arc<Mutex<HashMap<Uuid, Profile>>>,
    gate: Arc<Mutex<Option<Arc<Notify>>>>,
    /// Signalled whenever a lookup starts.
    pub entered: Arc<Notify>,
}

impl MemProfiles {
    pub fn insert(&self, id: Uuid, hospital_id: Uuid, roles: RoleSet) {
        let now = Utc::now();
        self.rows.lock().unwrap().insert(
            id,
            Profile {
                id,
                hospital_id,
                first_name: "Grace".into(),
                last_name: "Hopper".into(),
                phone: "555-0100".into(),
                department: "Cardiology".into(),
                roles,
                created_at: now,
                updated_at: now,
            },
        );
    }

    /// Hold lookups until [`MemProfiles::open_gate`].
    pub fn close_gate(&self) {
        *self.gate.lock().unwrap() = Some(Arc::new(Notify::new()));
    }

    /// Release the held lookup and stop gating.
    pub fn open_gate(&self) {
        if let Some(gate) = self.gate.lock().unwrap().take() {
            gate.notify_one();
        }
    }
}

impl ProfileRepository for MemProfiles {
    async fn create(&self, input: CreateProfile) -> WardgateResult<Profile> {
        self.insert(input.id, input.hospital_id, input.roles);
        self.get_by_id(input.id).await
    }

    async fn get_by_id(&self, id: Uuid) -> WardgateResult<Profile> {
        self.entered.notify_one();
        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.rows
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| WardgateError::NotFound {
                entity: "profile".into(),
                id: id.to_string(),
            })
    }

    async fn update(&self, _: Uuid, id: Uuid, _: UpdateProfile) -> WardgateResult<Profile> {
        self.get_by_id(id).await
    }

    async fn delete(&self, _: Uuid, id: Uuid) -> WardgateResult<()> {
        self.rows.lock().unwrap().remove(&id);
        Ok(())
    }

    async fn list_by_hospital(&self, hospital_id: Uuid) -> WardgateResult<Vec<Profile>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|p| p.hospital_id == hospital_id)
            .cloned()
            .collect())
    }

    async fn count_by_hospital(&self, hospital_id: Uuid) -> WardgateResult<u64> {
        Ok(self.list_by_hospital(hospital_id).await?.len() as u64)
    }
}

/// Hospital store with a switchable delete failure.
#[derive(Clone, Default)]
pub struct MemHospitals {
    rows: Arc<Mutex<HashMap<Uuid, Hospital>>>,
    fail_delete: Arc<Mutex<bool>>,
}

impl MemHospitals {
    pub fn fail_deletes(&self) {
        *self.fail_delete.lock().unwrap() = true;
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn all(&self) -> Vec<Hospital> {
        self.rows.lock().unwrap().values().cloned().collect()
    }
}

impl HospitalRepository for MemHospitals {
    async fn create(&self, input: CreateHospital) -> WardgateResult<Hospital> {
        let mut rows = self.rows.lock().unwrap();
        if rows
            .values()
            .any(|h| h.license_number == input.license_number)
        {
            return Err(WardgateError::AlreadyExists {
                entity: "hospital".into(),
                field: "license_number".into(),
            });
        }
        let now = Utc::now();
        let hospital = Hospital {
            id: Uuid::new_v4(),
            name: input.name,
            address: input.address,
            phone: input.phone,
            license_number: input.license_number,
            status: HospitalStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        rows.insert(hospital.id, hospital.clone());
        Ok(hospital)
    }

    async fn get_by_id(&self, id: Uuid) -> WardgateResult<Hospital> {
        self.rows
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| WardgateError::NotFound {
                entity: "hospital".into(),
                id: id.to_string(),
            })
    }

    async fn get_by_license_number(&self, license_number: &str) -> WardgateResult<Hospital> {
        self.rows
            .lock()
            .unwrap()
            .values()
            .find(|h| h.license_number == license_number)
            .cloned()
            .ok_or_else(|| WardgateError::NotFound {
                entity: "hospital".into(),
                id: license_number.into(),
            })
    }

    async fn update(&self, id: Uuid, input: UpdateHospital) -> WardgateResult<Hospital> {
        let mut rows = self.rows.lock().unwrap();
        let hospital = rows.get_mut(&id).ok_or_else(|| WardgateError::NotFound {
            entity: "hospital".into(),
            id: id.to_string(),
        })?;
        if let Some(status) = input.status {
            hospital.status = status;
        }
        Ok(hospital.clone())
    }

    async fn delete(&self, id: Uuid) -> WardgateResult<()> {
        if *self.fail_delete.lock().unwrap() {
            return Err(WardgateError::Database("delete refused".into()));
        }
        self.rows.lock().unwrap().remove(&id);
        Ok(())
    }

    async fn list(&self) -> WardgateResult<Vec<Hospital>> {
        Ok(self.all())
    }
}

pub fn hospital_input(license: &str) -> CreateHospital {
    CreateHospital {
        name: "St. Mary's".into(),
        address: "1 Hospital Rd".into(),
        phone: "555-0199".into(),
        license_number: license.into(),
    }
}
