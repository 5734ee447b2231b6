//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Hospital-scoped repositories
//! require a `hospital_id` parameter to enforce tenant isolation.

use uuid::Uuid;

use crate::error::WardgateResult;
use crate::models::{
    account::{Account, CreateAccount, UpdateAccount},
    appointment::{Appointment, AppointmentStatus, CreateAppointment},
    hospital::{CreateHospital, Hospital, UpdateHospital},
    medical_record::{CreateMedicalRecord, MedicalRecord, PrescriptionStatus},
    patient::{CreatePatient, Patient, UpdatePatient},
    profile::{CreateProfile, Profile, UpdateProfile},
    session::{CreateSession, Session},
};

// ---------------------------------------------------------------------------
// Hospitals (global scope)
// ---------------------------------------------------------------------------

pub trait HospitalRepository: Send + Sync {
    /// Create a hospital in `Pending` status.
    ///
    /// A taken license number fails with
    /// [`WardgateError::AlreadyExists`](crate::error::WardgateError::AlreadyExists).
    fn create(&self, input: CreateHospital) -> impl Future<Output = WardgateResult<Hospital>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = WardgateResult<Hospital>> + Send;
    fn get_by_license_number(
        &self,
        license_number: &str,
    ) -> impl Future<Output = WardgateResult<Hospital>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateHospital,
    ) -> impl Future<Output = WardgateResult<Hospital>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = WardgateResult<()>> + Send;
    fn list(&self) -> impl Future<Output = WardgateResult<Vec<Hospital>>> + Send;
}

// ---------------------------------------------------------------------------
// Identity (global scope)
// ---------------------------------------------------------------------------

pub trait AccountRepository: Send + Sync {
    /// Create an account in `PendingVerification` status.
    fn create(&self, input: CreateAccount) -> impl Future<Output = WardgateResult<Account>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = WardgateResult<Account>> + Send;
    fn get_by_email(&self, email: &str) -> impl Future<Output = WardgateResult<Account>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateAccount,
    ) -> impl Future<Output = WardgateResult<Account>> + Send;
    /// Hard delete; used to roll back a half-finished sign-up.
    fn delete(&self, id: Uuid) -> impl Future<Output = WardgateResult<()>> + Send;
}

pub trait SessionRepository: Send + Sync {
    fn create(&self, input: CreateSession) -> impl Future<Output = WardgateResult<Session>> + Send;
    fn get_by_token_hash(
        &self,
        token_hash: &str,
    ) -> impl Future<Output = WardgateResult<Session>> + Send;
    fn invalidate(&self, id: Uuid) -> impl Future<Output = WardgateResult<()>> + Send;
    fn invalidate_account_sessions(
        &self,
        account_id: Uuid,
    ) -> impl Future<Output = WardgateResult<()>> + Send;
    /// Delete expired sessions, returning how many were removed.
    fn cleanup_expired(&self) -> impl Future<Output = WardgateResult<u64>> + Send;
}

// ---------------------------------------------------------------------------
// Hospital-scoped repositories
// ---------------------------------------------------------------------------

pub trait ProfileRepository: Send + Sync {
    fn create(&self, input: CreateProfile) -> impl Future<Output = WardgateResult<Profile>> + Send;
    /// Point lookup by account id. Not hospital-scoped: this is how a
    /// session discovers its hospital.
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = WardgateResult<Profile>> + Send;
    fn update(
        &self,
        hospital_id: Uuid,
        id: Uuid,
        input: UpdateProfile,
    ) -> impl Future<Output = WardgateResult<Profile>> + Send;
    fn delete(&self, hospital_id: Uuid, id: Uuid)
    -> impl Future<Output = WardgateResult<()>> + Send;
    fn list_by_hospital(
        &self,
        hospital_id: Uuid,
    ) -> impl Future<Output = WardgateResult<Vec<Profile>>> + Send;
    fn count_by_hospital(&self, hospital_id: Uuid)
    -> impl Future<Output = WardgateResult<u64>> + Send;
}

pub trait PatientRepository: Send + Sync {
    fn create(&self, input: CreatePatient) -> impl Future<Output = WardgateResult<Patient>> + Send;
    fn get_by_id(
        &self,
        hospital_id: Uuid,
        id: Uuid,
    ) -> impl Future<Output = WardgateResult<Patient>> + Send;
    fn update(
        &self,
        hospital_id: Uuid,
        id: Uuid,
        input: UpdatePatient,
    ) -> impl Future<Output = WardgateResult<Patient>> + Send;
    /// List patients of a hospital, optionally filtered by a
    /// case-insensitive name fragment, newest first.
    fn list_by_hospital(
        &self,
        hospital_id: Uuid,
        name_contains: Option<&str>,
    ) -> impl Future<Output = WardgateResult<Vec<Patient>>> + Send;
    fn count_by_hospital(&self, hospital_id: Uuid)
    -> impl Future<Output = WardgateResult<u64>> + Send;
}

pub trait AppointmentRepository: Send + Sync {
    fn create(
        &self,
        input: CreateAppointment,
    ) -> impl Future<Output = WardgateResult<Appointment>> + Send;
    fn get_by_id(
        &self,
        hospital_id: Uuid,
        id: Uuid,
    ) -> impl Future<Output = WardgateResult<Appointment>> + Send;
    fn set_status(
        &self,
        hospital_id: Uuid,
        id: Uuid,
        status: AppointmentStatus,
    ) -> impl Future<Output = WardgateResult<Appointment>> + Send;
    fn delete(&self, hospital_id: Uuid, id: Uuid)
    -> impl Future<Output = WardgateResult<()>> + Send;
    /// Ordered by date, then time.
    fn list_by_hospital(
        &self,
        hospital_id: Uuid,
    ) -> impl Future<Output = WardgateResult<Vec<Appointment>>> + Send;
    fn list_by_doctor(
        &self,
        hospital_id: Uuid,
        doctor_id: Uuid,
    ) -> impl Future<Output = WardgateResult<Vec<Appointment>>> + Send;
}

pub trait MedicalRecordRepository: Send + Sync {
    fn create(
        &self,
        input: CreateMedicalRecord,
    ) -> impl Future<Output = WardgateResult<MedicalRecord>> + Send;
    fn get_by_id(
        &self,
        hospital_id: Uuid,
        id: Uuid,
    ) -> impl Future<Output = WardgateResult<MedicalRecord>> + Send;
    /// Newest first.
    fn list_by_patient(
        &self,
        hospital_id: Uuid,
        patient_id: Uuid,
    ) -> impl Future<Output = WardgateResult<Vec<MedicalRecord>>> + Send;
    /// Newest first.
    fn list_by_prescription_status(
        &self,
        hospital_id: Uuid,
        status: PrescriptionStatus,
    ) -> impl Future<Output = WardgateResult<Vec<MedicalRecord>>> + Send;
    fn count_by_prescription_status(
        &self,
        hospital_id: Uuid,
        status: PrescriptionStatus,
    ) -> impl Future<Output = WardgateResult<u64>> + Send;
    fn set_prescription_status(
        &self,
        hospital_id: Uuid,
        id: Uuid,
        status: PrescriptionStatus,
    ) -> impl Future<Output = WardgateResult<MedicalRecord>> + Send;
}

/// Bundle of the hospital-scoped repositories a clinic front end works
/// against.
pub trait RecordStore: Send + Sync {
    type Profiles: ProfileRepository;
    type Patients: PatientRepository;
    type Appointments: AppointmentRepository;
    type MedicalRecords: MedicalRecordRepository;

    fn profiles(&self) -> &Self::Profiles;
    fn patients(&self) -> &Self::Patients;
    fn appointments(&self) -> &Self::Appointments;
    fn medical_records(&self) -> &Self::MedicalRecords;
}
