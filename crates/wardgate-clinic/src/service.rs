//! Clinic operations over the hospital-scoped repositories.
//!
//! Every operation reads the signed-in principal from the published
//! [`AuthContext`], checks the permission it needs, and confines reads
//! and writes to the principal's hospital. Records of other hospitals
//! are reported as not found.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::info;
use uuid::Uuid;
use wardgate_auth::permissions::authorize;
use wardgate_auth::resolver::AuthContext;
use wardgate_core::error::{WardgateError, WardgateResult};
use wardgate_core::identity::{IdentityProvider, SignUp, SignUpAttributes};
use wardgate_core::models::appointment::{Appointment, AppointmentStatus, CreateAppointment};
use wardgate_core::models::medical_record::{
    CreateMedicalRecord, MedicalRecord, Medicine, PrescriptionStatus,
};
use wardgate_core::models::patient::{
    CreatePatient, EmergencyContact, Gender, Patient, PatientType,
};
use wardgate_core::models::permission::Permission;
use wardgate_core::models::profile::{Principal, Profile};
use wardgate_core::models::role::{Role, RoleSet};
use wardgate_core::repository::{
    AppointmentRepository, MedicalRecordRepository, PatientRepository, ProfileRepository,
    RecordStore,
};

use crate::summarize::Summarizer;

const STAFF_CREATE: Permission = Permission::from_static("STAFF:CREATE");
const STAFF_READ: Permission = Permission::from_static("STAFF:READ");
const PATIENT_CREATE: Permission = Permission::from_static("PATIENT:CREATE");
const PATIENT_READ: Permission = Permission::from_static("PATIENT:READ");
const APPOINTMENT_CREATE: Permission = Permission::from_static("APPOINTMENT:CREATE");
const APPOINTMENT_READ: Permission = Permission::from_static("APPOINTMENT:READ");
const APPOINTMENT_UPDATE: Permission = Permission::from_static("APPOINTMENT:UPDATE");
const APPOINTMENT_DELETE: Permission = Permission::from_static("APPOINTMENT:DELETE");
const MEDICAL_RECORD_CREATE: Permission = Permission::from_static("MEDICAL_RECORD:CREATE");
const MEDICAL_RECORD_READ: Permission = Permission::from_static("MEDICAL_RECORD:READ");
const PRESCRIPTION_CREATE: Permission = Permission::from_static("PRESCRIPTION:CREATE");
const PRESCRIPTION_READ: Permission = Permission::from_static("PRESCRIPTION:READ");
const PRESCRIPTION_UPDATE: Permission = Permission::from_static("PRESCRIPTION:UPDATE");
const DASHBOARD_READ: Permission = Permission::from_static("DASHBOARD:READ");

/// A staff member to add to the current hospital.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewStaff {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Initial password handed to the staff member out of band.
    pub password: String,
    pub phone: String,
    pub department: String,
    pub roles: RoleSet,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPatient {
    pub name: String,
    pub dob: NaiveDate,
    pub gender: Gender,
    pub contact: String,
    pub address: String,
    pub blood_type: String,
    pub emergency_contact: EmergencyContact,
    pub patient_type: PatientType,
    pub department: String,
    pub photo_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAppointment {
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub time: NaiveTime,
}

/// A consultation note written by the signed-in doctor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMedicalRecord {
    pub patient_id: Uuid,
    pub notes: String,
    pub diagnosis: String,
    #[serde(default)]
    pub prescription: Vec<Medicine>,
    pub summary: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub patients: u64,
    pub staff: u64,
    pub pending_prescriptions: u64,
}

pub struct ClinicService<R, I, S> {
    store: R,
    provider: Arc<I>,
    summarizer: S,
    context: watch::Receiver<AuthContext>,
}

impl<R, I, S> ClinicService<R, I, S>
where
    R: RecordStore,
    I: IdentityProvider,
    S: Summarizer,
{
    pub fn new(
        store: R,
        provider: Arc<I>,
        summarizer: S,
        context: watch::Receiver<AuthContext>,
    ) -> Self {
        Self {
            store,
            provider,
            summarizer,
            context,
        }
    }

    /// The signed-in principal, if it holds `permission`.
    fn require(&self, permission: &Permission) -> WardgateResult<Principal> {
        let principal = self.context.borrow().principal.clone().ok_or_else(|| {
            WardgateError::AuthenticationFailed {
                reason: "not signed in".into(),
            }
        })?;
        authorize(Some(&principal), permission)?;
        Ok(principal)
    }

    // -- staff --------------------------------------------------------------

    /// Create an account and profile for a new staff member of the
    /// caller's hospital. Returns the new account id.
    pub async fn add_staff(&self, input: NewStaff) -> WardgateResult<Uuid> {
        let principal = self.require(&STAFF_CREATE)?;
        if input.roles.is_empty() {
            return Err(WardgateError::Validation {
                message: "select at least one role".into(),
            });
        }
        if input.roles.contains(Role::SuperAdmin) {
            authorize(Some(&principal), &Permission::WILDCARD)?;
        }

        let id = self
            .provider
            .sign_up(SignUp {
                email: input.email,
                password: input.password,
                attributes: SignUpAttributes {
                    first_name: input.first_name,
                    last_name: input.last_name,
                    hospital_id: principal.hospital_id,
                    roles: input.roles,
                    department: input.department,
                    phone: input.phone,
                },
            })
            .await?;

        info!(staff_id = %id, hospital_id = %principal.hospital_id, added_by = %principal.id, "staff member added");
        Ok(id)
    }

    pub async fn list_staff(&self) -> WardgateResult<Vec<Profile>> {
        let principal = self.require(&STAFF_READ)?;
        self.store
            .profiles()
            .list_by_hospital(principal.hospital_id)
            .await
    }

    // -- patients -----------------------------------------------------------

    pub async fn register_patient(&self, input: NewPatient) -> WardgateResult<Patient> {
        let principal = self.require(&PATIENT_CREATE)?;
        if input.name.trim().is_empty() {
            return Err(WardgateError::Validation {
                message: "patient name is required".into(),
            });
        }
        let patient = self
            .store
            .patients()
            .create(CreatePatient {
                hospital_id: principal.hospital_id,
                name: input.name,
                dob: input.dob,
                gender: input.gender,
                contact: input.contact,
                address: input.address,
                blood_type: input.blood_type,
                emergency_contact: input.emergency_contact,
                patient_type: input.patient_type,
                department: input.department,
                photo_url: input.photo_url,
            })
            .await?;
        info!(patient_id = %patient.id, hospital_id = %patient.hospital_id, "patient registered");
        Ok(patient)
    }

    /// Patients of the caller's hospital, newest first. `search` matches
    /// a case-insensitive fragment of the name.
    pub async fn list_patients(&self, search: Option<&str>) -> WardgateResult<Vec<Patient>> {
        let principal = self.require(&PATIENT_READ)?;
        self.store
            .patients()
            .list_by_hospital(principal.hospital_id, search)
            .await
    }

    pub async fn get_patient(&self, id: Uuid) -> WardgateResult<Patient> {
        let principal = self.require(&PATIENT_READ)?;
        self.store
            .patients()
            .get_by_id(principal.hospital_id, id)
            .await
    }

    // -- appointments -------------------------------------------------------

    pub async fn schedule_appointment(&self, input: NewAppointment) -> WardgateResult<Appointment> {
        let principal = self.require(&APPOINTMENT_CREATE)?;
        let hospital_id = principal.hospital_id;

        self.store
            .patients()
            .get_by_id(hospital_id, input.patient_id)
            .await?;
        let doctor = self.store.profiles().get_by_id(input.doctor_id).await?;
        if doctor.hospital_id != hospital_id {
            return Err(WardgateError::NotFound {
                entity: "profile".into(),
                id: input.doctor_id.to_string(),
            });
        }
        if !doctor.roles.contains(Role::Doctor) {
            return Err(WardgateError::Validation {
                message: "appointments can only be booked with a doctor".into(),
            });
        }

        self.store
            .appointments()
            .create(CreateAppointment {
                hospital_id,
                patient_id: input.patient_id,
                doctor_id: input.doctor_id,
                date: input.date,
                time: input.time,
            })
            .await
    }

    pub async fn list_appointments(&self) -> WardgateResult<Vec<Appointment>> {
        let principal = self.require(&APPOINTMENT_READ)?;
        self.store
            .appointments()
            .list_by_hospital(principal.hospital_id)
            .await
    }

    pub async fn doctor_appointments(&self, doctor_id: Uuid) -> WardgateResult<Vec<Appointment>> {
        let principal = self.require(&APPOINTMENT_READ)?;
        self.store
            .appointments()
            .list_by_doctor(principal.hospital_id, doctor_id)
            .await
    }

    pub async fn set_appointment_status(
        &self,
        id: Uuid,
        status: AppointmentStatus,
    ) -> WardgateResult<Appointment> {
        let principal = self.require(&APPOINTMENT_UPDATE)?;
        self.store
            .appointments()
            .set_status(principal.hospital_id, id, status)
            .await
    }

    pub async fn cancel_appointment(&self, id: Uuid) -> WardgateResult<()> {
        let principal = self.require(&APPOINTMENT_DELETE)?;
        let appointments = self.store.appointments();
        appointments.get_by_id(principal.hospital_id, id).await?;
        appointments.delete(principal.hospital_id, id).await
    }

    // -- medical records ----------------------------------------------------

    /// Record a consultation by the signed-in doctor. A non-empty
    /// prescription additionally needs `PRESCRIPTION:CREATE` and enters
    /// the pharmacy queue as pending.
    pub async fn add_medical_record(&self, input: NewMedicalRecord) -> WardgateResult<MedicalRecord> {
        let principal = self.require(&MEDICAL_RECORD_CREATE)?;
        let has_prescription = !input.prescription.is_empty();
        if has_prescription {
            authorize(Some(&principal), &PRESCRIPTION_CREATE)?;
        }

        self.store
            .patients()
            .get_by_id(principal.hospital_id, input.patient_id)
            .await?;

        let record = self
            .store
            .medical_records()
            .create(CreateMedicalRecord {
                hospital_id: principal.hospital_id,
                patient_id: input.patient_id,
                doctor_id: Some(principal.id),
                doctor_name: principal.display_name(),
                notes: input.notes,
                diagnosis: input.diagnosis,
                prescription: input.prescription,
                summary: input.summary.filter(|s| !s.trim().is_empty()),
                prescription_status: has_prescription.then_some(PrescriptionStatus::Pending),
            })
            .await?;
        info!(record_id = %record.id, patient_id = %record.patient_id, "medical record added");
        Ok(record)
    }

    /// A patient's records, newest first.
    pub async fn patient_history(&self, patient_id: Uuid) -> WardgateResult<Vec<MedicalRecord>> {
        let principal = self.require(&MEDICAL_RECORD_READ)?;
        self.store
            .medical_records()
            .list_by_patient(principal.hospital_id, patient_id)
            .await
    }

    // -- pharmacy -----------------------------------------------------------

    /// Records whose prescription awaits fulfilment, newest first.
    pub async fn pharmacy_queue(&self) -> WardgateResult<Vec<MedicalRecord>> {
        let principal = self.require(&PRESCRIPTION_READ)?;
        self.store
            .medical_records()
            .list_by_prescription_status(principal.hospital_id, PrescriptionStatus::Pending)
            .await
    }

    pub async fn fulfill_prescription(&self, record_id: Uuid) -> WardgateResult<MedicalRecord> {
        let principal = self.require(&PRESCRIPTION_UPDATE)?;
        let records = self.store.medical_records();
        let record = records.get_by_id(principal.hospital_id, record_id).await?;

        match record.prescription_status {
            Some(PrescriptionStatus::Pending) => {}
            Some(PrescriptionStatus::Fulfilled) => {
                return Err(WardgateError::Conflict {
                    message: "prescription has already been fulfilled".into(),
                });
            }
            None => {
                return Err(WardgateError::Validation {
                    message: "record has no prescription".into(),
                });
            }
        }

        let record = records
            .set_prescription_status(
                principal.hospital_id,
                record_id,
                PrescriptionStatus::Fulfilled,
            )
            .await?;
        info!(record_id = %record.id, fulfilled_by = %principal.id, "prescription fulfilled");
        Ok(record)
    }

    // -- dashboard ----------------------------------------------------------

    pub async fn dashboard_stats(&self) -> WardgateResult<DashboardStats> {
        let principal = self.require(&DASHBOARD_READ)?;
        let hospital_id = principal.hospital_id;
        Ok(DashboardStats {
            patients: self.store.patients().count_by_hospital(hospital_id).await?,
            staff: self.store.profiles().count_by_hospital(hospital_id).await?,
            pending_prescriptions: self
                .store
                .medical_records()
                .count_by_prescription_status(hospital_id, PrescriptionStatus::Pending)
                .await?,
        })
    }

    // -- summarization ------------------------------------------------------

    pub async fn summarize_notes(&self, notes: &str) -> WardgateResult<String> {
        self.require(&MEDICAL_RECORD_CREATE)?;
        if notes.trim().is_empty() {
            return Err(WardgateError::Validation {
                message: "there are no notes to summarize".into(),
            });
        }
        Ok(self.summarizer.summarize(notes).await)
    }
}
