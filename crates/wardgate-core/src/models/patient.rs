//! Patient domain model.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Gender {
    Male,
    Female,
    Other,
}

/// Outpatient (`Opd`) or inpatient (`Ipd`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum PatientType {
    Opd,
    Ipd,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EmergencyContact {
    pub name: String,
    pub phone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    pub id: Uuid,
    pub hospital_id: Uuid,
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
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePatient {
    pub hospital_id: Uuid,
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

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdatePatient {
    pub name: Option<String>,
    pub contact: Option<String>,
    pub address: Option<String>,
    pub blood_type: Option<String>,
    pub emergency_contact: Option<EmergencyContact>,
    pub patient_type: Option<PatientType>,
    pub department: Option<String>,
    /// `Some(Some(url))` = set, `Some(None)` = clear, `None` = no change.
    pub photo_url: Option<Option<String>>,
}
