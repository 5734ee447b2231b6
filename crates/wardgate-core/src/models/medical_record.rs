//! Medical record and prescription models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Medicine {
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    pub duration: String,
    pub instructions: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PrescriptionStatus {
    Pending,
    Fulfilled,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MedicalRecord {
    pub id: Uuid,
    pub hospital_id: Uuid,
    pub patient_id: Uuid,
    /// `None` once the authoring doctor's profile is gone.
    pub doctor_id: Option<Uuid>,
    pub doctor_name: String,
    pub notes: String,
    pub diagnosis: String,
    pub prescription: Vec<Medicine>,
    pub summary: Option<String>,
    pub prescription_status: Option<PrescriptionStatus>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMedicalRecord {
    pub hospital_id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Option<Uuid>,
    pub doctor_name: String,
    pub notes: String,
    pub diagnosis: String,
    pub prescription: Vec<Medicine>,
    pub summary: Option<String>,
    pub prescription_status: Option<PrescriptionStatus>,
}
