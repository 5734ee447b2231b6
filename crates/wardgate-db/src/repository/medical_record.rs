//! SurrealDB implementation of [`MedicalRecordRepository`].

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;
use wardgate_core::error::WardgateResult;
use wardgate_core::models::medical_record::{
    CreateMedicalRecord, MedicalRecord, Medicine, PrescriptionStatus,
};
use wardgate_core::repository::MedicalRecordRepository;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct MedicalRecordRow {
    hospital_id: String,
    patient_id: String,
    doctor_id: Option<String>,
    doctor_name: String,
    notes: String,
    diagnosis: String,
    prescription: serde_json::Value,
    summary: Option<String>,
    prescription_status: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct MedicalRecordRowWithId {
    record_id: String,
    hospital_id: String,
    patient_id: String,
    doctor_id: Option<String>,
    doctor_name: String,
    notes: String,
    diagnosis: String,
    prescription: serde_json::Value,
    summary: Option<String>,
    prescription_status: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

fn status_to_string(s: PrescriptionStatus) -> &'static str {
    match s {
        PrescriptionStatus::Pending => "Pending",
        PrescriptionStatus::Fulfilled => "Fulfilled",
    }
}

fn parse_status(s: &str) -> Result<PrescriptionStatus, DbError> {
    match s {
        "Pending" => Ok(PrescriptionStatus::Pending),
        "Fulfilled" => Ok(PrescriptionStatus::Fulfilled),
        other => Err(DbError::Decode(format!(
            "unknown prescription status: {other}"
        ))),
    }
}

fn parse_uuid(s: &str, what: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(s).map_err(|e| DbError::Decode(format!("invalid {what} UUID: {e}")))
}

impl MedicalRecordRow {
    fn into_record(self, id: Uuid) -> Result<MedicalRecord, DbError> {
        let prescription: Vec<Medicine> = serde_json::from_value(self.prescription)
            .map_err(|e| DbError::Decode(format!("invalid prescription: {e}")))?;
        Ok(MedicalRecord {
            id,
            hospital_id: parse_uuid(&self.hospital_id, "hospital")?,
            patient_id: parse_uuid(&self.patient_id, "patient")?,
            doctor_id: self
                .doctor_id
                .as_deref()
                .map(|d| parse_uuid(d, "doctor"))
                .transpose()?,
            doctor_name: self.doctor_name,
            notes: self.notes,
            diagnosis: self.diagnosis,
            prescription,
            summary: self.summary,
            prescription_status: self
                .prescription_status
                .as_deref()
                .map(parse_status)
                .transpose()?,
            created_at: self.created_at,
        })
    }
}

impl MedicalRecordRowWithId {
    fn try_into_record(self) -> Result<MedicalRecord, DbError> {
        let id = parse_uuid(&self.record_id, "medical record")?;
        MedicalRecordRow {
            hospital_id: self.hospital_id,
            patient_id: self.patient_id,
            doctor_id: self.doctor_id,
            doctor_name: self.doctor_name,
            notes: self.notes,
            diagnosis: self.diagnosis,
            prescription: self.prescription,
            summary: self.summary,
            prescription_status: self.prescription_status,
            created_at: self.created_at,
        }
        .into_record(id)
    }
}

fn rows_into_records(rows: Vec<MedicalRecordRowWithId>) -> Result<Vec<MedicalRecord>, DbError> {
    rows.into_iter()
        .map(|row| row.try_into_record())
        .collect::<Result<Vec<_>, DbError>>()
}

/// SurrealDB implementation of the MedicalRecord repository.
#[derive(Clone)]
pub struct SurrealMedicalRecordRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealMedicalRecordRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> MedicalRecordRepository for SurrealMedicalRecordRepository<C> {
    async fn create(&self, input: CreateMedicalRecord) -> WardgateResult<MedicalRecord> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let prescription = serde_json::to_value(&input.prescription)
            .map_err(|e| DbError::Decode(format!("invalid prescription: {e}")))?;

        let result = self
            .db
            .query(
                "CREATE type::record('medical_record', $id) SET \
                 hospital_id = $hospital_id, patient_id = $patient_id, \
                 doctor_id = $doctor_id, doctor_name = $doctor_name, \
                 notes = $notes, diagnosis = $diagnosis, \
                 prescription = $prescription, summary = $summary, \
                 prescription_status = $prescription_status",
            )
            .bind(("id", id_str.clone()))
            .bind(("hospital_id", input.hospital_id.to_string()))
            .bind(("patient_id", input.patient_id.to_string()))
            .bind(("doctor_id", input.doctor_id.map(|d| d.to_string())))
            .bind(("doctor_name", input.doctor_name))
            .bind(("notes", input.notes))
            .bind(("diagnosis", input.diagnosis))
            .bind(("prescription", prescription))
            .bind(("summary", input.summary))
            .bind((
                "prescription_status",
                input
                    .prescription_status
                    .map(|s| status_to_string(s).to_string()),
            ))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(DbError::from)?;

        let rows: Vec<MedicalRecordRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "medical_record".into(),
            id: id_str,
        })?;

        Ok(row.into_record(id)?)
    }

    async fn get_by_id(&self, hospital_id: Uuid, id: Uuid) -> WardgateResult<MedicalRecord> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT * FROM type::record('medical_record', $id) \
                 WHERE hospital_id = $hospital_id",
            )
            .bind(("id", id_str.clone()))
            .bind(("hospital_id", hospital_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<MedicalRecordRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "medical_record".into(),
            id: id_str,
        })?;

        Ok(row.into_record(id)?)
    }

    async fn list_by_patient(
        &self,
        hospital_id: Uuid,
        patient_id: Uuid,
    ) -> WardgateResult<Vec<MedicalRecord>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM medical_record \
                 WHERE hospital_id = $hospital_id AND patient_id = $patient_id \
                 ORDER BY created_at DESC",
            )
            .bind(("hospital_id", hospital_id.to_string()))
            .bind(("patient_id", patient_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<MedicalRecordRowWithId> = result.take(0).map_err(DbError::from)?;
        Ok(rows_into_records(rows)?)
    }

    async fn list_by_prescription_status(
        &self,
        hospital_id: Uuid,
        status: PrescriptionStatus,
    ) -> WardgateResult<Vec<MedicalRecord>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM medical_record \
                 WHERE hospital_id = $hospital_id \
                 AND prescription_status = $status \
                 ORDER BY created_at DESC",
            )
            .bind(("hospital_id", hospital_id.to_string()))
            .bind(("status", status_to_string(status).to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<MedicalRecordRowWithId> = result.take(0).map_err(DbError::from)?;
        Ok(rows_into_records(rows)?)
    }

    async fn count_by_prescription_status(
        &self,
        hospital_id: Uuid,
        status: PrescriptionStatus,
    ) -> WardgateResult<u64> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM medical_record \
                 WHERE hospital_id = $hospital_id \
                 AND prescription_status = $status GROUP ALL",
            )
            .bind(("hospital_id", hospital_id.to_string()))
            .bind(("status", status_to_string(status).to_string()))
            .await
            .map_err(DbError::from)?;
        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }

    async fn set_prescription_status(
        &self,
        hospital_id: Uuid,
        id: Uuid,
        status: PrescriptionStatus,
    ) -> WardgateResult<MedicalRecord> {
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "UPDATE type::record('medical_record', $id) \
                 SET prescription_status = $status \
                 WHERE hospital_id = $hospital_id",
            )
            .bind(("id", id_str.clone()))
            .bind(("hospital_id", hospital_id.to_string()))
            .bind(("status", status_to_string(status).to_string()))
            .await
            .map_err(DbError::from)?;
        let mut result = result.check().map_err(DbError::from)?;

        let rows: Vec<MedicalRecordRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "medical_record".into(),
            id: id_str,
        })?;

        Ok(row.into_record(id)?)
    }
}
