//! SurrealDB implementation of [`PatientRepository`].

use chrono::{DateTime, NaiveDate, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;
use wardgate_core::error::WardgateResult;
use wardgate_core::models::patient::{
    CreatePatient, EmergencyContact, Gender, Patient, PatientType, UpdatePatient,
};
use wardgate_core::repository::PatientRepository;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct PatientRow {
    hospital_id: String,
    name: String,
    dob: String,
    gender: String,
    contact: String,
    address: String,
    blood_type: String,
    emergency_contact: serde_json::Value,
    patient_type: String,
    department: String,
    photo_url: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct PatientRowWithId {
    record_id: String,
    hospital_id: String,
    name: String,
    dob: String,
    gender: String,
    contact: String,
    address: String,
    blood_type: String,
    emergency_contact: serde_json::Value,
    patient_type: String,
    department: String,
    photo_url: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

fn gender_to_string(g: Gender) -> &'static str {
    match g {
        Gender::Male => "Male",
        Gender::Female => "Female",
        Gender::Other => "Other",
    }
}

fn parse_gender(s: &str) -> Result<Gender, DbError> {
    match s {
        "Male" => Ok(Gender::Male),
        "Female" => Ok(Gender::Female),
        "Other" => Ok(Gender::Other),
        other => Err(DbError::Decode(format!("unknown gender: {other}"))),
    }
}

fn patient_type_to_string(t: PatientType) -> &'static str {
    match t {
        PatientType::Opd => "OPD",
        PatientType::Ipd => "IPD",
    }
}

fn parse_patient_type(s: &str) -> Result<PatientType, DbError> {
    match s {
        "OPD" => Ok(PatientType::Opd),
        "IPD" => Ok(PatientType::Ipd),
        other => Err(DbError::Decode(format!("unknown patient type: {other}"))),
    }
}

fn contact_to_value(contact: &EmergencyContact) -> Result<serde_json::Value, DbError> {
    serde_json::to_value(contact).map_err(|e| DbError::Decode(e.to_string()))
}

impl PatientRow {
    fn into_patient(self, id: Uuid) -> Result<Patient, DbError> {
        let hospital_id = Uuid::parse_str(&self.hospital_id)
            .map_err(|e| DbError::Decode(format!("invalid hospital UUID: {e}")))?;
        let dob = NaiveDate::parse_from_str(&self.dob, "%Y-%m-%d")
            .map_err(|e| DbError::Decode(format!("invalid dob: {e}")))?;
        let emergency_contact = serde_json::from_value(self.emergency_contact)
            .map_err(|e| DbError::Decode(format!("invalid emergency contact: {e}")))?;
        Ok(Patient {
            id,
            hospital_id,
            name: self.name,
            dob,
            gender: parse_gender(&self.gender)?,
            contact: self.contact,
            address: self.address,
            blood_type: self.blood_type,
            emergency_contact,
            patient_type: parse_patient_type(&self.patient_type)?,
            department: self.department,
            photo_url: self.photo_url,
            created_at: self.created_at,
        })
    }
}

impl PatientRowWithId {
    fn try_into_patient(self) -> Result<Patient, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Decode(format!("invalid UUID: {e}")))?;
        PatientRow {
            hospital_id: self.hospital_id,
            name: self.name,
            dob: self.dob,
            gender: self.gender,
            contact: self.contact,
            address: self.address,
            blood_type: self.blood_type,
            emergency_contact: self.emergency_contact,
            patient_type: self.patient_type,
            department: self.department,
            photo_url: self.photo_url,
            created_at: self.created_at,
        }
        .into_patient(id)
    }
}

/// SurrealDB implementation of the Patient repository.
#[derive(Clone)]
pub struct SurrealPatientRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealPatientRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> PatientRepository for SurrealPatientRepository<C> {
    async fn create(&self, input: CreatePatient) -> WardgateResult<Patient> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let emergency_contact = contact_to_value(&input.emergency_contact)?;

        let result = self
            .db
            .query(
                "CREATE type::record('patient', $id) SET \
                 hospital_id = $hospital_id, name = $name, dob = $dob, \
                 gender = $gender, contact = $contact, address = $address, \
                 blood_type = $blood_type, \
                 emergency_contact = $emergency_contact, \
                 patient_type = $patient_type, department = $department, \
                 photo_url = $photo_url",
            )
            .bind(("id", id_str.clone()))
            .bind(("hospital_id", input.hospital_id.to_string()))
            .bind(("name", input.name))
            .bind(("dob", input.dob.format("%Y-%m-%d").to_string()))
            .bind(("gender", gender_to_string(input.gender).to_string()))
            .bind(("contact", input.contact))
            .bind(("address", input.address))
            .bind(("blood_type", input.blood_type))
            .bind(("emergency_contact", emergency_contact))
            .bind((
                "patient_type",
                patient_type_to_string(input.patient_type).to_string(),
            ))
            .bind(("department", input.department))
            .bind(("photo_url", input.photo_url))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(DbError::from)?;

        let rows: Vec<PatientRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "patient".into(),
            id: id_str,
        })?;

        Ok(row.into_patient(id)?)
    }

    async fn get_by_id(&self, hospital_id: Uuid, id: Uuid) -> WardgateResult<Patient> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT * FROM type::record('patient', $id) \
                 WHERE hospital_id = $hospital_id",
            )
            .bind(("id", id_str.clone()))
            .bind(("hospital_id", hospital_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PatientRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "patient".into(),
            id: id_str,
        })?;

        Ok(row.into_patient(id)?)
    }

    async fn update(
        &self,
        hospital_id: Uuid,
        id: Uuid,
        input: UpdatePatient,
    ) -> WardgateResult<Patient> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.contact.is_some() {
            sets.push("contact = $contact");
        }
        if input.address.is_some() {
            sets.push("address = $address");
        }
        if input.blood_type.is_some() {
            sets.push("blood_type = $blood_type");
        }
        if input.emergency_contact.is_some() {
            sets.push("emergency_contact = $emergency_contact");
        }
        if input.patient_type.is_some() {
            sets.push("patient_type = $patient_type");
        }
        if input.department.is_some() {
            sets.push("department = $department");
        }
        if input.photo_url.is_some() {
            sets.push("photo_url = $photo_url");
        }
        if sets.is_empty() {
            return self.get_by_id(hospital_id, id).await;
        }

        let query = format!(
            "UPDATE type::record('patient', $id) SET {} \
             WHERE hospital_id = $hospital_id",
            sets.join(", ")
        );

        let mut builder = self
            .db
            .query(&query)
            .bind(("id", id_str.clone()))
            .bind(("hospital_id", hospital_id.to_string()));

        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(contact) = input.contact {
            builder = builder.bind(("contact", contact));
        }
        if let Some(address) = input.address {
            builder = builder.bind(("address", address));
        }
        if let Some(blood_type) = input.blood_type {
            builder = builder.bind(("blood_type", blood_type));
        }
        if let Some(ref emergency_contact) = input.emergency_contact {
            builder = builder.bind(("emergency_contact", contact_to_value(emergency_contact)?));
        }
        if let Some(patient_type) = input.patient_type {
            builder = builder.bind((
                "patient_type",
                patient_type_to_string(patient_type).to_string(),
            ));
        }
        if let Some(department) = input.department {
            builder = builder.bind(("department", department));
        }
        if let Some(photo_url) = input.photo_url {
            builder = builder.bind(("photo_url", photo_url));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result.check().map_err(DbError::from)?;

        let rows: Vec<PatientRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "patient".into(),
            id: id_str,
        })?;

        Ok(row.into_patient(id)?)
    }

    async fn list_by_hospital(
        &self,
        hospital_id: Uuid,
        name_contains: Option<&str>,
    ) -> WardgateResult<Vec<Patient>> {
        let needle = name_contains
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());

        let query = if needle.is_some() {
            "SELECT meta::id(id) AS record_id, * FROM patient \
             WHERE hospital_id = $hospital_id \
             AND string::contains(string::lowercase(name), $needle) \
             ORDER BY created_at DESC"
        } else {
            "SELECT meta::id(id) AS record_id, * FROM patient \
             WHERE hospital_id = $hospital_id \
             ORDER BY created_at DESC"
        };

        let mut builder = self
            .db
            .query(query)
            .bind(("hospital_id", hospital_id.to_string()));
        if let Some(needle) = needle {
            builder = builder.bind(("needle", needle));
        }

        let mut result = builder.await.map_err(DbError::from)?;
        let rows: Vec<PatientRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_patient())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(items)
    }

    async fn count_by_hospital(&self, hospital_id: Uuid) -> WardgateResult<u64> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM patient \
                 WHERE hospital_id = $hospital_id GROUP ALL",
            )
            .bind(("hospital_id", hospital_id.to_string()))
            .await
            .map_err(DbError::from)?;
        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }
}
