//! SurrealDB implementation of [`AppointmentRepository`].

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;
use wardgate_core::error::WardgateResult;
use wardgate_core::models::appointment::{Appointment, AppointmentStatus, CreateAppointment};
use wardgate_core::repository::AppointmentRepository;

use crate::error::DbError;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M";

#[derive(Debug, SurrealValue)]
struct AppointmentRow {
    hospital_id: String,
    patient_id: String,
    doctor_id: String,
    date: String,
    time: String,
    status: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct AppointmentRowWithId {
    record_id: String,
    hospital_id: String,
    patient_id: String,
    doctor_id: String,
    date: String,
    time: String,
    status: String,
    created_at: DateTime<Utc>,
}

fn status_to_string(s: AppointmentStatus) -> &'static str {
    match s {
        AppointmentStatus::Scheduled => "Scheduled",
        AppointmentStatus::Completed => "Completed",
        AppointmentStatus::Cancelled => "Cancelled",
    }
}

fn parse_status(s: &str) -> Result<AppointmentStatus, DbError> {
    match s {
        "Scheduled" => Ok(AppointmentStatus::Scheduled),
        "Completed" => Ok(AppointmentStatus::Completed),
        "Cancelled" => Ok(AppointmentStatus::Cancelled),
        other => Err(DbError::Decode(format!("unknown appointment status: {other}"))),
    }
}

fn parse_uuid(s: &str, what: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(s).map_err(|e| DbError::Decode(format!("invalid {what} UUID: {e}")))
}

impl AppointmentRow {
    fn into_appointment(self, id: Uuid) -> Result<Appointment, DbError> {
        Ok(Appointment {
            id,
            hospital_id: parse_uuid(&self.hospital_id, "hospital")?,
            patient_id: parse_uuid(&self.patient_id, "patient")?,
            doctor_id: parse_uuid(&self.doctor_id, "doctor")?,
            date: NaiveDate::parse_from_str(&self.date, DATE_FORMAT)
                .map_err(|e| DbError::Decode(format!("invalid date: {e}")))?,
            time: NaiveTime::parse_from_str(&self.time, TIME_FORMAT)
                .map_err(|e| DbError::Decode(format!("invalid time: {e}")))?,
            status: parse_status(&self.status)?,
            created_at: self.created_at,
        })
    }
}

impl AppointmentRowWithId {
    fn try_into_appointment(self) -> Result<Appointment, DbError> {
        let id = parse_uuid(&self.record_id, "appointment")?;
        AppointmentRow {
            hospital_id: self.hospital_id,
            patient_id: self.patient_id,
            doctor_id: self.doctor_id,
            date: self.date,
            time: self.time,
            status: self.status,
            created_at: self.created_at,
        }
        .into_appointment(id)
    }
}

/// SurrealDB implementation of the Appointment repository.
#[derive(Clone)]
pub struct SurrealAppointmentRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealAppointmentRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn select_where(
        &self,
        filter: &str,
        hospital_id: Uuid,
        doctor_id: Option<Uuid>,
    ) -> WardgateResult<Vec<Appointment>> {
        let query = format!(
            "SELECT meta::id(id) AS record_id, * FROM appointment \
             WHERE {filter} ORDER BY date ASC, time ASC"
        );
        let mut builder = self
            .db
            .query(&query)
            .bind(("hospital_id", hospital_id.to_string()));
        if let Some(doctor_id) = doctor_id {
            builder = builder.bind(("doctor_id", doctor_id.to_string()));
        }

        let mut result = builder.await.map_err(DbError::from)?;
        let rows: Vec<AppointmentRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_appointment())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(items)
    }
}

impl<C: Connection> AppointmentRepository for SurrealAppointmentRepository<C> {
    async fn create(&self, input: CreateAppointment) -> WardgateResult<Appointment> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('appointment', $id) SET \
                 hospital_id = $hospital_id, patient_id = $patient_id, \
                 doctor_id = $doctor_id, date = $date, time = $time, \
                 status = $status",
            )
            .bind(("id", id_str.clone()))
            .bind(("hospital_id", input.hospital_id.to_string()))
            .bind(("patient_id", input.patient_id.to_string()))
            .bind(("doctor_id", input.doctor_id.to_string()))
            .bind(("date", input.date.format(DATE_FORMAT).to_string()))
            .bind(("time", input.time.format(TIME_FORMAT).to_string()))
            .bind((
                "status",
                status_to_string(AppointmentStatus::Scheduled).to_string(),
            ))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(DbError::from)?;

        let rows: Vec<AppointmentRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "appointment".into(),
            id: id_str,
        })?;

        Ok(row.into_appointment(id)?)
    }

    async fn get_by_id(&self, hospital_id: Uuid, id: Uuid) -> WardgateResult<Appointment> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT * FROM type::record('appointment', $id) \
                 WHERE hospital_id = $hospital_id",
            )
            .bind(("id", id_str.clone()))
            .bind(("hospital_id", hospital_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AppointmentRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "appointment".into(),
            id: id_str,
        })?;

        Ok(row.into_appointment(id)?)
    }

    async fn set_status(
        &self,
        hospital_id: Uuid,
        id: Uuid,
        status: AppointmentStatus,
    ) -> WardgateResult<Appointment> {
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "UPDATE type::record('appointment', $id) SET status = $status \
                 WHERE hospital_id = $hospital_id",
            )
            .bind(("id", id_str.clone()))
            .bind(("hospital_id", hospital_id.to_string()))
            .bind(("status", status_to_string(status).to_string()))
            .await
            .map_err(DbError::from)?;
        let mut result = result.check().map_err(DbError::from)?;

        let rows: Vec<AppointmentRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "appointment".into(),
            id: id_str,
        })?;

        Ok(row.into_appointment(id)?)
    }

    async fn delete(&self, hospital_id: Uuid, id: Uuid) -> WardgateResult<()> {
        self.db
            .query(
                "DELETE type::record('appointment', $id) \
                 WHERE hospital_id = $hospital_id",
            )
            .bind(("id", id.to_string()))
            .bind(("hospital_id", hospital_id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn list_by_hospital(&self, hospital_id: Uuid) -> WardgateResult<Vec<Appointment>> {
        self.select_where("hospital_id = $hospital_id", hospital_id, None)
            .await
    }

    async fn list_by_doctor(
        &self,
        hospital_id: Uuid,
        doctor_id: Uuid,
    ) -> WardgateResult<Vec<Appointment>> {
        self.select_where(
            "hospital_id = $hospital_id AND doctor_id = $doctor_id",
            hospital_id,
            Some(doctor_id),
        )
        .await
    }
}
