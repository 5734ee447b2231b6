//! SurrealDB implementation of [`HospitalRepository`].

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;
use wardgate_core::error::WardgateResult;
use wardgate_core::models::hospital::{CreateHospital, Hospital, HospitalStatus, UpdateHospital};
use wardgate_core::repository::HospitalRepository;

use crate::error::DbError;
use crate::schema::IDX_HOSPITAL_LICENSE;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct HospitalRow {
    name: String,
    address: String,
    phone: String,
    license_number: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct HospitalRowWithId {
    record_id: String,
    name: String,
    address: String,
    phone: String,
    license_number: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_status(s: &str) -> Result<HospitalStatus, DbError> {
    s.parse()
        .map_err(|_| DbError::Decode(format!("unknown hospital status: {s}")))
}

impl HospitalRow {
    fn into_hospital(self, id: Uuid) -> Result<Hospital, DbError> {
        Ok(Hospital {
            id,
            name: self.name,
            address: self.address,
            phone: self.phone,
            license_number: self.license_number,
            status: parse_status(&self.status)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl HospitalRowWithId {
    fn try_into_hospital(self) -> Result<Hospital, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Decode(format!("invalid UUID: {e}")))?;
        HospitalRow {
            name: self.name,
            address: self.address,
            phone: self.phone,
            license_number: self.license_number,
            status: self.status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .into_hospital(id)
    }
}

/// SurrealDB implementation of the Hospital repository.
#[derive(Clone)]
pub struct SurrealHospitalRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealHospitalRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> HospitalRepository for SurrealHospitalRepository<C> {
    async fn create(&self, input: CreateHospital) -> WardgateResult<Hospital> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('hospital', $id) SET \
                 name = $name, address = $address, phone = $phone, \
                 license_number = $license_number, status = $status",
            )
            .bind(("id", id_str.clone()))
            .bind(("name", input.name))
            .bind(("address", input.address))
            .bind(("phone", input.phone))
            .bind(("license_number", input.license_number))
            .bind(("status", HospitalStatus::Pending.as_str().to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| {
            DbError::from_write(e, "hospital", "license_number", IDX_HOSPITAL_LICENSE)
        })?;

        let rows: Vec<HospitalRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "hospital".into(),
            id: id_str,
        })?;

        Ok(row.into_hospital(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> WardgateResult<Hospital> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('hospital', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<HospitalRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "hospital".into(),
            id: id_str,
        })?;

        Ok(row.into_hospital(id)?)
    }

    async fn get_by_license_number(&self, license_number: &str) -> WardgateResult<Hospital> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * \
                 FROM hospital WHERE license_number = $license_number",
            )
            .bind(("license_number", license_number.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<HospitalRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "hospital".into(),
            id: format!("license_number={license_number}"),
        })?;

        Ok(row.try_into_hospital()?)
    }

    async fn update(&self, id: Uuid, input: UpdateHospital) -> WardgateResult<Hospital> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.address.is_some() {
            sets.push("address = $address");
        }
        if input.phone.is_some() {
            sets.push("phone = $phone");
        }
        if input.status.is_some() {
            sets.push("status = $status");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('hospital', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(address) = input.address {
            builder = builder.bind(("address", address));
        }
        if let Some(phone) = input.phone {
            builder = builder.bind(("phone", phone));
        }
        if let Some(status) = input.status {
            builder = builder.bind(("status", status.as_str().to_string()));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result.check().map_err(DbError::from)?;

        let rows: Vec<HospitalRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "hospital".into(),
            id: id_str,
        })?;

        Ok(row.into_hospital(id)?)
    }

    async fn delete(&self, id: Uuid) -> WardgateResult<()> {
        self.db
            .query("DELETE type::record('hospital', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn list(&self) -> WardgateResult<Vec<Hospital>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * \
                 FROM hospital ORDER BY created_at ASC",
            )
            .await
            .map_err(DbError::from)?;

        let rows: Vec<HospitalRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_hospital())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(items)
    }
}
