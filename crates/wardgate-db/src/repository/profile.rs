//! SurrealDB implementation of [`ProfileRepository`].
//!
//! Profile records share their id with the identity-provider account
//! they describe.

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::warn;
use uuid::Uuid;
use wardgate_core::error::{WardgateError, WardgateResult};
use wardgate_core::models::profile::{CreateProfile, Profile, UpdateProfile};
use wardgate_core::models::role::RoleSet;
use wardgate_core::repository::ProfileRepository;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct ProfileRow {
    hospital_id: String,
    first_name: String,
    last_name: String,
    phone: String,
    department: String,
    roles: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct ProfileRowWithId {
    record_id: String,
    hospital_id: String,
    first_name: String,
    last_name: String,
    phone: String,
    department: String,
    roles: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ProfileRow {
    fn into_profile(self, id: Uuid) -> Result<Profile, DbError> {
        let hospital_id = Uuid::parse_str(&self.hospital_id)
            .map_err(|e| DbError::Decode(format!("invalid hospital UUID: {e}")))?;
        let (roles, unknown) = RoleSet::from_names(&self.roles);
        if !unknown.is_empty() {
            warn!(profile_id = %id, roles = ?unknown, "skipping unknown stored roles");
        }
        Ok(Profile {
            id,
            hospital_id,
            first_name: self.first_name,
            last_name: self.last_name,
            phone: self.phone,
            department: self.department,
            roles,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl ProfileRowWithId {
    fn try_into_profile(self) -> Result<Profile, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Decode(format!("invalid UUID: {e}")))?;
        ProfileRow {
            hospital_id: self.hospital_id,
            first_name: self.first_name,
            last_name: self.last_name,
            phone: self.phone,
            department: self.department,
            roles: self.roles,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .into_profile(id)
    }
}

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

fn ensure_roles(roles: &RoleSet) -> WardgateResult<()> {
    if roles.is_empty() {
        return Err(WardgateError::Validation {
            message: "a staff profile needs at least one role".into(),
        });
    }
    Ok(())
}

/// SurrealDB implementation of the Profile repository.
#[derive(Clone)]
pub struct SurrealProfileRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealProfileRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> ProfileRepository for SurrealProfileRepository<C> {
    async fn create(&self, input: CreateProfile) -> WardgateResult<Profile> {
        ensure_roles(&input.roles)?;
        let id_str = input.id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('profile', $id) SET \
                 hospital_id = $hospital_id, \
                 first_name = $first_name, last_name = $last_name, \
                 phone = $phone, department = $department, \
                 roles = $roles",
            )
            .bind(("id", id_str.clone()))
            .bind(("hospital_id", input.hospital_id.to_string()))
            .bind(("first_name", input.first_name))
            .bind(("last_name", input.last_name))
            .bind(("phone", input.phone))
            .bind(("department", input.department))
            .bind(("roles", input.roles.to_names()))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(DbError::from)?;

        let rows: Vec<ProfileRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "profile".into(),
            id: id_str,
        })?;

        Ok(row.into_profile(input.id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> WardgateResult<Profile> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('profile', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ProfileRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "profile".into(),
            id: id_str,
        })?;

        Ok(row.into_profile(id)?)
    }

    async fn update(
        &self,
        hospital_id: Uuid,
        id: Uuid,
        input: UpdateProfile,
    ) -> WardgateResult<Profile> {
        if let Some(roles) = &input.roles {
            ensure_roles(roles)?;
        }
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.first_name.is_some() {
            sets.push("first_name = $first_name");
        }
        if input.last_name.is_some() {
            sets.push("last_name = $last_name");
        }
        if input.phone.is_some() {
            sets.push("phone = $phone");
        }
        if input.department.is_some() {
            sets.push("department = $department");
        }
        if input.roles.is_some() {
            sets.push("roles = $roles");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('profile', $id) SET {} \
             WHERE hospital_id = $hospital_id",
            sets.join(", ")
        );

        let mut builder = self
            .db
            .query(&query)
            .bind(("id", id_str.clone()))
            .bind(("hospital_id", hospital_id.to_string()));

        if let Some(first_name) = input.first_name {
            builder = builder.bind(("first_name", first_name));
        }
        if let Some(last_name) = input.last_name {
            builder = builder.bind(("last_name", last_name));
        }
        if let Some(phone) = input.phone {
            builder = builder.bind(("phone", phone));
        }
        if let Some(department) = input.department {
            builder = builder.bind(("department", department));
        }
        if let Some(roles) = input.roles {
            builder = builder.bind(("roles", roles.to_names()));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result.check().map_err(DbError::from)?;

        let rows: Vec<ProfileRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "profile".into(),
            id: id_str,
        })?;

        Ok(row.into_profile(id)?)
    }

    async fn delete(&self, hospital_id: Uuid, id: Uuid) -> WardgateResult<()> {
        self.db
            .query(
                "DELETE type::record('profile', $id) \
                 WHERE hospital_id = $hospital_id",
            )
            .bind(("id", id.to_string()))
            .bind(("hospital_id", hospital_id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn list_by_hospital(&self, hospital_id: Uuid) -> WardgateResult<Vec<Profile>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM profile \
                 WHERE hospital_id = $hospital_id \
                 ORDER BY last_name ASC, first_name ASC",
            )
            .bind(("hospital_id", hospital_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ProfileRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_profile())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(items)
    }

    async fn count_by_hospital(&self, hospital_id: Uuid) -> WardgateResult<u64> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM profile \
                 WHERE hospital_id = $hospital_id GROUP ALL",
            )
            .bind(("hospital_id", hospital_id.to_string()))
            .await
            .map_err(DbError::from)?;
        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }
}
