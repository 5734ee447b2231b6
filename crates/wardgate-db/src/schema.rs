//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! UUIDs are stored as strings. Enums are stored as strings with
//! ASSERT constraints for validation.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

/// Index guarding hospital license numbers; referenced when classifying
/// write errors.
pub(crate) const IDX_HOSPITAL_LICENSE: &str = "idx_hospital_license_number";
/// Index guarding account emails.
pub(crate) const IDX_ACCOUNT_EMAIL: &str = "idx_account_email";

// -----------------------------------------------------------------------
// Schema v1: initial table definitions
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Hospitals (global scope, tenant boundary)
-- =======================================================================
DEFINE TABLE hospital SCHEMAFULL;
DEFINE FIELD name ON TABLE hospital TYPE string;
DEFINE FIELD address ON TABLE hospital TYPE string;
DEFINE FIELD phone ON TABLE hospital TYPE string;
DEFINE FIELD license_number ON TABLE hospital TYPE string;
DEFINE FIELD status ON TABLE hospital TYPE string \
    ASSERT $value IN ['PENDING', 'VERIFIED', 'ACTIVE', 'SUSPENDED', \
    'INACTIVE'];
DEFINE FIELD created_at ON TABLE hospital TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE hospital TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_hospital_license_number ON TABLE hospital \
    COLUMNS license_number UNIQUE;

-- =======================================================================
-- Accounts (identity provider, global scope)
-- =======================================================================
DEFINE TABLE account SCHEMAFULL;
DEFINE FIELD email ON TABLE account TYPE string;
DEFINE FIELD password_hash ON TABLE account TYPE string;
DEFINE FIELD status ON TABLE account TYPE string \
    ASSERT $value IN ['Active', 'Inactive', 'Locked', \
    'PendingVerification'];
DEFINE FIELD created_at ON TABLE account TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE account TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_account_email ON TABLE account \
    COLUMNS email UNIQUE;

-- =======================================================================
-- Sessions (identity provider, one per refresh token)
-- =======================================================================
DEFINE TABLE session SCHEMAFULL;
DEFINE FIELD account_id ON TABLE session TYPE string;
DEFINE FIELD token_hash ON TABLE session TYPE string;
DEFINE FIELD expires_at ON TABLE session TYPE datetime;
DEFINE FIELD created_at ON TABLE session TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_session_token_hash ON TABLE session \
    COLUMNS token_hash UNIQUE;
DEFINE INDEX idx_session_account ON TABLE session \
    COLUMNS account_id;

-- =======================================================================
-- Profiles (hospital scope, keyed by account id)
-- =======================================================================
DEFINE TABLE profile SCHEMAFULL;
DEFINE FIELD hospital_id ON TABLE profile TYPE string;
DEFINE FIELD first_name ON TABLE profile TYPE string;
DEFINE FIELD last_name ON TABLE profile TYPE string;
DEFINE FIELD phone ON TABLE profile TYPE string;
DEFINE FIELD department ON TABLE profile TYPE string;
DEFINE FIELD roles ON TABLE profile TYPE array<string> \
    ASSERT array::len($value) > 0;
DEFINE FIELD OVERWRITE roles.* ON TABLE profile TYPE string \
    ASSERT $value IN ['SuperAdmin', 'Admin', 'Doctor', 'Nurse', \
    'Receptionist', 'Pharmacist'];
DEFINE FIELD created_at ON TABLE profile TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE profile TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_profile_hospital ON TABLE profile \
    COLUMNS hospital_id;

-- =======================================================================
-- Patients (hospital scope)
-- =======================================================================
DEFINE TABLE patient SCHEMAFULL;
DEFINE FIELD hospital_id ON TABLE patient TYPE string;
DEFINE FIELD name ON TABLE patient TYPE string;
DEFINE FIELD dob ON TABLE patient TYPE string;
DEFINE FIELD gender ON TABLE patient TYPE string \
    ASSERT $value IN ['Male', 'Female', 'Other'];
DEFINE FIELD contact ON TABLE patient TYPE string;
DEFINE FIELD address ON TABLE patient TYPE string;
DEFINE FIELD blood_type ON TABLE patient TYPE string;
DEFINE FIELD emergency_contact ON TABLE patient TYPE object FLEXIBLE;
DEFINE FIELD patient_type ON TABLE patient TYPE string \
    ASSERT $value IN ['OPD', 'IPD'];
DEFINE FIELD department ON TABLE patient TYPE string;
DEFINE FIELD photo_url ON TABLE patient TYPE option<string>;
DEFINE FIELD created_at ON TABLE patient TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_patient_hospital ON TABLE patient \
    COLUMNS hospital_id;

-- =======================================================================
-- Appointments (hospital scope)
-- =======================================================================
DEFINE TABLE appointment SCHEMAFULL;
DEFINE FIELD hospital_id ON TABLE appointment TYPE string;
DEFINE FIELD patient_id ON TABLE appointment TYPE string;
DEFINE FIELD doctor_id ON TABLE appointment TYPE string;
DEFINE FIELD date ON TABLE appointment TYPE string;
DEFINE FIELD time ON TABLE appointment TYPE string;
DEFINE FIELD status ON TABLE appointment TYPE string \
    ASSERT $value IN ['Scheduled', 'Completed', 'Cancelled'];
DEFINE FIELD created_at ON TABLE appointment TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_appointment_hospital ON TABLE appointment \
    COLUMNS hospital_id;
DEFINE INDEX idx_appointment_doctor ON TABLE appointment \
    COLUMNS hospital_id, doctor_id;

-- =======================================================================
-- Medical records (hospital scope)
-- =======================================================================
DEFINE TABLE medical_record SCHEMAFULL;
DEFINE FIELD hospital_id ON TABLE medical_record TYPE string;
DEFINE FIELD patient_id ON TABLE medical_record TYPE string;
DEFINE FIELD doctor_id ON TABLE medical_record TYPE option<string>;
DEFINE FIELD doctor_name ON TABLE medical_record TYPE string;
DEFINE FIELD notes ON TABLE medical_record TYPE string;
DEFINE FIELD diagnosis ON TABLE medical_record TYPE string;
DEFINE FIELD prescription ON TABLE medical_record TYPE array \
    DEFAULT [];
DEFINE FIELD prescription.* ON TABLE medical_record TYPE object FLEXIBLE;
DEFINE FIELD summary ON TABLE medical_record TYPE option<string>;
DEFINE FIELD prescription_status ON TABLE medical_record \
    TYPE option<string> \
    ASSERT $value = NONE OR $value IN ['Pending', 'Fulfilled'];
DEFINE FIELD created_at ON TABLE medical_record TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_medical_record_patient ON TABLE medical_record \
    COLUMNS hospital_id, patient_id;
DEFINE INDEX idx_medical_record_rx_status ON TABLE medical_record \
    COLUMNS hospital_id, prescription_status;
";

/// Run all pending schema migrations.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            db.query(migration.sql).await?.check().map_err(|e| {
                DbError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e,
                ))
            })?;

            db.query(
                "CREATE _migration SET version = $version, \
                 name = $name",
            )
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;

            info!(
                version = migration.version,
                "Migration applied successfully"
            );
        }
    }

    Ok(())
}

/// Returns the raw schema DDL for version 1.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_ordered() {
        for window in MIGRATIONS.windows(2) {
            assert!(
                window[0].version < window[1].version,
                "Migrations must be in ascending version order"
            );
        }
    }

    #[test]
    fn unique_indexes_are_declared() {
        assert!(SCHEMA_V1.contains(IDX_HOSPITAL_LICENSE));
        assert!(SCHEMA_V1.contains(IDX_ACCOUNT_EMAIL));
    }
}
