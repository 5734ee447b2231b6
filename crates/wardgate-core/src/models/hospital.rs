//! Hospital domain model.
//!
//! A hospital is the tenant boundary: every profile, patient,
//! appointment and medical record is scoped to exactly one hospital.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::WardgateError;

/// Lifecycle status of a hospital.
///
/// Registration always creates hospitals as `Pending`; later transitions
/// are driven by an external verification workflow.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HospitalStatus {
    Pending,
    Verified,
    Active,
    Suspended,
    Inactive,
}

impl HospitalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HospitalStatus::Pending => "PENDING",
            HospitalStatus::Verified => "VERIFIED",
            HospitalStatus::Active => "ACTIVE",
            HospitalStatus::Suspended => "SUSPENDED",
            HospitalStatus::Inactive => "INACTIVE",
        }
    }
}

impl fmt::Display for HospitalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HospitalStatus {
    type Err = WardgateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(HospitalStatus::Pending),
            "VERIFIED" => Ok(HospitalStatus::Verified),
            "ACTIVE" => Ok(HospitalStatus::Active),
            "SUSPENDED" => Ok(HospitalStatus::Suspended),
            "INACTIVE" => Ok(HospitalStatus::Inactive),
            other => Err(WardgateError::Validation {
                message: format!("unknown hospital status: {other}"),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Hospital {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub phone: String,
    /// Medical license number, unique across all hospitals.
    pub license_number: String,
    pub status: HospitalStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to register a new hospital.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateHospital {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub license_number: String,
}

/// Fields that can be updated on an existing hospital.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateHospital {
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub status: Option<HospitalStatus>,
}
