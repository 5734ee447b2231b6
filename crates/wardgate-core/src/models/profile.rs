//! Staff profile and authenticated principal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::role::RoleSet;

/// Stored staff profile, keyed by the identity-provider account id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    pub id: Uuid,
    pub hospital_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub department: String,
    pub roles: RoleSet,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProfile {
    /// Account id issued by the identity provider.
    pub id: Uuid,
    pub hospital_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub department: String,
    /// Must not be empty.
    pub roles: RoleSet,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateProfile {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub roles: Option<RoleSet>,
}

/// An authenticated staff member.
///
/// Built from a [`Profile`] plus the email carried by the identity
/// session; the profile store does not hold emails.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Principal {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub department: String,
    pub roles: RoleSet,
    pub hospital_id: Uuid,
}

impl Principal {
    pub fn from_profile(profile: Profile, email: impl Into<String>) -> Self {
        Self {
            id: profile.id,
            first_name: profile.first_name,
            last_name: profile.last_name,
            email: email.into(),
            phone: profile.phone,
            department: profile.department,
            roles: profile.roles,
            hospital_id: profile.hospital_id,
        }
    }

    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
