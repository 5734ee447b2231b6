//! Staff roles and typed role sets.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::WardgateError;

/// Closed set of staff roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    SuperAdmin,
    Admin,
    Doctor,
    Nurse,
    Receptionist,
    Pharmacist,
}

impl Role {
    pub const ALL: [Role; 6] = [
        Role::SuperAdmin,
        Role::Admin,
        Role::Doctor,
        Role::Nurse,
        Role::Receptionist,
        Role::Pharmacist,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "SuperAdmin",
            Role::Admin => "Admin",
            Role::Doctor => "Doctor",
            Role::Nurse => "Nurse",
            Role::Receptionist => "Receptionist",
            Role::Pharmacist => "Pharmacist",
        }
    }

    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = WardgateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| WardgateError::Validation {
                message: format!("unknown role: {s}"),
            })
    }
}

/// A set of [`Role`]s backed by a bitmask.
///
/// Serialized as a list of role names, in declaration order.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<Role>", into = "Vec<Role>")]
pub struct RoleSet(u8);

impl RoleSet {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn single(role: Role) -> Self {
        Self(role.bit())
    }

    pub fn insert(&mut self, role: Role) {
        self.0 |= role.bit();
    }

    pub fn remove(&mut self, role: Role) {
        self.0 &= !role.bit();
    }

    pub fn contains(&self, role: Role) -> bool {
        self.0 & role.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(&self) -> impl Iterator<Item = Role> + '_ {
        Role::ALL.into_iter().filter(|r| self.contains(*r))
    }

    /// Role names, for storage.
    pub fn to_names(&self) -> Vec<String> {
        self.iter().map(|r| r.as_str().to_string()).collect()
    }

    /// Parse stored role names. Unknown names are skipped and returned
    /// alongside the set so the caller can report them.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> (Self, Vec<String>) {
        let mut set = RoleSet::empty();
        let mut unknown = Vec::new();
        for name in names {
            match name.as_ref().parse::<Role>() {
                Ok(role) => set.insert(role),
                Err(_) => unknown.push(name.as_ref().to_string()),
            }
        }
        (set, unknown)
    }
}

impl fmt::Debug for RoleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl FromIterator<Role> for RoleSet {
    fn from_iter<I: IntoIterator<Item = Role>>(iter: I) -> Self {
        let mut set = RoleSet::empty();
        for role in iter {
            set.insert(role);
        }
        set
    }
}

impl From<Vec<Role>> for RoleSet {
    fn from(roles: Vec<Role>) -> Self {
        roles.into_iter().collect()
    }
}

impl From<RoleSet> for Vec<Role> {
    fn from(set: RoleSet) -> Self {
        set.iter().collect()
    }
}

impl<const N: usize> From<[Role; N]> for RoleSet {
    fn from(roles: [Role; N]) -> Self {
        roles.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_names_roundtrip() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn unknown_role_is_rejected() {
        assert!("Janitor".parse::<Role>().is_err());
    }

    #[test]
    fn set_membership() {
        let set = RoleSet::from([Role::Nurse, Role::Receptionist]);
        assert!(set.contains(Role::Nurse));
        assert!(set.contains(Role::Receptionist));
        assert!(!set.contains(Role::Doctor));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn duplicates_collapse() {
        let set = RoleSet::from([Role::Admin, Role::Admin]);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn serializes_as_name_list() {
        let set = RoleSet::from([Role::Pharmacist, Role::Doctor]);
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"["Doctor","Pharmacist"]"#);
        let back: RoleSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, set);
    }

    #[test]
    fn from_names_skips_unknown() {
        let (set, unknown) = RoleSet::from_names(&["Doctor", "Wizard", "Nurse"]);
        assert_eq!(set, RoleSet::from([Role::Doctor, Role::Nurse]));
        assert_eq!(unknown, vec!["Wizard".to_string()]);

        let (set, unknown) = RoleSet::from_names(&["Doctor"]);
        assert!(set.contains(Role::Doctor));
        assert!(unknown.is_empty());
    }
}
