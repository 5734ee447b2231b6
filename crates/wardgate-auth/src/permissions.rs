//! Static role-to-permission table and the permission evaluator.
//!
//! A principal holds a permission if any of its roles grants it (union
//! semantics). `SuperAdmin` is granted the wildcard and therefore holds
//! every permission. Evaluation is pure and never touches the store.

use wardgate_core::error::{WardgateError, WardgateResult};
use wardgate_core::models::permission::Permission;
use wardgate_core::models::profile::Principal;
use wardgate_core::models::role::Role;

macro_rules! perms {
    ($($p:literal),* $(,)?) => {
        &[$(Permission::from_static($p)),*]
    };
}

const SUPER_ADMIN: &[Permission] = &[Permission::WILDCARD];

const ADMIN: &[Permission] = perms![
    "DASHBOARD:READ",
    "PATIENT:READ",
    "STAFF:CREATE",
    "STAFF:READ",
    "STAFF:UPDATE",
    "STAFF:DELETE",
    "APPOINTMENT:READ",
];

const DOCTOR: &[Permission] = perms![
    "DASHBOARD:READ",
    "PATIENT:READ",
    "MEDICAL_RECORD:CREATE",
    "MEDICAL_RECORD:READ",
    "PRESCRIPTION:CREATE",
    "PRESCRIPTION:READ",
    "APPOINTMENT:READ",
    "APPOINTMENT:UPDATE",
];

const NURSE: &[Permission] = perms![
    "DASHBOARD:READ",
    "PATIENT:READ",
    "VITALS:CREATE",
    "VITALS:READ",
];

const RECEPTIONIST: &[Permission] = perms![
    "DASHBOARD:READ",
    "PATIENT:CREATE",
    "PATIENT:READ",
    "PATIENT:UPDATE",
    "APPOINTMENT:CREATE",
    "APPOINTMENT:READ",
    "APPOINTMENT:UPDATE",
    "APPOINTMENT:DELETE",
];

const PHARMACIST: &[Permission] = perms![
    "DASHBOARD:READ",
    "PRESCRIPTION:READ",
    "PRESCRIPTION:UPDATE",
];

/// Permissions granted to a single role.
pub fn permissions_for(role: Role) -> &'static [Permission] {
    match role {
        Role::SuperAdmin => SUPER_ADMIN,
        Role::Admin => ADMIN,
        Role::Doctor => DOCTOR,
        Role::Nurse => NURSE,
        Role::Receptionist => RECEPTIONIST,
        Role::Pharmacist => PHARMACIST,
    }
}

/// Whether `principal` holds `permission`. An absent principal holds
/// nothing.
pub fn has_permission(principal: Option<&Principal>, permission: &Permission) -> bool {
    let Some(principal) = principal else {
        return false;
    };
    principal.roles.iter().any(|role| {
        permissions_for(role)
            .iter()
            .any(|granted| granted.is_wildcard() || granted == permission)
    })
}

/// Like [`has_permission`], but fails with
/// [`WardgateError::AuthorizationDenied`] for use at service boundaries.
pub fn authorize(principal: Option<&Principal>, permission: &Permission) -> WardgateResult<()> {
    if has_permission(principal, permission) {
        return Ok(());
    }
    Err(WardgateError::AuthorizationDenied {
        reason: format!("missing permission {permission}"),
    })
}

/// Permission checks directly on a [`Principal`].
pub trait PrincipalExt {
    /// `principal.can("PATIENT:READ")`.
    fn can(&self, permission: &str) -> bool;
}

impl PrincipalExt for Principal {
    fn can(&self, permission: &str) -> bool {
        has_permission(Some(self), &Permission::new(permission.to_string()))
    }
}
