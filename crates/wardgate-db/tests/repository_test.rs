//! Integration tests for Hospital and Profile repository
//! implementations using in-memory SurrealDB.

use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;
use wardgate_core::error::WardgateError;
use wardgate_core::models::hospital::{CreateHospital, HospitalStatus, UpdateHospital};
use wardgate_core::models::profile::{CreateProfile, UpdateProfile};
use wardgate_core::models::role::{Role, RoleSet};
use wardgate_core::repository::{HospitalRepository, ProfileRepository};
use wardgate_db::repository::{SurrealHospitalRepository, SurrealProfileRepository};

/// Helper: spin up in-memory DB and run migrations.
async fn setup() -> Surreal<surrealdb::engine::local::Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    wardgate_db::run_migrations(&db).await.unwrap();
    db
}

fn hospital(license: &str) -> CreateHospital {
    CreateHospital {
        name: "General Hospital".into(),
        address: "1 Main St".into(),
        phone: "555-0100".into(),
        license_number: license.into(),
    }
}

// -----------------------------------------------------------------------
// Hospital tests
// -----------------------------------------------------------------------

#[tokio::test]
async fn create_hospital_starts_pending() {
    let db = setup().await;
    let repo = SurrealHospitalRepository::new(db);

    let created = repo.create(hospital("LIC-100")).await.unwrap();
    assert_eq!(created.status, HospitalStatus::Pending);
    assert_eq!(created.license_number, "LIC-100");

    let fetched = repo.get_by_id(created.id).await.unwrap();
    assert_eq!(fetched.id, created.id);
    assert_eq!(fetched.name, "General Hospital");

    let by_license = repo.get_by_license_number("LIC-100").await.unwrap();
    assert_eq!(by_license.id, created.id);
}

#[tokio::test]
async fn duplicate_license_is_already_exists() {
    let db = setup().await;
    let repo = SurrealHospitalRepository::new(db);

    repo.create(hospital("LIC-200")).await.unwrap();
    let err = repo.create(hospital("LIC-200")).await.unwrap_err();

    match err {
        WardgateError::AlreadyExists { entity, field } => {
            assert_eq!(entity, "hospital");
            assert_eq!(field, "license_number");
        }
        other => panic!("expected AlreadyExists, got {other:?}"),
    }
    assert_eq!(repo.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn update_hospital_status() {
    let db = setup().await;
    let repo = SurrealHospitalRepository::new(db);

    let created = repo.create(hospital("LIC-300")).await.unwrap();
    let updated = repo
        .update(
            created.id,
            UpdateHospital {
                status: Some(HospitalStatus::Verified),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.status, HospitalStatus::Verified);
    assert_eq!(updated.name, created.name);
}

#[tokio::test]
async fn delete_hospital() {
    let db = setup().await;
    let repo = SurrealHospitalRepository::new(db);

    let created = repo.create(hospital("LIC-400")).await.unwrap();
    repo.delete(created.id).await.unwrap();

    let err = repo.get_by_id(created.id).await.unwrap_err();
    assert!(matches!(err, WardgateError::NotFound { .. }));
}

// -----------------------------------------------------------------------
// Profile tests
// -----------------------------------------------------------------------

fn profile(hospital_id: Uuid, roles: RoleSet) -> CreateProfile {
    CreateProfile {
        id: Uuid::new_v4(),
        hospital_id,
        first_name: "Grace".into(),
        last_name: "Hopper".into(),
        phone: "555-0199".into(),
        department: "Cardiology".into(),
        roles,
    }
}

#[tokio::test]
async fn create_and_get_profile_keeps_roles() {
    let db = setup().await;
    let hospitals = SurrealHospitalRepository::new(db.clone());
    let repo = SurrealProfileRepository::new(db);
    let h = hospitals.create(hospital("LIC-500")).await.unwrap();

    let input = profile(h.id, RoleSet::from([Role::Doctor, Role::Nurse]));
    let id = input.id;
    let created = repo.create(input).await.unwrap();
    assert_eq!(created.id, id);

    let fetched = repo.get_by_id(id).await.unwrap();
    assert_eq!(fetched.hospital_id, h.id);
    assert!(fetched.roles.contains(Role::Doctor));
    assert!(fetched.roles.contains(Role::Nurse));
    assert!(!fetched.roles.contains(Role::Admin));
}

#[tokio::test]
async fn empty_roles_are_rejected() {
    let db = setup().await;
    let repo = SurrealProfileRepository::new(db);

    let err = repo
        .create(profile(Uuid::new_v4(), RoleSet::empty()))
        .await
        .unwrap_err();
    assert!(matches!(err, WardgateError::Validation { .. }));
}

#[tokio::test]
async fn profiles_are_scoped_to_hospital() {
    let db = setup().await;
    let hospitals = SurrealHospitalRepository::new(db.clone());
    let repo = SurrealProfileRepository::new(db);
    let a = hospitals.create(hospital("LIC-600")).await.unwrap();
    let b = hospitals.create(hospital("LIC-601")).await.unwrap();

    repo.create(profile(a.id, RoleSet::single(Role::Nurse)))
        .await
        .unwrap();
    repo.create(profile(a.id, RoleSet::single(Role::Doctor)))
        .await
        .unwrap();
    let in_b = repo
        .create(profile(b.id, RoleSet::single(Role::Admin)))
        .await
        .unwrap();

    assert_eq!(repo.list_by_hospital(a.id).await.unwrap().len(), 2);
    assert_eq!(repo.count_by_hospital(a.id).await.unwrap(), 2);
    assert_eq!(repo.count_by_hospital(b.id).await.unwrap(), 1);

    // Updating through the wrong hospital must not touch the row.
    let err = repo
        .update(
            a.id,
            in_b.id,
            UpdateProfile {
                department: Some("Hijacked".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, WardgateError::NotFound { .. }));
    assert_eq!(
        repo.get_by_id(in_b.id).await.unwrap().department,
        "Cardiology"
    );
}

#[tokio::test]
async fn unknown_stored_role_is_skipped() {
    let db = setup().await;
    let hospitals = SurrealHospitalRepository::new(db.clone());
    let repo = SurrealProfileRepository::new(db.clone());
    let h = hospitals.create(hospital("LIC-700")).await.unwrap();
    let created = repo
        .create(profile(h.id, RoleSet::single(Role::Doctor)))
        .await
        .unwrap();

    // A row written by a build with a wider role list.
    db.query("REMOVE FIELD roles.* ON TABLE profile")
        .query("UPDATE type::record('profile', $id) SET roles += 'Janitor'")
        .bind(("id", created.id.to_string()))
        .await
        .unwrap()
        .check()
        .unwrap();

    let fetched = repo.get_by_id(created.id).await.unwrap();
    assert_eq!(fetched.roles, RoleSet::single(Role::Doctor));
    assert_eq!(repo.list_by_hospital(h.id).await.unwrap().len(), 1);
}
