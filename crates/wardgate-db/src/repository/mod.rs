//! SurrealDB repository implementations.

mod account;
mod appointment;
mod hospital;
mod medical_record;
mod patient;
mod profile;
mod session;

pub use account::SurrealAccountRepository;
pub use appointment::SurrealAppointmentRepository;
pub use hospital::SurrealHospitalRepository;
pub use medical_record::SurrealMedicalRecordRepository;
pub use patient::SurrealPatientRepository;
pub use profile::SurrealProfileRepository;
pub use session::SurrealSessionRepository;

use surrealdb::{Connection, Surreal};
use wardgate_core::repository::RecordStore;

/// All hospital-scoped repositories over one SurrealDB handle.
#[derive(Clone)]
pub struct SurrealStore<C: Connection> {
    profiles: SurrealProfileRepository<C>,
    patients: SurrealPatientRepository<C>,
    appointments: SurrealAppointmentRepository<C>,
    medical_records: SurrealMedicalRecordRepository<C>,
}

impl<C: Connection> SurrealStore<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self {
            profiles: SurrealProfileRepository::new(db.clone()),
            patients: SurrealPatientRepository::new(db.clone()),
            appointments: SurrealAppointmentRepository::new(db.clone()),
            medical_records: SurrealMedicalRecordRepository::new(db),
        }
    }
}

impl<C: Connection> RecordStore for SurrealStore<C> {
    type Profiles = SurrealProfileRepository<C>;
    type Patients = SurrealPatientRepository<C>;
    type Appointments = SurrealAppointmentRepository<C>;
    type MedicalRecords = SurrealMedicalRecordRepository<C>;

    fn profiles(&self) -> &Self::Profiles {
        &self.profiles
    }

    fn patients(&self) -> &Self::Patients {
        &self.patients
    }

    fn appointments(&self) -> &Self::Appointments {
        &self.appointments
    }

    fn medical_records(&self) -> &Self::MedicalRecords {
        &self.medical_records
    }
}
