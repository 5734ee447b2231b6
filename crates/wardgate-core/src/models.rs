//! Domain models for Wardgate.
//!
//! These are the core types shared across all crates.

pub mod account;
pub mod appointment;
pub mod hospital;
pub mod medical_record;
pub mod patient;
pub mod permission;
pub mod profile;
pub mod role;
pub mod session;
