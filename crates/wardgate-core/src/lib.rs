//! Wardgate Core: domain models, error taxonomy, repository traits and
//! the identity-provider seam shared by every other crate.

pub mod error;
pub mod identity;
pub mod models;
pub mod repository;

pub use error::{WardgateError, WardgateResult};
