//! Wardgate Auth: local identity provider, permission evaluator and
//! session resolver.

pub mod config;
pub mod error;
pub mod password;
pub mod permissions;
pub mod provider;
pub mod resolver;
pub mod token;

pub use config::{AuthConfig, ResolverConfig};
pub use error::AuthError;
pub use permissions::{PrincipalExt, authorize, has_permission};
pub use provider::LocalIdentityProvider;
pub use resolver::{AuthContext, AuthState, RegisterHospital, SessionResolver};
pub use token::AccessTokenClaims;
