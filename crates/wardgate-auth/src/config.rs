//! Authentication and session-resolution configuration.

use std::time::Duration;

use serde::Deserialize;

/// Configuration for the local identity provider.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// PEM-encoded Ed25519 private key for JWT signing.
    pub jwt_private_key_pem: String,
    /// PEM-encoded Ed25519 public key for JWT verification.
    pub jwt_public_key_pem: String,
    /// Access token lifetime in seconds (default: 900 = 15 minutes).
    pub access_token_lifetime_secs: u64,
    /// Refresh token lifetime in seconds (default: 2_592_000 = 30 days).
    pub refresh_token_lifetime_secs: u64,
    /// JWT issuer (`iss` claim).
    pub jwt_issuer: String,
    /// Optional pepper prepended to passwords before Argon2id verification.
    /// Must match the pepper the account store hashes with.
    pub pepper: Option<String>,
    /// Minimum password length accepted at sign-up.
    pub min_password_length: usize,
    /// Capacity of the session-event broadcast channel.
    pub event_buffer: usize,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_private_key_pem: String::new(),
            jwt_public_key_pem: String::new(),
            access_token_lifetime_secs: 900,
            refresh_token_lifetime_secs: 2_592_000,
            jwt_issuer: "wardgate".into(),
            pepper: None,
            min_password_length: 12,
            event_buffer: 16,
        }
    }
}

/// Configuration for the session resolver.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Upper bound on how long logout waits for the provider before
    /// clearing the local context anyway (default: 5 seconds).
    #[serde(with = "duration_secs")]
    pub sign_out_timeout: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            sign_out_timeout: Duration::from_secs(5),
        }
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        f64::deserialize(d).map(Duration::from_secs_f64)
    }
}
