//! Password verification and sign-up policy.

use argon2::{Argon2, PasswordVerifier};

use crate::error::AuthError;

/// Verify a plaintext password against an Argon2 PHC-format hash.
///
/// If `pepper` is provided it is prepended to the password, matching
/// what the account store does when hashing.
///
/// Returns `Ok(false)` on mismatch and `Err(AuthError::Crypto)` if the
/// stored hash is malformed.
pub fn verify_password(
    password: &str,
    hash: &str,
    pepper: Option<&str>,
) -> Result<bool, AuthError> {
    let peppered: String;
    let input = match pepper {
        Some(p) => {
            peppered = format!("{p}{password}");
            peppered.as_bytes()
        }
        None => password.as_bytes(),
    };

    let parsed_hash = argon2::PasswordHash::new(hash)
        .map_err(|e| AuthError::Crypto(format!("invalid hash format: {e}")))?;

    // Parameters are read from the PHC string, so the default instance
    // verifies hashes produced with any cost settings.
    match Argon2::default().verify_password(input, &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AuthError::Crypto(format!("verify error: {e}"))),
    }
}

/// Reject passwords shorter than `min_length` characters.
pub fn check_policy(password: &str, min_length: usize) -> Result<(), AuthError> {
    if password.chars().count() < min_length {
        return Err(AuthError::WeakPassword { min: min_length });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use argon2::PasswordHasher;
    use argon2::password_hash::SaltString;
    use argon2::password_hash::rand_core::OsRng;

    fn hash(password: &str, pepper: Option<&str>) -> String {
        let input = match pepper {
            Some(p) => format!("{p}{password}"),
            None => password.to_string(),
        };
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(input.as_bytes(), &salt)
            .expect("hashing failed")
            .to_string()
    }

    #[test]
    fn matching_password_verifies() {
        let h = hash("ward-round-0700", None);
        assert!(verify_password("ward-round-0700", &h, None).unwrap());
        assert!(!verify_password("ward-round-0800", &h, None).unwrap());
    }

    #[test]
    fn pepper_must_match() {
        let h = hash("ward-round-0700", Some("s3cret"));
        assert!(verify_password("ward-round-0700", &h, Some("s3cret")).unwrap());
        assert!(!verify_password("ward-round-0700", &h, None).unwrap());
    }

    #[test]
    fn malformed_hash_is_an_error() {
        assert!(matches!(
            verify_password("pw", "plaintext", None),
            Err(AuthError::Crypto(_))
        ));
    }

    #[test]
    fn policy_counts_characters() {
        assert!(check_policy("short", 12).is_err());
        assert!(check_policy("long-enough-pw", 12).is_ok());
        // Multi-byte characters count once.
        assert!(check_policy("ééééé", 5).is_ok());
    }
}
