use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use tracing::error;

use crate::error::AppError;

/// Fresh per-account salt, generated once at registration and reused for
/// every later re-hash of that account's password.
pub fn generate_salt() -> SaltString {
    SaltString::generate(&mut OsRng)
}

pub fn parse_salt(stored: &str) -> Result<SaltString, AppError> {
    SaltString::from_b64(stored).map_err(|e| {
        error!(error = %e, "stored salt is malformed");
        AppError::Internal(anyhow::anyhow!(e.to_string()))
    })
}

pub fn hash_password(plain: &str, salt: &SaltString) -> Result<String, AppError> {
    if plain.is_empty() {
        return Err(AppError::Validation("Password is empty".into()));
    }
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(plain.as_bytes(), salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

/// Non-matching passwords return `Ok(false)`; only a malformed stored hash is
/// an error. Comparison happens inside argon2's verifier, which is not
/// sensitive to mismatch position.
pub fn verify_password(plain: &str, hash: &str) -> Result<bool, AppError> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        anyhow::anyhow!(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_roundtrip() {
        let password = "Secur3P@ssw0rd!";
        let salt = generate_salt();
        let hash = hash_password(password, &salt).expect("hashing should succeed");
        assert!(verify_password(password, &hash).expect("verify should succeed"));
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let password = "correct-horse-battery-staple";
        let salt = generate_salt();
        let hash = hash_password(password, &salt).expect("hashing should succeed");
        assert!(!verify_password("wrong-password", &hash).expect("verify should not error"));
    }

    #[test]
    fn same_salt_hashes_deterministically() {
        let salt = generate_salt();
        let a = hash_password("Secret123!", &salt).unwrap();
        let b = hash_password("Secret123!", &salt).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn empty_password_is_rejected() {
        let salt = generate_salt();
        let err = hash_password("", &salt).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn verify_errors_on_malformed_hash() {
        let err = verify_password("anything", "not-a-valid-hash").unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }

    #[test]
    fn stored_salt_roundtrips() {
        let salt = generate_salt();
        let parsed = parse_salt(salt.as_str()).expect("parse stored salt");
        assert_eq!(salt.as_str(), parsed.as_str());
    }
}
