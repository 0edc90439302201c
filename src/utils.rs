use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::errors::AppError;

/// Salted argon2 hash in PHC string form; the salt is generated per call and
/// travels inside the output, so verification needs nothing else.
pub fn hash_password(plain: &str) -> Result<String, AppError> {
    Argon2::default()
        .hash_password(plain.as_bytes(), &SaltString::generate(&mut OsRng))
        .map(|hash| hash.to_string())
        .map_err(|e| {
            log::error!("Failed to hash password: {}", e);
            AppError::Password(e.to_string())
        })
}

/// A stored hash that fails to parse verifies as false rather than erroring;
/// the caller treats both the same way (invalid credentials).
pub fn verify_password(provided: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(provided.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_verify_round_trip() {
        for plain in ["1234", "s3nha-f0rte!", ""] {
            let digest = hash_password(plain).unwrap();
            assert!(verify_password(plain, &digest));
        }
    }

    #[test]
    fn wrong_password_fails() {
        let digest = hash_password("certa").unwrap();
        assert!(!verify_password("errada", &digest));
    }

    #[test]
    fn same_password_hashes_differently() {
        let a = hash_password("1234").unwrap();
        let b = hash_password("1234").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn garbage_stored_hash_verifies_false() {
        assert!(!verify_password("1234", "not-a-phc-string"));
    }
}
