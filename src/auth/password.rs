//! Argon2id password hashing.
//!
//! Hashing is CPU-intensive; async callers go through the `*_blocking`
//! wrappers so the runtime's worker threads are never stalled.

use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use tokio::task;

use crate::config::SecurityConfig;

/// Hash a password into a PHC string using the configured Argon2id cost.
/// A fresh random salt is drawn on every call.
pub fn hash_password(password: &str, config: &SecurityConfig) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let params = Params::new(
        config.argon2_memory_cost_kib,
        config.argon2_time_cost,
        config.argon2_parallelism,
        None,
    )
    .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

/// Check a password against a stored PHC string.
///
/// The cost parameters are read back from the hash itself. A hash that
/// cannot be parsed never matches.
#[must_use]
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    let Ok(parsed_hash) = PasswordHash::new(password_hash) else {
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

pub async fn hash_password_blocking(password: String, config: SecurityConfig) -> Result<String> {
    task::spawn_blocking(move || hash_password(&password, &config))
        .await
        .context("Password hashing task panicked")?
}

pub async fn verify_password_blocking(password: String, password_hash: String) -> Result<bool> {
    task::spawn_blocking(move || verify_password(&password, &password_hash))
        .await
        .context("Password verification task panicked")
}

#[cfg(test)]
pub(crate) fn fast_test_config() -> SecurityConfig {
    SecurityConfig {
        argon2_memory_cost_kib: 64,
        argon2_time_cost: 1,
        argon2_parallelism: 1,
        ..SecurityConfig::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verifies_the_original_password_only() {
        let config = fast_test_config();
        let hash = hash_password("pw1", &config).unwrap();

        assert!(verify_password("pw1", &hash));
        assert!(!verify_password("pw1x", &hash));
        assert!(!verify_password("", &hash));
    }

    #[test]
    fn salts_every_hash() {
        let config = fast_test_config();
        let a = hash_password("same input", &config).unwrap();
        let b = hash_password("same input", &config).unwrap();

        assert_ne!(a, b);
        assert!(verify_password("same input", &a));
        assert!(verify_password("same input", &b));
    }

    #[test]
    fn produces_argon2id_phc_strings() {
        let hash = hash_password("pw", &fast_test_config()).unwrap();
        assert!(hash.starts_with("$argon2id$"));
    }

    #[test]
    fn malformed_hash_never_matches() {
        assert!(!verify_password("pw", ""));
        assert!(!verify_password("pw", "not-a-phc-string"));
        assert!(!verify_password("pw", "$argon2id$v=19$m=64,t=1,p=1$garbage"));
    }

    #[test]
    fn rejects_invalid_cost_params() {
        let config = SecurityConfig {
            argon2_memory_cost_kib: 0,
            ..fast_test_config()
        };
        assert!(hash_password("pw", &config).is_err());
    }

    #[tokio::test]
    async fn blocking_wrappers_round_trip() {
        let hash = hash_password_blocking("secret".to_string(), fast_test_config())
            .await
            .unwrap();

        assert!(
            verify_password_blocking("secret".to_string(), hash.clone())
                .await
                .unwrap()
        );
        assert!(
            !verify_password_blocking("wrong".to_string(), hash)
                .await
                .unwrap()
        );
    }
}
