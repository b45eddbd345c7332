//! Password-based key derivation.
//!
//! Two KDFs are supported:
//! - PBKDF2-HMAC-SHA256 with a fixed salt and 100 000 rounds. This is what
//!   every `1.0` credential record was written with, so its parameters are
//!   frozen.
//! - Argon2id with a per-record random salt, used by `2.0` records.

use rand::RngCore;
use serde::{Deserialize, Serialize};

#[cfg(feature = "encryption")]
use crate::errors::EimgError;
#[cfg(feature = "encryption")]
use crate::errors::Result;

/// Length of a derived key in bytes (256 bits).
pub const KEY_LEN: usize = 32;

/// Length of a random Argon2 salt in bytes.
pub const SALT_LEN: usize = 32;

/// Salt shared by every `1.0` installation.
pub const LEGACY_SALT: &[u8] = b"eimg_salt_2025_stasx";

/// PBKDF2 round count for `1.0` records.
pub const PBKDF2_ITERATIONS: u32 = 100_000;

/// Minimum safe Argon2 memory cost in KiB (8 MB).
pub const MIN_MEMORY_KIB: u32 = 8_192;

/// Argon2id cost parameters.
///
/// Stored alongside `2.0` records so decryption always uses the same
/// settings the record was sealed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Argon2Params {
    /// Memory cost in KiB (default: 65 536 = 64 MB).
    pub memory_kib: u32,
    /// Number of iterations (default: 3).
    pub iterations: u32,
    /// Parallelism lanes (default: 4).
    pub parallelism: u32,
}

impl Default for Argon2Params {
    fn default() -> Self {
        Self {
            memory_kib: 65_536,
            iterations: 3,
            parallelism: 4,
        }
    }
}

/// Derive a 32-byte key with PBKDF2-HMAC-SHA256.
#[cfg(feature = "encryption")]
pub fn derive_pbkdf2(password: &[u8], salt: &[u8], rounds: u32) -> Result<[u8; KEY_LEN]> {
    use hmac::Hmac;
    use sha2::Sha256;

    if rounds == 0 {
        return Err(EimgError::KeyDerivationFailed(
            "PBKDF2 rounds must be at least 1".into(),
        ));
    }

    let mut key = [0u8; KEY_LEN];
    pbkdf2::pbkdf2::<Hmac<Sha256>>(password, salt, rounds, &mut key)
        .map_err(|e| EimgError::KeyDerivationFailed(format!("PBKDF2 failed: {e}")))?;
    Ok(key)
}

/// Derive a 32-byte key with Argon2id.
///
/// Rejects parameters weaker than `MIN_MEMORY_KIB` / one iteration / one lane.
#[cfg(feature = "encryption")]
pub fn derive_argon2id(
    password: &[u8],
    salt: &[u8],
    argon2_params: &Argon2Params,
) -> Result<[u8; KEY_LEN]> {
    use argon2::{Algorithm, Argon2, Params, Version};

    if argon2_params.memory_kib < MIN_MEMORY_KIB {
        return Err(EimgError::KeyDerivationFailed(format!(
            "Argon2 memory_kib must be at least {MIN_MEMORY_KIB} (got {})",
            argon2_params.memory_kib
        )));
    }
    if argon2_params.iterations < 1 || argon2_params.parallelism < 1 {
        return Err(EimgError::KeyDerivationFailed(
            "Argon2 iterations and parallelism must be at least 1".into(),
        ));
    }

    let params = Params::new(
        argon2_params.memory_kib,
        argon2_params.iterations,
        argon2_params.parallelism,
        Some(KEY_LEN),
    )
    .map_err(|e| EimgError::KeyDerivationFailed(format!("invalid Argon2 params: {e}")))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut key = [0u8; KEY_LEN];
    argon2
        .hash_password_into(password, salt, &mut key)
        .map_err(|e| EimgError::KeyDerivationFailed(format!("Argon2id hashing failed: {e}")))?;
    Ok(key)
}

/// Generate a cryptographically random salt.
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    rand::rng().fill_bytes(&mut salt);
    salt
}

#[cfg(all(test, feature = "encryption"))]
mod tests {
    use super::*;

    // Reference value from Python's hashlib.pbkdf2_hmac.
    const CORRECT_HORSE_KEY: &str =
        "33d226a4dbf4701c25ff9f9a98832bfbba53d3b0a200e14468fd87d03e5bd51c";

    fn fast_argon2() -> Argon2Params {
        Argon2Params {
            memory_kib: MIN_MEMORY_KIB,
            iterations: 1,
            parallelism: 1,
        }
    }

    #[test]
    fn pbkdf2_matches_reference_vector() {
        let key = derive_pbkdf2(b"correct-horse-battery", LEGACY_SALT, PBKDF2_ITERATIONS).unwrap();
        assert_eq!(hex::encode(key), CORRECT_HORSE_KEY);
    }

    #[test]
    fn pbkdf2_rejects_zero_rounds() {
        assert!(derive_pbkdf2(b"pw", LEGACY_SALT, 0).is_err());
    }

    #[test]
    fn argon2_is_deterministic_per_salt() {
        let salt = generate_salt();
        let a = derive_argon2id(b"passphrase", &salt, &fast_argon2()).unwrap();
        let b = derive_argon2id(b"passphrase", &salt, &fast_argon2()).unwrap();
        assert_eq!(a, b);

        let other = derive_argon2id(b"passphrase", &generate_salt(), &fast_argon2()).unwrap();
        assert_ne!(a, other);
    }

    #[test]
    fn argon2_rejects_weak_memory() {
        let params = Argon2Params {
            memory_kib: 1024,
            ..fast_argon2()
        };
        let err = derive_argon2id(b"pw", &generate_salt(), &params).unwrap_err();
        assert!(err.to_string().contains("memory_kib"));
    }

    #[test]
    fn salts_are_random() {
        assert_ne!(generate_salt(), generate_salt());
    }
}
