//! AES-256-GCM authenticated encryption for `2.0` credential records.
//!
//! Each call to `seal` generates a fresh random 12-byte nonce and
//! prepends it to the ciphertext. The caller's associated data is bound
//! into the tag, so a ciphertext cannot be replayed under another label.
//!
//! Layout of the returned byte buffer:
//!   [ 12-byte nonce | ciphertext + 16-byte auth tag ]

use aes_gcm::aead::{Aead, KeyInit, OsRng, Payload};
use aes_gcm::{AeadCore, Aes256Gcm, Nonce};

use super::keys::DerivedKey;
use crate::errors::{EimgError, Result};

/// Size of the AES-256-GCM nonce in bytes.
pub const NONCE_LEN: usize = 12;

/// Encrypt `plaintext` under `key`, authenticating `aad` alongside it.
pub fn seal(key: &DerivedKey, plaintext: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| EimgError::EncryptionFailed(format!("invalid key length: {e}")))?;

    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    let ciphertext = cipher
        .encrypt(&nonce, Payload { msg: plaintext, aad })
        .map_err(|e| EimgError::EncryptionFailed(format!("encryption error: {e}")))?;

    let mut output = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    output.extend_from_slice(&nonce);
    output.extend_from_slice(&ciphertext);
    Ok(output)
}

/// Decrypt data produced by `seal` with the same `aad`.
pub fn open(key: &DerivedKey, sealed: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
    if sealed.len() < NONCE_LEN {
        tracing::debug!(len = sealed.len(), "GCM payload shorter than a nonce");
        return Err(EimgError::DecryptionFailed);
    }

    let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_LEN);
    let nonce = Nonce::from_slice(nonce_bytes);

    let cipher =
        Aes256Gcm::new_from_slice(key.as_bytes()).map_err(|_| EimgError::DecryptionFailed)?;

    cipher
        .decrypt(
            nonce,
            Payload {
                msg: ciphertext,
                aad,
            },
        )
        .map_err(|_| {
            tracing::debug!("GCM tag verification failed");
            EimgError::DecryptionFailed
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_with_aad() {
        let key = DerivedKey::new([0xAB; 32]);
        let sealed = seal(&key, b"api-key", b"eimg-2.0").unwrap();
        assert_eq!(sealed.len(), NONCE_LEN + 7 + 16);
        assert_eq!(open(&key, &sealed, b"eimg-2.0").unwrap(), b"api-key");
    }

    #[test]
    fn aad_mismatch_fails() {
        let key = DerivedKey::new([0xAB; 32]);
        let sealed = seal(&key, b"api-key", b"eimg-2.0").unwrap();
        assert!(open(&key, &sealed, b"eimg-1.0").is_err());
    }

    #[test]
    fn nonce_is_fresh_per_call() {
        let key = DerivedKey::new([0xCD; 32]);
        let a = seal(&key, b"same", b"").unwrap();
        let b = seal(&key, b"same", b"").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn truncated_payload_fails() {
        let key = DerivedKey::new([0xAA; 32]);
        assert!(open(&key, &[0u8; 5], b"").is_err());
    }
}
