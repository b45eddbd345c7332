//! Fernet tokens: AES-128-CBC with an HMAC-SHA256 tag (encrypt-then-MAC).
//!
//! Layout of a token:
//!
//! ```text
//! [0x80][timestamp: 8 bytes BE][IV: 16 bytes][AES-128-CBC ciphertext, PKCS7][HMAC-SHA256: 32 bytes]
//! ```
//!
//! The HMAC covers everything before it and is keyed with the first half
//! of the 32-byte key; the cipher uses the second half. Tokens are
//! interoperable with the reference Fernet implementations.

use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use chrono::Utc;
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;

use super::keys::DerivedKey;
use crate::errors::{EimgError, Result};

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;

const VERSION: u8 = 0x80;
const IV_LEN: usize = 16;
const TAG_LEN: usize = 32;
const BLOCK_LEN: usize = 16;

/// Version byte + timestamp + IV.
const HEADER_LEN: usize = 1 + 8 + IV_LEN;

/// Seal `plaintext` into a fresh token with a random IV and the current time.
pub fn seal(key: &DerivedKey, plaintext: &[u8]) -> Result<Vec<u8>> {
    let mut iv = [0u8; IV_LEN];
    rand::rng().fill_bytes(&mut iv);
    let timestamp = u64::try_from(Utc::now().timestamp()).unwrap_or_default();
    seal_with(key, plaintext, timestamp, &iv)
}

/// Seal with an explicit timestamp and IV.
pub fn seal_with(
    key: &DerivedKey,
    plaintext: &[u8],
    timestamp: u64,
    iv: &[u8; IV_LEN],
) -> Result<Vec<u8>> {
    let ciphertext = Aes128CbcEnc::new_from_slices(key.encryption_key(), iv)
        .map_err(|e| EimgError::EncryptionFailed(format!("cipher init: {e}")))?
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext);

    let mut token = Vec::with_capacity(HEADER_LEN + ciphertext.len() + TAG_LEN);
    token.push(VERSION);
    token.extend_from_slice(&timestamp.to_be_bytes());
    token.extend_from_slice(iv);
    token.extend_from_slice(&ciphertext);

    let mut mac = signer(key).map_err(|e| EimgError::EncryptionFailed(e.to_string()))?;
    mac.update(&token);
    token.extend_from_slice(&mac.finalize().into_bytes());

    Ok(token)
}

/// Verify and decrypt a token produced by `seal`.
///
/// Every failure maps to `DecryptionFailed`; the failing check is only
/// recorded at debug level.
pub fn open(key: &DerivedKey, token: &[u8]) -> Result<Vec<u8>> {
    if token.len() < HEADER_LEN + BLOCK_LEN + TAG_LEN {
        tracing::debug!(len = token.len(), "fernet token too short");
        return Err(EimgError::DecryptionFailed);
    }
    if token[0] != VERSION {
        tracing::debug!(version = token[0], "unexpected fernet version byte");
        return Err(EimgError::DecryptionFailed);
    }

    let (signed, tag) = token.split_at(token.len() - TAG_LEN);
    let mut mac = signer(key).map_err(|_| EimgError::DecryptionFailed)?;
    mac.update(signed);
    if mac.verify_slice(tag).is_err() {
        tracing::debug!("fernet HMAC verification failed");
        return Err(EimgError::DecryptionFailed);
    }

    let iv = &signed[1 + 8..HEADER_LEN];
    let ciphertext = &signed[HEADER_LEN..];
    if ciphertext.len() % BLOCK_LEN != 0 {
        tracing::debug!("fernet ciphertext is not block aligned");
        return Err(EimgError::DecryptionFailed);
    }

    Aes128CbcDec::new_from_slices(key.encryption_key(), iv)
        .map_err(|_| EimgError::DecryptionFailed)?
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| {
            tracing::debug!("fernet padding check failed");
            EimgError::DecryptionFailed
        })
}

fn signer(key: &DerivedKey) -> std::result::Result<Hmac<Sha256>, hmac::digest::InvalidLength> {
    Hmac::<Sha256>::new_from_slice(key.signing_key())
}
