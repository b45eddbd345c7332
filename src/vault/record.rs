//! The persisted credential record and its scheme versions.
//!
//! On disk a record is three (for `2.0`, five) flat JSON fields inside
//! `config.json`:
//!
//! ```json
//! {
//!   "encrypted_api_key": "<base64url>",
//!   "key_hash": "<sha256 hex of the plaintext>",
//!   "encryption_version": "1.0"
//! }
//! ```
//!
//! For `1.0` the stored string is the base64url of the Fernet token's
//! *text* form, so the token bytes are base64url-encoded twice. Records
//! written by earlier eimg releases use exactly this layout.

use std::fmt;
use std::str::FromStr;

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, URL_SAFE};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::crypto::Argon2Params;
use crate::errors::{EimgError, Result};

/// URL-safe base64 that accepts input with or without padding.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Encryption scheme a record was sealed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SchemeVersion {
    /// PBKDF2-HMAC-SHA256 (fixed salt, 100k rounds) + Fernet.
    #[default]
    #[serde(rename = "1.0")]
    V1,
    /// Argon2id (per-record salt) + AES-256-GCM.
    #[serde(rename = "2.0")]
    V2,
}

impl SchemeVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemeVersion::V1 => "1.0",
            SchemeVersion::V2 => "2.0",
        }
    }
}

impl fmt::Display for SchemeVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchemeVersion {
    type Err = EimgError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "1.0" => Ok(SchemeVersion::V1),
            "2.0" => Ok(SchemeVersion::V2),
            other => Err(EimgError::CorruptedRecord(format!(
                "unknown encryption_version '{other}'"
            ))),
        }
    }
}

/// Per-record key derivation inputs (scheme `2.0` only).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KdfParams {
    pub salt: Vec<u8>,
    pub argon2: Argon2Params,
}

/// An encrypted API key plus the hash of its plaintext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialRecord {
    /// Raw sealed bytes: a Fernet token for `1.0`, `nonce || ciphertext`
    /// for `2.0`.
    pub ciphertext: Vec<u8>,

    /// Lowercase hex SHA-256 of the plaintext.
    pub plaintext_hash: String,

    pub scheme: SchemeVersion,

    pub kdf: Option<KdfParams>,
}

impl CredentialRecord {
    /// The `encrypted_api_key` string as stored in `config.json`.
    pub fn encoded_ciphertext(&self) -> String {
        match self.scheme {
            SchemeVersion::V1 => URL_SAFE.encode(URL_SAFE.encode(&self.ciphertext)),
            SchemeVersion::V2 => URL_SAFE.encode(&self.ciphertext),
        }
    }

    /// The `kdf_salt` string, for records that carry one.
    pub fn encoded_salt(&self) -> Option<String> {
        self.kdf.as_ref().map(|k| URL_SAFE.encode(&k.salt))
    }

    /// Rebuild a record from its persisted fields.
    pub fn decode(
        encrypted_api_key: &str,
        key_hash: &str,
        encryption_version: &str,
        kdf_salt: Option<&str>,
        kdf_params: Option<Argon2Params>,
    ) -> Result<Self> {
        let scheme: SchemeVersion = encryption_version.parse()?;

        if key_hash.trim().is_empty() {
            return Err(EimgError::CorruptedRecord("key_hash is empty".into()));
        }

        let ciphertext = match scheme {
            SchemeVersion::V1 => {
                let text = decode_field(encrypted_api_key, "encrypted_api_key")?;
                let text = String::from_utf8(text).map_err(|_| {
                    EimgError::CorruptedRecord("encrypted_api_key is not a token".into())
                })?;
                decode_field(&text, "fernet token")?
            }
            SchemeVersion::V2 => decode_field(encrypted_api_key, "encrypted_api_key")?,
        };

        let kdf = match (scheme, kdf_salt, kdf_params) {
            (SchemeVersion::V1, _, _) => None,
            (SchemeVersion::V2, Some(salt), Some(argon2)) => Some(KdfParams {
                salt: decode_field(salt, "kdf_salt")?,
                argon2,
            }),
            (SchemeVersion::V2, _, _) => {
                return Err(EimgError::CorruptedRecord(
                    "2.0 record is missing kdf_salt or kdf_params".into(),
                ))
            }
        };

        Ok(Self {
            ciphertext,
            plaintext_hash: key_hash.trim().to_ascii_lowercase(),
            scheme,
            kdf,
        })
    }
}

fn decode_field(value: &str, what: &str) -> Result<Vec<u8>> {
    URL_SAFE_LENIENT
        .decode(value.trim())
        .map_err(|e| EimgError::CorruptedRecord(format!("{what} is not valid base64: {e}")))
}
