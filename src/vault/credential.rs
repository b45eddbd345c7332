//! `CredentialVault`: turns the plaintext API key into a tamper-evident
//! encrypted record and back.
//!
//! One vault is built per process invocation and passed by reference to
//! whatever needs it. It owns the key derivation parameters and the
//! passphrase cached for the current session.

use zeroize::Zeroizing;

use crate::crypto::hash::{digests_match, sha256_hex};
use crate::crypto::kdf::{LEGACY_SALT, PBKDF2_ITERATIONS};
use crate::crypto::{Argon2Params, DerivedKey};
use crate::errors::{EimgError, Result};

use super::record::{CredentialRecord, KdfParams, SchemeVersion};

/// Minimum length of a plausible API key, after trimming.
const MIN_KEY_LEN: usize = 20;

/// Associated data bound into every `2.0` ciphertext.
#[cfg_attr(not(feature = "encryption"), allow(dead_code))]
const V2_AAD: &[u8] = b"eimg-credential-2.0";

#[cfg_attr(not(feature = "encryption"), allow(dead_code))]
pub struct CredentialVault {
    salt: &'static [u8],
    iterations: u32,
    /// Scheme used for new records. Existing records are always opened
    /// with the scheme they carry.
    scheme: SchemeVersion,
    argon2: Argon2Params,
    session_passphrase: Option<Zeroizing<String>>,
}

impl Default for CredentialVault {
    fn default() -> Self {
        Self::new(SchemeVersion::V1, Argon2Params::default())
    }
}

impl CredentialVault {
    pub fn new(scheme: SchemeVersion, argon2: Argon2Params) -> Self {
        Self {
            salt: LEGACY_SALT,
            iterations: PBKDF2_ITERATIONS,
            scheme,
            argon2,
            session_passphrase: None,
        }
    }

    pub fn scheme(&self) -> SchemeVersion {
        self.scheme
    }

    /// Derive the `1.0` key: PBKDF2-HMAC-SHA256 over the fixed salt.
    pub fn derive_key(&self, passphrase: &str) -> Result<DerivedKey> {
        require_non_empty(passphrase, "passphrase")?;
        self.derive_fixed_salt(passphrase)
    }

    /// Encrypt `plaintext` under `passphrase` with this vault's scheme.
    ///
    /// Each call uses a fresh IV/nonce, so encrypting the same key twice
    /// gives two different records.
    pub fn encrypt(&self, plaintext: &str, passphrase: &str) -> Result<CredentialRecord> {
        require_non_empty(plaintext, "API key")?;
        require_non_empty(passphrase, "passphrase")?;

        let (ciphertext, kdf) = self.seal(plaintext.as_bytes(), passphrase)?;

        Ok(CredentialRecord {
            ciphertext,
            plaintext_hash: Self::hash_string(plaintext),
            scheme: self.scheme,
            kdf,
        })
    }

    /// Decrypt a record and verify the plaintext against its stored hash.
    ///
    /// A wrong passphrase and a corrupted ciphertext both surface as
    /// `DecryptionFailed`. A hash disagreement after a successful
    /// decryption is `IntegrityMismatch`; the plaintext is wiped and
    /// never returned.
    pub fn decrypt(&self, record: &CredentialRecord, passphrase: &str) -> Result<Zeroizing<String>> {
        require_non_empty(passphrase, "passphrase")?;

        let plaintext = Zeroizing::new(self.open(record, passphrase).map_err(|e| {
            if matches!(e, EimgError::DecryptionFailed) {
                tracing::warn!(scheme = %record.scheme, "credential authentication failed");
            }
            e
        })?);

        if !digests_match(&sha256_hex(&plaintext), &record.plaintext_hash) {
            tracing::error!(scheme = %record.scheme, "credential hash mismatch after decryption");
            return Err(EimgError::IntegrityMismatch);
        }

        let text = std::str::from_utf8(&plaintext)
            .map_err(|_| EimgError::CorruptedRecord("API key is not valid UTF-8".into()))?;
        Ok(Zeroizing::new(text.to_owned()))
    }

    /// SHA-256 hex digest of a string's UTF-8 bytes.
    pub fn hash_string(data: &str) -> String {
        sha256_hex(data.as_bytes())
    }

    /// Shape check for an API key candidate.
    ///
    /// Rejects missing, blank and short (< 20 chars trimmed) values, and
    /// anything that is not ASCII alphanumeric once `-` and `_` are
    /// removed. Does not contact the API.
    pub fn validate_format<'a>(candidate: impl Into<Option<&'a str>>) -> bool {
        let Some(candidate) = candidate.into() else {
            return false;
        };
        let trimmed = candidate.trim();
        if trimmed.chars().count() < MIN_KEY_LEN {
            return false;
        }

        let cleaned: String = candidate.chars().filter(|c| *c != '-' && *c != '_').collect();
        !cleaned.is_empty() && cleaned.chars().all(|c| c.is_ascii_alphanumeric())
    }

    // ------------------------------------------------------------------
    // Session passphrase
    // ------------------------------------------------------------------

    /// Keep `passphrase` for the rest of this invocation.
    pub fn remember_passphrase(&mut self, passphrase: Zeroizing<String>) {
        self.session_passphrase = Some(passphrase);
    }

    pub fn session_passphrase(&self) -> Option<&str> {
        self.session_passphrase.as_deref().map(String::as_str)
    }

    pub fn forget_passphrase(&mut self) {
        self.session_passphrase = None;
    }
}

#[cfg(feature = "encryption")]
impl CredentialVault {
    fn derive_fixed_salt(&self, passphrase: &str) -> Result<DerivedKey> {
        use zeroize::Zeroize;

        let mut raw =
            crate::crypto::kdf::derive_pbkdf2(passphrase.as_bytes(), self.salt, self.iterations)?;
        let key = DerivedKey::new(raw);
        raw.zeroize();
        Ok(key)
    }

    fn derive_argon2(&self, passphrase: &str, kdf: &KdfParams) -> Result<DerivedKey> {
        use zeroize::Zeroize;

        let mut raw =
            crate::crypto::kdf::derive_argon2id(passphrase.as_bytes(), &kdf.salt, &kdf.argon2)?;
        let key = DerivedKey::new(raw);
        raw.zeroize();
        Ok(key)
    }

    fn seal(&self, plaintext: &[u8], passphrase: &str) -> Result<(Vec<u8>, Option<KdfParams>)> {
        use crate::crypto::{encryption, fernet, generate_salt};

        match self.scheme {
            SchemeVersion::V1 => {
                let key = self.derive_key(passphrase)?;
                Ok((fernet::seal(&key, plaintext)?, None))
            }
            SchemeVersion::V2 => {
                let kdf = KdfParams {
                    salt: generate_salt().to_vec(),
                    argon2: self.argon2,
                };
                let key = self.derive_argon2(passphrase, &kdf)?;
                Ok((encryption::seal(&key, plaintext, V2_AAD)?, Some(kdf)))
            }
        }
    }

    fn open(&self, record: &CredentialRecord, passphrase: &str) -> Result<Vec<u8>> {
        use crate::crypto::{encryption, fernet};

        match record.scheme {
            SchemeVersion::V1 => fernet::open(&self.derive_key(passphrase)?, &record.ciphertext),
            SchemeVersion::V2 => {
                let kdf = record.kdf.as_ref().ok_or_else(|| {
                    EimgError::CorruptedRecord("2.0 record without KDF parameters".into())
                })?;
                let key = self.derive_argon2(passphrase, kdf)?;
                encryption::open(&key, &record.ciphertext, V2_AAD)
            }
        }
    }
}

#[cfg(not(feature = "encryption"))]
impl CredentialVault {
    fn derive_fixed_salt(&self, _passphrase: &str) -> Result<DerivedKey> {
        Err(unavailable())
    }

    fn seal(&self, _plaintext: &[u8], _passphrase: &str) -> Result<(Vec<u8>, Option<KdfParams>)> {
        Err(unavailable())
    }

    fn open(&self, _record: &CredentialRecord, _passphrase: &str) -> Result<Vec<u8>> {
        Err(unavailable())
    }
}

#[cfg(not(feature = "encryption"))]
fn unavailable() -> EimgError {
    EimgError::PrimitiveUnavailable("this build has no cipher or KDF support".into())
}

fn require_non_empty(value: &str, what: &str) -> Result<()> {
    if value.is_empty() {
        return Err(EimgError::InvalidInput(format!("{what} must not be empty")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_format_cases() {
        assert!(!CredentialVault::validate_format(""));
        assert!(!CredentialVault::validate_format("   \t  "));
        assert!(!CredentialVault::validate_format("short"));
        assert!(!CredentialVault::validate_format(None));
        assert!(CredentialVault::validate_format(
            "abcdefghijklmnopqrstuvwxyz1234567890"
        ));
    }

    #[test]
    fn validate_format_allows_dashes_and_underscores() {
        assert!(CredentialVault::validate_format("abcd-efgh_ijkl-mnop_qrst"));
        assert!(!CredentialVault::validate_format("abcdefghij0123456789!@#$"));
        assert!(!CredentialVault::validate_format("abcdefghij 0123456789xyz"));
    }

    #[test]
    fn validate_format_is_ascii_only() {
        assert!(!CredentialVault::validate_format("ÄBCDEFGHIJ0123456789KLMN"));
        assert!(!CredentialVault::validate_format("abcdefghij0123456789ｘｙｚ"));
        assert!(CredentialVault::validate_format("ABCDEFGHIJ0123456789KLMN"));
    }

    #[test]
    fn validate_format_length_is_measured_after_trim() {
        // 19 characters padded with spaces.
        assert!(!CredentialVault::validate_format("  abcdefghij012345678  "));
        assert!(CredentialVault::validate_format("abcdefghij0123456789"));
    }

    #[test]
    fn hash_string_is_stable_and_distinct() {
        let a = CredentialVault::hash_string("ABCDEFGHIJ0123456789KLMN");
        assert_eq!(a, CredentialVault::hash_string("ABCDEFGHIJ0123456789KLMN"));
        assert_eq!(
            a,
            "d6818dacc3e5691e976055423e8135973e46d5e271728d386c06aa75b8c476f8"
        );

        let corpus = ["", "a", "b", "ab", "ba", "api-key", "api_key", "API-KEY"];
        let digests: std::collections::HashSet<_> =
            corpus.iter().map(|s| CredentialVault::hash_string(s)).collect();
        assert_eq!(digests.len(), corpus.len());
    }

    #[test]
    fn empty_inputs_rejected_before_crypto() {
        let vault = CredentialVault::default();
        assert!(matches!(
            vault.encrypt("", "passphrase"),
            Err(EimgError::InvalidInput(_))
        ));
        assert!(matches!(
            vault.encrypt("ABCDEFGHIJ0123456789KLMN", ""),
            Err(EimgError::InvalidInput(_))
        ));
        assert!(matches!(vault.derive_key(""), Err(EimgError::InvalidInput(_))));
    }

    #[test]
    fn session_passphrase_lifecycle() {
        let mut vault = CredentialVault::default();
        assert!(vault.session_passphrase().is_none());
        vault.remember_passphrase(Zeroizing::new("correct-horse".into()));
        assert_eq!(vault.session_passphrase(), Some("correct-horse"));
        vault.forget_passphrase();
        assert!(vault.session_passphrase().is_none());
    }

    #[cfg(not(feature = "encryption"))]
    #[test]
    fn fails_closed_without_primitives() {
        let vault = CredentialVault::default();
        assert!(matches!(
            vault.encrypt("ABCDEFGHIJ0123456789KLMN", "passphrase"),
            Err(EimgError::PrimitiveUnavailable(_))
        ));
    }

    #[cfg(feature = "encryption")]
    mod sealed {
        use super::*;
        use crate::crypto::kdf::MIN_MEMORY_KIB;

        const KEY: &str = "ABCDEFGHIJ0123456789KLMN";

        fn fast_v2() -> CredentialVault {
            CredentialVault::new(
                SchemeVersion::V2,
                Argon2Params {
                    memory_kib: MIN_MEMORY_KIB,
                    iterations: 1,
                    parallelism: 1,
                },
            )
        }

        #[test]
        fn derive_key_is_deterministic() {
            let vault = CredentialVault::default();
            let a = vault.derive_key("correct-horse-battery").unwrap();
            let b = vault.derive_key("correct-horse-battery").unwrap();
            let c = vault.derive_key("correct-horse-batterz").unwrap();
            assert_eq!(a.as_bytes(), b.as_bytes());
            assert_ne!(a.as_bytes(), c.as_bytes());
            assert_eq!(
                a.to_fernet_key(),
                "M9ImpNv0cBwl_5-amIMr-7pT07CiAOFEaP2H0D5b1Rw="
            );
        }

        #[test]
        fn v1_roundtrip() {
            let vault = CredentialVault::default();
            let record = vault.encrypt(KEY, "correct-horse-battery").unwrap();
            assert_eq!(record.scheme, SchemeVersion::V1);
            assert!(record.kdf.is_none());
            let plain = vault.decrypt(&record, "correct-horse-battery").unwrap();
            assert_eq!(plain.as_str(), KEY);
        }

        #[test]
        fn v1_wrong_passphrase_fails() {
            let vault = CredentialVault::default();
            let record = vault.encrypt(KEY, "correct-horse-battery").unwrap();
            assert!(matches!(
                vault.decrypt(&record, "wrong"),
                Err(EimgError::DecryptionFailed)
            ));
        }

        #[test]
        fn encryption_is_non_deterministic() {
            let vault = CredentialVault::default();
            let a = vault.encrypt(KEY, "pw-12345678").unwrap();
            let b = vault.encrypt(KEY, "pw-12345678").unwrap();
            assert_ne!(a.ciphertext, b.ciphertext);
            assert_eq!(a.plaintext_hash, b.plaintext_hash);
        }

        #[test]
        fn hash_mismatch_is_integrity_failure() {
            let vault = CredentialVault::default();
            let mut record = vault.encrypt(KEY, "pw-12345678").unwrap();
            record.plaintext_hash = CredentialVault::hash_string("something else");
            assert!(matches!(
                vault.decrypt(&record, "pw-12345678"),
                Err(EimgError::IntegrityMismatch)
            ));
        }

        #[test]
        fn flipped_ciphertext_byte_fails() {
            let vault = CredentialVault::default();
            let mut record = vault.encrypt(KEY, "pw-12345678").unwrap();
            let mid = record.ciphertext.len() / 2;
            record.ciphertext[mid] ^= 0x01;
            assert!(vault.decrypt(&record, "pw-12345678").is_err());
        }

        #[test]
        fn v2_roundtrip_uses_random_salt() {
            let vault = fast_v2();
            let a = vault.encrypt(KEY, "pw-12345678").unwrap();
            let b = vault.encrypt(KEY, "pw-12345678").unwrap();
            assert_eq!(a.scheme, SchemeVersion::V2);
            assert_ne!(a.kdf.as_ref().unwrap().salt, b.kdf.as_ref().unwrap().salt);
            assert_eq!(vault.decrypt(&a, "pw-12345678").unwrap().as_str(), KEY);
            assert!(vault.decrypt(&a, "pw-87654321").is_err());
        }

        #[test]
        fn v1_vault_still_opens_v2_records() {
            let record = fast_v2().encrypt(KEY, "pw-12345678").unwrap();
            let legacy = CredentialVault::default();
            assert_eq!(legacy.decrypt(&record, "pw-12345678").unwrap().as_str(), KEY);
        }
    }
}
