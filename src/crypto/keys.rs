//! The derived key wrapper.

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use zeroize::Zeroize;

use super::kdf::KEY_LEN;

/// A 32-byte key derived from a passphrase that automatically zeroes
/// its memory when dropped.
///
/// For Fernet the key is split in half: the first 16 bytes sign, the
/// last 16 bytes encrypt.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct DerivedKey {
    bytes: [u8; KEY_LEN],
}

impl DerivedKey {
    pub fn new(bytes: [u8; KEY_LEN]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }

    /// HMAC-SHA256 signing half of a Fernet key.
    pub fn signing_key(&self) -> &[u8] {
        &self.bytes[..KEY_LEN / 2]
    }

    /// AES-128 encryption half of a Fernet key.
    pub fn encryption_key(&self) -> &[u8] {
        &self.bytes[KEY_LEN / 2..]
    }

    /// The key in Fernet's textual form (URL-safe base64, padded).
    pub fn to_fernet_key(&self) -> String {
        URL_SAFE.encode(self.bytes)
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DerivedKey(..)")
    }
}
