//! File-backed persistence for `config.json`.
//!
//! The file lives in the eimg home (`~/.eimg` by default). On Unix the
//! directory is kept at mode 0700 and the file at 0600. Writes go through
//! a temp file and a rename so readers never see a half-written config.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::crypto::Argon2Params;
use crate::errors::{EimgError, Result};
use crate::vault::{CredentialRecord, SchemeVersion};

/// Config file name inside the eimg home.
pub const CONFIG_FILE: &str = "config.json";

/// A wipe overwrites at least this many bytes.
const WIPE_MIN_BYTES: usize = 1024;

/// The contents of `config.json`.
///
/// Unknown keys are preserved across a load/save cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted_api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_hash: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encryption_version: Option<String>,

    /// Per-record salt (scheme 2.0).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kdf_salt: Option<String>,

    /// Argon2 parameters the record was sealed with (scheme 2.0).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kdf_params: Option<Argon2Params>,

    /// Unencrypted key, written only through the explicit insecure path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// What kind of credential a config holds.
pub enum StoredCredential {
    Encrypted(CredentialRecord),
    Plaintext(Zeroizing<String>),
    Missing,
}

impl ConfigFile {
    /// Interpret the credential fields.
    ///
    /// An encrypted key always wins over a plaintext one. A half-written
    /// record (ciphertext without hash) is an error, never `Missing`.
    pub fn credential(&self) -> Result<StoredCredential> {
        if let Some(encrypted) = self.encrypted_api_key.as_deref() {
            let key_hash = self
                .key_hash
                .as_deref()
                .ok_or_else(|| EimgError::CorruptedRecord("key_hash is missing".into()))?;
            let version = self
                .encryption_version
                .as_deref()
                .unwrap_or(SchemeVersion::V1.as_str());

            let record = CredentialRecord::decode(
                encrypted,
                key_hash,
                version,
                self.kdf_salt.as_deref(),
                self.kdf_params,
            )?;
            return Ok(StoredCredential::Encrypted(record));
        }

        match self.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Ok(StoredCredential::Plaintext(Zeroizing::new(
                key.to_string(),
            ))),
            _ => Ok(StoredCredential::Missing),
        }
    }

    /// Store an encrypted record, dropping any plaintext key.
    pub fn set_record(&mut self, record: &CredentialRecord) {
        self.encrypted_api_key = Some(record.encoded_ciphertext());
        self.key_hash = Some(record.plaintext_hash.clone());
        self.encryption_version = Some(record.scheme.as_str().to_string());
        self.kdf_salt = record.encoded_salt();
        self.kdf_params = record.kdf.as_ref().map(|k| k.argon2);
        self.api_key = None;
    }

    /// Store a plaintext key, dropping any encrypted record.
    pub fn set_plaintext(&mut self, api_key: &str) {
        self.encrypted_api_key = None;
        self.key_hash = None;
        self.encryption_version = None;
        self.kdf_salt = None;
        self.kdf_params = None;
        self.api_key = Some(api_key.trim().to_string());
    }
}

/// Reads, writes and wipes `config.json`.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    dir: PathBuf,
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(home: &Path) -> Self {
        Self {
            dir: home.to_path_buf(),
            path: home.join(CONFIG_FILE),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load the config. A missing or blank file is an empty config.
    pub fn load(&self) -> Result<ConfigFile> {
        if !self.path.exists() {
            return Ok(ConfigFile::default());
        }

        let contents = fs::read_to_string(&self.path)?;
        if contents.trim().is_empty() {
            return Ok(ConfigFile::default());
        }

        serde_json::from_str(&contents).map_err(|e| {
            EimgError::Config(format!(
                "Invalid config file format in {}: {e}",
                self.path.display()
            ))
        })
    }

    /// Write the config atomically with owner-only permissions.
    pub fn save(&self, config: &ConfigFile) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        restrict_permissions(&self.dir, 0o700);

        let json = serde_json::to_vec_pretty(config)
            .map_err(|e| EimgError::Serialization(format!("config: {e}")))?;

        let tmp_path = self.dir.join(format!(".{CONFIG_FILE}.tmp"));
        {
            let mut file = open_private(&tmp_path)?;
            file.write_all(&json)?;
            file.sync_all()?;
        }
        rename_with_fallback(&tmp_path, &self.path)?;
        restrict_permissions(&self.path, 0o600);

        tracing::info!(path = %self.path.display(), "config saved");
        Ok(())
    }

    /// Overwrite the config with random bytes, flush it to disk, then
    /// delete it. Returns `false` if there was nothing to wipe.
    pub fn wipe(&self) -> Result<bool> {
        if !self.path.exists() {
            return Ok(false);
        }

        if let Err(e) = self.overwrite_with_noise() {
            tracing::warn!(error = %e, "could not overwrite config before deletion");
        }
        fs::remove_file(&self.path)?;

        tracing::info!(path = %self.path.display(), "config wiped");
        Ok(true)
    }

    fn overwrite_with_noise(&self) -> std::io::Result<()> {
        let size = usize::try_from(fs::metadata(&self.path)?.len()).unwrap_or(usize::MAX);
        if size == 0 {
            return Ok(());
        }

        let mut noise = vec![0u8; size.max(WIPE_MIN_BYTES)];
        rand::rng().fill_bytes(&mut noise);

        let mut file = OpenOptions::new().write(true).open(&self.path)?;
        file.write_all(&noise)?;
        file.flush()?;
        file.sync_all()
    }

    /// Permission bits of the config directory (Unix only).
    pub fn dir_mode(&self) -> Option<u32> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::metadata(&self.dir)
                .ok()
                .map(|m| m.permissions().mode() & 0o777)
        }
        #[cfg(not(unix))]
        {
            None
        }
    }

    /// Whether a file can be created in the config directory.
    pub fn is_writable(&self) -> bool {
        let test_file = self.dir.join(".write_test");
        let ok = fs::write(&test_file, b"").is_ok();
        let _ = fs::remove_file(&test_file);
        ok
    }
}

fn open_private(path: &Path) -> std::io::Result<fs::File> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options.open(path)
}

fn restrict_permissions(path: &Path, mode: u32) {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Err(e) = fs::set_permissions(path, fs::Permissions::from_mode(mode)) {
            tracing::warn!(path = %path.display(), error = %e, "could not restrict permissions");
        }
    }
    #[cfg(not(unix))]
    let _ = (path, mode);
}

/// Rename `temp_path` over `destination`, removing the destination first
/// on platforms where rename refuses to replace.
pub(crate) fn rename_with_fallback(temp_path: &Path, destination: &Path) -> std::io::Result<()> {
    if fs::rename(temp_path, destination).is_err() {
        let _ = fs::remove_file(destination);
        if let Err(e) = fs::rename(temp_path, destination) {
            let _ = fs::remove_file(temp_path);
            return Err(e);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn load_missing_or_blank_is_empty() {
        let tmp = TempDir::new().unwrap();
        let store = ConfigStore::new(tmp.path());
        assert_eq!(store.load().unwrap(), ConfigFile::default());

        fs::write(store.path(), "  \n").unwrap();
        assert_eq!(store.load().unwrap(), ConfigFile::default());
    }

    #[test]
    fn load_rejects_invalid_json() {
        let tmp = TempDir::new().unwrap();
        let store = ConfigStore::new(tmp.path());
        fs::write(store.path(), "{not json").unwrap();
        assert!(matches!(store.load(), Err(EimgError::Config(_))));
    }

    #[test]
    fn save_creates_nested_home() {
        let tmp = TempDir::new().unwrap();
        let store = ConfigStore::new(&tmp.path().join("a").join(".eimg"));
        store.save(&ConfigFile::default()).unwrap();
        assert!(store.exists());
    }

    #[cfg(unix)]
    #[test]
    fn save_sets_owner_only_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let store = ConfigStore::new(&tmp.path().join(".eimg"));
        let mut cfg = ConfigFile::default();
        cfg.set_plaintext("ABCDEFGHIJ0123456789KLMN");
        store.save(&cfg).unwrap();

        let file_mode = fs::metadata(store.path()).unwrap().permissions().mode() & 0o777;
        assert_eq!(file_mode, 0o600);
        assert_eq!(store.dir_mode(), Some(0o700));
    }

    #[test]
    fn unknown_keys_survive_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let store = ConfigStore::new(tmp.path());
        fs::write(store.path(), r#"{"theme": "dark", "api_key": "k"}"#).unwrap();

        let cfg = store.load().unwrap();
        assert_eq!(cfg.extra.get("theme").unwrap(), "dark");
        store.save(&cfg).unwrap();

        let raw = fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("\"theme\": \"dark\""));
    }

    #[test]
    fn plaintext_credential_is_reported() {
        let mut cfg = ConfigFile::default();
        cfg.set_plaintext("  ABCDEFGHIJ0123456789KLMN ");
        match cfg.credential().unwrap() {
            StoredCredential::Plaintext(k) => assert_eq!(k.as_str(), "ABCDEFGHIJ0123456789KLMN"),
            _ => panic!("expected plaintext credential"),
        }
    }

    #[test]
    fn empty_config_has_no_credential() {
        assert!(matches!(
            ConfigFile::default().credential().unwrap(),
            StoredCredential::Missing
        ));
    }

    #[test]
    fn ciphertext_without_hash_is_corrupted() {
        let cfg = ConfigFile {
            encrypted_api_key: Some("Z0FBQUFB".into()),
            ..ConfigFile::default()
        };
        assert!(matches!(
            cfg.credential(),
            Err(EimgError::CorruptedRecord(_))
        ));
    }

    #[test]
    fn set_record_replaces_plaintext() {
        let mut cfg = ConfigFile::default();
        cfg.set_plaintext("ABCDEFGHIJ0123456789KLMN");

        let record = CredentialRecord {
            ciphertext: vec![0x80; 73],
            plaintext_hash: "ef".repeat(32),
            scheme: SchemeVersion::V1,
            kdf: None,
        };
        cfg.set_record(&record);

        assert!(cfg.api_key.is_none());
        assert_eq!(cfg.encryption_version.as_deref(), Some("1.0"));
        assert!(cfg.kdf_salt.is_none());
        match cfg.credential().unwrap() {
            StoredCredential::Encrypted(back) => assert_eq!(back, record),
            _ => panic!("expected encrypted credential"),
        }
    }

    #[test]
    fn wipe_removes_file() {
        let tmp = TempDir::new().unwrap();
        let store = ConfigStore::new(tmp.path());
        assert!(!store.wipe().unwrap());

        fs::write(store.path(), r#"{"api_key": "secret"}"#).unwrap();
        assert!(store.wipe().unwrap());
        assert!(!store.exists());
    }

    #[test]
    fn writable_check_leaves_nothing_behind() {
        let tmp = TempDir::new().unwrap();
        let store = ConfigStore::new(tmp.path());
        assert!(store.is_writable());
        assert_eq!(fs::read_dir(tmp.path()).unwrap().count(), 0);
    }
}
