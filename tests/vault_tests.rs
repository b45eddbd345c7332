//! End-to-end tests for storing the API key: vault + config store on disk.

#![cfg(feature = "encryption")]

use std::fs;
use std::path::PathBuf;

use eimg::config::{ConfigFile, ConfigStore, StoredCredential};
use eimg::crypto::kdf::MIN_MEMORY_KIB;
use eimg::crypto::Argon2Params;
use eimg::errors::EimgError;
use eimg::vault::{CredentialRecord, CredentialVault, SchemeVersion};
use tempfile::TempDir;

const API_KEY: &str = "ABCDEFGHIJ0123456789KLMN";
const PASSPHRASE: &str = "correct-horse-battery";

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn stored_record(store: &ConfigStore) -> CredentialRecord {
    match store.load().unwrap().credential().unwrap() {
        StoredCredential::Encrypted(record) => record,
        _ => panic!("expected an encrypted credential"),
    }
}

fn save_key(store: &ConfigStore, vault: &CredentialVault) {
    let record = vault.encrypt(API_KEY, PASSPHRASE).unwrap();
    let mut config = ConfigFile::default();
    config.set_record(&record);
    store.save(&config).unwrap();
}

// ---------------------------------------------------------------------------
// Persist, reload, decrypt
// ---------------------------------------------------------------------------

#[test]
fn stored_key_survives_reload() {
    let tmp = TempDir::new().unwrap();
    let home = tmp.path().join(".eimg");
    save_key(&ConfigStore::new(&home), &CredentialVault::default());

    // Fresh store and vault: nothing carried over in memory.
    let store = ConfigStore::new(&home);
    let record = stored_record(&store);
    assert_eq!(record.scheme, SchemeVersion::V1);

    let key = CredentialVault::default().decrypt(&record, PASSPHRASE).unwrap();
    assert_eq!(key.as_str(), API_KEY);
}

#[test]
fn persisted_json_has_expected_fields() {
    let tmp = TempDir::new().unwrap();
    let store = ConfigStore::new(tmp.path());
    save_key(&store, &CredentialVault::default());

    let raw: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
    assert_eq!(raw["encryption_version"], "1.0");
    assert_eq!(raw["key_hash"], CredentialVault::hash_string(API_KEY));
    assert!(raw["encrypted_api_key"].as_str().unwrap().starts_with("Z0FBQUFB"));
    assert!(raw.get("api_key").is_none());
}

#[test]
fn wrong_passphrase_leaves_file_untouched() {
    let tmp = TempDir::new().unwrap();
    let store = ConfigStore::new(tmp.path());
    save_key(&store, &CredentialVault::default());
    let before = fs::read(store.path()).unwrap();

    let result = CredentialVault::default().decrypt(&stored_record(&store), "wrong");
    assert!(matches!(result, Err(EimgError::DecryptionFailed)));

    assert_eq!(fs::read(store.path()).unwrap(), before);
}

#[test]
fn tampered_hash_is_detected() {
    let tmp = TempDir::new().unwrap();
    let store = ConfigStore::new(tmp.path());
    save_key(&store, &CredentialVault::default());

    let mut config = store.load().unwrap();
    config.key_hash = Some(CredentialVault::hash_string("another key entirely"));
    store.save(&config).unwrap();

    let result = CredentialVault::default().decrypt(&stored_record(&store), PASSPHRASE);
    assert!(matches!(result, Err(EimgError::IntegrityMismatch)));
}

#[test]
fn tampered_ciphertext_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let store = ConfigStore::new(tmp.path());
    save_key(&store, &CredentialVault::default());

    let mut record = stored_record(&store);
    let last = record.ciphertext.len() - 1;
    record.ciphertext[last] ^= 0x01;

    assert!(CredentialVault::default().decrypt(&record, PASSPHRASE).is_err());
}

// ---------------------------------------------------------------------------
// Compatibility with existing config files
// ---------------------------------------------------------------------------

#[test]
fn legacy_config_decrypts() {
    let tmp = TempDir::new().unwrap();
    fs::copy(fixture("legacy_config.json"), tmp.path().join("config.json")).unwrap();

    let store = ConfigStore::new(tmp.path());
    let key = CredentialVault::default()
        .decrypt(&stored_record(&store), PASSPHRASE)
        .unwrap();
    assert_eq!(key.as_str(), API_KEY);
}

#[test]
fn legacy_plaintext_key_is_readable() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("config.json"),
        format!(r#"{{"api_key": "{API_KEY}"}}"#),
    )
    .unwrap();

    match ConfigStore::new(tmp.path()).load().unwrap().credential().unwrap() {
        StoredCredential::Plaintext(key) => assert_eq!(key.as_str(), API_KEY),
        _ => panic!("expected a plaintext credential"),
    }
}

#[test]
fn v2_record_roundtrips_through_disk() {
    let tmp = TempDir::new().unwrap();
    let store = ConfigStore::new(tmp.path());
    let vault = CredentialVault::new(
        SchemeVersion::V2,
        Argon2Params {
            memory_kib: MIN_MEMORY_KIB,
            iterations: 1,
            parallelism: 1,
        },
    );
    save_key(&store, &vault);

    let raw: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
    assert_eq!(raw["encryption_version"], "2.0");
    assert!(raw["kdf_salt"].is_string());
    assert_eq!(raw["kdf_params"]["memory_kib"], MIN_MEMORY_KIB);

    // A default (1.0) vault reads it back from the stored parameters.
    let key = CredentialVault::default()
        .decrypt(&stored_record(&store), PASSPHRASE)
        .unwrap();
    assert_eq!(key.as_str(), API_KEY);
}

#[test]
fn wipe_removes_stored_key() {
    let tmp = TempDir::new().unwrap();
    let store = ConfigStore::new(tmp.path());
    save_key(&store, &CredentialVault::default());

    assert!(store.wipe().unwrap());
    assert!(matches!(
        store.load().unwrap().credential().unwrap(),
        StoredCredential::Missing
    ));
}
