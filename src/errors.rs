use std::path::PathBuf;
use thiserror::Error;

/// All errors that can occur in eimg.
#[derive(Debug, Error)]
pub enum EimgError {
    // --- Vault errors ---
    #[error("Encryption unavailable: {0} (rebuild with the `encryption` feature)")]
    PrimitiveUnavailable(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Passphrase mismatch: passphrases do not match")]
    PasswordMismatch,

    #[error("Cannot decrypt API key: wrong passphrase or corrupted data")]
    DecryptionFailed,

    #[error("API key integrity check failed: stored record may be tampered")]
    IntegrityMismatch,

    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Corrupted credential record: {0}")]
    CorruptedRecord(String),

    #[error("No API key set (use `eimg set API=<key>`)")]
    NoCredential,

    // --- Config errors ---
    #[error("Config error: {0}")]
    Config(String),

    #[error("No home directory found (set EIMG_HOME)")]
    NoHomeDir,

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not write {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    // --- Serialization errors ---
    #[error("Serialization error: {0}")]
    Serialization(String),

    // --- Remote API errors ---
    #[error("Network error: {0}")]
    Http(String),

    #[error("API returned HTTP {status}")]
    HttpStatus { status: u16 },

    #[error("Invalid response format from API: {0}")]
    InvalidResponse(String),

    #[error("{0}")]
    NoImages(String),

    #[error("Invalid date '{0}': use YYYY-MM-DD")]
    InvalidDate(String),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("User cancelled operation")]
    UserCancelled,
}

/// Convenience type alias for eimg results.
pub type Result<T> = std::result::Result<T, EimgError>;
