//! Vault module: encryption at rest for the NASA API key.
//!
//! This module provides:
//! - `CredentialRecord` and `SchemeVersion`, the persisted shape (`record`)
//! - `CredentialVault`, key derivation, sealing and integrity checks (`credential`)

pub mod credential;
pub mod record;

// Re-export the most commonly used items.
pub use credential::CredentialVault;
pub use record::{CredentialRecord, KdfParams, SchemeVersion};
