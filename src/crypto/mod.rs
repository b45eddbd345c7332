//! Cryptographic primitives for eimg.
//!
//! This module provides:
//! - SHA-256 hex digests (`hash`)
//! - PBKDF2-HMAC-SHA256 and Argon2id key derivation (`kdf`)
//! - The zeroizing `DerivedKey` wrapper (`keys`)
//! - Fernet tokens, AES-128-CBC + HMAC-SHA256 (`fernet`)
//! - AES-256-GCM authenticated encryption (`encryption`)
//!
//! The cipher and KDF implementations are only compiled with the
//! `encryption` feature. Without it, `ENABLED` is `false` and the vault
//! refuses every operation that needs them.

pub mod hash;
pub mod kdf;
pub mod keys;

#[cfg(feature = "encryption")]
pub mod encryption;
#[cfg(feature = "encryption")]
pub mod fernet;

pub use hash::sha256_hex;
pub use kdf::{generate_salt, Argon2Params};
pub use keys::DerivedKey;

/// Whether this build carries the cipher and KDF primitives.
pub const ENABLED: bool = cfg!(feature = "encryption");
