//! SHA-256 content hashing.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Lowercase hex SHA-256 digest of `data`.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Compare two hex digests without leaking where they differ.
pub fn digests_match(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_vector() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn digest_is_64_lowercase_hex_chars() {
        let digest = sha256_hex(b"ABCDEFGHIJ0123456789KLMN");
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn digests_match_is_exact() {
        let d = sha256_hex(b"x");
        assert!(digests_match(&d, &d.clone()));
        assert!(!digests_match(&d, &sha256_hex(b"y")));
        assert!(!digests_match(&d, &d[..10]));
    }
}
