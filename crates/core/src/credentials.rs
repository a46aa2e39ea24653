//! Password hashing.
//!
//! Hashes are stored as `pbkdf2-sha256$<iterations>$<salt hex>$<digest hex>`: PBKDF2 with
//! HMAC-SHA256 over a random per-password salt.

use crate::constants::{PASSWORD_HASH_ITERATIONS, PASSWORD_HASH_LEN, PASSWORD_SALT_LEN};
use crate::{HisError, HisResult};
use rand::RngCore;
use sha2::Sha256;

const SCHEME: &str = "pbkdf2-sha256";

fn digest(salt: &[u8], password: &str, iterations: u32) -> [u8; PASSWORD_HASH_LEN] {
    let mut out = [0u8; PASSWORD_HASH_LEN];
    pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut out);
    out
}

/// Hash `password` with a fresh random salt.
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; PASSWORD_SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    let out = digest(&salt, password, PASSWORD_HASH_ITERATIONS);
    format!(
        "{SCHEME}${PASSWORD_HASH_ITERATIONS}${}${}",
        hex::encode(salt),
        hex::encode(out)
    )
}

/// Check `password` against a stored hash.
///
/// # Errors
///
/// Returns `HisError::Credentials` if `stored` is not a hash this module produced.
pub fn verify_password(password: &str, stored: &str) -> HisResult<bool> {
    let malformed = || HisError::Credentials("stored password hash is malformed".into());

    let mut parts = stored.split('$');
    let (Some(SCHEME), Some(iterations), Some(salt), Some(expected), None) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return Err(malformed());
    };

    let iterations: u32 = iterations.parse().map_err(|_| malformed())?;
    if iterations == 0 {
        return Err(malformed());
    }
    let salt = hex::decode(salt).map_err(|_| malformed())?;
    let expected = hex::decode(expected).map_err(|_| malformed())?;

    let actual = digest(&salt, password, iterations);
    Ok(constant_time_eq(&actual, &expected))
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_then_verify() {
        let stored = hash_password("correct horse");
        assert!(verify_password("correct horse", &stored).expect("verify should succeed"));
        assert!(!verify_password("wrong horse", &stored).expect("verify should succeed"));
    }

    #[test]
    fn test_salt_makes_hashes_differ() {
        assert_ne!(hash_password("same"), hash_password("same"));
    }

    #[test]
    fn test_malformed_hash_is_an_error() {
        assert!(verify_password("x", "plaintext").is_err());
        assert!(verify_password("x", "pbkdf2-sha256$0$00$00").is_err());
        assert!(verify_password("x", "md5$1$00$00").is_err());
    }

    #[test]
    fn test_hash_uses_pbkdf2_sha256() {
        let stored = hash_password("correct horse");
        let parts: Vec<&str> = stored.split('$').collect();
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[0], "pbkdf2-sha256");
        assert_eq!(parts[1], PASSWORD_HASH_ITERATIONS.to_string());
        assert_eq!(parts[2].len(), PASSWORD_SALT_LEN * 2);

        let salt = hex::decode(parts[2]).expect("salt should be hex");
        let mut expected = [0u8; PASSWORD_HASH_LEN];
        pbkdf2::pbkdf2_hmac::<Sha256>(
            b"correct horse",
            &salt,
            PASSWORD_HASH_ITERATIONS,
            &mut expected,
        );
        assert_eq!(parts[3], hex::encode(expected));
    }

    #[test]
    fn test_matches_pbkdf2_hmac_sha256_vector() {
        // RFC 7914 section 11, first 32 bytes of the c=1 vector.
        let stored = format!(
            "{SCHEME}$1${}$55ac046e56e3089fec1691c22544b605f94185216dde0465e68b9d57c20dacbc",
            hex::encode("salt")
        );
        assert!(verify_password("passwd", &stored).expect("verify should succeed"));
        assert!(!verify_password("passwe", &stored).expect("verify should succeed"));
    }

    #[test]
    fn test_legacy_sha256_hash_is_rejected() {
        let legacy = format!("sha256$10000${}${}", "00".repeat(16), "00".repeat(32));
        assert!(verify_password("x", &legacy).is_err());
    }
}
