//! Password hashing using Argon2id.
//!
//! Digests are PHC strings (`$argon2id$v=19$m=...,t=...,p=...$salt$hash`), so
//! the salt and cost parameters travel with the digest and verification works
//! across parameter changes.

use argon2::password_hash::{
    PasswordHash as PhcString, PasswordHasher as _, PasswordVerifier, SaltString,
};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::{CryptoError, CryptoResult};

/// Salt length in bytes before base64 encoding.
const SALT_LEN: usize = 16;

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashParams {
    /// Memory in KiB (default: 19456 = 19 MiB).
    pub memory_kib: u32,
    /// Time iterations (default: 2).
    pub iterations: u32,
    /// Parallelism degree (default: 1).
    pub parallelism: u32,
}

impl Default for HashParams {
    fn default() -> Self {
        Self {
            memory_kib: 19456,
            iterations: 2,
            parallelism: 1,
        }
    }
}

impl HashParams {
    /// Minimal-cost parameters for tests and fixture seeding.
    pub fn fast() -> Self {
        Self {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        }
    }
}

/// A verified-format password digest.
///
/// The only ways to obtain one are [`PasswordHasher::hash`] and
/// [`PasswordHash::parse`], which rejects anything that is not a PHC string.
/// Plaintext therefore cannot end up where a digest is expected.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Parse a digest loaded from storage.
    pub fn parse(stored: &str) -> CryptoResult<Self> {
        PhcString::new(stored).map_err(|e| CryptoError::MalformedHash(e.to_string()))?;
        Ok(Self(stored.to_string()))
    }

    /// The PHC string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("PasswordHash").field(&"[REDACTED]").finish()
    }
}

/// Hashes and verifies user passwords.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    params: HashParams,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self {
            params: HashParams::default(),
        }
    }
}

impl PasswordHasher {
    /// Create a hasher with the given cost parameters.
    ///
    /// Parameters are checked eagerly so a bad configuration fails at startup
    /// rather than on the first signup.
    pub fn new(params: HashParams) -> CryptoResult<Self> {
        Self::argon2_params(&params)?;
        Ok(Self { params })
    }

    fn argon2_params(params: &HashParams) -> CryptoResult<Params> {
        Params::new(params.memory_kib, params.iterations, params.parallelism, None)
            .map_err(|e| CryptoError::InvalidParams(e.to_string()))
    }

    fn argon2(&self) -> CryptoResult<Argon2<'static>> {
        let params = Self::argon2_params(&self.params)?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }

    /// Hash a plaintext password with a fresh random salt.
    pub fn hash(&self, plaintext: &str) -> CryptoResult<PasswordHash> {
        let mut salt_bytes = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt_bytes);
        let salt = SaltString::encode_b64(&salt_bytes)
            .map_err(|e| CryptoError::Hashing(e.to_string()))?;

        let digest = self
            .argon2()?
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| CryptoError::Hashing(e.to_string()))?;

        Ok(PasswordHash(digest.to_string()))
    }

    /// Check a plaintext password against a stored digest.
    ///
    /// Returns `Ok(false)` on mismatch. The comparison is the library's
    /// constant-time verify; cost parameters are read from the digest itself.
    pub fn verify(&self, plaintext: &str, digest: &PasswordHash) -> CryptoResult<bool> {
        let parsed =
            PhcString::new(digest.as_str()).map_err(|e| CryptoError::MalformedHash(e.to_string()))?;

        match Argon2::default().verify_password(plaintext.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(CryptoError::Verification(e.to_string())),
        }
    }

    /// Stand-in for [`verify`](Self::verify) when no digest is stored.
    ///
    /// Does one hash at the configured cost and always returns `Ok(false)`,
    /// so a login for an unknown username takes as long as a wrong password.
    pub fn verify_absent(&self, plaintext: &str) -> CryptoResult<bool> {
        self.hash(plaintext)?;
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> PasswordHasher {
        PasswordHasher::new(HashParams::fast()).unwrap()
    }

    #[test]
    fn test_hash_params_default() {
        let params = HashParams::default();
        assert_eq!(params.memory_kib, 19456);
        assert_eq!(params.iterations, 2);
        assert_eq!(params.parallelism, 1);
    }

    #[test]
    fn test_hash_produces_argon2id_phc_string() {
        let digest = hasher().hash("correct horse").unwrap();
        assert!(digest.as_str().starts_with("$argon2id$v=19$m=1024,t=1,p=1$"));
    }

    #[test]
    fn test_hash_is_salted() {
        let h = hasher();
        let a = h.hash("same password").unwrap();
        let b = h.hash("same password").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_verify_accepts_correct_password() {
        let h = hasher();
        let digest = h.hash("baseball").unwrap();
        assert!(h.verify("baseball", &digest).unwrap());
    }

    #[test]
    fn test_verify_rejects_wrong_password() {
        let h = hasher();
        let digest = h.hash("baseball").unwrap();
        assert!(!h.verify("basketball", &digest).unwrap());
    }

    #[test]
    fn test_verify_uses_params_from_digest() {
        let digest = hasher().hash("baseball").unwrap();
        let other = PasswordHasher::default();
        assert!(other.verify("baseball", &digest).unwrap());
    }

    #[test]
    fn test_verify_absent_never_matches() {
        let h = hasher();
        assert!(!h.verify_absent("baseball").unwrap());
        assert!(!h.verify_absent("").unwrap());
    }

    #[test]
    fn test_parse_round_trips_stored_digest() {
        let digest = hasher().hash("baseball").unwrap();
        let parsed = PasswordHash::parse(digest.as_str()).unwrap();
        assert_eq!(parsed, digest);
    }

    #[test]
    fn test_parse_rejects_plaintext() {
        let result = PasswordHash::parse("baseball");
        assert!(matches!(result, Err(CryptoError::MalformedHash(_))));
    }

    #[test]
    fn test_invalid_params_rejected() {
        let params = HashParams {
            memory_kib: 1,
            iterations: 0,
            parallelism: 1,
        };
        assert!(matches!(
            PasswordHasher::new(params),
            Err(CryptoError::InvalidParams(_))
        ));
    }

    #[test]
    fn test_debug_redacts_digest() {
        let digest = hasher().hash("baseball").unwrap();
        let debug = format!("{:?}", digest);
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains("argon2id"));
    }
}
