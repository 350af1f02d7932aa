//! Opaque session tokens.
//!
//! Tokens are random strings handed to the client once. Only their SHA-256
//! digest is persisted, so a leaked session table cannot be replayed.

use rand::Rng;
use sha2::{Digest, Sha256};

/// Prefix identifying noteful access tokens.
pub const TOKEN_PREFIX: &str = "nf_at_";

/// Number of random characters after the prefix.
pub const TOKEN_RANDOM_LEN: usize = 48;

/// Generate a cryptographically secure random alphanumeric string.
pub fn generate_secret(length: usize) -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| {
            let idx = rng.gen_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}

/// Generate a new session token.
pub fn generate_token() -> String {
    format!("{}{}", TOKEN_PREFIX, generate_secret(TOKEN_RANDOM_LEN))
}

/// Hex-encoded SHA-256 digest of a token, as stored.
pub fn token_digest(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Cheap shape check before touching the database.
pub fn looks_like_token(token: &str) -> bool {
    token
        .strip_prefix(TOKEN_PREFIX)
        .map(|rest| rest.len() == TOKEN_RANDOM_LEN && rest.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_secret() {
        let secret = generate_secret(32);
        assert_eq!(secret.len(), 32);
        assert!(secret.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_generate_token_shape() {
        let token = generate_token();
        assert!(token.starts_with(TOKEN_PREFIX));
        assert!(looks_like_token(&token));
    }

    #[test]
    fn test_tokens_are_unique() {
        assert_ne!(generate_token(), generate_token());
    }

    #[test]
    fn test_token_digest_is_stable_hex() {
        let a = token_digest("nf_at_abc");
        let b = token_digest("nf_at_abc");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_looks_like_token_rejects_garbage() {
        assert!(!looks_like_token(""));
        assert!(!looks_like_token("Bearer nf_at_x"));
        assert!(!looks_like_token("nf_at_short"));
        let wrong_prefix = format!("mm_at_{}", generate_secret(TOKEN_RANDOM_LEN));
        assert!(!looks_like_token(&wrong_prefix));
    }
}
