//! # noteful-crypto
//!
//! Credential primitives for noteful.
//!
//! - **Password hashing**: Argon2id with per-hash random salts, PHC-encoded
//! - **Session tokens**: random opaque bearer tokens, persisted as SHA-256 digests
//!
//! ## Example
//!
//! ```rust
//! use noteful_crypto::{HashParams, PasswordHasher};
//!
//! let hasher = PasswordHasher::new(HashParams::fast()).unwrap();
//! let digest = hasher.hash("correct horse battery staple").unwrap();
//! assert!(hasher.verify("correct horse battery staple", &digest).unwrap());
//! ```

pub mod error;
pub mod password;
pub mod token;

pub use error::{CryptoError, CryptoResult};
pub use password::{HashParams, PasswordHash, PasswordHasher};
pub use token::{generate_token, looks_like_token, token_digest, TOKEN_PREFIX};
