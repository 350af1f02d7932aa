//! Error types for cryptographic operations.

use thiserror::Error;

/// Cryptographic operation errors.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// Cost parameters rejected by the hashing library.
    #[error("Invalid hashing parameters: {0}")]
    InvalidParams(String),

    /// Password hashing failed.
    #[error("Password hashing failed: {0}")]
    Hashing(String),

    /// Stored digest is not a valid PHC string.
    #[error("Malformed password hash: {0}")]
    MalformedHash(String),

    /// Verification failed for a reason other than a mismatch.
    #[error("Password verification failed: {0}")]
    Verification(String),
}

/// Result type for cryptographic operations.
pub type CryptoResult<T> = std::result::Result<T, CryptoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_malformed_hash() {
        let err = CryptoError::MalformedHash("missing algorithm".to_string());
        assert_eq!(err.to_string(), "Malformed password hash: missing algorithm");
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<CryptoError>();
        assert_sync::<CryptoError>();
    }
}
