//! Error types for noteful.

use noteful_crypto::CryptoError;
use thiserror::Error;

/// Result type alias using noteful's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for noteful operations.
///
/// Handlers switch on these variants explicitly to pick a status code; see
/// `noteful_api::ApiError`.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Malformed or missing request input
    #[error("{0}")]
    Validation(String),

    /// Referenced folder is missing, malformed, or owned by someone else
    #[error("The folder is not valid")]
    InvalidFolder(String),

    /// At least one referenced tag is missing, malformed, or owned by someone else
    #[error("The tag is not valid")]
    InvalidTag(Vec<String>),

    /// No owned resource matches
    #[error("Not found: {0}")]
    NotFound(String),

    /// Unique constraint violated (duplicate username, folder or tag name)
    #[error("{0}")]
    Conflict(String),

    /// A signup field failed a constraint
    #[error("{message}")]
    Unprocessable { field: String, message: String },

    /// Authentication failed
    #[error("{0}")]
    Unauthorized(String),

    /// Password hashing or verification failed
    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl Error {
    /// Shorthand for a 422 on a named field.
    pub fn unprocessable(field: &str, message: impl Into<String>) -> Self {
        Error::Unprocessable {
            field: field.to_string(),
            message: message.into(),
        }
    }
}
