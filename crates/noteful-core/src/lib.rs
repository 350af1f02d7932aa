//! # noteful-core
//!
//! Core types, traits, and reference validation for noteful.
//!
//! This crate provides the domain models, the closed [`Error`] set that
//! handlers switch on, the owner-scoped repository traits implemented by
//! `noteful-db`, and the folder/tag reference checks that guard note writes.

pub mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod models;
pub mod traits;
pub mod uuid_utils;
pub mod validation;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::*;
pub use traits::*;
pub use uuid_utils::{new_v7, parse_id, parse_query_id};
pub use validation::{validate_folder, validate_references, validate_tags};
