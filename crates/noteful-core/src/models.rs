//! Domain models for noteful.
//!
//! Projections (`Note`, `Folder`, `Tag`, `User`) serialize with camelCase keys
//! and never carry the owner id or a password digest.

use chrono::{DateTime, Utc};
use noteful_crypto::PasswordHash;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Message for a create/update body without a usable title.
pub const MISSING_TITLE_MESSAGE: &str = "Missing `title` in request body";

/// Message for a folder/tag body without a usable name.
pub const MISSING_NAME_MESSAGE: &str = "Missing `name` in request body";

/// Password length bounds; the upper bound matches common hash input limits.
pub const PASSWORD_MIN_LEN: usize = 8;
pub const PASSWORD_MAX_LEN: usize = 72;

// =============================================================================
// USERS
// =============================================================================

/// Public view of a user account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub fullname: String,
    pub username: String,
}

/// A user together with the stored password digest, for login only.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: PasswordHash,
}

/// A user ready to be persisted.
///
/// Requires a [`PasswordHash`], so the password has been hashed by the time
/// a `NewUser` exists.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub fullname: String,
    pub username: String,
    pub password_hash: PasswordHash,
}

impl NewUser {
    pub fn new(
        fullname: impl Into<String>,
        username: impl Into<String>,
        password_hash: PasswordHash,
    ) -> Self {
        Self {
            fullname: fullname.into(),
            username: username.into(),
            password_hash,
        }
    }
}

/// Signup request fields, checked before hashing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signup {
    #[serde(default)]
    pub fullname: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl Signup {
    /// Check required fields, whitespace and length constraints.
    ///
    /// Returns `(fullname, username, password)` with the fullname trimmed.
    pub fn validate(self) -> Result<(String, String, String)> {
        let username = self
            .username
            .ok_or_else(|| Error::unprocessable("username", "Missing field"))?;
        let password = self
            .password
            .ok_or_else(|| Error::unprocessable("password", "Missing field"))?;

        if username.trim() != username {
            return Err(Error::unprocessable(
                "username",
                "Cannot start or end with whitespace",
            ));
        }
        if password.trim() != password {
            return Err(Error::unprocessable(
                "password",
                "Cannot start or end with whitespace",
            ));
        }
        if username.is_empty() {
            return Err(Error::unprocessable(
                "username",
                "Must be at least 1 characters long",
            ));
        }
        let password_len = password.chars().count();
        if password_len < PASSWORD_MIN_LEN {
            return Err(Error::unprocessable(
                "password",
                format!("Must be at least {} characters long", PASSWORD_MIN_LEN),
            ));
        }
        if password_len > PASSWORD_MAX_LEN {
            return Err(Error::unprocessable(
                "password",
                format!("Must be at most {} characters long", PASSWORD_MAX_LEN),
            ));
        }

        let fullname = self.fullname.unwrap_or_default().trim().to_string();
        Ok((fullname, username, password))
    }
}

// =============================================================================
// SESSIONS
// =============================================================================

/// A session row to persist. Only the token digest is stored.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub token_digest: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// Token handed to the client after login or refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedToken {
    pub auth_token: String,
    pub expires_at: DateTime<Utc>,
}

// =============================================================================
// FOLDERS & TAGS
// =============================================================================

/// A folder owned by one user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub id: Uuid,
    pub name: String,
    #[serde(skip)]
    pub user_id: Uuid,
    pub created: DateTime<Utc>,
}

/// A tag owned by one user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    #[serde(skip)]
    pub user_id: Uuid,
    pub created: DateTime<Utc>,
}

/// Tag as embedded in a note projection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TagRef {
    pub id: Uuid,
    pub name: String,
}

impl From<&Tag> for TagRef {
    fn from(tag: &Tag) -> Self {
        Self {
            id: tag.id,
            name: tag.name.clone(),
        }
    }
}

/// Trim a folder/tag name, rejecting blanks.
pub fn validate_name(name: Option<&str>) -> Result<String> {
    match name.map(str::trim) {
        Some(n) if !n.is_empty() => Ok(n.to_string()),
        _ => Err(Error::Validation(MISSING_NAME_MESSAGE.to_string())),
    }
}

// =============================================================================
// NOTES
// =============================================================================

/// Note projection returned to clients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub folder_id: Option<Uuid>,
    pub tags: Vec<TagRef>,
    /// Full-text relevance, present only when listing with a search term.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

/// Validated content of a create or update request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteDraft {
    pub title: String,
    pub content: String,
    pub folder_id: Option<Uuid>,
    /// Distinct tag ids in submission order.
    pub tags: Vec<Uuid>,
}

impl NoteDraft {
    /// Build a draft from raw request fields.
    ///
    /// - blank or missing title: `Validation`
    /// - `folderId` absent, null or empty: unfiled; unparseable: `InvalidFolder`
    /// - any unparseable tag id: `InvalidTag`; duplicates are collapsed
    pub fn parse(
        title: Option<String>,
        content: Option<String>,
        folder_id: Option<String>,
        tags: Option<Vec<String>>,
    ) -> Result<Self> {
        let title = match title {
            Some(t) if !t.trim().is_empty() => t,
            _ => return Err(Error::Validation(MISSING_TITLE_MESSAGE.to_string())),
        };

        let folder_id = match folder_id.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                Uuid::parse_str(raw).map_err(|_| Error::InvalidFolder(raw.to_string()))?,
            ),
        };

        let raw_tags = tags.unwrap_or_default();
        let mut tag_ids: Vec<Uuid> = Vec::with_capacity(raw_tags.len());
        for raw in &raw_tags {
            let id = Uuid::parse_str(raw.trim()).map_err(|_| Error::InvalidTag(raw_tags.clone()))?;
            if !tag_ids.contains(&id) {
                tag_ids.push(id);
            }
        }

        Ok(Self {
            title,
            content: content.unwrap_or_default(),
            folder_id,
            tags: tag_ids,
        })
    }
}

/// Filter for listing a user's notes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoteFilter {
    /// Full-text query; results are ranked by relevance when present.
    pub search_term: Option<String>,
    pub folder_id: Option<Uuid>,
    pub tag_id: Option<Uuid>,
}

impl NoteFilter {
    /// The search term, if it has any non-whitespace content.
    pub fn search_term(&self) -> Option<&str> {
        self.search_term
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}
