//! Repository traits.
//!
//! Every folder, tag and note method takes the requesting `user_id` and must
//! only observe or modify rows owned by that user. A row owned by someone
//! else is reported exactly like a missing one.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

/// Repository for user accounts.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user. Fails with `Conflict` if the username is taken.
    async fn insert(&self, user: NewUser) -> Result<User>;

    /// Look up a user and their password digest for login.
    async fn find_credentials(&self, username: &str) -> Result<Option<UserCredentials>>;
}

/// Repository for bearer-token sessions.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Persist a session.
    async fn create(&self, session: NewSession) -> Result<()>;

    /// Resolve a token digest to its user, ignoring sessions expired at `now`.
    async fn find_user(&self, token_digest: &str, now: DateTime<Utc>) -> Result<Option<Uuid>>;

    /// Drop sessions expired at `now`. Returns the number removed.
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64>;
}

/// Repository for folders.
#[async_trait]
pub trait FolderRepository: Send + Sync {
    /// List the user's folders ordered by name.
    async fn list(&self, user_id: Uuid) -> Result<Vec<Folder>>;

    async fn get(&self, user_id: Uuid, id: Uuid) -> Result<Option<Folder>>;

    /// Create a folder. Fails with `Conflict` on a duplicate name.
    async fn create(&self, user_id: Uuid, name: &str) -> Result<Folder>;

    /// Rename a folder. `None` if no owned folder matches.
    async fn update(&self, user_id: Uuid, id: Uuid, name: &str) -> Result<Option<Folder>>;

    /// Delete a folder and un-file its notes. Returns whether a row existed.
    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<bool>;

    /// Whether a folder with this id is owned by the user.
    async fn exists_owned(&self, user_id: Uuid, id: Uuid) -> Result<bool>;
}

/// Repository for tags.
#[async_trait]
pub trait TagRepository: Send + Sync {
    /// List the user's tags ordered by name.
    async fn list(&self, user_id: Uuid) -> Result<Vec<Tag>>;

    async fn get(&self, user_id: Uuid, id: Uuid) -> Result<Option<Tag>>;

    /// Create a tag. Fails with `Conflict` on a duplicate name.
    async fn create(&self, user_id: Uuid, name: &str) -> Result<Tag>;

    /// Rename a tag. `None` if no owned tag matches.
    async fn update(&self, user_id: Uuid, id: Uuid, name: &str) -> Result<Option<Tag>>;

    /// Delete a tag and detach it from every note. Returns whether a row existed.
    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<bool>;

    /// How many of `ids` are tags owned by the user.
    async fn count_owned(&self, user_id: Uuid, ids: &[Uuid]) -> Result<usize>;
}

/// Repository for notes.
#[async_trait]
pub trait NoteRepository: Send + Sync {
    /// List the user's notes.
    ///
    /// With a search term, only matching notes are returned, each with a
    /// `score`, ordered by descending score. Otherwise ordered by creation
    /// time, oldest first.
    async fn list(&self, user_id: Uuid, filter: &NoteFilter) -> Result<Vec<Note>>;

    async fn get(&self, user_id: Uuid, id: Uuid) -> Result<Option<Note>>;

    /// Insert a note. References must already be validated.
    async fn insert(&self, user_id: Uuid, draft: &NoteDraft) -> Result<Note>;

    /// Replace title, content, folder and tags. `None` if no owned note matches.
    async fn update(&self, user_id: Uuid, id: Uuid, draft: &NoteDraft) -> Result<Option<Note>>;

    /// Delete a note. Returns whether a row existed.
    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<bool>;
}
