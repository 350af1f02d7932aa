//! Fixture seeding.
//!
//! Wipes every table and repopulates it from the JSON fixtures under
//! `crates/noteful-db/seed/`, which are compiled into the crate. Fixture ids
//! are fixed so that clients and tests can address seeded rows directly.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use chrono::{Duration, Utc};
use serde::Deserialize;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use noteful_core::{validate_name, Error, Result};
use noteful_crypto::PasswordHasher;

const USERS_JSON: &str = include_str!("../seed/users.json");
const FOLDERS_JSON: &str = include_str!("../seed/folders.json");
const TAGS_JSON: &str = include_str!("../seed/tags.json");
const NOTES_JSON: &str = include_str!("../seed/notes.json");

/// A fixture user. The password is plaintext and is hashed at seed time.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedUser {
    pub id: Uuid,
    #[serde(default)]
    pub fullname: String,
    pub username: String,
    pub password: String,
}

/// A fixture folder or tag.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedLabel {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedNote {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub folder_id: Option<Uuid>,
    #[serde(default)]
    pub tags: Vec<Uuid>,
}

/// The complete fixture set.
#[derive(Debug, Clone)]
pub struct SeedData {
    pub users: Vec<SeedUser>,
    pub folders: Vec<SeedLabel>,
    pub tags: Vec<SeedLabel>,
    pub notes: Vec<SeedNote>,
}

/// Row counts written by a seed run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub users: usize,
    pub folders: usize,
    pub tags: usize,
    pub notes: usize,
    pub note_tags: usize,
}

impl SeedData {
    /// Parse the bundled fixtures.
    pub fn bundled() -> Result<Self> {
        Self::from_json(USERS_JSON, FOLDERS_JSON, TAGS_JSON, NOTES_JSON)
    }

    pub fn from_json(users: &str, folders: &str, tags: &str, notes: &str) -> Result<Self> {
        Ok(Self {
            users: serde_json::from_str(users)?,
            folders: serde_json::from_str(folders)?,
            tags: serde_json::from_str(tags)?,
            notes: serde_json::from_str(notes)?,
        })
    }

    /// Check that the fixtures obey the same rules the API enforces.
    ///
    /// Ids and usernames must be unique, names and titles non-blank, and
    /// every folder, tag and note reference must point at a row owned by
    /// the same user.
    pub fn validate(&self) -> Result<()> {
        let mut usernames = HashSet::new();
        let mut user_ids = HashSet::new();
        for user in &self.users {
            if !user_ids.insert(user.id) {
                return Err(seed_error(format!("duplicate user id {}", user.id)));
            }
            if !usernames.insert(user.username.as_str()) {
                return Err(seed_error(format!("duplicate username {}", user.username)));
            }
        }

        let folder_owner = label_owners("folder", &self.folders, &user_ids)?;
        let tag_owner = label_owners("tag", &self.tags, &user_ids)?;

        let mut note_ids = HashSet::new();
        for note in &self.notes {
            if !note_ids.insert(note.id) {
                return Err(seed_error(format!("duplicate note id {}", note.id)));
            }
            if !user_ids.contains(&note.user_id) {
                return Err(seed_error(format!("note {} has unknown owner", note.id)));
            }
            if note.title.trim().is_empty() {
                return Err(seed_error(format!("note {} has a blank title", note.id)));
            }
            if let Some(folder_id) = note.folder_id {
                if folder_owner.get(&folder_id) != Some(&note.user_id) {
                    return Err(seed_error(format!(
                        "note {} references folder {} of another user",
                        note.id, folder_id
                    )));
                }
            }
            let mut seen_tags = HashSet::new();
            for tag_id in &note.tags {
                if !seen_tags.insert(tag_id) {
                    return Err(seed_error(format!(
                        "note {} lists tag {} more than once",
                        note.id, tag_id
                    )));
                }
                if tag_owner.get(tag_id) != Some(&note.user_id) {
                    return Err(seed_error(format!(
                        "note {} references tag {} of another user",
                        note.id, tag_id
                    )));
                }
            }
        }
        Ok(())
    }

    fn note_tag_count(&self) -> usize {
        self.notes.iter().map(|n| n.tags.len()).sum()
    }
}

fn seed_error(message: String) -> Error {
    Error::Validation(format!("Invalid seed data: {}", message))
}

fn label_owners(
    kind: &str,
    labels: &[SeedLabel],
    user_ids: &HashSet<Uuid>,
) -> Result<HashMap<Uuid, Uuid>> {
    let mut owners = HashMap::new();
    let mut names = HashSet::new();
    for label in labels {
        if !user_ids.contains(&label.user_id) {
            return Err(seed_error(format!("{} {} has unknown owner", kind, label.id)));
        }
        validate_name(Some(&label.name))
            .map_err(|_| seed_error(format!("{} {} has a blank name", kind, label.id)))?;
        if !names.insert((label.user_id, label.name.as_str())) {
            return Err(seed_error(format!("duplicate {} name {}", kind, label.name)));
        }
        if owners.insert(label.id, label.user_id).is_some() {
            return Err(seed_error(format!("duplicate {} id {}", kind, label.id)));
        }
    }
    Ok(owners)
}

/// Wipe the store and load `data`.
///
/// Users go first, then folders and tags concurrently, then notes with their
/// tag links in a single transaction.
pub async fn seed_database(
    pool: &PgPool,
    data: &SeedData,
    hasher: &PasswordHasher,
) -> Result<SeedReport> {
    data.validate()?;
    let start = Instant::now();

    sqlx::query("TRUNCATE note_tag, note, folder, tag, user_session, app_user")
        .execute(pool)
        .await
        .map_err(Error::Database)?;
    info!(subsystem = "database", component = "seed", op = "truncate", "Store wiped");

    for user in &data.users {
        let digest = hasher.hash(&user.password)?;
        sqlx::query(
            "INSERT INTO app_user (id, fullname, username, password_hash) VALUES ($1, $2, $3, $4)",
        )
        .bind(user.id)
        .bind(&user.fullname)
        .bind(&user.username)
        .bind(digest.as_str())
        .execute(pool)
        .await
        .map_err(Error::Database)?;
    }

    tokio::try_join!(
        insert_labels(pool, "folder", &data.folders),
        insert_labels(pool, "tag", &data.tags),
    )?;

    insert_notes(pool, &data.notes).await?;

    let report = SeedReport {
        users: data.users.len(),
        folders: data.folders.len(),
        tags: data.tags.len(),
        notes: data.notes.len(),
        note_tags: data.note_tag_count(),
    };
    info!(
        subsystem = "database",
        component = "seed",
        op = "complete",
        users = report.users,
        folders = report.folders,
        tags = report.tags,
        notes = report.notes,
        duration_ms = start.elapsed().as_millis() as u64,
        "Seed complete"
    );
    Ok(report)
}

async fn insert_labels(pool: &PgPool, table: &'static str, labels: &[SeedLabel]) -> Result<()> {
    let sql = format!(
        "INSERT INTO {} (id, user_id, name) VALUES ($1, $2, $3)",
        table
    );
    for label in labels {
        sqlx::query(&sql)
            .bind(label.id)
            .bind(label.user_id)
            .bind(label.name.trim())
            .execute(pool)
            .await
            .map_err(Error::Database)?;
    }
    Ok(())
}

async fn insert_notes(pool: &PgPool, notes: &[SeedNote]) -> Result<()> {
    let mut tx = pool.begin().await.map_err(Error::Database)?;
    let base = Utc::now();

    for (i, note) in notes.iter().enumerate() {
        // Spread creation times so the default ordering follows fixture order
        let created = base + Duration::seconds(i as i64);
        sqlx::query(
            "INSERT INTO note (id, user_id, folder_id, title, content, created_at_utc, updated_at_utc)
             VALUES ($1, $2, $3, $4, $5, $6, $6)",
        )
        .bind(note.id)
        .bind(note.user_id)
        .bind(note.folder_id)
        .bind(&note.title)
        .bind(&note.content)
        .bind(created)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        for (position, tag_id) in note.tags.iter().enumerate() {
            sqlx::query("INSERT INTO note_tag (note_id, tag_id, position) VALUES ($1, $2, $3)")
                .bind(note.id)
                .bind(tag_id)
                .bind(position as i32)
                .execute(&mut *tx)
                .await
                .map_err(Error::Database)?;
        }
    }

    tx.commit().await.map_err(Error::Database)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_fixtures_are_valid() {
        let data = SeedData::bundled().unwrap();
        data.validate().unwrap();
        assert_eq!(data.users.len(), 2);
        assert!(!data.notes.is_empty());
    }

    #[test]
    fn test_bundled_passwords_meet_signup_rules() {
        let data = SeedData::bundled().unwrap();
        for user in &data.users {
            assert!(user.password.len() >= noteful_core::PASSWORD_MIN_LEN);
        }
    }

    #[test]
    fn test_cross_user_folder_reference_rejected() {
        let users = r#"[
            {"id": "00000000-0000-4000-8000-000000000001", "username": "alice", "password": "password123"},
            {"id": "00000000-0000-4000-8000-000000000002", "username": "bob", "password": "password456"}
        ]"#;
        let folders = r#"[
            {"id": "10000000-0000-4000-8000-000000000001", "userId": "00000000-0000-4000-8000-000000000002", "name": "Work"}
        ]"#;
        let notes = r#"[
            {"id": "30000000-0000-4000-8000-000000000001", "userId": "00000000-0000-4000-8000-000000000001",
             "title": "hello", "folderId": "10000000-0000-4000-8000-000000000001"}
        ]"#;
        let data = SeedData::from_json(users, folders, "[]", notes).unwrap();

        let err = data.validate().unwrap_err();
        assert!(err.to_string().contains("folder"));
    }

    #[test]
    fn test_duplicate_tag_name_rejected() {
        let users = r#"[{"id": "00000000-0000-4000-8000-000000000001", "username": "alice", "password": "password123"}]"#;
        let tags = r#"[
            {"id": "20000000-0000-4000-8000-000000000001", "userId": "00000000-0000-4000-8000-000000000001", "name": "cats"},
            {"id": "20000000-0000-4000-8000-000000000002", "userId": "00000000-0000-4000-8000-000000000001", "name": "cats"}
        ]"#;
        let data = SeedData::from_json(users, "[]", tags, "[]").unwrap();

        assert!(data.validate().is_err());
    }

    #[test]
    fn test_repeated_tag_on_note_rejected() {
        let users = r#"[{"id": "00000000-0000-4000-8000-000000000001", "username": "alice", "password": "password123"}]"#;
        let tags = r#"[
            {"id": "20000000-0000-4000-8000-000000000001", "userId": "00000000-0000-4000-8000-000000000001", "name": "cats"}
        ]"#;
        let notes = r#"[
            {"id": "30000000-0000-4000-8000-000000000001", "userId": "00000000-0000-4000-8000-000000000001",
             "title": "hello", "tags": ["20000000-0000-4000-8000-000000000001", "20000000-0000-4000-8000-000000000001"]}
        ]"#;
        let data = SeedData::from_json(users, "[]", tags, notes).unwrap();

        let err = data.validate().unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_malformed_fixture_is_serialization_error() {
        let err = SeedData::from_json("{", "[]", "[]", "[]").unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }
}
