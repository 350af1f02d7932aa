//! In-memory repository implementations for deterministic testing.
//!
//! `MockStore` implements every repository trait over a single mutex-guarded
//! state, with the same ownership rules as the PostgreSQL repositories. Full
//! text search is approximated by counting query-term occurrences.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use noteful_core::mock::MockStore;
//!
//! let store = MockStore::new();
//! let folder = store.seed_folder(user_id, "Archive");
//! assert_eq!(store.write_count(), 0);
//! ```

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use noteful_crypto::PasswordHash;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::*;
use crate::traits::*;
use crate::uuid_utils::new_v7;

#[derive(Debug, Clone)]
struct StoredNote {
    id: Uuid,
    user_id: Uuid,
    title: String,
    content: String,
    created: DateTime<Utc>,
    updated: DateTime<Utc>,
    folder_id: Option<Uuid>,
    tags: Vec<Uuid>,
}

#[derive(Debug, Default)]
struct MockState {
    users: Vec<(User, PasswordHash)>,
    sessions: Vec<NewSession>,
    folders: Vec<Folder>,
    tags: Vec<Tag>,
    notes: Vec<StoredNote>,
    writes: usize,
}

impl MockState {
    fn project(&self, note: &StoredNote, score: Option<f32>) -> Note {
        let tags = note
            .tags
            .iter()
            .filter_map(|id| self.tags.iter().find(|t| t.id == *id))
            .map(TagRef::from)
            .collect();
        Note {
            id: note.id,
            title: note.title.clone(),
            content: note.content.clone(),
            created: note.created,
            updated: note.updated,
            folder_id: note.folder_id,
            tags,
            score,
        }
    }
}

/// Shared in-memory store; clones see the same data.
#[derive(Clone, Default)]
pub struct MockStore {
    state: Arc<Mutex<MockState>>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful mutations performed through the traits.
    pub fn write_count(&self) -> usize {
        self.state.lock().unwrap().writes
    }

    /// Number of notes across all users.
    pub fn note_count(&self) -> usize {
        self.state.lock().unwrap().notes.len()
    }

    /// Insert a folder directly, bypassing the write counter.
    pub fn seed_folder(&self, user_id: Uuid, name: &str) -> Folder {
        let folder = Folder {
            id: new_v7(),
            name: name.to_string(),
            user_id,
            created: Utc::now(),
        };
        self.state.lock().unwrap().folders.push(folder.clone());
        folder
    }

    /// Insert a tag directly, bypassing the write counter.
    pub fn seed_tag(&self, user_id: Uuid, name: &str) -> Tag {
        let tag = Tag {
            id: new_v7(),
            name: name.to_string(),
            user_id,
            created: Utc::now(),
        };
        self.state.lock().unwrap().tags.push(tag.clone());
        tag
    }
}

fn relevance(note: &StoredNote, term: &str) -> f32 {
    let haystack = format!("{} {}", note.title, note.content).to_lowercase();
    term.split_whitespace()
        .map(|word| haystack.matches(&word.to_lowercase()).count() as f32)
        .sum()
}

#[async_trait]
impl UserRepository for MockStore {
    async fn insert(&self, user: NewUser) -> Result<User> {
        let mut state = self.state.lock().unwrap();
        if state.users.iter().any(|(u, _)| u.username == user.username) {
            return Err(Error::Conflict("The username already exists".to_string()));
        }
        let created = User {
            id: new_v7(),
            fullname: user.fullname,
            username: user.username,
        };
        state.users.push((created.clone(), user.password_hash));
        state.writes += 1;
        Ok(created)
    }

    async fn find_credentials(&self, username: &str) -> Result<Option<UserCredentials>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .users
            .iter()
            .find(|(u, _)| u.username == username)
            .map(|(u, h)| UserCredentials {
                user: u.clone(),
                password_hash: h.clone(),
            }))
    }
}

#[async_trait]
impl SessionRepository for MockStore {
    async fn create(&self, session: NewSession) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.sessions.push(session);
        state.writes += 1;
        Ok(())
    }

    async fn find_user(&self, token_digest: &str, now: DateTime<Utc>) -> Result<Option<Uuid>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .sessions
            .iter()
            .find(|s| s.token_digest == token_digest && s.expires_at > now)
            .map(|s| s.user_id))
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let mut state = self.state.lock().unwrap();
        let before = state.sessions.len();
        state.sessions.retain(|s| s.expires_at > now);
        Ok((before - state.sessions.len()) as u64)
    }
}

#[async_trait]
impl FolderRepository for MockStore {
    async fn list(&self, user_id: Uuid) -> Result<Vec<Folder>> {
        let state = self.state.lock().unwrap();
        let mut folders: Vec<Folder> = state
            .folders
            .iter()
            .filter(|f| f.user_id == user_id)
            .cloned()
            .collect();
        folders.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(folders)
    }

    async fn get(&self, user_id: Uuid, id: Uuid) -> Result<Option<Folder>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .folders
            .iter()
            .find(|f| f.id == id && f.user_id == user_id)
            .cloned())
    }

    async fn create(&self, user_id: Uuid, name: &str) -> Result<Folder> {
        let mut state = self.state.lock().unwrap();
        if state
            .folders
            .iter()
            .any(|f| f.user_id == user_id && f.name == name)
        {
            return Err(Error::Conflict("Folder name already exists".to_string()));
        }
        let folder = Folder {
            id: new_v7(),
            name: name.to_string(),
            user_id,
            created: Utc::now(),
        };
        state.folders.push(folder.clone());
        state.writes += 1;
        Ok(folder)
    }

    async fn update(&self, user_id: Uuid, id: Uuid, name: &str) -> Result<Option<Folder>> {
        let mut state = self.state.lock().unwrap();
        if state
            .folders
            .iter()
            .any(|f| f.user_id == user_id && f.name == name && f.id != id)
        {
            return Err(Error::Conflict("Folder name already exists".to_string()));
        }
        let Some(folder) = state
            .folders
            .iter_mut()
            .find(|f| f.id == id && f.user_id == user_id)
        else {
            return Ok(None);
        };
        folder.name = name.to_string();
        let updated = folder.clone();
        state.writes += 1;
        Ok(Some(updated))
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        let before = state.folders.len();
        state.folders.retain(|f| !(f.id == id && f.user_id == user_id));
        let removed = state.folders.len() != before;
        if removed {
            for note in state
                .notes
                .iter_mut()
                .filter(|n| n.user_id == user_id && n.folder_id == Some(id))
            {
                note.folder_id = None;
            }
            state.writes += 1;
        }
        Ok(removed)
    }

    async fn exists_owned(&self, user_id: Uuid, id: Uuid) -> Result<bool> {
        let state = self.state.lock().unwrap();
        Ok(state
            .folders
            .iter()
            .any(|f| f.id == id && f.user_id == user_id))
    }
}

#[async_trait]
impl TagRepository for MockStore {
    async fn list(&self, user_id: Uuid) -> Result<Vec<Tag>> {
        let state = self.state.lock().unwrap();
        let mut tags: Vec<Tag> = state
            .tags
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tags)
    }

    async fn get(&self, user_id: Uuid, id: Uuid) -> Result<Option<Tag>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .tags
            .iter()
            .find(|t| t.id == id && t.user_id == user_id)
            .cloned())
    }

    async fn create(&self, user_id: Uuid, name: &str) -> Result<Tag> {
        let mut state = self.state.lock().unwrap();
        if state.tags.iter().any(|t| t.user_id == user_id && t.name == name) {
            return Err(Error::Conflict("Tag name already exists".to_string()));
        }
        let tag = Tag {
            id: new_v7(),
            name: name.to_string(),
            user_id,
            created: Utc::now(),
        };
        state.tags.push(tag.clone());
        state.writes += 1;
        Ok(tag)
    }

    async fn update(&self, user_id: Uuid, id: Uuid, name: &str) -> Result<Option<Tag>> {
        let mut state = self.state.lock().unwrap();
        if state
            .tags
            .iter()
            .any(|t| t.user_id == user_id && t.name == name && t.id != id)
        {
            return Err(Error::Conflict("Tag name already exists".to_string()));
        }
        let Some(tag) = state
            .tags
            .iter_mut()
            .find(|t| t.id == id && t.user_id == user_id)
        else {
            return Ok(None);
        };
        tag.name = name.to_string();
        let updated = tag.clone();
        state.writes += 1;
        Ok(Some(updated))
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        let before = state.tags.len();
        state.tags.retain(|t| !(t.id == id && t.user_id == user_id));
        let removed = state.tags.len() != before;
        if removed {
            for note in state.notes.iter_mut().filter(|n| n.user_id == user_id) {
                note.tags.retain(|t| *t != id);
            }
            state.writes += 1;
        }
        Ok(removed)
    }

    async fn count_owned(&self, user_id: Uuid, ids: &[Uuid]) -> Result<usize> {
        let state = self.state.lock().unwrap();
        Ok(state
            .tags
            .iter()
            .filter(|t| t.user_id == user_id && ids.contains(&t.id))
            .count())
    }
}

#[async_trait]
impl NoteRepository for MockStore {
    async fn list(&self, user_id: Uuid, filter: &NoteFilter) -> Result<Vec<Note>> {
        let state = self.state.lock().unwrap();
        let mut scored: Vec<(&StoredNote, Option<f32>)> = state
            .notes
            .iter()
            .filter(|n| n.user_id == user_id)
            .filter(|n| filter.folder_id.map_or(true, |f| n.folder_id == Some(f)))
            .filter(|n| filter.tag_id.map_or(true, |t| n.tags.contains(&t)))
            .map(|n| (n, filter.search_term().map(|term| relevance(n, term))))
            .filter(|(_, score)| score.map_or(true, |s| s > 0.0))
            .collect();

        if filter.search_term().is_some() {
            scored.sort_by(|a, b| {
                b.1.partial_cmp(&a.1)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(a.0.created.cmp(&b.0.created))
                    .then(a.0.id.cmp(&b.0.id))
            });
        } else {
            scored.sort_by(|a, b| a.0.created.cmp(&b.0.created).then(a.0.id.cmp(&b.0.id)));
        }

        Ok(scored
            .into_iter()
            .map(|(n, score)| state.project(n, score))
            .collect())
    }

    async fn get(&self, user_id: Uuid, id: Uuid) -> Result<Option<Note>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .notes
            .iter()
            .find(|n| n.id == id && n.user_id == user_id)
            .map(|n| state.project(n, None)))
    }

    async fn insert(&self, user_id: Uuid, draft: &NoteDraft) -> Result<Note> {
        let mut state = self.state.lock().unwrap();
        let now = Utc::now();
        let note = StoredNote {
            id: new_v7(),
            user_id,
            title: draft.title.clone(),
            content: draft.content.clone(),
            created: now,
            updated: now,
            folder_id: draft.folder_id,
            tags: draft.tags.clone(),
        };
        let projected = state.project(&note, None);
        state.notes.push(note);
        state.writes += 1;
        Ok(projected)
    }

    async fn update(&self, user_id: Uuid, id: Uuid, draft: &NoteDraft) -> Result<Option<Note>> {
        let mut state = self.state.lock().unwrap();
        let Some(note) = state
            .notes
            .iter_mut()
            .find(|n| n.id == id && n.user_id == user_id)
        else {
            return Ok(None);
        };
        note.title = draft.title.clone();
        note.content = draft.content.clone();
        note.folder_id = draft.folder_id;
        note.tags = draft.tags.clone();
        note.updated = Utc::now();
        let snapshot = note.clone();
        state.writes += 1;
        Ok(Some(state.project(&snapshot, None)))
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        let before = state.notes.len();
        state.notes.retain(|n| !(n.id == id && n.user_id == user_id));
        let removed = state.notes.len() != before;
        if removed {
            state.writes += 1;
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(title: &str, content: &str) -> NoteDraft {
        NoteDraft {
            title: title.to_string(),
            content: content.to_string(),
            folder_id: None,
            tags: vec![],
        }
    }

    #[tokio::test]
    async fn test_notes_are_owner_scoped() {
        let store = MockStore::new();
        let alice = new_v7();
        let bob = new_v7();
        let note = NoteRepository::insert(&store, alice, &draft("x", "y"))
            .await
            .unwrap();

        assert!(NoteRepository::get(&store, bob, note.id).await.unwrap().is_none());
        assert!(!NoteRepository::delete(&store, bob, note.id).await.unwrap());
        assert!(NoteRepository::get(&store, alice, note.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_search_orders_by_relevance() {
        let store = MockStore::new();
        let user = new_v7();
        NoteRepository::insert(&store, user, &draft("dogs", "cats once"))
            .await
            .unwrap();
        NoteRepository::insert(&store, user, &draft("cats", "cats cats"))
            .await
            .unwrap();
        NoteRepository::insert(&store, user, &draft("birds", "none here"))
            .await
            .unwrap();

        let filter = NoteFilter {
            search_term: Some("cats".into()),
            ..Default::default()
        };
        let notes = NoteRepository::list(&store, user, &filter).await.unwrap();
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].title, "cats");
        assert!(notes[0].score.unwrap() > notes[1].score.unwrap());
    }

    #[tokio::test]
    async fn test_tag_delete_detaches_from_notes() {
        let store = MockStore::new();
        let user = new_v7();
        let tag = store.seed_tag(user, "breed");
        let mut d = draft("x", "");
        d.tags = vec![tag.id];
        let note = NoteRepository::insert(&store, user, &d).await.unwrap();
        assert_eq!(note.tags.len(), 1);

        assert!(TagRepository::delete(&store, user, tag.id).await.unwrap());
        let note = NoteRepository::get(&store, user, note.id).await.unwrap().unwrap();
        assert!(note.tags.is_empty());
    }
}
