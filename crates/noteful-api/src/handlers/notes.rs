//! Note HTTP handlers.
//!
//! Every route requires a bearer token and only ever touches the caller's
//! notes. Writes check the folder and tag references before anything is
//! stored.

use axum::{
    extract::{OriginalUri, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use tracing::info;

use noteful_core::{
    parse_id, parse_query_id, validate_references, Note, NoteDraft, NoteFilter,
    MISSING_TITLE_MESSAGE,
};

use super::{created, JsonBody};
use crate::{ApiError, AppState, RequireAuth};

/// Query parameters for listing notes.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListNotesQuery {
    /// Full-text query; ranks results by relevance when present
    pub search_term: Option<String>,
    pub folder_id: Option<String>,
    pub tag_id: Option<String>,
}

/// Request body for create and update.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteBody {
    pub title: Option<String>,
    pub content: Option<String>,
    pub folder_id: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl NoteBody {
    fn has_title(&self) -> bool {
        self.title.as_deref().is_some_and(|t| !t.trim().is_empty())
    }

    fn into_draft(self) -> Result<NoteDraft, ApiError> {
        Ok(NoteDraft::parse(
            self.title,
            self.content,
            self.folder_id,
            self.tags,
        )?)
    }
}

/// List the caller's notes.
///
/// # Query Parameters
/// - `searchTerm`: full-text query (optional)
/// - `folderId`: only notes in this folder (optional)
/// - `tagId`: only notes carrying this tag (optional)
pub async fn list_notes(
    State(state): State<AppState>,
    auth: RequireAuth,
    Query(query): Query<ListNotesQuery>,
) -> Result<Json<Vec<Note>>, ApiError> {
    let filter = NoteFilter {
        folder_id: parse_query_id("folderId", query.folder_id.as_deref())?,
        tag_id: parse_query_id("tagId", query.tag_id.as_deref())?,
        search_term: query.search_term,
    };

    let notes = state.notes.list(auth.user_id, &filter).await?;
    Ok(Json(notes))
}

pub async fn get_note(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<String>,
) -> Result<Json<Note>, ApiError> {
    let id = parse_id(&id)?;
    state
        .notes
        .get(auth.user_id, id)
        .await?
        .map(Json)
        .ok_or_else(ApiError::not_found)
}

/// Create a note.
///
/// # Returns
/// - 201 Created with `Location` and the stored note
/// - 400 Bad Request on a missing title or an invalid folder/tag reference
pub async fn create_note(
    State(state): State<AppState>,
    auth: RequireAuth,
    OriginalUri(uri): OriginalUri,
    JsonBody(body): JsonBody<NoteBody>,
) -> Result<impl IntoResponse, ApiError> {
    let draft = body.into_draft()?;
    validate_references(
        state.folders.as_ref(),
        state.tags.as_ref(),
        auth.user_id,
        &draft,
    )
    .await?;

    let note = state.notes.insert(auth.user_id, &draft).await?;
    info!(
        subsystem = "api",
        component = "notes",
        op = "create",
        user_id = %auth.user_id,
        note_id = %note.id,
        "Note created"
    );
    Ok(created(&uri, note.id, note))
}

/// Replace a note's title, content, folder and tags.
///
/// The title is checked before the id, and both before any reference lookup.
pub async fn update_note(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<NoteBody>,
) -> Result<Json<Note>, ApiError> {
    if !body.has_title() {
        return Err(ApiError::BadRequest(MISSING_TITLE_MESSAGE.to_string()));
    }
    let id = parse_id(&id)?;
    let draft = body.into_draft()?;

    validate_references(
        state.folders.as_ref(),
        state.tags.as_ref(),
        auth.user_id,
        &draft,
    )
    .await?;

    state
        .notes
        .update(auth.user_id, id, &draft)
        .await?
        .map(Json)
        .ok_or_else(ApiError::not_found)
}

/// Delete a note. Deleting a note that does not exist still answers 204.
pub async fn delete_note(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    let existed = state.notes.delete(auth.user_id, id).await?;
    info!(
        subsystem = "api",
        component = "notes",
        op = "delete",
        user_id = %auth.user_id,
        note_id = %id,
        existed,
        "Note delete handled"
    );
    Ok(StatusCode::NO_CONTENT)
}
