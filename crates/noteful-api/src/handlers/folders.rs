//! Folder HTTP handlers.

use axum::{
    extract::{OriginalUri, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use tracing::info;

use noteful_core::{parse_id, validate_name, Folder};

use super::{created, JsonBody};
use crate::{ApiError, AppState, RequireAuth};

/// Request body for creating or renaming a folder or tag.
#[derive(Debug, Default, Deserialize)]
pub struct NameBody {
    pub name: Option<String>,
}

/// List the caller's folders ordered by name.
pub async fn list_folders(
    State(state): State<AppState>,
    auth: RequireAuth,
) -> Result<Json<Vec<Folder>>, ApiError> {
    Ok(Json(state.folders.list(auth.user_id).await?))
}

pub async fn get_folder(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<String>,
) -> Result<Json<Folder>, ApiError> {
    let id = parse_id(&id)?;
    state
        .folders
        .get(auth.user_id, id)
        .await?
        .map(Json)
        .ok_or_else(ApiError::not_found)
}

/// Create a folder. A name the caller already uses is rejected with 400.
pub async fn create_folder(
    State(state): State<AppState>,
    auth: RequireAuth,
    OriginalUri(uri): OriginalUri,
    JsonBody(body): JsonBody<NameBody>,
) -> Result<impl IntoResponse, ApiError> {
    let name = validate_name(body.name.as_deref())?;
    let folder = state.folders.create(auth.user_id, &name).await?;
    info!(
        subsystem = "api",
        component = "folders",
        op = "create",
        user_id = %auth.user_id,
        folder_id = %folder.id,
        "Folder created"
    );
    Ok(created(&uri, folder.id, folder))
}

pub async fn update_folder(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<NameBody>,
) -> Result<Json<Folder>, ApiError> {
    let name = validate_name(body.name.as_deref())?;
    let id = parse_id(&id)?;
    state
        .folders
        .update(auth.user_id, id, &name)
        .await?
        .map(Json)
        .ok_or_else(ApiError::not_found)
}

/// Delete a folder. Its notes stay, unfiled.
pub async fn delete_folder(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    let existed = state.folders.delete(auth.user_id, id).await?;
    info!(
        subsystem = "api",
        component = "folders",
        op = "delete",
        user_id = %auth.user_id,
        folder_id = %id,
        existed,
        "Folder delete handled"
    );
    Ok(StatusCode::NO_CONTENT)
}
