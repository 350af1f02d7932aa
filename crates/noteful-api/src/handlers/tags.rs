//! Tag HTTP handlers.

use axum::{
    extract::{OriginalUri, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use tracing::info;

use noteful_core::{parse_id, validate_name, Tag};

use super::folders::NameBody;
use super::{created, JsonBody};
use crate::{ApiError, AppState, RequireAuth};

pub async fn list_tags(
    State(state): State<AppState>,
    auth: RequireAuth,
) -> Result<Json<Vec<Tag>>, ApiError> {
    Ok(Json(state.tags.list(auth.user_id).await?))
}

pub async fn get_tag(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<String>,
) -> Result<Json<Tag>, ApiError> {
    let id = parse_id(&id)?;
    state
        .tags
        .get(auth.user_id, id)
        .await?
        .map(Json)
        .ok_or_else(ApiError::not_found)
}

pub async fn create_tag(
    State(state): State<AppState>,
    auth: RequireAuth,
    OriginalUri(uri): OriginalUri,
    JsonBody(body): JsonBody<NameBody>,
) -> Result<impl IntoResponse, ApiError> {
    let name = validate_name(body.name.as_deref())?;
    let tag = state.tags.create(auth.user_id, &name).await?;
    info!(
        subsystem = "api",
        component = "tags",
        op = "create",
        user_id = %auth.user_id,
        tag_id = %tag.id,
        "Tag created"
    );
    Ok(created(&uri, tag.id, tag))
}

pub async fn update_tag(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<NameBody>,
) -> Result<Json<Tag>, ApiError> {
    let name = validate_name(body.name.as_deref())?;
    let id = parse_id(&id)?;
    state
        .tags
        .update(auth.user_id, id, &name)
        .await?
        .map(Json)
        .ok_or_else(ApiError::not_found)
}

/// Delete a tag and detach it from every note.
pub async fn delete_tag(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    let existed = state.tags.delete(auth.user_id, id).await?;
    info!(
        subsystem = "api",
        component = "tags",
        op = "delete",
        user_id = %auth.user_id,
        tag_id = %id,
        existed,
        "Tag delete handled"
    );
    Ok(StatusCode::NO_CONTENT)
}
