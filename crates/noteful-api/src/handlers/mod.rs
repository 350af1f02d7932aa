//! HTTP handlers for noteful-api.

pub mod folders;
pub mod notes;
pub mod tags;
pub mod users;

use axum::{
    extract::FromRequest,
    http::{header, StatusCode, Uri},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::ApiError;

/// JSON body extractor whose rejections use the `{"error"}` body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);

/// 201 with `Location: <request path>/<id>` and `body`.
pub(crate) fn created<T: Serialize>(uri: &Uri, id: Uuid, body: T) -> impl IntoResponse {
    let location = format!("{}/{}", uri.path().trim_end_matches('/'), id);
    (StatusCode::CREATED, [(header::LOCATION, location)], Json(body))
}
