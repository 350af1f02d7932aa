//! Bearer-token authentication.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use noteful_core::{IssuedToken, NewSession};
use noteful_crypto::{generate_token, looks_like_token, token_digest};

use crate::{ApiError, AppState};

/// Extractor for authenticated requests.
///
/// Resolves `Authorization: Bearer <token>` to the owning user through the
/// session store. Missing, malformed, unknown and expired tokens are all
/// rejected with 401.
#[derive(Debug, Clone, Copy)]
pub struct RequireAuth {
    pub user_id: Uuid,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| looks_like_token(t))
            .ok_or_else(ApiError::unauthorized)?;

        match state
            .sessions
            .find_user(&token_digest(token), Utc::now())
            .await?
        {
            Some(user_id) => Ok(RequireAuth { user_id }),
            None => {
                debug!(subsystem = "api", component = "auth", "Unknown or expired token");
                Err(ApiError::unauthorized())
            }
        }
    }
}

/// Create a session for `user_id` and return the plaintext token.
///
/// Only the token digest is persisted.
pub async fn issue_token(state: &AppState, user_id: Uuid) -> Result<IssuedToken, ApiError> {
    let token = generate_token();
    let expires_at = Utc::now()
        .checked_add_signed(state.session_lifetime)
        .ok_or_else(|| ApiError::Internal("session expiry out of range".to_string()))?;

    state
        .sessions
        .create(NewSession {
            token_digest: token_digest(&token),
            user_id,
            expires_at,
        })
        .await?;

    debug!(
        subsystem = "api",
        component = "auth",
        op = "issue_token",
        %user_id,
        %expires_at,
        "Session issued"
    );
    Ok(IssuedToken {
        auth_token: token,
        expires_at,
    })
}
