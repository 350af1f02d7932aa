//! Signup, login and token refresh.
//!
//! Argon2 hashing and verification run on the blocking pool.

use axum::{
    extract::{OriginalUri, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use tracing::{info, warn};

use noteful_core::{IssuedToken, NewUser, Signup};
use noteful_crypto::PasswordHash;

use super::{created, JsonBody};
use crate::auth::issue_token;
use crate::{ApiError, AppState, RequireAuth};

/// Message for any failed login.
pub const BAD_CREDENTIALS_MESSAGE: &str = "Incorrect username or password";

#[derive(Debug, Default, Deserialize)]
pub struct LoginBody {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Register a user.
///
/// # Returns
/// - 201 Created with `Location` and `{id, fullname, username}`
/// - 422 when a field breaks a constraint; `location` names the field
/// - 400 when the username is taken
pub async fn signup(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    JsonBody(body): JsonBody<Signup>,
) -> Result<impl IntoResponse, ApiError> {
    let (fullname, username, password) = body.validate()?;

    let hasher = state.hasher.clone();
    let digest = tokio::task::spawn_blocking(move || hasher.hash(&password))
        .await
        .map_err(|e| ApiError::Internal(format!("hashing task failed: {}", e)))?
        .map_err(noteful_core::Error::from)?;

    let user = state
        .users
        .insert(NewUser::new(fullname, username, digest))
        .await?;
    info!(
        subsystem = "api",
        component = "users",
        op = "signup",
        user_id = %user.id,
        "User registered"
    );
    Ok(created(&uri, user.id, user))
}

/// Exchange a username and password for a bearer token.
pub async fn login(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<LoginBody>,
) -> Result<Json<IssuedToken>, ApiError> {
    let bad_credentials = || ApiError::Unauthorized(BAD_CREDENTIALS_MESSAGE.to_string());

    let (Some(username), Some(password)) = (body.username, body.password) else {
        return Err(bad_credentials());
    };

    // Unknown usernames still pay for one hash
    let creds = state.users.find_credentials(&username).await?;
    let digest = creds.as_ref().map(|c| c.password_hash.clone());
    let verified = verify_password(&state, password, digest).await?;

    let creds = match creds {
        Some(creds) if verified => creds,
        Some(creds) => {
            warn!(
                subsystem = "api",
                component = "users",
                op = "login",
                user_id = %creds.user.id,
                "Password mismatch"
            );
            return Err(bad_credentials());
        }
        None => return Err(bad_credentials()),
    };

    Ok(Json(issue_token(&state, creds.user.id).await?))
}

/// Issue a fresh token to an authenticated caller.
pub async fn refresh(
    State(state): State<AppState>,
    auth: RequireAuth,
) -> Result<Json<IssuedToken>, ApiError> {
    Ok(Json(issue_token(&state, auth.user_id).await?))
}

async fn verify_password(
    state: &AppState,
    password: String,
    digest: Option<PasswordHash>,
) -> Result<bool, ApiError> {
    let hasher = state.hasher.clone();
    let verified = tokio::task::spawn_blocking(move || match digest {
        Some(digest) => hasher.verify(&password, &digest),
        None => hasher.verify_absent(&password),
    })
        .await
        .map_err(|e| ApiError::Internal(format!("verify task failed: {}", e)))?
        .map_err(noteful_core::Error::from)?;
    Ok(verified)
}
