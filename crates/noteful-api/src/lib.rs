//! # noteful-api
//!
//! HTTP surface for noteful: notes, folders and tags scoped to the
//! authenticated user, plus signup and bearer-token login.
//!
//! Handlers only see repository trait objects, so the router runs the same
//! against PostgreSQL ([`AppState::from_database`]) or any other store
//! implementing the `noteful-core` traits ([`AppState::from_store`]).

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use uuid::Uuid;

use noteful_core::{
    FolderRepository, NoteRepository, SessionRepository, TagRepository, UserRepository,
};
use noteful_crypto::PasswordHasher;
use noteful_db::Database;

pub use auth::RequireAuth;
pub use config::{parse_allowed_origins, ApiConfig};
pub use error::ApiError;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub sessions: Arc<dyn SessionRepository>,
    pub folders: Arc<dyn FolderRepository>,
    pub tags: Arc<dyn TagRepository>,
    pub notes: Arc<dyn NoteRepository>,
    pub hasher: Arc<PasswordHasher>,
    /// Lifetime of newly issued session tokens.
    pub session_lifetime: chrono::Duration,
}

impl AppState {
    /// Wire handlers to the PostgreSQL repositories.
    pub fn from_database(
        db: &Database,
        hasher: PasswordHasher,
        session_lifetime: chrono::Duration,
    ) -> Self {
        Self {
            users: Arc::new(db.users.clone()),
            sessions: Arc::new(db.sessions.clone()),
            folders: Arc::new(db.folders.clone()),
            tags: Arc::new(db.tags.clone()),
            notes: Arc::new(db.notes.clone()),
            hasher: Arc::new(hasher),
            session_lifetime,
        }
    }

    /// Wire handlers to a single store implementing every repository.
    pub fn from_store<S>(store: S, hasher: PasswordHasher, session_lifetime: chrono::Duration) -> Self
    where
        S: UserRepository
            + SessionRepository
            + FolderRepository
            + TagRepository
            + NoteRepository
            + Clone
            + 'static,
    {
        Self {
            users: Arc::new(store.clone()),
            sessions: Arc::new(store.clone()),
            folders: Arc::new(store.clone()),
            tags: Arc::new(store.clone()),
            notes: Arc::new(store),
            hasher: Arc::new(hasher),
            session_lifetime,
        }
    }
}

/// Generates time-ordered UUIDv7 request correlation IDs.
#[derive(Clone, Default)]
pub struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Build the full application router with middleware.
pub fn build_router(state: AppState, config: &ApiConfig) -> Router {
    use handlers::{folders, notes, tags, users};

    let api = Router::new()
        .route("/notes", get(notes::list_notes).post(notes::create_note))
        .route(
            "/notes/:id",
            get(notes::get_note)
                .put(notes::update_note)
                .delete(notes::delete_note),
        )
        .route(
            "/folders",
            get(folders::list_folders).post(folders::create_folder),
        )
        .route(
            "/folders/:id",
            get(folders::get_folder)
                .put(folders::update_folder)
                .delete(folders::delete_folder),
        )
        .route("/tags", get(tags::list_tags).post(tags::create_tag))
        .route(
            "/tags/:id",
            get(tags::get_tag).put(tags::update_tag).delete(tags::delete_tag),
        )
        .route("/users", post(users::signup))
        .route("/login", post(users::login))
        .route("/refresh", post(users::refresh));

    let allowed_origins: Vec<HeaderValue> = parse_allowed_origins(&config.allowed_origins);

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api)
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(allowed_origins))
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
                .expose_headers([header::LOCATION])
                .max_age(std::time::Duration::from_secs(3600)),
        )
        .layer(RequestBodyLimitLayer::new(config.max_body_bytes))
        .with_state(state)
}
