//! # noteful-db
//!
//! PostgreSQL database layer for noteful.
//!
//! This crate provides repository implementations for the traits defined
//! in `noteful-core`, plus the seeding routine behind the `noteful-seed`
//! binary.
//!
//! Every folder, tag and note query is filtered by the owner id it is given.

pub mod folders;
pub mod notes;
pub mod pool;
pub mod seed;
pub mod sessions;
pub mod tags;
pub mod test_fixtures;
pub mod users;

// Re-export core types
pub use noteful_core::*;

pub use folders::PgFolderRepository;
pub use notes::{build_list_query, PgNoteRepository, QueryParam};
pub use pool::{create_pool, log_pool_metrics, PoolConfig, PoolStats};
pub use seed::{seed_database, SeedData, SeedReport};
pub use sessions::PgSessionRepository;
pub use tags::PgTagRepository;
pub use users::PgUserRepository;

/// Map a unique-constraint violation to `Conflict(message)`.
///
/// Any other failure stays a database error.
pub(crate) fn conflict_on_unique(err: sqlx::Error, message: &str) -> Error {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            Error::Conflict(message.to_string())
        }
        _ => Error::Database(err),
    }
}

/// Combined database access.
#[derive(Clone)]
pub struct Database {
    pub pool: sqlx::Pool<sqlx::Postgres>,
    pub users: PgUserRepository,
    pub sessions: PgSessionRepository,
    pub folders: PgFolderRepository,
    pub tags: PgTagRepository,
    pub notes: PgNoteRepository,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            users: PgUserRepository::new(pool.clone()),
            sessions: PgSessionRepository::new(pool.clone()),
            folders: PgFolderRepository::new(pool.clone()),
            tags: PgTagRepository::new(pool.clone()),
            notes: PgNoteRepository::new(pool.clone()),
            pool,
        }
    }

    /// Connect to `url` with the given pool sizing.
    pub async fn connect(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }

    /// Close the pool, waiting for checked-out connections to return.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
