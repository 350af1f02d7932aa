//! Session repository implementation.
//!
//! Rows are keyed by the SHA-256 digest of the bearer token; the token itself
//! never reaches the database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres, Row};
use tracing::debug;
use uuid::Uuid;

use noteful_core::{Error, NewSession, Result, SessionRepository};

/// PostgreSQL implementation of SessionRepository.
#[derive(Clone)]
pub struct PgSessionRepository {
    pool: Pool<Postgres>,
}

impl PgSessionRepository {
    /// Create a new PgSessionRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionRepository for PgSessionRepository {
    async fn create(&self, session: NewSession) -> Result<()> {
        sqlx::query(
            "INSERT INTO user_session (token_hash, user_id, created_at_utc, expires_at)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(&session.token_digest)
        .bind(session.user_id)
        .bind(Utc::now())
        .bind(session.expires_at)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    async fn find_user(&self, token_digest: &str, now: DateTime<Utc>) -> Result<Option<Uuid>> {
        let row = sqlx::query(
            "SELECT user_id FROM user_session WHERE token_hash = $1 AND expires_at > $2",
        )
        .bind(token_digest)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(|r| r.get("user_id")))
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM user_session WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        let removed = result.rows_affected();
        debug!(
            subsystem = "database",
            component = "sessions",
            op = "purge_expired",
            removed,
            "Expired sessions purged"
        );
        Ok(removed)
    }
}
