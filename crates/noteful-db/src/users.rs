//! User repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres, Row};
use tracing::info;

use noteful_core::{
    new_v7, Error, NewUser, Result, User, UserCredentials, UserRepository,
};
use noteful_crypto::PasswordHash;

use crate::conflict_on_unique;

/// Message for a signup whose username is taken.
pub const DUPLICATE_USERNAME_MESSAGE: &str = "The username already exists";

/// PostgreSQL implementation of UserRepository.
#[derive(Clone)]
pub struct PgUserRepository {
    pool: Pool<Postgres>,
}

impl PgUserRepository {
    /// Create a new PgUserRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn insert(&self, user: NewUser) -> Result<User> {
        let id = new_v7();

        sqlx::query(
            "INSERT INTO app_user (id, fullname, username, password_hash, created_at_utc)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(id)
        .bind(&user.fullname)
        .bind(&user.username)
        .bind(user.password_hash.as_str())
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, DUPLICATE_USERNAME_MESSAGE))?;

        info!(
            subsystem = "database",
            component = "users",
            op = "insert",
            user_id = %id,
            "User created"
        );

        Ok(User {
            id,
            fullname: user.fullname,
            username: user.username,
        })
    }

    async fn find_credentials(&self, username: &str) -> Result<Option<UserCredentials>> {
        let row = sqlx::query(
            "SELECT id, fullname, username, password_hash FROM app_user WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        let Some(r) = row else {
            return Ok(None);
        };

        let stored: String = r.get("password_hash");
        Ok(Some(UserCredentials {
            user: User {
                id: r.get("id"),
                fullname: r.get("fullname"),
                username: r.get("username"),
            },
            password_hash: PasswordHash::parse(&stored)?,
        }))
    }
}
