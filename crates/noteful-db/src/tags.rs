//! Tag repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use tracing::debug;
use uuid::Uuid;

use noteful_core::{new_v7, Error, Result, Tag, TagRepository};

use crate::conflict_on_unique;

/// Message for a tag whose name the user already uses.
pub const DUPLICATE_TAG_MESSAGE: &str = "Tag name already exists";

/// PostgreSQL implementation of TagRepository.
#[derive(Clone)]
pub struct PgTagRepository {
    pool: Pool<Postgres>,
}

impl PgTagRepository {
    /// Create a new PgTagRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn tag_from_row(r: &PgRow) -> Tag {
    Tag {
        id: r.get("id"),
        name: r.get("name"),
        user_id: r.get("user_id"),
        created: r.get("created_at_utc"),
    }
}

#[async_trait]
impl TagRepository for PgTagRepository {
    async fn list(&self, user_id: Uuid) -> Result<Vec<Tag>> {
        let rows = sqlx::query(
            "SELECT id, name, user_id, created_at_utc FROM tag
             WHERE user_id = $1
             ORDER BY name",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(tag_from_row).collect())
    }

    async fn get(&self, user_id: Uuid, id: Uuid) -> Result<Option<Tag>> {
        let row = sqlx::query(
            "SELECT id, name, user_id, created_at_utc FROM tag WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.as_ref().map(tag_from_row))
    }

    async fn create(&self, user_id: Uuid, name: &str) -> Result<Tag> {
        let tag = Tag {
            id: new_v7(),
            name: name.to_string(),
            user_id,
            created: Utc::now(),
        };

        sqlx::query("INSERT INTO tag (id, user_id, name, created_at_utc) VALUES ($1, $2, $3, $4)")
            .bind(tag.id)
            .bind(user_id)
            .bind(name)
            .bind(tag.created)
            .execute(&self.pool)
            .await
            .map_err(|e| conflict_on_unique(e, DUPLICATE_TAG_MESSAGE))?;

        Ok(tag)
    }

    async fn update(&self, user_id: Uuid, id: Uuid, name: &str) -> Result<Option<Tag>> {
        let row = sqlx::query(
            "UPDATE tag SET name = $1 WHERE id = $2 AND user_id = $3
             RETURNING id, name, user_id, created_at_utc",
        )
        .bind(name)
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, DUPLICATE_TAG_MESSAGE))?;

        Ok(row.as_ref().map(tag_from_row))
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<bool> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        // Detach from notes first; scoped through the tag's owner
        let detached = sqlx::query(
            "DELETE FROM note_tag nt USING tag t
             WHERE nt.tag_id = t.id AND t.id = $1 AND t.user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        let deleted = sqlx::query("DELETE FROM tag WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

        tx.commit().await.map_err(Error::Database)?;

        debug!(
            subsystem = "database",
            component = "tags",
            op = "delete",
            tag_id = %id,
            detached_notes = detached.rows_affected(),
            deleted = deleted.rows_affected(),
            "Tag delete finished"
        );
        Ok(deleted.rows_affected() > 0)
    }

    async fn count_owned(&self, user_id: Uuid, ids: &[Uuid]) -> Result<usize> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS owned FROM tag WHERE user_id = $1 AND id = ANY($2::uuid[])",
        )
        .bind(user_id)
        .bind(ids)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        let owned: i64 = row.get("owned");
        Ok(owned as usize)
    }
}
