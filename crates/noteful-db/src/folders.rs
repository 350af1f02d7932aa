//! Folder repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use tracing::debug;
use uuid::Uuid;

use noteful_core::{new_v7, Error, Folder, FolderRepository, Result};

use crate::conflict_on_unique;

/// Message for a folder whose name the user already uses.
pub const DUPLICATE_FOLDER_MESSAGE: &str = "Folder name already exists";

/// PostgreSQL implementation of FolderRepository.
#[derive(Clone)]
pub struct PgFolderRepository {
    pool: Pool<Postgres>,
}

impl PgFolderRepository {
    /// Create a new PgFolderRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn folder_from_row(r: &PgRow) -> Folder {
    Folder {
        id: r.get("id"),
        name: r.get("name"),
        user_id: r.get("user_id"),
        created: r.get("created_at_utc"),
    }
}

#[async_trait]
impl FolderRepository for PgFolderRepository {
    async fn list(&self, user_id: Uuid) -> Result<Vec<Folder>> {
        let rows = sqlx::query(
            "SELECT id, name, user_id, created_at_utc FROM folder
             WHERE user_id = $1
             ORDER BY name",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(folder_from_row).collect())
    }

    async fn get(&self, user_id: Uuid, id: Uuid) -> Result<Option<Folder>> {
        let row = sqlx::query(
            "SELECT id, name, user_id, created_at_utc FROM folder WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.as_ref().map(folder_from_row))
    }

    async fn create(&self, user_id: Uuid, name: &str) -> Result<Folder> {
        let folder = Folder {
            id: new_v7(),
            name: name.to_string(),
            user_id,
            created: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO folder (id, user_id, name, created_at_utc) VALUES ($1, $2, $3, $4)",
        )
        .bind(folder.id)
        .bind(user_id)
        .bind(name)
        .bind(folder.created)
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, DUPLICATE_FOLDER_MESSAGE))?;

        Ok(folder)
    }

    async fn update(&self, user_id: Uuid, id: Uuid, name: &str) -> Result<Option<Folder>> {
        let row = sqlx::query(
            "UPDATE folder SET name = $1 WHERE id = $2 AND user_id = $3
             RETURNING id, name, user_id, created_at_utc",
        )
        .bind(name)
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, DUPLICATE_FOLDER_MESSAGE))?;

        Ok(row.as_ref().map(folder_from_row))
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<bool> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        // Un-file the owner's notes before the folder goes away
        let unfiled = sqlx::query(
            "UPDATE note SET folder_id = NULL, updated_at_utc = $1
             WHERE folder_id = $2 AND user_id = $3",
        )
        .bind(Utc::now())
        .bind(id)
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        let deleted = sqlx::query("DELETE FROM folder WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

        tx.commit().await.map_err(Error::Database)?;

        debug!(
            subsystem = "database",
            component = "folders",
            op = "delete",
            folder_id = %id,
            unfiled_notes = unfiled.rows_affected(),
            deleted = deleted.rows_affected(),
            "Folder delete finished"
        );
        Ok(deleted.rows_affected() > 0)
    }

    async fn exists_owned(&self, user_id: Uuid, id: Uuid) -> Result<bool> {
        let row = sqlx::query(
            "SELECT EXISTS(SELECT 1 FROM folder WHERE id = $1 AND user_id = $2) AS present",
        )
        .bind(id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.get("present"))
    }
}
