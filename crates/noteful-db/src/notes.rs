//! Note repository implementation.
//!
//! Notes are always read through one projection that embeds the note's tags
//! as a JSON array, so list, get, insert and update return the same shape.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{Pool, Postgres, Row, Transaction};
use tracing::debug;
use uuid::Uuid;

use noteful_core::{new_v7, Error, Note, NoteDraft, NoteFilter, NoteRepository, Result, TagRef};

/// Columns of the note projection. Expects the note aliased as `n`.
const NOTE_COLUMNS: &str = r#"
    n.id, n.title, n.content, n.folder_id, n.created_at_utc, n.updated_at_utc,
    COALESCE(
        (SELECT json_agg(json_build_object('id', t.id, 'name', t.name) ORDER BY nt.position, t.name)
         FROM note_tag nt
         JOIN tag t ON t.id = nt.tag_id
         WHERE nt.note_id = n.id),
        '[]'::json
    ) AS tags"#;

/// Type-safe parameter binding for the list query.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryParam {
    Uuid(Uuid),
    Text(String),
}

/// Build the SQL and ordered parameters for listing a user's notes.
///
/// `$1` is always the owner. A search term adds a `websearch_to_tsquery`
/// match and ranks by `ts_rank`; folder and tag filters are ANDed on.
pub fn build_list_query(user_id: Uuid, filter: &NoteFilter) -> (String, Vec<QueryParam>) {
    let mut params = vec![QueryParam::Uuid(user_id)];
    let mut clauses = vec!["n.user_id = $1".to_string()];

    let score = match filter.search_term() {
        Some(term) => {
            params.push(QueryParam::Text(term.to_string()));
            let idx = params.len();
            clauses.push(format!("n.tsv @@ websearch_to_tsquery('english', ${})", idx));
            format!("ts_rank(n.tsv, websearch_to_tsquery('english', ${}))", idx)
        }
        None => "NULL::real".to_string(),
    };

    if let Some(folder_id) = filter.folder_id {
        params.push(QueryParam::Uuid(folder_id));
        clauses.push(format!("n.folder_id = ${}", params.len()));
    }

    if let Some(tag_id) = filter.tag_id {
        params.push(QueryParam::Uuid(tag_id));
        clauses.push(format!(
            "EXISTS (SELECT 1 FROM note_tag ft WHERE ft.note_id = n.id AND ft.tag_id = ${})",
            params.len()
        ));
    }

    let order = if filter.search_term().is_some() {
        "score DESC, n.created_at_utc ASC, n.id ASC"
    } else {
        "n.created_at_utc ASC, n.id ASC"
    };

    let sql = format!(
        "SELECT {}, {} AS score FROM note n WHERE {} ORDER BY {}",
        NOTE_COLUMNS,
        score,
        clauses.join(" AND "),
        order
    );
    (sql, params)
}

fn note_from_row(r: &PgRow, with_score: bool) -> Note {
    let tags: Json<Vec<TagRef>> = r.get("tags");
    Note {
        id: r.get("id"),
        title: r.get("title"),
        content: r.get("content"),
        created: r.get("created_at_utc"),
        updated: r.get("updated_at_utc"),
        folder_id: r.get("folder_id"),
        tags: tags.0,
        score: if with_score { r.get("score") } else { None },
    }
}

/// PostgreSQL implementation of NoteRepository.
#[derive(Clone)]
pub struct PgNoteRepository {
    pool: Pool<Postgres>,
}

impl PgNoteRepository {
    /// Create a new PgNoteRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    async fn fetch_tx(
        tx: &mut Transaction<'_, Postgres>,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Note>> {
        let sql = format!(
            "SELECT {} FROM note n WHERE n.id = $1 AND n.user_id = $2",
            NOTE_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(Error::Database)?;
        Ok(row.as_ref().map(|r| note_from_row(r, false)))
    }

    /// Replace a note's tag links, keeping submission order.
    async fn replace_tags_tx(
        tx: &mut Transaction<'_, Postgres>,
        note_id: Uuid,
        tags: &[Uuid],
    ) -> Result<()> {
        sqlx::query("DELETE FROM note_tag WHERE note_id = $1")
            .bind(note_id)
            .execute(&mut **tx)
            .await
            .map_err(Error::Database)?;

        if tags.is_empty() {
            return Ok(());
        }

        let positions: Vec<i32> = (0..tags.len() as i32).collect();
        sqlx::query(
            "INSERT INTO note_tag (note_id, tag_id, position)
             SELECT $1, l.tag_id, l.position
             FROM UNNEST($2::uuid[], $3::int[]) AS l(tag_id, position)",
        )
        .bind(note_id)
        .bind(tags)
        .bind(&positions)
        .execute(&mut **tx)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }
}

#[async_trait]
impl NoteRepository for PgNoteRepository {
    async fn list(&self, user_id: Uuid, filter: &NoteFilter) -> Result<Vec<Note>> {
        let (sql, params) = build_list_query(user_id, filter);

        let mut q = sqlx::query(&sql);
        for param in &params {
            q = match param {
                QueryParam::Uuid(id) => q.bind(id),
                QueryParam::Text(s) => q.bind(s),
            };
        }

        let rows = q.fetch_all(&self.pool).await.map_err(Error::Database)?;
        let with_score = filter.search_term().is_some();

        debug!(
            subsystem = "database",
            component = "notes",
            op = "list",
            user_id = %user_id,
            search = with_score,
            result_count = rows.len(),
            "Notes listed"
        );
        Ok(rows.iter().map(|r| note_from_row(r, with_score)).collect())
    }

    async fn get(&self, user_id: Uuid, id: Uuid) -> Result<Option<Note>> {
        let sql = format!(
            "SELECT {} FROM note n WHERE n.id = $1 AND n.user_id = $2",
            NOTE_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(row.as_ref().map(|r| note_from_row(r, false)))
    }

    async fn insert(&self, user_id: Uuid, draft: &NoteDraft) -> Result<Note> {
        let id = new_v7();
        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        sqlx::query(
            "INSERT INTO note (id, user_id, folder_id, title, content, created_at_utc, updated_at_utc)
             VALUES ($1, $2, $3, $4, $5, $6, $6)",
        )
        .bind(id)
        .bind(user_id)
        .bind(draft.folder_id)
        .bind(&draft.title)
        .bind(&draft.content)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        Self::replace_tags_tx(&mut tx, id, &draft.tags).await?;

        let note = Self::fetch_tx(&mut tx, user_id, id)
            .await?
            .ok_or_else(|| Error::Internal(format!("note {} vanished after insert", id)))?;

        tx.commit().await.map_err(Error::Database)?;

        debug!(
            subsystem = "database",
            component = "notes",
            op = "insert",
            note_id = %id,
            tag_count = draft.tags.len(),
            "Note inserted"
        );
        Ok(note)
    }

    async fn update(&self, user_id: Uuid, id: Uuid, draft: &NoteDraft) -> Result<Option<Note>> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let updated = sqlx::query(
            "UPDATE note SET title = $1, content = $2, folder_id = $3, updated_at_utc = $4
             WHERE id = $5 AND user_id = $6",
        )
        .bind(&draft.title)
        .bind(&draft.content)
        .bind(draft.folder_id)
        .bind(Utc::now())
        .bind(id)
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        if updated.rows_affected() == 0 {
            tx.rollback().await.map_err(Error::Database)?;
            return Ok(None);
        }

        Self::replace_tags_tx(&mut tx, id, &draft.tags).await?;
        let note = Self::fetch_tx(&mut tx, user_id, id).await?;

        tx.commit().await.map_err(Error::Database)?;
        Ok(note)
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM note WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(result.rows_affected() > 0)
    }
}
