use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use super::author_from_row;
use crate::database::{now, parse_optional_timestamp, parse_timestamp};
use crate::entities::{
    Comment, CommentId, CommentWithAuthor, Page, PageRequest, PresetId, UserId,
};
use crate::error::{Result, StoreError};

const COMMENT_COLUMNS: &str = r#"
    c.id, c.content, c.preset_id, c.author_id, c.created_at, c.updated_at,
    u.username AS author_username, u.avatar_url AS author_avatar_url
"#;

/// Comments and the comment counter they drive
pub struct CommentRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> CommentRepository<'a> {
    pub(crate) fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Comments on a preset, newest first
    pub async fn list_for_preset(
        &self,
        preset_id: PresetId,
        page: PageRequest,
    ) -> Result<Page<CommentWithAuthor>> {
        let total: i64 = sqlx::query("SELECT COUNT(*) AS total FROM comments WHERE preset_id = ?")
            .bind(preset_id)
            .fetch_one(self.pool)
            .await
            .map_err(StoreError::storage("Failed to count comments"))?
            .get("total");

        let sql = format!(
            "SELECT {} FROM comments c JOIN users u ON u.id = c.author_id WHERE c.preset_id = ? ORDER BY c.created_at DESC, c.id DESC LIMIT ? OFFSET ?",
            COMMENT_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(preset_id)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(self.pool)
            .await
            .map_err(StoreError::storage("Failed to list comments"))?;

        let items = rows
            .iter()
            .map(comment_with_author_from_row)
            .collect::<Result<Vec<_>>>()?;

        Ok(Page {
            items,
            total,
            request: page,
        })
    }

    /// Add a comment and bump the preset's comment counter.
    ///
    /// The counter is bumped first so a missing preset is reported before
    /// the insert trips the foreign key.
    pub async fn create(
        &self,
        preset_id: PresetId,
        author_id: UserId,
        content: &str,
    ) -> Result<CommentWithAuthor> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(StoreError::storage("Failed to begin transaction"))?;

        let bumped = sqlx::query("UPDATE presets SET comment_count = comment_count + 1 WHERE id = ?")
            .bind(preset_id)
            .execute(&mut *tx)
            .await
            .map_err(StoreError::storage("Failed to update comment count"))?;
        if bumped.rows_affected() == 0 {
            return Err(StoreError::PresetNotFound(preset_id));
        }

        let id = sqlx::query(
            "INSERT INTO comments (content, preset_id, author_id, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(content)
        .bind(preset_id)
        .bind(author_id)
        .bind(now()?)
        .execute(&mut *tx)
        .await
        .map_err(StoreError::storage("Failed to insert comment"))?
        .last_insert_rowid();

        tx.commit()
            .await
            .map_err(StoreError::storage("Failed to commit comment"))?;

        self.find_with_author(id)
            .await?
            .ok_or(StoreError::CommentNotFound(id))
    }

    pub async fn find(&self, id: CommentId) -> Result<Option<Comment>> {
        let row = sqlx::query(
            "SELECT id, content, preset_id, author_id, created_at, updated_at FROM comments WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(StoreError::storage("Failed to get comment"))?;

        row.as_ref().map(comment_from_row).transpose()
    }

    pub async fn find_with_author(&self, id: CommentId) -> Result<Option<CommentWithAuthor>> {
        let sql = format!(
            "SELECT {} FROM comments c JOIN users u ON u.id = c.author_id WHERE c.id = ?",
            COMMENT_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(StoreError::storage("Failed to get comment"))?;

        row.as_ref().map(comment_with_author_from_row).transpose()
    }

    /// Remove a comment and decrement its preset's counter, never below zero
    pub async fn delete(&self, id: CommentId) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(StoreError::storage("Failed to begin transaction"))?;

        let preset_id: PresetId = sqlx::query("DELETE FROM comments WHERE id = ? RETURNING preset_id")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(StoreError::storage("Failed to delete comment"))?
            .ok_or(StoreError::CommentNotFound(id))?
            .get("preset_id");

        sqlx::query("UPDATE presets SET comment_count = MAX(comment_count - 1, 0) WHERE id = ?")
            .bind(preset_id)
            .execute(&mut *tx)
            .await
            .map_err(StoreError::storage("Failed to update comment count"))?;

        tx.commit()
            .await
            .map_err(StoreError::storage("Failed to commit comment deletion"))?;

        Ok(())
    }
}

fn comment_from_row(row: &SqliteRow) -> Result<Comment> {
    let created_at: String = row.get("created_at");
    Ok(Comment {
        id: row.get("id"),
        content: row.get("content"),
        preset_id: row.get("preset_id"),
        author_id: row.get("author_id"),
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_optional_timestamp(row.get("updated_at"))?,
    })
}

fn comment_with_author_from_row(row: &SqliteRow) -> Result<CommentWithAuthor> {
    Ok(CommentWithAuthor {
        comment: comment_from_row(row)?,
        author: author_from_row(row),
    })
}
