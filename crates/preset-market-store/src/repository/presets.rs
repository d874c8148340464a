use preset_market::slug::{slug_candidates, slugify};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use super::author_from_row;
use crate::database::{now, parse_optional_timestamp, parse_timestamp};
use crate::entities::{
    NewPreset, Page, PageRequest, Preset, PresetChanges, PresetId, PresetSort, PresetWithAuthor,
    UserId,
};
use crate::error::{Result, StoreError};

const PRESET_COLUMNS: &str = r#"
    p.id, p.name, p.slug, p.description, p.layout, p.preview_image, p.author_id,
    p.download_count, p.like_count, p.comment_count, p.is_public, p.created_at, p.updated_at,
    u.username AS author_username, u.avatar_url AS author_avatar_url
"#;

/// Presets and their counters
pub struct PresetRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> PresetRepository<'a> {
    pub(crate) fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a preset under a fresh slug derived from its name.
    ///
    /// Candidates `slug`, `slug-1`, `slug-2`, ... are checked in turn. The
    /// unique index on `slug` catches a concurrent insert that wins between
    /// the check and the insert, in which case the next candidate is tried.
    pub async fn create(&self, preset: NewPreset) -> Result<PresetWithAuthor> {
        let base = slugify(&preset.name);
        let layout = serde_json::to_string(&preset.layout)?;

        for candidate in slug_candidates(&base) {
            if self.slug_exists(&candidate).await? {
                continue;
            }

            let timestamp = now()?;
            let inserted = sqlx::query(
                r#"
                INSERT INTO presets
                (name, slug, description, layout, preview_image, author_id, is_public, created_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            )
            .bind(&preset.name)
            .bind(&candidate)
            .bind(&preset.description)
            .bind(&layout)
            .bind(&preset.preview_image)
            .bind(preset.author_id)
            .bind(preset.is_public)
            .bind(&timestamp)
            .execute(self.pool)
            .await;

            match inserted {
                Ok(result) => {
                    let id = result.last_insert_rowid();
                    debug!("Created preset {} with slug {}", id, candidate);
                    return self.find(id).await?.ok_or(StoreError::PresetNotFound(id));
                }
                Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                    debug!("Slug {} taken concurrently, trying next", candidate);
                    continue;
                }
                Err(e) => return Err(StoreError::storage("Failed to insert preset")(e)),
            }
        }

        Err(StoreError::SlugTaken(base))
    }

    pub async fn slug_exists(&self, slug: &str) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM presets WHERE slug = ?")
            .bind(slug)
            .fetch_optional(self.pool)
            .await
            .map_err(StoreError::storage("Failed to check slug"))?;
        Ok(row.is_some())
    }

    pub async fn find(&self, id: PresetId) -> Result<Option<PresetWithAuthor>> {
        let sql = format!(
            "SELECT {} FROM presets p JOIN users u ON u.id = p.author_id WHERE p.id = ?",
            PRESET_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(StoreError::storage("Failed to get preset"))?;

        row.as_ref().map(preset_with_author_from_row).transpose()
    }

    /// Public presets, optionally filtered by a case-insensitive substring of
    /// the name
    pub async fn list_public(
        &self,
        search: Option<&str>,
        sort: PresetSort,
        page: PageRequest,
    ) -> Result<Page<PresetWithAuthor>> {
        let pattern = search
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", escape_like(s)));

        let filter = if pattern.is_some() {
            "p.is_public = 1 AND p.name LIKE ? ESCAPE '\\'"
        } else {
            "p.is_public = 1"
        };

        let count_sql = format!("SELECT COUNT(*) AS total FROM presets p WHERE {}", filter);
        let mut count_query = sqlx::query(&count_sql);
        if let Some(pattern) = &pattern {
            count_query = count_query.bind(pattern);
        }
        let total: i64 = count_query
            .fetch_one(self.pool)
            .await
            .map_err(StoreError::storage("Failed to count presets"))?
            .get("total");

        let list_sql = format!(
            "SELECT {} FROM presets p JOIN users u ON u.id = p.author_id WHERE {} ORDER BY {} LIMIT ? OFFSET ?",
            PRESET_COLUMNS,
            filter,
            sort.order_by()
        );
        let mut list_query = sqlx::query(&list_sql);
        if let Some(pattern) = &pattern {
            list_query = list_query.bind(pattern);
        }
        let rows = list_query
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(self.pool)
            .await
            .map_err(StoreError::storage("Failed to list presets"))?;

        let items = rows
            .iter()
            .map(preset_with_author_from_row)
            .collect::<Result<Vec<_>>>()?;

        Ok(Page {
            items,
            total,
            request: page,
        })
    }

    /// Every preset owned by `author_id`, newest first, whatever its visibility
    pub async fn list_by_author(&self, author_id: UserId) -> Result<Vec<PresetWithAuthor>> {
        let sql = format!(
            "SELECT {} FROM presets p JOIN users u ON u.id = p.author_id WHERE p.author_id = ? ORDER BY p.created_at DESC, p.id DESC",
            PRESET_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(author_id)
            .fetch_all(self.pool)
            .await
            .map_err(StoreError::storage("Failed to list presets by author"))?;

        rows.iter().map(preset_with_author_from_row).collect()
    }

    /// Apply a partial update; the slug never changes
    pub async fn update(&self, id: PresetId, changes: PresetChanges) -> Result<PresetWithAuthor> {
        let layout = changes
            .layout
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let result = sqlx::query(
            r#"
            UPDATE presets SET
                name = COALESCE(?, name),
                description = COALESCE(?, description),
                layout = COALESCE(?, layout),
                preview_image = COALESCE(?, preview_image),
                is_public = COALESCE(?, is_public),
                updated_at = ?
            WHERE id = ?
        "#,
        )
        .bind(&changes.name)
        .bind(&changes.description)
        .bind(&layout)
        .bind(&changes.preview_image)
        .bind(changes.is_public)
        .bind(now()?)
        .bind(id)
        .execute(self.pool)
        .await
        .map_err(StoreError::storage("Failed to update preset"))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::PresetNotFound(id));
        }

        self.find(id).await?.ok_or(StoreError::PresetNotFound(id))
    }

    /// Delete a preset together with its comments and likes
    pub async fn delete(&self, id: PresetId) -> Result<()> {
        let result = sqlx::query("DELETE FROM presets WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(StoreError::storage("Failed to delete preset"))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::PresetNotFound(id));
        }

        Ok(())
    }

    /// Bump the download counter and return the new value
    pub async fn record_download(&self, id: PresetId) -> Result<i64> {
        let row = sqlx::query(
            "UPDATE presets SET download_count = download_count + 1 WHERE id = ? RETURNING download_count",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(StoreError::storage("Failed to record download"))?;

        row.map(|r| r.get("download_count"))
            .ok_or(StoreError::PresetNotFound(id))
    }
}

fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

pub(crate) fn preset_from_row(row: &SqliteRow) -> Result<Preset> {
    let layout: String = row.get("layout");
    let created_at: String = row.get("created_at");
    Ok(Preset {
        id: row.get("id"),
        name: row.get("name"),
        slug: row.get("slug"),
        description: row.get("description"),
        layout: serde_json::from_str(&layout)?,
        preview_image: row.get("preview_image"),
        author_id: row.get("author_id"),
        download_count: row.get("download_count"),
        like_count: row.get("like_count"),
        comment_count: row.get("comment_count"),
        is_public: row.get("is_public"),
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_optional_timestamp(row.get("updated_at"))?,
    })
}

fn preset_with_author_from_row(row: &SqliteRow) -> Result<PresetWithAuthor> {
    Ok(PresetWithAuthor {
        preset: preset_from_row(row)?,
        author: author_from_row(row),
    })
}
