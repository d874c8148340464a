use std::collections::HashSet;

use sqlx::{Row, SqlitePool};

use crate::database::now;
use crate::entities::{LikeState, PresetId, UserId};
use crate::error::{Result, StoreError};

/// The like join table and the like counter it drives
pub struct LikeRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> LikeRepository<'a> {
    pub(crate) fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Flip the like of `user_id` on `preset_id`.
    ///
    /// The join row and the counter change in one transaction; the counter
    /// is adjusted in SQL and never drops below zero.
    pub async fn toggle(&self, preset_id: PresetId, user_id: UserId) -> Result<LikeState> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(StoreError::storage("Failed to begin transaction"))?;

        sqlx::query("SELECT 1 FROM presets WHERE id = ?")
            .bind(preset_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(StoreError::storage("Failed to get preset"))?
            .ok_or(StoreError::PresetNotFound(preset_id))?;

        let removed = sqlx::query("DELETE FROM likes WHERE preset_id = ? AND user_id = ?")
            .bind(preset_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(StoreError::storage("Failed to remove like"))?
            .rows_affected()
            > 0;

        let counter_sql = if removed {
            "UPDATE presets SET like_count = MAX(like_count - 1, 0) WHERE id = ? RETURNING like_count"
        } else {
            sqlx::query("INSERT INTO likes (preset_id, user_id, created_at) VALUES (?, ?, ?)")
                .bind(preset_id)
                .bind(user_id)
                .bind(now()?)
                .execute(&mut *tx)
                .await
                .map_err(StoreError::storage("Failed to add like"))?;
            "UPDATE presets SET like_count = like_count + 1 WHERE id = ? RETURNING like_count"
        };

        let like_count: i64 = sqlx::query(counter_sql)
            .bind(preset_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(StoreError::storage("Failed to update like count"))?
            .ok_or(StoreError::PresetNotFound(preset_id))?
            .get("like_count");

        tx.commit()
            .await
            .map_err(StoreError::storage("Failed to commit like"))?;

        Ok(LikeState {
            liked: !removed,
            like_count,
        })
    }

    pub async fn is_liked(&self, preset_id: PresetId, user_id: UserId) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM likes WHERE preset_id = ? AND user_id = ?")
            .bind(preset_id)
            .bind(user_id)
            .fetch_optional(self.pool)
            .await
            .map_err(StoreError::storage("Failed to check like"))?;
        Ok(row.is_some())
    }

    /// Ids of every preset `user_id` has liked
    pub async fn liked_preset_ids(&self, user_id: UserId) -> Result<HashSet<PresetId>> {
        let rows = sqlx::query("SELECT preset_id FROM likes WHERE user_id = ?")
            .bind(user_id)
            .fetch_all(self.pool)
            .await
            .map_err(StoreError::storage("Failed to list likes"))?;

        Ok(rows.iter().map(|row| row.get("preset_id")).collect())
    }

    /// Number of like rows for a preset, counted from the join table
    pub async fn count_for_preset(&self, preset_id: PresetId) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS total FROM likes WHERE preset_id = ?")
            .bind(preset_id)
            .fetch_one(self.pool)
            .await
            .map_err(StoreError::storage("Failed to count likes"))?;
        Ok(row.get("total"))
    }
}
