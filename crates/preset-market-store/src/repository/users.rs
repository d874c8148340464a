use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::database::{now, parse_optional_timestamp, parse_timestamp};
use crate::entities::{ProviderProfile, User, UserId};
use crate::error::{Result, StoreError};

/// Users keyed by their OAuth provider identity
pub struct UserRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> UserRepository<'a> {
    pub(crate) fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn find(&self, id: UserId) -> Result<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT id, github_id, username, avatar_url, email, created_at, updated_at
            FROM users
            WHERE id = ?
        "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(StoreError::storage("Failed to get user"))?;

        row.as_ref().map(user_from_row).transpose()
    }

    pub async fn find_by_github_id(&self, github_id: i64) -> Result<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT id, github_id, username, avatar_url, email, created_at, updated_at
            FROM users
            WHERE github_id = ?
        "#,
        )
        .bind(github_id)
        .fetch_optional(self.pool)
        .await
        .map_err(StoreError::storage("Failed to get user by provider id"))?;

        row.as_ref().map(user_from_row).transpose()
    }

    /// Create the user for a provider identity or refresh the stored profile.
    ///
    /// Username and avatar always follow the provider; the email is only
    /// replaced when the provider returned one.
    pub async fn upsert_from_provider(&self, profile: &ProviderProfile) -> Result<User> {
        let timestamp = now()?;

        sqlx::query(
            r#"
            INSERT INTO users (github_id, username, avatar_url, email, created_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT (github_id) DO UPDATE SET
                username = excluded.username,
                avatar_url = excluded.avatar_url,
                email = COALESCE(excluded.email, users.email),
                updated_at = ?
        "#,
        )
        .bind(profile.github_id)
        .bind(&profile.username)
        .bind(&profile.avatar_url)
        .bind(&profile.email)
        .bind(&timestamp)
        .bind(&timestamp)
        .execute(self.pool)
        .await
        .map_err(StoreError::storage("Failed to save user"))?;

        self.find_by_github_id(profile.github_id)
            .await?
            .ok_or_else(|| StoreError::Storage("User vanished after upsert".to_string()))
    }
}

fn user_from_row(row: &SqliteRow) -> Result<User> {
    let created_at: String = row.get("created_at");
    Ok(User {
        id: row.get("id"),
        github_id: row.get("github_id"),
        username: row.get("username"),
        avatar_url: row.get("avatar_url"),
        email: row.get("email"),
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_optional_timestamp(row.get("updated_at"))?,
    })
}
