//! SQLite connection handling and schema bootstrap
//!
//! Timestamps are stored as fixed-width UTC text so that ordering by the
//! column matches chronological order.

use std::str::FromStr;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::repository::{CommentRepository, LikeRepository, PresetRepository, UserRepository};

const TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] = format_description!(
    "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:6]Z"
);

const SCHEMA: &[(&str, &str)] = &[
    (
        "users table",
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            github_id INTEGER NOT NULL UNIQUE,
            username TEXT NOT NULL,
            avatar_url TEXT,
            email TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT
        )
        "#,
    ),
    (
        "presets table",
        r#"
        CREATE TABLE IF NOT EXISTS presets (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            slug TEXT NOT NULL UNIQUE,
            description TEXT,
            layout TEXT NOT NULL,                -- JSON
            preview_image TEXT,
            author_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            download_count INTEGER NOT NULL DEFAULT 0,
            like_count INTEGER NOT NULL DEFAULT 0,
            comment_count INTEGER NOT NULL DEFAULT 0,
            is_public INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            updated_at TEXT
        )
        "#,
    ),
    (
        "comments table",
        r#"
        CREATE TABLE IF NOT EXISTS comments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            content TEXT NOT NULL,
            preset_id INTEGER NOT NULL REFERENCES presets(id) ON DELETE CASCADE,
            author_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            created_at TEXT NOT NULL,
            updated_at TEXT
        )
        "#,
    ),
    (
        "likes table",
        r#"
        CREATE TABLE IF NOT EXISTS likes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            preset_id INTEGER NOT NULL REFERENCES presets(id) ON DELETE CASCADE,
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            created_at TEXT NOT NULL,
            UNIQUE (preset_id, user_id)
        )
        "#,
    ),
    (
        "presets listing index",
        "CREATE INDEX IF NOT EXISTS idx_presets_public_created ON presets(is_public, created_at)",
    ),
    (
        "presets author index",
        "CREATE INDEX IF NOT EXISTS idx_presets_author ON presets(author_id)",
    ),
    (
        "comments preset index",
        "CREATE INDEX IF NOT EXISTS idx_comments_preset ON comments(preset_id, created_at)",
    ),
    (
        "likes user index",
        "CREATE INDEX IF NOT EXISTS idx_likes_user ON likes(user_id)",
    ),
];

/// Handle to the preset-market database
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connect to the SQLite database at `database_url` and make sure the
    /// schema exists.
    ///
    /// Example: `sqlite:./data/preset_market.db`
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| StoreError::Storage(format!("Invalid database URL: {}", e)))?
            .create_if_missing(true)
            .foreign_keys(true);

        let mut pool_options = SqlitePoolOptions::new();
        if database_url.contains(":memory:") {
            // Every connection to an in-memory database is a separate database
            pool_options = pool_options
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        } else {
            ensure_parent_dir(database_url).await?;
        }

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(StoreError::storage("Failed to connect to SQLite"))?;

        let database = Self { pool };
        database.init_schema().await?;
        Ok(database)
    }

    /// A private in-memory database
    pub async fn in_memory() -> Result<Self> {
        Self::connect("sqlite::memory:").await
    }

    async fn init_schema(&self) -> Result<()> {
        for (what, statement) in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| StoreError::Storage(format!("Failed to create {}: {}", what, e)))?;
        }
        debug!("Database schema ready");
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn users(&self) -> UserRepository<'_> {
        UserRepository::new(&self.pool)
    }

    pub fn presets(&self) -> PresetRepository<'_> {
        PresetRepository::new(&self.pool)
    }

    pub fn comments(&self) -> CommentRepository<'_> {
        CommentRepository::new(&self.pool)
    }

    pub fn likes(&self) -> LikeRepository<'_> {
        LikeRepository::new(&self.pool)
    }
}

async fn ensure_parent_dir(database_url: &str) -> Result<()> {
    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:");
    let path = path.split('?').next().unwrap_or_default();
    if let Some(parent) = std::path::Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                StoreError::Storage(format!("Failed to create database directory: {}", e))
            })?;
        }
    }
    Ok(())
}

pub(crate) fn format_timestamp(at: OffsetDateTime) -> Result<String> {
    at.to_offset(time::UtcOffset::UTC)
        .format(TIMESTAMP_FORMAT)
        .map_err(|e| StoreError::Time(format!("Failed to format timestamp: {}", e)))
}

pub(crate) fn parse_timestamp(value: &str) -> Result<OffsetDateTime> {
    PrimitiveDateTime::parse(value, TIMESTAMP_FORMAT)
        .map(PrimitiveDateTime::assume_utc)
        .map_err(|e| StoreError::Time(format!("Failed to parse timestamp {:?}: {}", value, e)))
}

pub(crate) fn parse_optional_timestamp(value: Option<String>) -> Result<Option<OffsetDateTime>> {
    value.as_deref().map(parse_timestamp).transpose()
}

pub(crate) fn now() -> Result<String> {
    format_timestamp(OffsetDateTime::now_utc())
}
