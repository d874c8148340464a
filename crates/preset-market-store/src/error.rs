//! Error types for preset-market storage

use thiserror::Error;

/// Storage-specific errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("User not found: {0}")]
    UserNotFound(i64),

    #[error("Preset not found: {0}")]
    PresetNotFound(i64),

    #[error("Comment not found: {0}")]
    CommentNotFound(i64),

    #[error("Slug already taken: {0}")]
    SlugTaken(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Time error: {0}")]
    Time(String),
}

impl StoreError {
    /// Map a sqlx error into a storage error with some context
    pub(crate) fn storage(context: &'static str) -> impl FnOnce(sqlx::Error) -> StoreError {
        move |e| StoreError::Storage(format!("{}: {}", context, e))
    }
}

/// Result type for storage operations
pub type Result<T> = std::result::Result<T, StoreError>;
