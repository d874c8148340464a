//! Repository functions over plain records
//!
//! Each repository borrows the shared pool; obtain them through
//! [`Database`](crate::Database).

mod comments;
mod likes;
mod presets;
mod users;

pub use comments::CommentRepository;
pub use likes::LikeRepository;
pub use presets::PresetRepository;
pub use users::UserRepository;

use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::entities::AuthorSummary;

/// Read the `author_*` columns produced by the author join
pub(crate) fn author_from_row(row: &SqliteRow) -> AuthorSummary {
    AuthorSummary {
        id: row.get("author_id"),
        username: row.get("author_username"),
        avatar_url: row.get("author_avatar_url"),
    }
}
