use preset_market_store::{AuthorSummary, CommentId, CommentWithAuthor, PresetId};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct CommentResponse {
    pub id: CommentId,
    pub content: String,
    pub preset_id: PresetId,
    pub author: AuthorSummary,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

impl From<CommentWithAuthor> for CommentResponse {
    fn from(record: CommentWithAuthor) -> Self {
        let CommentWithAuthor { comment, author } = record;
        Self {
            id: comment.id,
            content: comment.content,
            preset_id: comment.preset_id,
            author,
            created_at: comment.created_at,
            updated_at: comment.updated_at,
        }
    }
}
