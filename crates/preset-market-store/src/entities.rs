//! Plain records stored in the preset-market database

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

pub type UserId = i64;
pub type PresetId = i64;
pub type CommentId = i64;

/// A user known through the OAuth provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,

    /// Identifier assigned by the OAuth provider
    pub github_id: i64,

    pub username: String,
    pub avatar_url: Option<String>,
    pub email: Option<String>,

    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,

    #[serde(with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

/// Identity reported by the OAuth provider after a successful login
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderProfile {
    pub github_id: i64,
    pub username: String,
    pub avatar_url: Option<String>,
    pub email: Option<String>,
}

/// The public face of a user attached to presets and comments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorSummary {
    pub id: UserId,
    pub username: String,
    pub avatar_url: Option<String>,
}

impl From<&User> for AuthorSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            avatar_url: user.avatar_url.clone(),
        }
    }
}

/// A shared layout document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub id: PresetId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,

    /// Opaque layout object, returned verbatim
    pub layout: serde_json::Value,

    /// Public path of the preview image
    pub preview_image: Option<String>,

    pub author_id: UserId,
    pub download_count: i64,
    pub like_count: i64,
    pub comment_count: i64,
    pub is_public: bool,

    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,

    #[serde(with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

/// A preset joined with its author
#[derive(Debug, Clone, PartialEq)]
pub struct PresetWithAuthor {
    pub preset: Preset,
    pub author: AuthorSummary,
}

/// Everything needed to insert a preset; the slug is derived on insert
#[derive(Debug, Clone)]
pub struct NewPreset {
    pub name: String,
    pub description: Option<String>,
    pub layout: serde_json::Value,
    pub preview_image: Option<String>,
    pub author_id: UserId,
    pub is_public: bool,
}

/// Partial update of a preset; `None` leaves a column untouched
#[derive(Debug, Clone, Default)]
pub struct PresetChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub layout: Option<serde_json::Value>,
    pub preview_image: Option<String>,
    pub is_public: Option<bool>,
}

/// A comment on a preset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub content: String,
    pub preset_id: PresetId,
    pub author_id: UserId,

    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,

    #[serde(with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

/// A comment joined with its author
#[derive(Debug, Clone, PartialEq)]
pub struct CommentWithAuthor {
    pub comment: Comment,
    pub author: AuthorSummary,
}

/// State of a like after a toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LikeState {
    pub liked: bool,
    pub like_count: i64,
}

/// Ordering of the public preset list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresetSort {
    /// Newest first
    #[default]
    Latest,
    /// Most downloaded first
    Popular,
    /// Most liked first
    Likes,
}

impl PresetSort {
    pub(crate) fn order_by(self) -> &'static str {
        match self {
            PresetSort::Latest => "p.created_at DESC, p.id DESC",
            PresetSort::Popular => "p.download_count DESC, p.id DESC",
            PresetSort::Likes => "p.like_count DESC, p.id DESC",
        }
    }
}

/// 1-indexed page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    pub const DEFAULT_PAGE_SIZE: u32 = 20;
    pub const MAX_PAGE_SIZE: u32 = 100;

    /// Build a page request, clamping `page` to at least 1 and `page_size`
    /// into `1..=MAX_PAGE_SIZE`
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.clamp(1, Self::MAX_PAGE_SIZE),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.page_size as i64
    }

    pub fn limit(&self) -> i64 {
        self.page_size as i64
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, Self::DEFAULT_PAGE_SIZE)
    }
}

/// One page of results plus the total matching row count
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub request: PageRequest,
}
