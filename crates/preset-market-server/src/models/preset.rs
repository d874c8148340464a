//! Preset request and response types

use preset_market_store::{AuthorSummary, PresetId, PresetSort, PresetWithAuthor};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::api::{default_page, default_page_size};

/// Query parameters of the public preset list
#[derive(Debug, Deserialize)]
pub struct PresetListQuery {
    #[serde(default = "default_page")]
    pub page: u32,

    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Case-insensitive substring of the name
    pub search: Option<String>,

    #[serde(default)]
    pub sort: PresetSort,
}

#[derive(Debug, Deserialize)]
pub struct CreatePresetRequest {
    pub name: String,
    pub description: Option<String>,
    pub layout: serde_json::Value,
    #[serde(default = "default_public")]
    pub is_public: bool,
}

fn default_public() -> bool {
    true
}

/// Partial update; absent fields are left untouched
#[derive(Debug, Default, Deserialize)]
pub struct UpdatePresetRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub layout: Option<serde_json::Value>,
    pub is_public: Option<bool>,
}

/// A preset as shown in lists
#[derive(Debug, Serialize)]
pub struct PresetSummary {
    pub id: PresetId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub preview_image: Option<String>,
    pub author: AuthorSummary,
    pub download_count: i64,
    pub like_count: i64,
    pub comment_count: i64,
    pub is_liked: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl PresetSummary {
    pub fn new(record: PresetWithAuthor, is_liked: bool) -> Self {
        let PresetWithAuthor { preset, author } = record;
        Self {
            id: preset.id,
            name: preset.name,
            slug: preset.slug,
            description: preset.description,
            preview_image: preset.preview_image,
            author,
            download_count: preset.download_count,
            like_count: preset.like_count,
            comment_count: preset.comment_count,
            is_liked,
            created_at: preset.created_at,
        }
    }
}

/// Full preset view
#[derive(Debug, Serialize)]
pub struct PresetDetails {
    #[serde(flatten)]
    pub summary: PresetSummary,
    pub layout: serde_json::Value,
    pub is_owner: bool,
    #[serde(with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

impl PresetDetails {
    pub fn new(mut record: PresetWithAuthor, is_liked: bool, is_owner: bool) -> Self {
        let layout = std::mem::take(&mut record.preset.layout);
        let updated_at = record.preset.updated_at;
        Self {
            summary: PresetSummary::new(record, is_liked),
            layout,
            is_owner,
            updated_at,
        }
    }
}

/// A preset in the owner's own list, private ones included
#[derive(Debug, Serialize)]
pub struct OwnedPreset {
    #[serde(flatten)]
    pub summary: PresetSummary,
    pub is_public: bool,
}

#[derive(Debug, Serialize)]
pub struct CreatePresetResponse {
    pub id: PresetId,
    pub name: String,
    pub slug: String,
    pub preview_image: Option<String>,
    pub message: String,
}

/// Response when the download was written into the plugin directory
#[derive(Debug, Serialize)]
pub struct PluginSaveResponse {
    pub message: String,
    pub path: String,
    pub preset: preset_market::PresetDocument,
}
