//! Download documents
//!
//! A downloaded preset is a small JSON document the plugin can load directly.
//! It can be returned to the client or dropped into the plugin's data
//! directory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::macros::format_description;

use crate::error::ExportError;

/// Subdirectory of the plugin data directory holding preset files
pub const PLUGIN_PRESET_SUBDIR: &str = "presets";

/// The JSON artifact handed to the plugin
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PresetDocument {
    pub name: String,
    pub slug: String,
    /// UTC, second precision, trailing `Z`
    pub saved_at: String,
    pub layout: serde_json::Value,
}

impl PresetDocument {
    /// Build a document stamped with the current time
    pub fn new(
        name: impl Into<String>,
        slug: impl Into<String>,
        layout: serde_json::Value,
    ) -> Result<Self, ExportError> {
        Self::saved_at(name, slug, layout, OffsetDateTime::now_utc())
    }

    /// Build a document stamped with `at`, converted to UTC
    pub fn saved_at(
        name: impl Into<String>,
        slug: impl Into<String>,
        layout: serde_json::Value,
        at: OffsetDateTime,
    ) -> Result<Self, ExportError> {
        let saved_at = at
            .to_offset(time::UtcOffset::UTC)
            .format(format_description!(
                "[year]-[month]-[day]T[hour]:[minute]:[second]Z"
            ))?;
        Ok(Self {
            name: name.into(),
            slug: slug.into(),
            saved_at,
            layout,
        })
    }

    /// File name used for downloads and the plugin directory
    pub fn file_name(&self) -> String {
        format!("{}.json", self.slug)
    }

    /// Pretty-printed JSON with two-space indentation
    pub fn to_pretty_json(&self) -> Result<String, ExportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the document to `<plugin_dir>/presets/<slug>.json`, creating
    /// directories as needed, and return the written path
    pub fn write_to_plugin_dir(&self, plugin_dir: &Path) -> Result<PathBuf, ExportError> {
        let preset_dir = plugin_dir.join(PLUGIN_PRESET_SUBDIR);
        std::fs::create_dir_all(&preset_dir).map_err(|e| ExportError::from_io(&preset_dir, e))?;

        let file_path = preset_dir.join(self.file_name());
        let contents = self.to_pretty_json()?;
        std::fs::write(&file_path, contents).map_err(|e| ExportError::from_io(&file_path, e))?;

        Ok(file_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::datetime;

    #[test]
    fn saved_at_is_utc_with_trailing_z() {
        let doc = PresetDocument::saved_at(
            "Night",
            "night",
            json!({}),
            datetime!(2024-03-01 10:20:30.987 +02:00),
        )
        .unwrap();
        assert_eq!(doc.saved_at, "2024-03-01T08:20:30Z");
    }

    #[test]
    fn field_order_matches_plugin_format() {
        let doc =
            PresetDocument::saved_at("N", "n", json!({"k": 1}), datetime!(2024-01-01 0:00 UTC))
                .unwrap();
        let text = doc.to_pretty_json().unwrap();
        let name_at = text.find("\"name\"").unwrap();
        let slug_at = text.find("\"slug\"").unwrap();
        let saved_at = text.find("\"saved_at\"").unwrap();
        let layout_at = text.find("\"layout\"").unwrap();
        assert!(name_at < slug_at && slug_at < saved_at && saved_at < layout_at);
        assert!(text.contains("\n  \"name\": \"N\""));
    }
}
