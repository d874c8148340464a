//! Preset-market core: everything about presets that does not need a database.
//!
//! - [`render`] turns a layout into a PNG preview
//! - [`slug`] derives URL slugs from preset names
//! - [`export`] builds the JSON document handed to the plugin on download

pub mod color;
pub mod error;
pub mod export;
pub mod layout;
pub mod render;
pub mod slug;

// Re-export core types
pub use error::{ExportError, PreviewError, Result};
pub use export::PresetDocument;
pub use layout::PreviewLayout;
pub use render::{DEFAULT_PREVIEW_PATH, PreviewOutcome, PreviewRenderer, preview_file_name};
pub use slug::{slug_candidates, slugify};

/// Get the library version
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
