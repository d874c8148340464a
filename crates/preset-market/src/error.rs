//! Error types for the preset-market library
//!
//! Preview failures never reach HTTP clients: the renderer folds them into a
//! fallback outcome. They still carry enough detail to be logged.

use thiserror::Error;

/// Errors raised while turning a layout into a preview image
#[derive(Error, Debug)]
pub enum PreviewError {
    /// The layout value is not a JSON object or a field has the wrong type
    #[error("Invalid layout: {reason}")]
    InvalidLayout { reason: String },

    /// A field holds a value outside of what can be drawn
    #[error("Invalid layout field {field}: {reason}")]
    InvalidField { field: String, reason: String },

    /// A color string could not be understood
    #[error("Invalid color value: {value:?}")]
    InvalidColor { value: String },

    #[error("Font unusable: {reason}")]
    Font { reason: String },

    #[error("Image encoding failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PreviewError {
    pub(crate) fn field<F: Into<String>, R: Into<String>>(field: F, reason: R) -> Self {
        Self::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn color<S: Into<String>>(value: S) -> Self {
        Self::InvalidColor {
            value: value.into(),
        }
    }
}

impl From<serde_json::Error> for PreviewError {
    fn from(error: serde_json::Error) -> Self {
        PreviewError::InvalidLayout {
            reason: error.to_string(),
        }
    }
}

/// Errors raised while exporting a preset document to disk
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Permission denied writing {path}")]
    PermissionDenied { path: String },

    #[error("Failed to write {path}: {reason}")]
    WriteError { path: String, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Time formatting error: {0}")]
    Time(#[from] time::error::Format),
}

impl ExportError {
    pub(crate) fn from_io(path: &std::path::Path, error: std::io::Error) -> Self {
        let path = path.display().to_string();
        match error.kind() {
            std::io::ErrorKind::PermissionDenied => ExportError::PermissionDenied { path },
            _ => ExportError::WriteError {
                path,
                reason: error.to_string(),
            },
        }
    }
}

/// Shorthand result type for preview operations
pub type Result<T> = std::result::Result<T, PreviewError>;
