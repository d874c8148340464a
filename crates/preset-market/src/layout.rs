//! The subset of a preset layout that the preview renderer understands
//!
//! A layout is an opaque JSON object owned by the plugin. Only the fields
//! below influence the preview; everything else is ignored.

use serde::Deserialize;

use crate::error::{PreviewError, Result};

/// Largest canvas edge the renderer agrees to allocate
pub const MAX_CANVAS_EDGE: u32 = 8192;

/// Largest font size, in pixels, the renderer agrees to rasterize
pub const MAX_FONT_SIZE: f32 = 2048.0;

/// Offsets are pinned to this range; anything beyond it lies off every
/// allowed canvas even with a maximal box
const MAX_OFFSET: f64 = 2.0 * MAX_CANVAS_EDGE as f64;

/// Preview-relevant view of a layout, with the plugin's defaults applied
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PreviewLayout {
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub background_color: String,
    pub box_left: f64,
    pub box_top: f64,
    /// Defaults to the canvas width
    pub box_width: Option<f64>,
    /// Defaults to the canvas height
    pub box_height: Option<f64>,
    pub text_bg: String,
    pub text_color: String,
    pub font_size: f32,
    /// Path to a font file on the server
    pub body_font: Option<String>,
    pub padding: f64,
}

impl Default for PreviewLayout {
    fn default() -> Self {
        Self {
            canvas_width: 1600,
            canvas_height: 600,
            background_color: "#05060a".to_string(),
            box_left: 0.0,
            box_top: 0.0,
            box_width: None,
            box_height: None,
            text_bg: "rgba(0,0,0,0.52)".to_string(),
            text_color: "#ffffff".to_string(),
            font_size: 56.0,
            body_font: None,
            padding: 28.0,
        }
    }
}

/// Pixel geometry of the text box, before clipping to the canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoxGeometry {
    pub left: i64,
    pub top: i64,
    pub width: u32,
    pub height: u32,
}

impl PreviewLayout {
    /// Read the preview fields out of a layout value
    pub fn from_value(value: &serde_json::Value) -> Result<Self> {
        if !value.is_object() {
            return Err(PreviewError::InvalidLayout {
                reason: "layout must be a JSON object".to_string(),
            });
        }
        let layout = PreviewLayout::deserialize(value)?;
        layout.validate()?;
        Ok(layout)
    }

    fn validate(&self) -> Result<()> {
        for (field, edge) in [
            ("canvas_width", self.canvas_width),
            ("canvas_height", self.canvas_height),
        ] {
            if edge == 0 || edge > MAX_CANVAS_EDGE {
                return Err(PreviewError::field(
                    field,
                    format!("must be between 1 and {}", MAX_CANVAS_EDGE),
                ));
            }
        }
        if !(self.font_size > 0.0) {
            return Err(PreviewError::field("font_size", "must be positive"));
        }
        if self.font_size > MAX_FONT_SIZE {
            return Err(PreviewError::field(
                "font_size",
                format!("must not exceed {}", MAX_FONT_SIZE),
            ));
        }
        for (field, value) in [
            ("box_left", self.box_left),
            ("box_top", self.box_top),
            ("padding", self.padding),
        ] {
            if !value.is_finite() {
                return Err(PreviewError::field(field, "must be a finite number"));
            }
        }
        self.box_geometry().map(|_| ())
    }

    /// Box position and size in whole pixels; fractions are truncated and
    /// far off-canvas positions are pulled in to a bounded range
    pub fn box_geometry(&self) -> Result<BoxGeometry> {
        let width = self.box_width.unwrap_or(self.canvas_width as f64);
        let height = self.box_height.unwrap_or(self.canvas_height as f64);
        Ok(BoxGeometry {
            left: pin_offset(self.box_left) as i64,
            top: pin_offset(self.box_top) as i64,
            width: box_edge("box_width", width)?,
            height: box_edge("box_height", height)?,
        })
    }

    /// Top-left corner of the sample text
    pub fn text_origin(&self) -> (i32, i32) {
        (
            pin_offset(pin_offset(self.box_left) + pin_offset(self.padding)) as i32,
            pin_offset(pin_offset(self.box_top) + pin_offset(self.padding)) as i32,
        )
    }

    /// Font path from the layout, if one was given
    pub fn font_path(&self) -> Option<&str> {
        self.body_font.as_deref().filter(|p| !p.trim().is_empty())
    }
}

fn pin_offset(value: f64) -> f64 {
    value.clamp(-MAX_OFFSET, MAX_OFFSET)
}

fn box_edge(field: &str, value: f64) -> Result<u32> {
    if value < 0.0 {
        return Err(PreviewError::field(field, "must not be negative"));
    }
    if value > MAX_CANVAS_EDGE as f64 {
        return Err(PreviewError::field(
            field,
            format!("must not exceed {}", MAX_CANVAS_EDGE),
        ));
    }
    Ok(value as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_object_uses_defaults() {
        let layout = PreviewLayout::from_value(&json!({})).unwrap();
        assert_eq!(layout.canvas_width, 1600);
        assert_eq!(layout.canvas_height, 600);
        assert_eq!(
            layout.box_geometry().unwrap(),
            BoxGeometry {
                left: 0,
                top: 0,
                width: 1600,
                height: 600
            }
        );
        assert_eq!(layout.text_origin(), (28, 28));
    }

    #[test]
    fn box_defaults_follow_canvas() {
        let layout = PreviewLayout::from_value(&json!({"canvas_width": 800})).unwrap();
        assert_eq!(layout.box_geometry().unwrap().width, 800);
        assert_eq!(layout.box_geometry().unwrap().height, 600);
    }

    #[test]
    fn unrelated_fields_are_ignored() {
        let layout =
            PreviewLayout::from_value(&json!({"theme": {"nested": true}, "box_left": 12.7}))
                .unwrap();
        assert_eq!(layout.box_geometry().unwrap().left, 12);
    }

    #[test]
    fn rejects_non_object_and_bad_types() {
        assert!(PreviewLayout::from_value(&json!([1, 2])).is_err());
        assert!(PreviewLayout::from_value(&json!({"canvas_width": "wide"})).is_err());
        assert!(PreviewLayout::from_value(&json!({"canvas_width": 0})).is_err());
        assert!(PreviewLayout::from_value(&json!({"box_width": -5})).is_err());
        assert!(PreviewLayout::from_value(&json!({"font_size": 0})).is_err());
        assert!(PreviewLayout::from_value(&json!({"font_size": 1e9})).is_err());
    }

    #[test]
    fn huge_offsets_are_pinned() {
        let layout = PreviewLayout::from_value(&json!({
            "box_left": 1e19,
            "box_top": -1e19,
            "padding": 1e12
        }))
        .unwrap();

        let geometry = layout.box_geometry().unwrap();
        assert_eq!(geometry.left, 16384);
        assert_eq!(geometry.top, -16384);
        assert_eq!(layout.text_origin(), (16384, 0));
    }

    #[test]
    fn blank_font_path_is_ignored() {
        let layout = PreviewLayout::from_value(&json!({"body_font": "  "})).unwrap();
        assert_eq!(layout.font_path(), None);
    }
}
