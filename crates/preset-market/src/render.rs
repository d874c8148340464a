//! Preview image rendering
//!
//! This module turns a preset layout into a PNG thumbnail: a canvas in the
//! layout's background color, the text box painted either as a translucent
//! overlay or a flat fill, and one line of sample text inside the box.
//!
//! Rendering never fails from the caller's point of view. [`PreviewRenderer::render`]
//! returns a [`PreviewOutcome`] that is either the freshly written image or the
//! placeholder path together with the reason the render was abandoned.

use std::path::{Path, PathBuf};

use ab_glyph::{FontArc, PxScale};
use image::{ImageFormat, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::color::{BoxFill, parse_box_fill, parse_color};
use crate::error::{PreviewError, Result};
use crate::layout::{BoxGeometry, PreviewLayout};

/// Public path of the placeholder served when a preview cannot be rendered
pub const DEFAULT_PREVIEW_PATH: &str = "/static/default-preview.png";

/// Public URL prefix under which generated previews are served
pub const DEFAULT_PUBLIC_PREFIX: &str = "/uploads/previews";

/// Text drawn inside the box of every preview
pub const SAMPLE_TEXT: &str = "Preset preview sample";

/// DejaVu Sans, drawn when neither the layout nor the renderer names a
/// loadable font
static BUILTIN_FONT: &[u8] = include_bytes!("../assets/DejaVuSans.ttf");

/// Result of a preview render
#[derive(Debug)]
pub enum PreviewOutcome {
    /// The preview was written; holds its public path
    Generated { path: String },
    /// Rendering was abandoned; holds the placeholder path and why
    Fallback { path: String, reason: PreviewError },
}

impl PreviewOutcome {
    /// Public path to store on the preset, whichever way the render went
    pub fn path(&self) -> &str {
        match self {
            PreviewOutcome::Generated { path } | PreviewOutcome::Fallback { path, .. } => path,
        }
    }

    pub fn into_path(self) -> String {
        match self {
            PreviewOutcome::Generated { path } | PreviewOutcome::Fallback { path, .. } => path,
        }
    }

    pub fn is_generated(&self) -> bool {
        matches!(self, PreviewOutcome::Generated { .. })
    }
}

/// Writes layout previews into a directory and hands back their public paths
#[derive(Debug, Clone)]
pub struct PreviewRenderer {
    output_dir: PathBuf,
    public_prefix: String,
    fallback_path: String,
    default_font: Option<PathBuf>,
}

impl PreviewRenderer {
    /// Create a renderer writing into `output_dir`, served under `public_prefix`
    pub fn new(output_dir: impl Into<PathBuf>, public_prefix: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            public_prefix: public_prefix.into().trim_end_matches('/').to_string(),
            fallback_path: DEFAULT_PREVIEW_PATH.to_string(),
            default_font: None,
        }
    }

    /// Font used when the layout does not name a loadable one
    pub fn with_default_font(mut self, path: impl Into<PathBuf>) -> Self {
        self.default_font = Some(path.into());
        self
    }

    /// Placeholder path returned when rendering fails
    pub fn with_fallback_path(mut self, path: impl Into<String>) -> Self {
        self.fallback_path = path.into();
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn fallback_path(&self) -> &str {
        &self.fallback_path
    }

    /// Render a layout, degrading to the placeholder on any failure
    pub fn render(&self, layout: &serde_json::Value) -> PreviewOutcome {
        match self.try_render(layout) {
            Ok(path) => PreviewOutcome::Generated { path },
            Err(reason) => PreviewOutcome::Fallback {
                path: self.fallback_path.clone(),
                reason,
            },
        }
    }

    /// Render a layout and write it to disk, returning the public path
    pub fn try_render(&self, layout: &serde_json::Value) -> Result<String> {
        let parsed = PreviewLayout::from_value(layout)?;
        let font = self.resolve_font(&parsed)?;
        let canvas = draw_preview(&parsed, &font)?;

        let file_name = preview_file_name(layout);
        std::fs::create_dir_all(&self.output_dir)?;
        let file_path = self.output_dir.join(&file_name);
        canvas.save_with_format(&file_path, ImageFormat::Png)?;

        debug!("Wrote preview {}", file_path.display());
        Ok(format!("{}/{}", self.public_prefix, file_name))
    }

    /// Layout font, then the renderer default, then the built-in font
    fn resolve_font(&self, layout: &PreviewLayout) -> Result<FontArc> {
        let configured = layout
            .font_path()
            .map(PathBuf::from)
            .into_iter()
            .chain(self.default_font.iter().cloned())
            .filter(|path| path.exists())
            .find_map(|path| load_font(&path));

        match configured {
            Some(font) => Ok(font),
            None => builtin_font(),
        }
    }
}

/// The font bundled with the crate
pub fn builtin_font() -> Result<FontArc> {
    FontArc::try_from_slice(BUILTIN_FONT).map_err(|e| PreviewError::Font {
        reason: e.to_string(),
    })
}

fn load_font(path: &Path) -> Option<FontArc> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!("Cannot read font {}: {}", path.display(), e);
            return None;
        }
    };
    match FontArc::try_from_vec(bytes) {
        Ok(font) => Some(font),
        Err(e) => {
            debug!("Cannot parse font {}: {}", path.display(), e);
            None
        }
    }
}

/// Paint a preview in memory
pub fn draw_preview(layout: &PreviewLayout, font: &FontArc) -> Result<RgbImage> {
    let background = parse_color(&layout.background_color)?;
    let fill = parse_box_fill(&layout.text_bg)?;
    let text_color = parse_color(&layout.text_color)?;
    let geometry = layout.box_geometry()?;

    let mut canvas = RgbImage::from_pixel(layout.canvas_width, layout.canvas_height, background);

    match fill {
        BoxFill::Overlay { color, alpha } => blend_box(&mut canvas, geometry, color, alpha),
        BoxFill::Solid(color) => {
            if geometry.width > 0 && geometry.height > 0 {
                let rect = Rect::at(clamp_i32(geometry.left), clamp_i32(geometry.top))
                    .of_size(geometry.width, geometry.height);
                draw_filled_rect_mut(&mut canvas, rect, color);
            }
        }
    }

    let (x, y) = layout.text_origin();
    draw_text_mut(
        &mut canvas,
        text_color,
        x,
        y,
        PxScale::from(layout.font_size),
        font,
        SAMPLE_TEXT,
    );

    Ok(canvas)
}

/// Alpha-blend a flat color over the box region, clipped to the canvas
fn blend_box(canvas: &mut RgbImage, geometry: BoxGeometry, color: Rgb<u8>, alpha: u8) {
    let (canvas_w, canvas_h) = (canvas.width() as i64, canvas.height() as i64);
    let x0 = geometry.left.max(0);
    let y0 = geometry.top.max(0);
    let x1 = geometry.left.saturating_add(geometry.width as i64).min(canvas_w);
    let y1 = geometry.top.saturating_add(geometry.height as i64).min(canvas_h);

    let a = alpha as u32;
    for y in y0..y1 {
        for x in x0..x1 {
            let pixel = canvas.get_pixel_mut(x as u32, y as u32);
            for (dst, src) in pixel.0.iter_mut().zip(color.0) {
                *dst = ((src as u32 * a + *dst as u32 * (255 - a) + 127) / 255) as u8;
            }
        }
    }
}

fn clamp_i32(value: i64) -> i32 {
    value.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

/// File name for a layout's preview.
///
/// Derived from the SHA-256 of the layout encoded with sorted keys, truncated
/// to 64 bits, so equal layouts share a file.
pub fn preview_file_name(layout: &serde_json::Value) -> String {
    let canonical = canonicalize(layout).to_string();
    let digest = Sha256::digest(canonical.as_bytes());
    let mut word = [0u8; 8];
    word.copy_from_slice(&digest[..8]);
    format!("preview_{:016x}.png", u64::from_be_bytes(word))
}

fn canonicalize(value: &serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut sorted = serde_json::Map::new();
            for key in keys {
                sorted.insert(key.clone(), canonicalize(&map[key]));
            }
            serde_json::Value::Object(sorted)
        }
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.iter().map(canonicalize).collect())
        }
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn overlay_blends_toward_canvas() {
        let layout = PreviewLayout::from_value(&json!({
            "canvas_width": 20,
            "canvas_height": 10,
            "background_color": "#000000",
            "box_left": 5,
            "box_top": 0,
            "box_width": 10,
            "box_height": 10,
            "text_bg": "rgba(255,255,255,0.5)"
        }))
        .unwrap();

        let canvas = draw_preview(&layout, &builtin_font().unwrap()).unwrap();
        // 0.5 * 255 truncates to 127
        assert_eq!(canvas.get_pixel(7, 5), &Rgb([127, 127, 127]));
        assert_eq!(canvas.get_pixel(2, 5), &Rgb([0, 0, 0]));
        assert_eq!(canvas.get_pixel(17, 5), &Rgb([0, 0, 0]));
    }

    #[test]
    fn solid_fill_is_flat() {
        let layout = PreviewLayout::from_value(&json!({
            "canvas_width": 10,
            "canvas_height": 10,
            "background_color": "white",
            "box_left": 2,
            "box_top": 2,
            "box_width": 4,
            "box_height": 4,
            "text_bg": "#ff0000"
        }))
        .unwrap();

        let canvas = draw_preview(&layout, &builtin_font().unwrap()).unwrap();
        assert_eq!(canvas.get_pixel(3, 3), &Rgb([255, 0, 0]));
        assert_eq!(canvas.get_pixel(0, 0), &Rgb([255, 255, 255]));
        assert_eq!(canvas.get_pixel(8, 8), &Rgb([255, 255, 255]));
    }

    #[test]
    fn box_hanging_off_canvas_is_clipped() {
        let layout = PreviewLayout::from_value(&json!({
            "canvas_width": 8,
            "canvas_height": 8,
            "background_color": "#000",
            "box_left": -4,
            "box_top": 6,
            "box_width": 100,
            "box_height": 100,
            "text_bg": "rgba(255,0,0,1)"
        }))
        .unwrap();

        let canvas = draw_preview(&layout, &builtin_font().unwrap()).unwrap();
        assert_eq!(canvas.get_pixel(0, 7), &Rgb([255, 0, 0]));
        assert_eq!(canvas.get_pixel(0, 5), &Rgb([0, 0, 0]));
    }

    #[test]
    fn far_away_solid_box_leaves_canvas_untouched() {
        let layout = PreviewLayout::from_value(&json!({
            "canvas_width": 8,
            "canvas_height": 8,
            "background_color": "#000",
            "box_left": 1e19,
            "text_bg": "#ff0000"
        }))
        .unwrap();

        let canvas = draw_preview(&layout, &builtin_font().unwrap()).unwrap();
        assert!(canvas.pixels().all(|p| p.0 == [0, 0, 0]));
    }

    #[test]
    fn file_name_ignores_key_order() {
        let a = json!({"a": 1, "b": {"y": 2, "x": 3}});
        let b = json!({"b": {"x": 3, "y": 2}, "a": 1});
        assert_eq!(preview_file_name(&a), preview_file_name(&b));
        assert_ne!(preview_file_name(&a), preview_file_name(&json!({"a": 2})));

        let name = preview_file_name(&a);
        assert!(name.starts_with("preview_") && name.ends_with(".png"));
        assert_eq!(name.len(), "preview_".len() + 16 + ".png".len());
    }
}
