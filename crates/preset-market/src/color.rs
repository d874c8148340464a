//! Color strings as they appear in preset layouts
//!
//! Layouts are written for a CSS-like front end, so colors arrive as hex
//! codes, `rgb(...)`/`rgba(...)` functions or a handful of named colors.

use image::Rgb;

use crate::error::{PreviewError, Result};

/// Alpha applied to an `rgba(...)` box background that omits its alpha channel
pub const DEFAULT_OVERLAY_ALPHA: f32 = 0.52;

/// How the text box background is painted
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoxFill {
    /// Translucent overlay blended over the canvas
    Overlay { color: Rgb<u8>, alpha: u8 },
    /// Flat opaque fill
    Solid(Rgb<u8>),
}

/// Parse a box background value.
///
/// Values starting with `rgba` become a blended overlay; anything else is an
/// opaque color.
pub fn parse_box_fill(value: &str) -> Result<BoxFill> {
    let trimmed = value.trim();
    if !trimmed.starts_with("rgba") {
        return parse_color(trimmed).map(BoxFill::Solid);
    }

    let inner = trimmed.replace("rgba(", "").replace(')', "");
    let parts: Vec<&str> = inner.split(',').collect();
    if parts.len() < 3 {
        return Err(PreviewError::color(value));
    }

    let color = Rgb([
        parse_channel(parts[0], value)?,
        parse_channel(parts[1], value)?,
        parse_channel(parts[2], value)?,
    ]);

    let alpha = match parts.get(3) {
        Some(raw) => raw
            .trim()
            .parse::<f32>()
            .map_err(|_| PreviewError::color(value))?,
        None => DEFAULT_OVERLAY_ALPHA,
    };
    if !alpha.is_finite() {
        return Err(PreviewError::color(value));
    }

    Ok(BoxFill::Overlay {
        color,
        alpha: (alpha.clamp(0.0, 1.0) * 255.0) as u8,
    })
}

/// Parse an opaque color: `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa`,
/// `rgb(r,g,b)`, `rgba(r,g,b,a)` (alpha ignored) or a named color.
pub fn parse_color(value: &str) -> Result<Rgb<u8>> {
    let lowered = value.trim().to_ascii_lowercase();

    if let Some(hex) = lowered.strip_prefix('#') {
        return parse_hex(hex).ok_or_else(|| PreviewError::color(value));
    }

    if let Some(args) = lowered
        .strip_prefix("rgba(")
        .or_else(|| lowered.strip_prefix("rgb("))
    {
        let args = args
            .strip_suffix(')')
            .ok_or_else(|| PreviewError::color(value))?;
        let parts: Vec<&str> = args.split(',').collect();
        if parts.len() < 3 {
            return Err(PreviewError::color(value));
        }
        return Ok(Rgb([
            parse_channel(parts[0], value)?,
            parse_channel(parts[1], value)?,
            parse_channel(parts[2], value)?,
        ]));
    }

    named_color(&lowered).ok_or_else(|| PreviewError::color(value))
}

fn parse_channel(raw: &str, original: &str) -> Result<u8> {
    raw.trim()
        .parse::<u8>()
        .map_err(|_| PreviewError::color(original))
}

fn parse_hex(hex: &str) -> Option<Rgb<u8>> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    match hex.len() {
        3 | 4 => {
            let mut channels = [0u8; 3];
            for (slot, c) in channels.iter_mut().zip(hex.chars()) {
                let nibble = c.to_digit(16)? as u8;
                *slot = nibble * 17;
            }
            Some(Rgb(channels))
        }
        6 | 8 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some(Rgb([r, g, b]))
        }
        _ => None,
    }
}

fn named_color(name: &str) -> Option<Rgb<u8>> {
    let rgb = match name {
        "black" => [0, 0, 0],
        "white" => [255, 255, 255],
        "red" => [255, 0, 0],
        "lime" => [0, 255, 0],
        "green" => [0, 128, 0],
        "blue" => [0, 0, 255],
        "yellow" => [255, 255, 0],
        "cyan" | "aqua" => [0, 255, 255],
        "magenta" | "fuchsia" => [255, 0, 255],
        "gray" | "grey" => [128, 128, 128],
        "silver" => [192, 192, 192],
        "maroon" => [128, 0, 0],
        "olive" => [128, 128, 0],
        "purple" => [128, 0, 128],
        "teal" => [0, 128, 128],
        "navy" => [0, 0, 128],
        "orange" => [255, 165, 0],
        "pink" => [255, 192, 203],
        _ => return None,
    };
    Some(Rgb(rgb))
}
