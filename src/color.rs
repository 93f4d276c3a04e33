//! Color utilities: hex color parsing and HSL hue rotation
//!
//! Supports the following hex formats, with or without a leading `#`:
//! - `#RGB` - 3-digit hex, each digit is doubled
//! - `#RRGGBB` - 6-digit hex, alpha defaults to 255 (opaque)
//! - `#RRGGBBAA` - 8-digit hex, explicit alpha channel
//!
//! Hue rotation works on straight-alpha RGBA buffers and leaves fully
//! transparent pixels untouched.

use image::{Rgba, RgbaImage};
use thiserror::Error;

/// Error type for color parsing failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorError {
    /// Input string was empty
    #[error("empty color string")]
    Empty,
    /// Invalid length (must be 3, 6, or 8 hex chars)
    #[error("invalid color length {0}, expected 3, 6, or 8")]
    InvalidLength(usize),
    /// Contains non-hex characters
    #[error("invalid hex character '{0}'")]
    InvalidHex(char),
}

/// Parse a hex color string into an RGBA color.
///
/// # Examples
///
/// ```
/// use charagen::color::parse_hex_color;
///
/// assert_eq!(parse_hex_color("#F00").unwrap(), image::Rgba([255, 0, 0, 255]));
/// assert_eq!(parse_hex_color("f8f9fa").unwrap(), image::Rgba([248, 249, 250, 255]));
/// assert_eq!(parse_hex_color("#00000080").unwrap(), image::Rgba([0, 0, 0, 128]));
/// ```
///
/// # Errors
///
/// Returns `ColorError` if the input is empty, has the wrong length, or
/// contains non-hex characters.
pub fn parse_hex_color(s: &str) -> Result<Rgba<u8>, ColorError> {
    let hex = s.trim();
    let hex = hex.strip_prefix('#').unwrap_or(hex);
    if hex.is_empty() {
        return Err(ColorError::Empty);
    }

    if let Some(c) = hex.chars().find(|c| !c.is_ascii_hexdigit()) {
        return Err(ColorError::InvalidHex(c));
    }

    let digits: Vec<u8> = hex.chars().map(parse_hex_digit).collect::<Result<_, _>>()?;
    match digits.len() {
        3 => Ok(Rgba([digits[0] * 17, digits[1] * 17, digits[2] * 17, 255])),
        6 => Ok(Rgba([
            digits[0] * 16 + digits[1],
            digits[2] * 16 + digits[3],
            digits[4] * 16 + digits[5],
            255,
        ])),
        8 => Ok(Rgba([
            digits[0] * 16 + digits[1],
            digits[2] * 16 + digits[3],
            digits[4] * 16 + digits[5],
            digits[6] * 16 + digits[7],
        ])),
        len => Err(ColorError::InvalidLength(len)),
    }
}

/// Parse a single hex digit (0-9, A-F, a-f) to u8 (0-15)
fn parse_hex_digit(c: char) -> Result<u8, ColorError> {
    match c {
        '0'..='9' => Ok(c as u8 - b'0'),
        'a'..='f' => Ok(c as u8 - b'a' + 10),
        'A'..='F' => Ok(c as u8 - b'A' + 10),
        _ => Err(ColorError::InvalidHex(c)),
    }
}

/// Format a color as `#rrggbb` (or `#rrggbbaa` when not fully opaque).
pub fn format_hex_color(color: Rgba<u8>) -> String {
    let [r, g, b, a] = color.0;
    if a == 255 {
        format!("#{:02x}{:02x}{:02x}", r, g, b)
    } else {
        format!("#{:02x}{:02x}{:02x}{:02x}", r, g, b, a)
    }
}

/// Normalize an angle in degrees into `[0, 360)`.
pub fn normalize_degrees(degrees: f64) -> f64 {
    if !degrees.is_finite() {
        return 0.0;
    }
    let d = ((degrees % 360.0) + 360.0) % 360.0;
    // (-1e-20 % 360 + 360) % 360 rounds up to exactly 360
    if d >= 360.0 {
        0.0
    } else {
        d
    }
}

/// Convert RGB to HSL color space.
///
/// Returns (hue, saturation, lightness) where:
/// - hue is in degrees (0-360)
/// - saturation is 0.0-1.0
/// - lightness is 0.0-1.0
pub fn rgb_to_hsl(r: u8, g: u8, b: u8) -> (f64, f64, f64) {
    let r = r as f64 / 255.0;
    let g = g as f64 / 255.0;
    let b = b as f64 / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let l = (max + min) / 2.0;

    if delta == 0.0 {
        return (0.0, 0.0, l);
    }

    let s = delta / (1.0 - (2.0 * l - 1.0).abs());

    let h = if max == r {
        60.0 * (((g - b) / delta) % 6.0)
    } else if max == g {
        60.0 * (((b - r) / delta) + 2.0)
    } else {
        60.0 * (((r - g) / delta) + 4.0)
    };

    let h = if h < 0.0 { h + 360.0 } else { h };
    (h, s, l)
}

/// Convert HSL back to RGB using the sector-based chroma construction.
///
/// `h` must already be in `[0, 360)`. Each channel is rounded to the
/// nearest integer and clamped into `0..=255`.
pub fn hsl_to_rgb(h: f64, s: f64, l: f64) -> (u8, u8, u8) {
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = l - c / 2.0;

    let (r1, g1, b1) = if h < 60.0 {
        (c, x, 0.0)
    } else if h < 120.0 {
        (x, c, 0.0)
    } else if h < 180.0 {
        (0.0, c, x)
    } else if h < 240.0 {
        (0.0, x, c)
    } else if h < 300.0 {
        (x, 0.0, c)
    } else {
        (c, 0.0, x)
    };

    (to_channel(r1 + m), to_channel(g1 + m), to_channel(b1 + m))
}

fn to_channel(v: f64) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}

/// Rotate the hue of a single pixel by an already-normalized delta.
///
/// Fully transparent pixels are returned unchanged; alpha is never modified.
pub fn rotate_hue_pixel(pixel: Rgba<u8>, hue_delta: f64) -> Rgba<u8> {
    let [r, g, b, a] = pixel.0;
    if a == 0 {
        return pixel;
    }
    let (h, s, l) = rgb_to_hsl(r, g, b);
    let h = (h + hue_delta) % 360.0;
    let (r, g, b) = hsl_to_rgb(h, s, l);
    Rgba([r, g, b, a])
}

/// Rotate the hue of every visible pixel in `image` by `degrees`.
///
/// Returns a new buffer; the input is left untouched. Degrees are
/// normalized into `[0, 360)` first, so `rotate_hue(img, 360.0)` equals
/// `rotate_hue(img, 0.0)`.
pub fn rotate_hue(image: &RgbaImage, degrees: f64) -> RgbaImage {
    let delta = normalize_degrees(degrees);
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        *pixel = rotate_hue_pixel(*pixel, delta);
    }
    out
}
