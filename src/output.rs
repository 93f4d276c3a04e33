//! Presentation, PNG output and file naming
//!
//! A sprite is presented by upscaling it and its synthesized outline by an
//! integer nearest-neighbor factor, then drawing the outline and the sprite
//! (in that order) centered on a surface that is either filled with a
//! background color or left transparent.

use image::imageops::FilterType;
use image::{Rgba, RgbaImage};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

use crate::composition::blit_over;
use crate::outline::synthesize_outline;

/// Default background of the presentation surface (`#f8f9fa`).
pub const DEFAULT_BACKGROUND: Rgba<u8> = Rgba([248, 249, 250, 255]);

/// Default integer upscale factor.
pub const DEFAULT_SCALE: u32 = 10;

/// Largest accepted upscale factor.
pub const MAX_SCALE: u32 = 64;

/// Largest width or height of any produced image.
pub const MAX_DIMENSION: u32 = 32_768;

const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Error type for output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("cannot write image: {0}")]
    Io(#[from] io::Error),
    #[error("cannot encode image: {0}")]
    Image(#[from] image::ImageError),
    /// Requested output exceeds [`MAX_DIMENSION`] on some axis
    #[error("output of {width}x{height} pixels exceeds the {}px limit", MAX_DIMENSION)]
    TooLarge { width: u64, height: u64 },
}

/// Check that a `width`×`height` image may be allocated.
pub fn checked_dimensions(width: u64, height: u64) -> Result<(u32, u32), OutputError> {
    let limit = MAX_DIMENSION as u64;
    if width > limit || height > limit {
        return Err(OutputError::TooLarge { width, height });
    }
    Ok((width as u32, height as u32))
}

/// How a sprite is placed on the output surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Presentation {
    /// Integer nearest-neighbor upscale factor (at least 1)
    pub scale: u32,
    /// Surface fill; `None` leaves the surface transparent
    pub background: Option<Rgba<u8>>,
    /// Surface size; `None` means exactly the scaled sprite
    pub surface: Option<(u32, u32)>,
}

impl Default for Presentation {
    fn default() -> Self {
        Self {
            scale: DEFAULT_SCALE,
            background: Some(DEFAULT_BACKGROUND),
            surface: None,
        }
    }
}

impl Presentation {
    /// The export variant: same placement, transparent background.
    pub fn transparent(self) -> Self {
        Self {
            background: None,
            ..self
        }
    }
}

/// Present a composited sprite: outline first, sprite over it, upscaled and centered.
pub fn present(sprite: &RgbaImage, presentation: &Presentation) -> Result<RgbaImage, OutputError> {
    let outline = scale_image(synthesize_outline(sprite), presentation.scale)?;
    let scaled = scale_image(sprite.clone(), presentation.scale)?;
    let (sw, sh) = scaled.dimensions();
    let (w, h) = match presentation.surface {
        Some((w, h)) => checked_dimensions(w as u64, h as u64)?,
        None => (sw, sh),
    };

    let mut surface = RgbaImage::from_pixel(w, h, presentation.background.unwrap_or(TRANSPARENT));
    let x = w.saturating_sub(sw) / 2;
    let y = h.saturating_sub(sh) / 2;
    blit_over(&mut surface, &outline, x, y);
    blit_over(&mut surface, &scaled, x, y);
    Ok(surface)
}

/// Scale image by integer factor using nearest-neighbor interpolation.
///
/// A factor of 0 or 1 returns the image unchanged. Results larger than
/// [`MAX_DIMENSION`] on either axis are refused.
pub fn scale_image(image: RgbaImage, factor: u32) -> Result<RgbaImage, OutputError> {
    if factor <= 1 {
        return Ok(image);
    }
    let (w, h) = image.dimensions();
    let (sw, sh) = match (w.checked_mul(factor), h.checked_mul(factor)) {
        (Some(sw), Some(sh)) => checked_dimensions(sw as u64, sh as u64)?,
        _ => {
            return Err(OutputError::TooLarge {
                width: w as u64 * factor as u64,
                height: h as u64 * factor as u64,
            })
        }
    };
    Ok(image::imageops::resize(&image, sw, sh, FilterType::Nearest))
}

/// Size of a `cols`×`rows` sheet of `cell_w`×`cell_h` cells.
pub fn sheet_dimensions(cols: u32, rows: u32, cell_w: u32, cell_h: u32) -> Result<(u32, u32), OutputError> {
    checked_dimensions(cols as u64 * cell_w as u64, rows as u64 * cell_h as u64)
}

/// Arrange presented frames in a grid, row-major, `cols` per row.
///
/// Cells are sized to the largest frame. Unused cells and the gaps around
/// smaller frames show `background` (transparent when `None`).
pub fn tile_grid(frames: &[RgbaImage], cols: u32, background: Option<Rgba<u8>>) -> Result<RgbaImage, OutputError> {
    let fill = background.unwrap_or(TRANSPARENT);
    if frames.is_empty() {
        return Ok(RgbaImage::from_pixel(1, 1, fill));
    }

    let cell_w = frames.iter().map(|f| f.width()).max().unwrap_or(1);
    let cell_h = frames.iter().map(|f| f.height()).max().unwrap_or(1);
    let columns = cols.max(1);
    let rows = (frames.len() as u32).div_ceil(columns);
    let (w, h) = sheet_dimensions(columns, rows, cell_w, cell_h)?;

    let mut sheet = RgbaImage::from_pixel(w, h, fill);
    for (i, frame) in frames.iter().enumerate() {
        let col = (i as u32) % columns;
        let row = (i as u32) / columns;
        blit_over(&mut sheet, frame, col * cell_w, row * cell_h);
    }
    Ok(sheet)
}

/// Save an RGBA image to a PNG file, creating parent directories.
pub fn save_png(image: &RgbaImage, path: &Path) -> Result<(), OutputError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    image.save_with_format(path, image::ImageFormat::Png)?;
    Ok(())
}

/// Directory for a batch run: `<out>/batch_<count>_x<scale>_<stamp>`.
pub fn batch_dir(out: &Path, count: usize, scale: u32, stamp: &str) -> PathBuf {
    out.join(format!("batch_{}_x{}_{}", count, scale, stamp))
}

/// File name of the `index`-th (0-based) image of a batch of `count`.
///
/// Names are 1-based and zero-padded to the digit width of `count`.
pub fn batch_file_name(index: usize, count: usize) -> String {
    let width = count.max(1).to_string().len();
    format!("{:0width$}.png", index + 1, width = width)
}

/// Path of a tile sheet: `<out>/tile_<cols>x<rows>_x<scale>_<stamp>.png`.
pub fn tile_path(out: &Path, cols: u32, rows: u32, scale: u32, stamp: &str) -> PathBuf {
    out.join(format!("tile_{}x{}_x{}_{}.png", cols, rows, scale, stamp))
}

/// Current UTC time as `YYYY-MM-DDTHH-MM-SS`, safe for file names.
pub fn timestamp_slug() -> String {
    let secs = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs();
    format_timestamp_slug(secs)
}

/// Format seconds since the Unix epoch as `YYYY-MM-DDTHH-MM-SS` (UTC).
pub fn format_timestamp_slug(epoch_secs: u64) -> String {
    let (year, month, day) = civil_from_days((epoch_secs / 86_400) as i64);
    let of_day = epoch_secs % 86_400;
    format!(
        "{:04}-{:02}-{:02}T{:02}-{:02}-{:02}",
        year,
        month,
        day,
        of_day / 3600,
        of_day % 3600 / 60,
        of_day % 60
    )
}

/// Proleptic Gregorian date for a count of days since 1970-01-01.
///
/// Works in 400-year eras starting on March 1st so leap days fall at the
/// end of each shifted year.
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let day_of_era = z.rem_euclid(146_097);
    let year_of_era = (day_of_era - day_of_era / 1460 + day_of_era / 36_524 - day_of_era / 146_096) / 365;
    let day_of_year = day_of_era - (365 * year_of_era + year_of_era / 4 - year_of_era / 100);
    let shifted_month = (5 * day_of_year + 2) / 153;
    let day = (day_of_year - (153 * shifted_month + 2) / 5 + 1) as u32;
    let month = (if shifted_month < 10 { shifted_month + 3 } else { shifted_month - 9 }) as u32;
    let year = year_of_era + era * 400 + i64::from(month <= 2);
    (year, month, day)
}
