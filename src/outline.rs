//! Silhouette outline synthesis
//!
//! Derives a 1-pixel, four-directional black fringe from the alpha channel
//! of a sprite. The outline is drawn beneath the sprite at presentation
//! time, so only pixels that border the silhouette end up visible.

use image::{Rgba, RgbaImage};

/// Neighbor visitation order: left, right, up, down.
const DIRECTIONS: [(i64, i64); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// Synthesize the outline buffer for `source`.
///
/// Every visible source pixel claims its in-bounds 4-neighbors when the
/// neighbor is transparent in the source, or when the neighbor has not yet
/// been written in the outline. The claimed pixel becomes `(0, 0, 0, a)`
/// where `a` is the alpha of the claiming source pixel. Source pixels are
/// visited in row-major order, which decides which alpha wins when two
/// visible pixels border the same transparent one.
///
/// The result has the same dimensions as `source`; untouched pixels stay
/// `(0, 0, 0, 0)`.
pub fn synthesize_outline(source: &RgbaImage) -> RgbaImage {
    let (width, height) = source.dimensions();
    let mut outline = RgbaImage::new(width, height);

    for py in 0..height {
        for px in 0..width {
            let alpha = source.get_pixel(px, py)[3];
            if alpha == 0 {
                continue;
            }

            for (dx, dy) in DIRECTIONS {
                let nx = px as i64 + dx;
                let ny = py as i64 + dy;
                if nx < 0 || ny < 0 || nx >= width as i64 || ny >= height as i64 {
                    continue;
                }
                let (nx, ny) = (nx as u32, ny as u32);

                let neighbor_alpha = source.get_pixel(nx, ny)[3];
                if neighbor_alpha == 0 || outline.get_pixel(nx, ny)[3] == 0 {
                    outline.put_pixel(nx, ny, Rgba([0, 0, 0, alpha]));
                }
            }
        }
    }

    outline
}
