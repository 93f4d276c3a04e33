//! Character compositing - stacking layer images into one sprite
//!
//! Layers are drawn bottom to top (skin, face, face2, hair) onto a blank
//! transparent canvas. The hair layer is hue-rotated on a private copy
//! before it is drawn. Outlining happens at presentation time, see
//! [`crate::output::present`].

mod blend;

use image::RgbaImage;

use crate::assets::LayerImages;
use crate::catalog::Layer;
use crate::color::rotate_hue;

pub(crate) use blend::blit_over;
#[cfg(test)]
pub(crate) use blend::source_over;

/// Edge length of a character sprite in pixels.
pub const SPRITE_SIZE: u32 = 32;

/// Largest accepted sprite edge length.
pub const MAX_SPRITE_SIZE: u32 = 256;

/// Composite the layer images of one draw into a `size`×`size` sprite.
///
/// Absent layers are skipped. Layer images larger than the canvas are
/// clipped; smaller ones are anchored at the top-left corner.
pub fn compose_sprite(images: &LayerImages, hair_hue: f64, size: u32) -> RgbaImage {
    let mut canvas = RgbaImage::new(size, size);

    for layer in Layer::ALL {
        let Some(img) = images.get(layer) else {
            continue;
        };
        if layer == Layer::Hair {
            let shifted = rotate_hue(img, hair_hue);
            blit_over(&mut canvas, &shifted, 0, 0);
        } else {
            blit_over(&mut canvas, img, 0, 0);
        }
    }

    canvas
}
