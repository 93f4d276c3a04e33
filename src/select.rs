//! Weighted random index selection
//!
//! The random source is always injected, so seeded generators give
//! reproducible draws.

use rand::Rng;

/// Pick an index in `[0, len)` according to `weights`.
///
/// When `weights` is present and has exactly `len` entries, each weight is
/// clamped to `max(0, w)` (non-finite counts as 0) and an index is drawn
/// proportionally. A non-positive total, absent weights, or a length
/// mismatch all fall back to a uniform draw.
///
/// A `len` of 0 has no valid answer; 0 is returned without consuming
/// entropy.
///
/// # Examples
///
/// ```
/// use charagen::select::pick_index;
/// use rand::SeedableRng;
///
/// let mut rng = rand_pcg::Pcg32::seed_from_u64(7);
/// // Only the last part can be drawn
/// assert_eq!(pick_index(Some(&[0.0, 0.0, 5.0]), 3, &mut rng), 2);
/// ```
pub fn pick_index<R: Rng + ?Sized>(weights: Option<&[f64]>, len: usize, rng: &mut R) -> usize {
    if len == 0 {
        return 0;
    }

    let weights = match weights {
        Some(w) if w.len() == len => w,
        _ => return rng.gen_range(0..len),
    };

    let total: f64 = weights.iter().copied().map(clamp_weight).sum();
    if !total.is_finite() || total <= 0.0 {
        return rng.gen_range(0..len);
    }

    let mut r = rng.gen::<f64>() * total;
    for (i, &w) in weights.iter().enumerate() {
        r -= clamp_weight(w);
        if r < 0.0 {
            return i;
        }
    }

    // Floating-point residue can leave r at exactly 0
    len - 1
}

fn clamp_weight(w: f64) -> f64 {
    if w.is_finite() {
        w.max(0.0)
    } else {
        0.0
    }
}
