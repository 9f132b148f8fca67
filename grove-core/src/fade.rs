//! Ages the strokes of earlier trees before a new one grows.
//!
//! Only "gray" pixels (R = G = B) are touched; anything carrying color is
//! left as it is. Both policies move each pixel one step towards the
//! background and saturate there, so repeated fades converge.

use serde::Deserialize;

use crate::raster::Surface;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FadePolicy {
    /// Raise the channels of visible gray pixels towards white.
    Brighten,
    /// Lower the alpha of gray pixels towards fully transparent.
    #[default]
    AlphaDecay,
}

#[inline]
fn is_gray(px: &[u8]) -> bool {
    px[0] == px[1] && px[1] == px[2]
}

/// Applies one fade step to a raw RGBA buffer.
///
/// ### Parameters
/// - `pixels` - Row-major RGBA bytes; a trailing partial pixel is ignored.
/// - `policy` - How gray pixels move towards the background.
/// - `step` - Amount added to each channel, or removed from alpha.
///
/// ### Returns
/// The number of pixels that changed.
pub fn age_pixels(pixels: &mut [u8], policy: FadePolicy, step: u8) -> usize {
    let mut changed = 0;
    for px in pixels.chunks_exact_mut(4) {
        if !is_gray(px) {
            continue;
        }
        match policy {
            FadePolicy::Brighten => {
                if px[3] == 0 || px[0] == u8::MAX {
                    continue;
                }
                let v = px[0].saturating_add(step);
                px[0] = v;
                px[1] = v;
                px[2] = v;
                changed += 1;
            }
            FadePolicy::AlphaDecay => {
                if px[3] == 0 {
                    continue;
                }
                px[3] = px[3].saturating_sub(step);
                changed += 1;
            }
        }
    }
    changed
}

/// Ages every pixel of `surface` once.
pub fn age<S: Surface>(surface: &mut S, policy: FadePolicy, step: u8) -> usize {
    age_pixels(surface.pixels_mut(), policy, step)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::Raster;

    #[test]
    fn brighten_moves_gray_towards_white_and_clamps() {
        let mut px = vec![0, 0, 0, 255, 250, 250, 250, 255];
        assert_eq!(age_pixels(&mut px, FadePolicy::Brighten, 10), 2);
        assert_eq!(px, vec![10, 10, 10, 255, 255, 255, 255, 255]);

        // Fully bright pixels are already at the background.
        assert_eq!(age_pixels(&mut px[4..], FadePolicy::Brighten, 10), 0);
    }

    #[test]
    fn brighten_ignores_transparent_pixels() {
        let mut px = vec![0, 0, 0, 0];
        assert_eq!(age_pixels(&mut px, FadePolicy::Brighten, 10), 0);
        assert_eq!(px, vec![0, 0, 0, 0]);
    }

    #[test]
    fn alpha_decay_clamps_at_zero() {
        let mut px = vec![0, 0, 0, 30, 90, 90, 90, 255];
        age_pixels(&mut px, FadePolicy::AlphaDecay, 48);
        assert_eq!(px, vec![0, 0, 0, 0, 90, 90, 90, 207]);
    }

    #[test]
    fn colored_pixels_are_left_untouched() {
        let original = vec![10, 200, 30, 255, 0, 0, 1, 128];
        for policy in [FadePolicy::Brighten, FadePolicy::AlphaDecay] {
            let mut px = original.clone();
            assert_eq!(age_pixels(&mut px, policy, 50), 0);
            assert_eq!(px, original);
        }
    }

    #[test]
    fn repeated_fades_are_monotone_and_converge() {
        for policy in [FadePolicy::Brighten, FadePolicy::AlphaDecay] {
            let mut r = Raster::new(4, 1);
            r.put_pixel(0, 0, [0, 0, 0, 255]);
            r.put_pixel(1, 0, [120, 120, 120, 200]);
            r.put_pixel(2, 0, [7, 7, 7, 3]);
            r.put_pixel(3, 0, [0, 90, 0, 255]);

            let mut prev = r.clone();
            let mut rounds = 0;
            while age(&mut r, policy, 37) > 0 {
                for x in 0..4 {
                    let (a, b) = (prev.pixel(x, 0).unwrap(), r.pixel(x, 0).unwrap());
                    match policy {
                        FadePolicy::Brighten => assert!(b[0] >= a[0]),
                        FadePolicy::AlphaDecay => assert!(b[3] <= a[3]),
                    }
                }
                prev = r.clone();
                rounds += 1;
                assert!(rounds <= 10, "{policy:?} did not converge");
            }

            let settled = r.clone();
            age(&mut r, policy, 37);
            assert_eq!(r, settled);
            assert_eq!(r.pixel(3, 0), Some([0, 90, 0, 255]));
        }
    }
}
