//! The blit pipeline: turns per-row winding deltas into composited pixels.
//!
//! The winding-integration, change-mask-skip, and source-over compositing
//! math is identical across every paint kind; only the per-pixel color
//! lookup differs. So instead of five copy-pasted inner loops, one shared
//! row driver ([`make_row_driver`]) is parameterized by a boxed per-pixel
//! color closure captured per paint kind in [`blit_for`].

use crate::coverage::{coverage, WindingRule};
use crate::geom::Point;
use crate::paint::{Paint, RepeatMode};
use crate::raster::{group_bit_set, BlitFn};

const GROUP_WIDTH: i32 = 4;

/// Builds the blit callback for `paint`, writing into `pixels` (row-major,
/// `stride` pixels per row, ARGB32 native byte order, alpha in the high
/// byte). Snapshots each gradient's LUT once up front so the per-pixel
/// closure never needs a second mutable borrow of the paint during
/// rasterization.
pub fn blit_for<'a>(
    paint: &'a mut Paint,
    pixels: &'a mut [u32],
    stride: i32,
    winding: WindingRule,
) -> Box<BlitFn<'a>> {
    match paint {
        Paint::Solid(argb) => {
            let argb = *argb;
            make_row_driver(pixels, stride, winding, move |_x, _y| argb)
        }
        Paint::Linear { p0, p1, gradient, repeat } => {
            let (p0, p1, repeat) = (*p0, *p1, *repeat);
            let table = gradient.table().to_vec();
            let len = table.len();
            let dx = p1.x - p0.x;
            let dy = p1.y - p0.y;
            let axis_len_sq = (dx * dx + dy * dy).max(1e-6);
            let color = move |x: i32, y: i32| -> u32 {
                let px = x as f32 + 0.5 - p0.x;
                let py = y as f32 + 0.5 - p0.y;
                let t = (px * dx + py * dy) / axis_len_sq;
                let idx = (t * len as f32).floor() as i32;
                table[repeat.apply(idx, len)]
            };
            make_row_driver(pixels, stride, winding, color)
        }
        Paint::Radial { center, radius, gradient, repeat } => {
            let (center, radius, repeat) = (*center, *radius, *repeat);
            let table = gradient.table().to_vec();
            let len = table.len();
            let rx = radius.x.abs().max(1e-6);
            let ry = radius.y.abs().max(1e-6);
            let color = move |x: i32, y: i32| -> u32 {
                let px = (x as f32 + 0.5 - center.x) / rx;
                let py = (y as f32 + 0.5 - center.y) / ry;
                let t = (px * px + py * py).sqrt();
                let idx = (t * len as f32).floor() as i32;
                table[repeat.apply(idx, len)]
            };
            make_row_driver(pixels, stride, winding, color)
        }
        Paint::Angular { center, axis0, axis1, num_repeats, gradient, repeat } => {
            let (center, axis0, axis1, num_repeats, repeat) =
                (*center, *axis0, *axis1, *num_repeats, *repeat);
            let table = gradient.table().to_vec();
            let len = table.len();
            let sx = axis0.x.abs().max(1e-6);
            let sy = axis1.y.abs().max(1e-6);
            let color = move |x: i32, y: i32| -> u32 {
                let px = (x as f32 + 0.5 - center.x) / sx;
                let py = (y as f32 + 0.5 - center.y) / sy;
                let angle = atan2_approx(py, px); // [-pi, pi]
                let frac = (angle / std::f32::consts::TAU).rem_euclid(1.0);
                let idx = (frac * len as f32 * num_repeats).floor() as i32;
                table[repeat.apply(idx, len)]
            };
            make_row_driver(pixels, stride, winding, color)
        }
        Paint::Biradial { c0, r0, c1, r1, gradient, repeat } => {
            let (c0, r0, c1, r1, repeat) = (*c0, *r0, *c1, *r1, *repeat);
            let table = gradient.table().to_vec();
            let len = table.len();
            // Undefined region (no real root, i.e. the focus circle isn't
            // enclosed by the main one for this pixel) fills with the last
            // LUT entry rather than going transparent, see DESIGN.md.
            let last = *table.last().unwrap_or(&0);
            let dx = c1.x - c0.x;
            let dy = c1.y - c0.y;
            let dr = r1 - r0;
            // a == 0 only for two identical circles (d == 0, dr == 0).
            let a = dx * dx + dy * dy - dr * dr;
            let color = move |x: i32, y: i32| -> u32 {
                let qx = x as f32 + 0.5;
                let qy = y as f32 + 0.5;
                let fx = c0.x - qx;
                let fy = c0.y - qy;
                let b = 2.0 * (fx * dx + fy * dy - r0 * dr);
                let c = fx * fx + fy * fy - r0 * r0;
                if a.abs() < 1e-6 {
                    return last;
                }
                let disc = b * b - 4.0 * a * c;
                if disc < 0.0 {
                    return last;
                }
                let t = (-b + disc.sqrt()) / (2.0 * a);
                let idx = (t * len as f32).floor() as i32;
                table[repeat.apply(idx, len)]
            };
            make_row_driver(pixels, stride, winding, color)
        }
    }
}

/// A widely used minimax-polynomial approximation of `atan2`, accurate to
/// within a few thousandths of a radian, avoiding a transcendental call per
/// pixel.
fn atan2_approx(y: f32, x: f32) -> f32 {
    const QUARTER_PI_COEFFS: (f32, f32, f32) = (-0.0464964749, 0.15931422, -0.327622764);
    let ax = x.abs();
    let ay = y.abs();
    let a = ax.min(ay) / (ax.max(ay) + 1.0e-10);
    let s = a * a;
    let (c0, c1, c2) = QUARTER_PI_COEFFS;
    let mut r = ((c0 * s + c1) * s + c2) * s * a + a;
    if ay > ax {
        r = std::f32::consts::FRAC_PI_2 - r;
    }
    if x < 0.0 {
        r = std::f32::consts::PI - r;
    }
    if y < 0.0 {
        r = -r;
    }
    r
}

/// Builds the shared per-row driver: integrates `delta` into a running
/// winding number (resetting to zero at the start of every row, since rows
/// are independent), consults the change mask to skip groups with no new
/// edge contribution, converts winding to coverage, fetches `color(x, y)`,
/// and source-over composites into `pixels`.
fn make_row_driver<'a>(
    pixels: &'a mut [u32],
    stride: i32,
    winding_rule: WindingRule,
    mut color: impl FnMut(i32, i32) -> u32 + 'a,
) -> Box<BlitFn<'a>> {
    Box::new(move |delta: &mut [i32], mask: &[u32], x0: i32, x1: i32, y: i32| {
        let mut winding = 0i32;
        let row_off = (y as i64 * stride as i64) as usize;

        let mut x = x0;
        while x < x1 {
            let local = x - x0;
            let group = local / GROUP_WIDTH;
            let group_has_edge = group_bit_set(mask, group);
            let group_end = ((group + 1) * GROUP_WIDTH).min(x1 - x0);

            if !group_has_edge {
                // No edge touched this group: winding (and therefore
                // coverage) is constant across it.
                let cov = coverage(winding, winding_rule);
                for lx in local..group_end {
                    let px = x0 + lx;
                    blend_pixel(pixels, row_off, px as usize, color(px, y), cov);
                }
            } else {
                for lx in local..group_end {
                    winding += delta[lx as usize];
                    delta[lx as usize] = 0;
                    let px = x0 + lx;
                    let cov = coverage(winding, winding_rule);
                    blend_pixel(pixels, row_off, px as usize, color(px, y), cov);
                }
            }
            x = x0 + group_end;
        }
    })
}

/// Source-over composite of one straight-alpha ARGB pixel at 16-bit
/// `coverage` (upper 8 bits used as the alpha multiplier) into
/// `pixels[row_off + x]`. Skips the read entirely when coverage is ~0
/// (nothing changes) or treats it as a plain overwrite when coverage is
/// ~full; the general blended case falls through to the per-channel lerp.
#[inline]
fn blend_pixel(pixels: &mut [u32], row_off: usize, x: usize, src: u32, cov: u16) {
    if cov == 0 {
        return;
    }
    let idx = row_off + x;
    let Some(dst) = pixels.get_mut(idx) else { return };

    let src_a = (src >> 24) & 0xFF;
    // cov saturates at 0xFFFF, not 0x10000, so round rather than truncate.
    let alpha = (((src_a * cov as u32) + 0x8000) >> 16).min(255);
    if alpha == 0 {
        return;
    }
    if alpha == 255 {
        *dst = src;
        return;
    }

    let inv = 255 - alpha;
    let blend_channel = |shift: u32| -> u32 {
        let s = (src >> shift) & 0xFF;
        let d = (*dst >> shift) & 0xFF;
        ((s * alpha + d * inv) / 255) & 0xFF
    };
    let a_out = (src_a * alpha + ((*dst >> 24) & 0xFF) * inv) / 255;
    *dst = (a_out << 24) | (blend_channel(16) << 16) | (blend_channel(8) << 8) | blend_channel(0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gradient::Gradient;
    use crate::raster::Rasterizer;

    fn draw_square(rast: &mut Rasterizer, min: (f32, f32), max: (f32, f32)) {
        rast.move_to(min.0, min.1);
        rast.line_to(max.0, min.1);
        rast.line_to(max.0, max.1);
        rast.line_to(min.0, max.1);
        rast.close_path();
    }

    #[test]
    fn solid_square_fills_exactly_its_interior() {
        use crate::geom::Rect;
        let mut pixels = vec![0u32; 32 * 32];
        let mut rast = Rasterizer::new();
        rast.initialise(Rect::from_size(32, 32));
        draw_square(&mut rast, (8.0, 8.0), (24.0, 24.0));
        let mut paint = Paint::Solid(0xFFFF0000);
        let mut blit = blit_for(&mut paint, &mut pixels, 32, WindingRule::NonZero);
        rast.rasterize(&mut *blit);
        drop(blit);

        for y in 0..32 {
            for x in 0..32 {
                let expect = if (8..24).contains(&x) && (8..24).contains(&y) {
                    0xFFFF0000u32
                } else {
                    0
                };
                assert_eq!(pixels[y * 32 + x], expect, "x={} y={}", x, y);
            }
        }
    }

    #[test]
    fn empty_clip_leaves_buffer_untouched() {
        use crate::geom::Rect;
        let mut pixels = vec![0xFFABCDEFu32; 10 * 10];
        let before = pixels.clone();
        let mut rast = Rasterizer::new();
        rast.initialise(Rect::new(0, 0, 0, 0));
        draw_square(&mut rast, (1.0, 1.0), (5.0, 5.0));
        let mut paint = Paint::Solid(0xFF000000);
        let mut blit = blit_for(&mut paint, &mut pixels, 10, WindingRule::NonZero);
        rast.rasterize(&mut *blit);
        drop(blit);
        assert_eq!(pixels, before);
    }

    #[test]
    fn linear_gradient_row_is_monotone_in_red_channel() {
        use crate::geom::Rect;
        let mut pixels = vec![0u32; 256];
        let mut rast = Rasterizer::new();
        rast.initialise(Rect::from_size(256, 1));
        draw_square(&mut rast, (0.0, 0.0), (256.0, 1.0));
        let mut gradient = Gradient::new(256);
        gradient.add_stop(0.0, 0xFF000000);
        gradient.add_stop(1.0, 0xFFFFFFFF);
        let mut paint = Paint::Linear {
            p0: Point::new(0.0, 0.0),
            p1: Point::new(256.0, 0.0),
            gradient,
            repeat: RepeatMode::Pad,
        };
        let mut blit = blit_for(&mut paint, &mut pixels, 256, WindingRule::NonZero);
        rast.rasterize(&mut *blit);
        drop(blit);

        assert_eq!(pixels[0], 0xFF000000);
        let mut prev = 0u32;
        for &p in &pixels {
            let r = (p >> 16) & 0xFF;
            assert!(r >= prev);
            prev = r;
        }
    }
}
