//! Curve flattener: turns quadratic and cubic Bézier segments into line
//! segments fed straight into the rasterizer's edge list.
//!
//! Recursive de Casteljau subdivision with a per-split deviation test
//! (halve until the control point(s) are within tolerance of the chord,
//! then emit the chord). The deviation math (a cross-product distance from
//! chord) is the same shape used by `golang.org/x/image/vector`-style
//! flatteners; the recursive structure keeps a bounded stack depth so it
//! stays allocation-free for ordinary paths.

use crate::geom::Point;
use crate::util::lerp_point;

/// Roughly a quarter pixel, tight enough that subdivision artifacts are
/// imperceptible, loose enough to keep segment counts low.
const FLATTEN_TOLERANCE: f32 = 0.25;

/// Recursion is capped; past this depth we simply emit the chord, which
/// only matters for pathological/degenerate control points since real
/// curves converge in well under this many halvings.
const MAX_DEPTH: u32 = 24;

/// Deviation of `mid` from the line `a`-`b`, as `|d·n|` for the unit normal
/// `n` of `b-a`.
fn deviation(a: Point, mid: Point, b: Point) -> f32 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len = (dx * dx + dy * dy).sqrt();
    if len < 1e-12 {
        // Degenerate chord: deviation is just distance from the (coincident)
        // endpoint, so any nonzero control offset forces another split.
        let ex = mid.x - a.x;
        let ey = mid.y - a.y;
        return (ex * ex + ey * ey).sqrt();
    }
    // n = (-dy, dx) / len is the unit normal; |d . n| = |(mid-a) x (b-a)| / len.
    let cross = (mid.x - a.x) * dy - (mid.y - a.y) * dx;
    cross.abs() / len
}

/// Flattens a quadratic Bézier `(p0, p1, p2)` (p0 is the current pen
/// position, not passed as a control point) into line segments, calling
/// `emit(x, y)` for each generated vertex in order (p0 itself is not
/// re-emitted; the caller already has the pen there).
pub fn flatten_quad(p0: Point, p1: Point, p2: Point, emit: &mut dyn FnMut(f32, f32)) {
    quad_rec(p0, p1, p2, 0, emit);
}

fn quad_rec(p0: Point, p1: Point, p2: Point, depth: u32, emit: &mut dyn FnMut(f32, f32)) {
    if depth >= MAX_DEPTH || deviation(p0, p1, p2) <= FLATTEN_TOLERANCE {
        emit(p2.x, p2.y);
        return;
    }
    let p01 = mid(p0, p1);
    let p12 = mid(p1, p2);
    let p012 = mid(p01, p12);
    quad_rec(p0, p01, p012, depth + 1, emit);
    quad_rec(p012, p12, p2, depth + 1, emit);
}

/// Flattens a cubic Bézier `(p0, p1, p2, p3)` into line segments. Stops
/// subdividing when both control points satisfy the deviation test against
/// the chord `p0`-`p3`.
pub fn flatten_cubic(p0: Point, p1: Point, p2: Point, p3: Point, emit: &mut dyn FnMut(f32, f32)) {
    cubic_rec(p0, p1, p2, p3, 0, emit);
}

fn cubic_rec(p0: Point, p1: Point, p2: Point, p3: Point, depth: u32, emit: &mut dyn FnMut(f32, f32)) {
    let flat = deviation(p0, p1, p3) <= FLATTEN_TOLERANCE && deviation(p0, p2, p3) <= FLATTEN_TOLERANCE;
    if depth >= MAX_DEPTH || flat {
        emit(p3.x, p3.y);
        return;
    }
    let p01 = mid(p0, p1);
    let p12 = mid(p1, p2);
    let p23 = mid(p2, p3);
    let p012 = mid(p01, p12);
    let p123 = mid(p12, p23);
    let p0123 = mid(p012, p123);
    cubic_rec(p0, p01, p012, p0123, depth + 1, emit);
    cubic_rec(p0123, p123, p23, p3, depth + 1, emit);
}

#[inline(always)]
fn mid(a: Point, b: Point) -> Point {
    let (x, y) = lerp_point(0.5, a.x, a.y, b.x, b.y);
    Point::new(x, y)
}
