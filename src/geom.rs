//! Point and integer-rectangle primitives shared by the path store, the
//! rasterizer, and the canvas façade.
//!
//! Coordinates stay plain `f32`/`i32` rather than a generic fixed-point
//! trait family, since the rasterizer only ever needs one internal
//! accumulator scale (`coverage::WINDING_ONE`) and nothing else in the
//! crate needs hinting-style fixed point (see DESIGN.md).

/// A point in canvas space. Cheap to copy; the path store and its lazy
/// views (`offset`, `scale`, `rotate`) compute these on demand rather than
/// materializing a transformed copy of the path.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    #[inline(always)]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    #[inline(always)]
    pub fn offset(self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    #[inline(always)]
    pub fn scale(self, sx: f32, sy: f32) -> Self {
        Self::new(self.x * sx, self.y * sy)
    }

    /// Rotates about the origin by `radians`, matching the right-handed
    /// convention used throughout the rest of the crate (y grows downward,
    /// positive angle rotates from +x toward +y).
    #[inline(always)]
    pub fn rotate(self, radians: f32) -> Self {
        let (s, c) = radians.sin_cos();
        Self::new(self.x * c - self.y * s, self.x * s + self.y * c)
    }
}

impl std::ops::Add for Point {
    type Output = Point;
    #[inline(always)]
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Point {
    type Output = Point;
    #[inline(always)]
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// An integer rectangle used for the canvas's view and clip stacks. `max` is
/// an exclusive bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl Rect {
    #[inline(always)]
    pub const fn new(min_x: i32, min_y: i32, max_x: i32, max_y: i32) -> Self {
        Self { min_x, min_y, max_x, max_y }
    }

    #[inline(always)]
    pub const fn from_size(w: i32, h: i32) -> Self {
        Self::new(0, 0, w, h)
    }

    #[inline(always)]
    pub fn width(&self) -> i32 {
        self.max_x - self.min_x
    }

    #[inline(always)]
    pub fn height(&self) -> i32 {
        self.max_y - self.min_y
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.min_x >= self.max_x || self.min_y >= self.max_y
    }

    /// Largest rectangle contained in both `self` and `other`. Returns the
    /// canonical empty rectangle (all zero extents) if they don't overlap.
    pub fn intersect(self, other: Rect) -> Rect {
        let r = Rect {
            min_x: self.min_x.max(other.min_x),
            min_y: self.min_y.max(other.min_y),
            max_x: self.max_x.min(other.max_x),
            max_y: self.max_y.min(other.max_y),
        };
        if r.is_empty() {
            Rect::default()
        } else {
            r
        }
    }

    #[inline(always)]
    pub fn offset(self, dx: i32, dy: i32) -> Rect {
        Rect::new(self.min_x + dx, self.min_y + dy, self.max_x + dx, self.max_y + dy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_offset_then_negate_is_identity() {
        let p = Point::new(3.0, 4.0);
        let q = p.offset(5.0, -2.0).offset(-5.0, 2.0);
        assert!((p.x - q.x).abs() < 1e-5);
        assert!((p.y - q.y).abs() < 1e-5);
    }

    #[test]
    fn rect_intersect_empty_when_disjoint() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(20, 20, 30, 30);
        assert!(a.intersect(b).is_empty());
    }

    #[test]
    fn rect_intersect_idempotent() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(5, 5, 20, 20);
        let once = a.intersect(b);
        let twice = once.intersect(b);
        assert_eq!(once, twice);
    }
}
