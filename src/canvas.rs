//! Canvas façade: owns the pixel buffer and the view/clip rectangle stack,
//! and is the single entry point that wires path → rasterizer → blit
//! together.

use crate::coverage::WindingRule;
use crate::geom::Rect;
use crate::path::PathSource;
use crate::paint::Paint;
use crate::raster::Rasterizer;

/// A pushed view/clip snapshot, restored by [`Canvas::restore`].
#[derive(Debug, Clone, Copy)]
struct ViewState {
    view: Rect,
    clip: Rect,
}

/// Owns a row-major ARGB32 pixel buffer (native byte order, alpha in the
/// high byte) plus the current view/clip rectangles. `stride` is in pixels
/// and must be a multiple of 4; violating that is a contract violation
/// diagnosed by assertion, never a recoverable error, so the constructor
/// `debug_assert!`s it rather than returning a `Result`.
pub struct Canvas {
    pixels: Vec<u32>,
    width: i32,
    height: i32,
    stride: i32,
    view: Rect,
    clip: Rect,
    stack: Vec<ViewState>,
    rasterizer: Rasterizer,
}

impl Canvas {
    /// Creates a canvas over a zeroed `width x height` buffer with
    /// `stride == width` rounded up to a multiple of 4.
    pub fn new(width: i32, height: i32) -> Self {
        debug_assert!(width > 0 && height > 0);
        let stride = (width + 3) & !3;
        let full = Rect::from_size(width, height);
        Self {
            pixels: vec![0; stride as usize * height as usize],
            width,
            height,
            stride,
            view: full,
            clip: full,
            stack: Vec::new(),
            rasterizer: Rasterizer::new(),
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }
    pub fn height(&self) -> i32 {
        self.height
    }
    pub fn stride(&self) -> i32 {
        self.stride
    }
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }
    pub fn pixels_mut(&mut self) -> &mut [u32] {
        &mut self.pixels
    }

    pub fn view(&self) -> Rect {
        self.view
    }
    pub fn clip(&self) -> Rect {
        self.clip
    }

    /// Pushes the current `(view, clip)` so a later [`Canvas::restore`] can
    /// bring it back.
    pub fn save(&mut self) {
        self.stack.push(ViewState { view: self.view, clip: self.clip });
    }

    /// Restores the most recently [`Canvas::save`]d `(view, clip)`. A
    /// no-op if the stack is empty.
    pub fn restore(&mut self) {
        if let Some(s) = self.stack.pop() {
            self.view = s.view;
            self.clip = s.clip;
        }
    }

    /// Sets the view to `rect` intersected with the prior clip, and resets
    /// the clip to match.
    pub fn set_view(&mut self, rect: Rect) {
        self.view = rect.intersect(self.clip);
        self.clip = self.view;
    }

    /// Intersects `rect` with the current clip. Idempotent: calling this
    /// twice with the same rectangle leaves the clip equal to
    /// `intersect(prior, rect)` exactly once.
    pub fn set_clip(&mut self, rect: Rect) {
        self.clip = self.clip.intersect(rect);
    }

    /// Fills `path` with `paint` under `winding`. Offsets the path by the
    /// view origin via a lazy view (no allocation), feeds it through the
    /// rasterizer initialised with the current clip, and dispatches to the
    /// blit matching `paint`'s variant × `winding` × repeat. An empty clip
    /// short-circuits to a no-op, leaving the pixel buffer untouched.
    pub fn draw<S: PathSource>(&mut self, path: &S, paint: &mut Paint, winding: WindingRule) {
        if self.clip.is_empty() {
            return;
        }
        let view = self.view_offset_for(path);
        self.rasterizer.initialise(self.clip);
        self.rasterizer.add_path(&view);

        let mut blit = crate::blit::blit_for(paint, &mut self.pixels, self.stride, winding);
        self.rasterizer.rasterize(&mut *blit);
    }

    fn view_offset_for<'a, S: PathSource>(&self, path: &'a S) -> crate::path::Offset<'a, S> {
        crate::path::Offset::new(path, self.view.min_x as f32, self.view.min_y as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::Path;

    fn square(p: &mut Path, min: (f32, f32), max: (f32, f32)) {
        p.move_to(min.0, min.1);
        p.line_to(max.0, min.1).unwrap();
        p.line_to(max.0, max.1).unwrap();
        p.line_to(min.0, max.1).unwrap();
        p.close().unwrap();
    }

    #[test]
    fn set_clip_intersection_is_idempotent() {
        let mut c = Canvas::new(64, 64);
        let r = Rect::new(5, 5, 50, 50);
        c.set_clip(r);
        let once = c.clip();
        c.set_clip(r);
        assert_eq!(once, c.clip());
    }

    #[test]
    fn empty_clip_short_circuits_draw() {
        let mut c = Canvas::new(10, 10);
        c.pixels_mut().iter_mut().for_each(|p| *p = 0xFFABCDEF);
        let before = c.pixels().to_vec();

        c.set_view(Rect::new(10, 10, 20, 20));
        c.set_clip(Rect::new(100, 100, 110, 110));
        assert!(c.clip().is_empty());

        let mut p = Path::new();
        square(&mut p, (1.0, 1.0), (5.0, 5.0));
        let mut paint = Paint::Solid(0xFF000000);
        c.draw(&p, &mut paint, WindingRule::NonZero);

        assert_eq!(c.pixels(), before.as_slice());
    }

    #[test]
    fn solid_draw_fills_expected_rect() {
        let mut c = Canvas::new(32, 32);
        let mut p = Path::new();
        square(&mut p, (8.0, 8.0), (24.0, 24.0));
        let mut paint = Paint::Solid(0xFFFF0000);
        c.draw(&p, &mut paint, WindingRule::NonZero);

        let stride = c.stride();
        for y in 0..32 {
            for x in 0..32 {
                let expect = if (8..24).contains(&x) && (8..24).contains(&y) { 0xFFFF0000u32 } else { 0 };
                assert_eq!(c.pixels()[(y * stride + x) as usize], expect, "x={} y={}", x, y);
            }
        }
    }
}
