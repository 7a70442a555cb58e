//! A software-only 2D vector graphics rasterizer core: the scanline fill
//! algorithm, analytic coverage, the curve flattener, the path store, and
//! the gradient/blit pipeline that turns coverage into composited pixels.
//!
//! Out of scope (see each module's docs and `DESIGN.md` for the full
//! rationale): windowing/backend glue, a glyph/TrueType layer, stroking
//! and dashing, blend modes beyond source-over, and multithreading. The
//! core only ever emits `moveTo/lineTo/quadTo/cubicTo` into a [`path`] and
//! consumes a finished pixel buffer; everything upstream or downstream of
//! that is someone else's concern.

pub mod blit;
pub mod canvas;
pub mod coverage;
pub mod error;
pub mod flatten;
pub mod geom;
pub mod gradient;
pub mod paint;
pub mod path;
pub mod raster;
pub mod util;

pub use canvas::Canvas;
pub use coverage::WindingRule;
pub use error::PathError;
pub use geom::{Point, Rect};
pub use gradient::Gradient;
pub use paint::{Paint, RepeatMode};
pub use path::Path;
