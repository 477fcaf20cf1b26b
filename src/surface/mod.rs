//! Drawable surfaces that panels paint onto.
//!
//! A panel owns exactly one surface and talks to it only through the
//! [`Surface`] trait. Three backends ship with the crate:
//! - `PixelSurface` (native only): software RGBA raster, exportable as PNG
//! - [`RecordingSurface`]: records draw commands, used for headless inspection and tests
//! - `CanvasSurface` (wasm32 only): a browser `<canvas>` 2D context

use glam::Vec2;

use crate::color::Color;
use crate::error::Result;

#[cfg(not(target_arch = "wasm32"))]
mod font;
#[cfg(not(target_arch = "wasm32"))]
mod pixel;
mod recording;

#[cfg(target_arch = "wasm32")]
pub mod canvas;

#[cfg(not(target_arch = "wasm32"))]
pub use pixel::{PixelSurface, PixelSurfaceFactory};
pub use recording::{DrawCommand, RecordingSurface, RecordingSurfaceFactory};

/// Axis-aligned rectangle in device pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

/// Linear color ramp along the y axis, used to fill the area under a line.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VerticalGradient {
    pub top: f32,
    pub bottom: f32,
    pub top_color: Color,
    pub bottom_color: Color,
}

impl VerticalGradient {
    /// Interpolated color at height `y`, clamped to the ramp ends.
    pub fn color_at(&self, y: f32) -> Color {
        let span = self.bottom - self.top;
        let t = if span.abs() <= f32::EPSILON {
            0.0
        } else {
            ((y - self.top) / span).clamp(0.0, 1.0)
        };
        let lerp = |a: u8, b: u8| -> u8 { (a as f32 + (b as f32 - a as f32) * t).round() as u8 };
        Color::rgba(
            lerp(self.top_color.r, self.bottom_color.r),
            lerp(self.top_color.g, self.bottom_color.g),
            lerp(self.top_color.b, self.bottom_color.b),
            lerp(self.top_color.a, self.bottom_color.a),
        )
    }
}

/// A 2D drawing target owned by a single panel.
pub trait Surface {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// Source-over fill of `rect` with `color`.
    fn fill_rect(&mut self, rect: Rect, color: Color);

    /// Stroke a connected polyline. Fewer than two points draws nothing.
    fn stroke_polyline(&mut self, points: &[Vec2], color: Color, line_width: f32);

    /// Fill a closed polygon with a vertical gradient.
    fn fill_polygon(&mut self, points: &[Vec2], gradient: &VerticalGradient);

    /// Copy the pixels under `src` so their top-left corner lands on `dst`.
    fn copy_region(&mut self, src: Rect, dst: Vec2);

    /// Draw `text` with its top-left corner at `origin`.
    fn fill_text(&mut self, text: &str, origin: Vec2, font_size: f32, color: Color);
}

/// Allocates surfaces for newly constructed panels.
pub trait SurfaceFactory {
    type Surface: Surface;

    /// Create a `width` x `height` surface for the panel called `label`.
    ///
    /// Implementations return [`crate::OverlayError::SurfaceUnavailable`] when
    /// no drawing context can be obtained.
    fn create_surface(&mut self, label: &str, width: u32, height: u32) -> Result<Self::Surface>;
}
