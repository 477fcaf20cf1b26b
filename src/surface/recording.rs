//! Surface that records draw calls instead of rasterizing them.

use glam::Vec2;

use super::{Rect, Surface, SurfaceFactory, VerticalGradient};
use crate::color::Color;
use crate::error::Result;

/// One recorded draw call.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    FillRect {
        rect: Rect,
        color: Color,
    },
    StrokePolyline {
        points: Vec<Vec2>,
        color: Color,
        line_width: f32,
    },
    FillPolygon {
        points: Vec<Vec2>,
        gradient: VerticalGradient,
    },
    CopyRegion {
        src: Rect,
        dst: Vec2,
    },
    FillText {
        text: String,
        origin: Vec2,
        font_size: f32,
        color: Color,
    },
}

#[derive(Clone, Debug, Default)]
pub struct RecordingSurface {
    width: u32,
    height: u32,
    commands: Vec<DrawCommand>,
}

impl RecordingSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            commands: Vec::new(),
        }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Drain the log, returning everything recorded so far.
    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// Every `FillText` string in recording order.
    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|cmd| match cmd {
                DrawCommand::FillText { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Every stroked polyline as `(points, color)`.
    pub fn strokes(&self) -> Vec<(&[Vec2], Color)> {
        self.commands
            .iter()
            .filter_map(|cmd| match cmd {
                DrawCommand::StrokePolyline { points, color, .. } => Some((points.as_slice(), *color)),
                _ => None,
            })
            .collect()
    }
}

impl Surface for RecordingSurface {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.commands.push(DrawCommand::FillRect { rect, color });
    }

    fn stroke_polyline(&mut self, points: &[Vec2], color: Color, line_width: f32) {
        if points.len() < 2 {
            return;
        }
        self.commands.push(DrawCommand::StrokePolyline {
            points: points.to_vec(),
            color,
            line_width,
        });
    }

    fn fill_polygon(&mut self, points: &[Vec2], gradient: &VerticalGradient) {
        if points.len() < 3 {
            return;
        }
        self.commands.push(DrawCommand::FillPolygon {
            points: points.to_vec(),
            gradient: *gradient,
        });
    }

    fn copy_region(&mut self, src: Rect, dst: Vec2) {
        self.commands.push(DrawCommand::CopyRegion { src, dst });
    }

    fn fill_text(&mut self, text: &str, origin: Vec2, font_size: f32, color: Color) {
        self.commands.push(DrawCommand::FillText {
            text: text.to_string(),
            origin,
            font_size,
            color,
        });
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct RecordingSurfaceFactory;

impl SurfaceFactory for RecordingSurfaceFactory {
    type Surface = RecordingSurface;

    fn create_surface(&mut self, _label: &str, width: u32, height: u32) -> Result<RecordingSurface> {
        Ok(RecordingSurface::new(width, height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_commands_drains_log() {
        let mut s = RecordingSurface::new(10, 10);
        s.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0), Color::BLACK);
        s.fill_text("FPS", Vec2::ZERO, 12.0, Color::BLACK);

        let taken = s.take_commands();
        assert_eq!(taken.len(), 2);
        assert!(matches!(taken[1], DrawCommand::FillText { ref text, .. } if text == "FPS"));
        assert!(s.commands().is_empty());
    }

    #[test]
    fn test_degenerate_shapes_are_not_recorded() {
        let mut s = RecordingSurface::new(10, 10);
        s.stroke_polyline(&[Vec2::ZERO], Color::BLACK, 1.0);
        let gradient = VerticalGradient {
            top: 0.0,
            bottom: 1.0,
            top_color: Color::BLACK,
            bottom_color: Color::WHITE,
        };
        s.fill_polygon(&[Vec2::ZERO, Vec2::ONE], &gradient);
        assert!(s.commands().is_empty());
        assert_eq!((s.width(), s.height()), (10, 10));
    }
}
