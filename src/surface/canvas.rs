//! Browser `<canvas>` backend.

use glam::Vec2;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, Document, HtmlCanvasElement};

use super::{Rect, Surface, SurfaceFactory, VerticalGradient};
use crate::color::Color;
use crate::error::{OverlayError, Result};
use crate::panel::{LOGICAL_HEIGHT, LOGICAL_WIDTH};

const FONT_FAMILY: &str = "\"Avenir Next\", Helvetica, \"Helvetica Neue\", Arial, sans-serif";

pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    context: CanvasRenderingContext2d,
}

impl CanvasSurface {
    /// The element to mount in the page.
    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    #[allow(deprecated)]
    fn set_fill(&self, color: Color) {
        self.context.set_fill_style(&JsValue::from_str(&color.to_css()));
    }

    fn trace_path(&self, points: &[Vec2]) {
        self.context.begin_path();
        self.context.move_to(points[0].x as f64, points[0].y as f64);
        for p in &points[1..] {
            self.context.line_to(p.x as f64, p.y as f64);
        }
    }
}

impl Surface for CanvasSurface {
    fn width(&self) -> u32 {
        self.canvas.width()
    }

    fn height(&self) -> u32 {
        self.canvas.height()
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.set_fill(color);
        self.context.fill_rect(
            rect.x as f64,
            rect.y as f64,
            rect.width as f64,
            rect.height as f64,
        );
    }

    #[allow(deprecated)]
    fn stroke_polyline(&mut self, points: &[Vec2], color: Color, line_width: f32) {
        if points.len() < 2 {
            return;
        }
        self.trace_path(points);
        self.context
            .set_stroke_style(&JsValue::from_str(&color.to_css()));
        self.context.set_line_width(line_width as f64);
        self.context.stroke();
    }

    #[allow(deprecated)]
    fn fill_polygon(&mut self, points: &[Vec2], gradient: &VerticalGradient) {
        if points.len() < 3 {
            return;
        }
        let fill = self
            .context
            .create_linear_gradient(0.0, gradient.top as f64, 0.0, gradient.bottom as f64);
        if let Err(e) = fill.add_color_stop(0.0, &gradient.top_color.to_css()) {
            log::warn!("Gradient stop rejected: {:?}", e);
        }
        if let Err(e) = fill.add_color_stop(1.0, &gradient.bottom_color.to_css()) {
            log::warn!("Gradient stop rejected: {:?}", e);
        }
        self.trace_path(points);
        self.context.close_path();
        self.context.set_fill_style(&fill);
        self.context.fill();
    }

    fn copy_region(&mut self, src: Rect, dst: Vec2) {
        let result = self
            .context
            .draw_image_with_html_canvas_element_and_sw_and_sh_and_dx_and_dy_and_dw_and_dh(
                &self.canvas,
                src.x as f64,
                src.y as f64,
                src.width as f64,
                src.height as f64,
                dst.x as f64,
                dst.y as f64,
                src.width as f64,
                src.height as f64,
            );
        if let Err(e) = result {
            log::warn!("Canvas self-copy failed: {:?}", e);
        }
    }

    fn fill_text(&mut self, text: &str, origin: Vec2, font_size: f32, color: Color) {
        self.context
            .set_font(&format!("400 {}px {}", font_size, FONT_FAMILY));
        self.context.set_text_baseline("top");
        self.set_fill(color);
        if let Err(e) = self
            .context
            .fill_text(text, origin.x as f64, origin.y as f64)
        {
            log::warn!("Canvas fill_text failed: {:?}", e);
        }
    }
}

/// Creates detached `<canvas>` elements sized in device pixels and styled at
/// the logical panel size.
pub struct CanvasSurfaceFactory {
    document: Document,
}

impl CanvasSurfaceFactory {
    /// `None` outside a window context.
    pub fn new() -> Option<Self> {
        let document = web_sys::window()?.document()?;
        Some(Self { document })
    }
}

impl SurfaceFactory for CanvasSurfaceFactory {
    type Surface = CanvasSurface;

    fn create_surface(&mut self, label: &str, width: u32, height: u32) -> Result<CanvasSurface> {
        let unavailable = |reason: &str| OverlayError::surface_unavailable(label, reason);

        let canvas: HtmlCanvasElement = self
            .document
            .create_element("canvas")
            .map_err(|_| unavailable("createElement(\"canvas\") failed"))?
            .dyn_into()
            .map_err(|_| unavailable("element is not a canvas"))?;
        canvas.set_width(width);
        canvas.set_height(height);
        canvas.style().set_css_text(&format!(
            "width: {}px; height: {}px",
            LOGICAL_WIDTH, LOGICAL_HEIGHT
        ));

        let context: CanvasRenderingContext2d = canvas
            .get_context("2d")
            .ok()
            .flatten()
            .ok_or_else(|| unavailable("2d context unavailable"))?
            .dyn_into()
            .map_err(|_| unavailable("context is not a CanvasRenderingContext2d"))?;

        Ok(CanvasSurface { canvas, context })
    }
}
