//! Software RGBA raster surface backed by `image::RgbaImage`.
//!
//! Rects and line rasterization come from `imageproc`; every write goes
//! through its `Blend` canvas so translucent colors composite source-over.

use std::path::Path;

use glam::Vec2;
use image::{GenericImage, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, Blend, BresenhamLineIter, Canvas};
use imageproc::rect::Rect as PixelRect;

use super::font::{glyph, GLYPH_ADVANCE, GLYPH_HEIGHT, GLYPH_WIDTH};
use super::{Rect, Surface, SurfaceFactory, VerticalGradient};
use crate::color::Color;
use crate::error::{OverlayError, Result};

type BlendCanvas = Blend<RgbaImage>;

fn rgba(color: Color) -> Rgba<u8> {
    Rgba(color.to_array())
}

/// Blend one pixel, ignoring coordinates off the canvas.
fn blend_at(canvas: &mut BlendCanvas, x: i64, y: i64, color: Rgba<u8>) {
    let (w, h) = canvas.dimensions();
    if x < 0 || y < 0 || x >= w as i64 || y >= h as i64 {
        return;
    }
    canvas.draw_pixel(x as u32, y as u32, color);
}

/// CPU-side surface. Pixels start fully transparent.
#[derive(Clone, Debug)]
pub struct PixelSurface {
    image: RgbaImage,
}

impl PixelSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        if x >= self.image.width() || y >= self.image.height() {
            return None;
        }
        let [r, g, b, a] = self.image.get_pixel(x, y).0;
        Some(Color::rgba(r, g, b, a))
    }

    pub fn save_png(&self, path: &Path) -> Result<()> {
        self.image.save(path)?;
        Ok(())
    }

    /// Run `draw` against a blending view of the image.
    fn blended<F: FnOnce(&mut BlendCanvas)>(&mut self, draw: F) {
        let mut canvas = Blend(std::mem::take(&mut self.image));
        draw(&mut canvas);
        self.image = canvas.0;
    }

    /// Integer pixel bounds of `rect`, clipped to the surface.
    fn clip(&self, rect: Rect) -> Option<(u32, u32, u32, u32)> {
        let x0 = rect.x.round().max(0.0) as i64;
        let y0 = rect.y.round().max(0.0) as i64;
        let x1 = (rect.right().round() as i64).min(self.image.width() as i64);
        let y1 = (rect.bottom().round() as i64).min(self.image.height() as i64);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some((x0 as u32, y0 as u32, x1 as u32, y1 as u32))
    }
}

impl Surface for PixelSurface {
    fn width(&self) -> u32 {
        self.image.width()
    }

    fn height(&self) -> u32 {
        self.image.height()
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        let Some((x0, y0, x1, y1)) = self.clip(rect) else {
            return;
        };
        let area = PixelRect::at(x0 as i32, y0 as i32).of_size(x1 - x0, y1 - y0);
        self.blended(|canvas| draw_filled_rect_mut(canvas, area, rgba(color)));
    }

    fn stroke_polyline(&mut self, points: &[Vec2], color: Color, line_width: f32) {
        if points.len() < 2 {
            return;
        }

        // Coverage mask so overlapping brush stamps blend once per pixel
        let (w, h) = (self.image.width() as i64, self.image.height() as i64);
        let mut covered = vec![false; (w * h) as usize];
        let brush = line_width.round().max(1.0) as i64;
        let offset = (brush - 1) / 2;

        for pair in points.windows(2) {
            let line = BresenhamLineIter::new((pair[0].x, pair[0].y), (pair[1].x, pair[1].y));
            for (px, py) in line {
                let (bx, by) = (px as i64 - offset, py as i64 - offset);
                for y in by..by + brush {
                    for x in bx..bx + brush {
                        if x >= 0 && y >= 0 && x < w && y < h {
                            covered[(y * w + x) as usize] = true;
                        }
                    }
                }
            }
        }

        let color = rgba(color);
        self.blended(|canvas| {
            for (i, hit) in covered.iter().enumerate() {
                if *hit {
                    let i = i as i64;
                    blend_at(canvas, i % w, i / w, color);
                }
            }
        });
    }

    fn fill_polygon(&mut self, points: &[Vec2], gradient: &VerticalGradient) {
        if points.len() < 3 {
            return;
        }

        let min_y = points.iter().map(|p| p.y).fold(f32::INFINITY, f32::min);
        let max_y = points.iter().map(|p| p.y).fold(f32::NEG_INFINITY, f32::max);
        let y_start = min_y.floor().max(0.0) as i64;
        let y_end = (max_y.ceil() as i64).min(self.image.height() as i64);

        // Scanline fill: imageproc's polygon fill takes a single color, the
        // gradient needs one per row.
        self.blended(|canvas| {
            let mut crossings: Vec<f32> = Vec::with_capacity(points.len());
            for py in y_start..y_end {
                let yc = py as f32 + 0.5;
                crossings.clear();
                for i in 0..points.len() {
                    let a = points[i];
                    let b = points[(i + 1) % points.len()];
                    if (a.y <= yc && yc < b.y) || (b.y <= yc && yc < a.y) {
                        crossings.push(a.x + (yc - a.y) * (b.x - a.x) / (b.y - a.y));
                    }
                }
                crossings.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

                let color = rgba(gradient.color_at(yc));
                for span in crossings.chunks_exact(2) {
                    let x_start = (span[0] - 0.5).ceil() as i64;
                    let x_end = (span[1] - 0.5).ceil() as i64;
                    for px in x_start..x_end {
                        blend_at(canvas, px, py, color);
                    }
                }
            }
        });
    }

    fn copy_region(&mut self, src: Rect, dst: Vec2) {
        let Some((x0, y0, x1, y1)) = self.clip(src) else {
            return;
        };
        let (dx, dy) = (dst.x.round(), dst.y.round());
        if dx < 0.0 || dy < 0.0 {
            log::debug!("copy_region destination ({}, {}) is off the surface", dx, dy);
            return;
        }
        let source = image::math::Rect {
            x: x0,
            y: y0,
            width: x1 - x0,
            height: y1 - y0,
        };
        // copy_within handles the overlap between source and destination
        if !self.image.copy_within(source, dx as u32, dy as u32) {
            log::debug!("copy_region destination ({}, {}) does not fit", dx, dy);
        }
    }

    fn fill_text(&mut self, text: &str, origin: Vec2, font_size: f32, color: Color) {
        // Glyphs are 7 rows tall; one glyph pixel per 12 units of font size
        let scale = (font_size / 12.0).round().max(1.0) as i64;
        let left = origin.x.round() as i64;
        let top = origin.y.round() as i64;
        let color = rgba(color);

        self.blended(|canvas| {
            let mut pen_x = left;
            for c in text.chars() {
                if let Some(rows) = glyph(c) {
                    for (row, bits) in rows.iter().enumerate().take(GLYPH_HEIGHT as usize) {
                        for col in 0..GLYPH_WIDTH {
                            if bits & (0x10 >> col) == 0 {
                                continue;
                            }
                            let gx = pen_x + col as i64 * scale;
                            let gy = top + row as i64 * scale;
                            for y in gy..gy + scale {
                                for x in gx..gx + scale {
                                    blend_at(canvas, x, y, color);
                                }
                            }
                        }
                    }
                }
                pen_x += GLYPH_ADVANCE as i64 * scale;
            }
        });
    }
}

/// Creates [`PixelSurface`]s. Zero-sized requests are refused.
#[derive(Clone, Copy, Debug, Default)]
pub struct PixelSurfaceFactory;

impl SurfaceFactory for PixelSurfaceFactory {
    type Surface = PixelSurface;

    fn create_surface(&mut self, label: &str, width: u32, height: u32) -> Result<PixelSurface> {
        if width == 0 || height == 0 {
            return Err(OverlayError::surface_unavailable(
                label,
                format!("cannot allocate a {}x{} raster", width, height),
            ));
        }
        Ok(PixelSurface::new(width, height))
    }
}
