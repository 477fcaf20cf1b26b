//! A single metric panel: throttled sampling, history and chart rendering.
//!
//! Each panel pulls a [`MetricSample`] from its supplier whenever enough time
//! has elapsed since the last accepted sample, records it in a fixed-capacity
//! [`RingHistory`], and repaints its surface in one of two [`RenderMode`]s:
//!
//! ```text
//! +--------------------------------+
//! | 60 FPS (58-61)                 |  title band (memoized)
//! |  +--------------------------+  |
//! |  |   /\__/\___/\_           |  |  graph region
//! |  +--------------------------+  |
//! +--------------------------------+
//! ```

use std::fmt;
use std::str::FromStr;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::error::{OverlayError, Result};
use crate::history::RingHistory;
use crate::surface::{Rect, Surface, SurfaceFactory, VerticalGradient};
use crate::threshold::{resolve_color, Threshold};

/// Logical panel size before pixel-ratio scaling.
pub const LOGICAL_WIDTH: u32 = 100;
pub const LOGICAL_HEIGHT: u32 = 60;

/// Largest supported pixel ratio. Higher ratios are clamped to it.
pub const MAX_PIXEL_RATIO: u32 = 16;

/// Logical title font size.
const FONT_SIZE: f32 = 12.0;

/// Alpha of the background wash laid over the foreground in the graph backdrop.
const BACKDROP_ALPHA: f32 = 0.9;

/// Alpha of the area fill right under the line in soft mode.
const FILL_TOP_ALPHA: f32 = 0.6;

/// One value produced by a supplier.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MetricSample {
    pub value: f64,
    /// Vertical scale hint. The chart grows past it if `value` does.
    pub max_value: f64,
}

impl MetricSample {
    pub fn new(value: f64, max_value: f64) -> Self {
        Self { value, max_value }
    }
}

/// Callback invoked as `supplier(timestamp_ms, delta_ms)` when a panel's
/// throttle fires. `None` means no data this time and leaves the panel untouched.
pub type SampleSupplier = Box<dyn FnMut(f64, f64) -> Option<MetricSample>>;

/// Graph rendering strategy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// Clear and redraw the whole line with a gradient fill on every sample.
    #[default]
    Soft,
    /// Scroll the existing pixels left one column and paint only the newest bar.
    Hardcore,
}

impl FromStr for RenderMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "soft" => Ok(RenderMode::Soft),
            "hardcore" => Ok(RenderMode::Hardcore),
            other => Err(format!("unknown render mode '{}' (expected soft or hardcore)", other)),
        }
    }
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderMode::Soft => write!(f, "soft"),
            RenderMode::Hardcore => write!(f, "hardcore"),
        }
    }
}

/// Device-pixel geometry of a panel for a given pixel ratio.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PanelLayout {
    pub pixel_ratio: u32,
    pub width: u32,
    pub height: u32,
    pub text_origin: Vec2,
    pub font_size: f32,
    pub graph: Rect,
}

impl PanelLayout {
    /// The ratio is rounded and clamped to `1..=MAX_PIXEL_RATIO`.
    pub fn new(pixel_ratio: f32) -> Self {
        let ratio = if pixel_ratio.is_finite() {
            pixel_ratio.round().clamp(1.0, MAX_PIXEL_RATIO as f32) as u32
        } else {
            1
        };
        let p = ratio as f32;
        Self {
            pixel_ratio: ratio,
            width: LOGICAL_WIDTH * ratio,
            height: LOGICAL_HEIGHT * ratio,
            text_origin: Vec2::new(3.0 * p, 2.0 * p),
            font_size: FONT_SIZE * p,
            graph: Rect::new(3.0 * p, 18.0 * p, 94.0 * p, 40.0 * p),
        }
    }

    /// Width of one hardcore-mode column.
    pub fn column_width(&self) -> f32 {
        self.pixel_ratio as f32
    }

    /// One history slot per horizontal graph pixel.
    pub fn history_capacity(&self) -> usize {
        self.graph.width as usize
    }
}

impl Default for PanelLayout {
    fn default() -> Self {
        Self::new(1.0)
    }
}

/// Construction parameters for a [`Panel`].
#[derive(Clone, Debug)]
pub struct PanelOptions {
    pub name: String,
    pub foreground: Color,
    pub background: Color,
    /// Minimum time between accepted samples; `0` samples on every update.
    pub refresh_interval_ms: f64,
    pub mode: RenderMode,
    pub pixel_ratio: f32,
}

impl PanelOptions {
    pub fn new(name: impl Into<String>, foreground: Color) -> Self {
        Self {
            name: name.into(),
            foreground,
            background: Color::WHITE,
            refresh_interval_ms: 0.0,
            mode: RenderMode::Soft,
            pixel_ratio: 1.0,
        }
    }

    pub fn with_background(mut self, background: Color) -> Self {
        self.background = background;
        self
    }

    pub fn with_refresh_interval(mut self, refresh_interval_ms: f64) -> Self {
        self.refresh_interval_ms = refresh_interval_ms;
        self
    }

    pub fn with_mode(mut self, mode: RenderMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_pixel_ratio(mut self, pixel_ratio: f32) -> Self {
        self.pixel_ratio = pixel_ratio;
        self
    }
}

/// Rounded `(value, min, max)` last painted into the title band.
type TitleKey = (i64, i64, i64);

pub struct Panel<S: Surface> {
    name: String,
    foreground: Color,
    background: Color,
    refresh_interval_ms: f64,
    mode: RenderMode,
    thresholds: Vec<Threshold>,
    supplier: SampleSupplier,
    history: RingHistory,
    min: f64,
    max: f64,
    last_sample_time: Option<f64>,
    last_title: Option<TitleKey>,
    layout: PanelLayout,
    surface: S,
}

impl<S: Surface> Panel<S> {
    /// Build a panel and paint its initial frame.
    ///
    /// Fails with [`OverlayError::SurfaceUnavailable`] if `factory` cannot
    /// provide a surface; no panel exists in that case.
    pub fn new<F, P>(options: PanelOptions, supplier: P, factory: &mut F) -> Result<Self>
    where
        F: SurfaceFactory<Surface = S>,
        P: FnMut(f64, f64) -> Option<MetricSample> + 'static,
    {
        if options.name.trim().is_empty() {
            return Err(OverlayError::EmptyPanelName);
        }
        if !options.refresh_interval_ms.is_finite() || options.refresh_interval_ms < 0.0 {
            return Err(OverlayError::InvalidRefreshInterval {
                panel: options.name,
                interval_ms: options.refresh_interval_ms,
            });
        }

        let layout = PanelLayout::new(options.pixel_ratio);
        let surface = factory.create_surface(&options.name, layout.width, layout.height)?;

        let mut panel = Self {
            name: options.name,
            foreground: options.foreground,
            background: options.background,
            refresh_interval_ms: options.refresh_interval_ms,
            mode: options.mode,
            thresholds: Vec::new(),
            supplier: Box::new(supplier),
            history: RingHistory::new(layout.history_capacity()),
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            last_sample_time: None,
            last_title: None,
            layout,
            surface,
        };
        panel.paint_initial();
        Ok(panel)
    }

    /// Pull a sample if the throttle allows it and repaint.
    ///
    /// Returns `true` when a sample was accepted. A panel that has never been
    /// [`prime`](Self::prime)d accepts its first sample unconditionally and
    /// hands the supplier a delta of `0`.
    pub fn update(&mut self, timestamp: f64) -> bool {
        let delta = self.last_sample_time.map(|last| timestamp - last);
        if let Some(delta) = delta {
            if delta < self.refresh_interval_ms {
                return false;
            }
        }

        let Some(sample) = (self.supplier)(timestamp, delta.unwrap_or(0.0)) else {
            return false;
        };
        if !sample.value.is_finite() {
            log::trace!("{}: dropping non-finite sample {}", self.name, sample.value);
            return false;
        }

        let value = sample.value;
        self.last_sample_time = Some(timestamp);
        self.min = self.min.min(value);
        self.max = self.max.max(value);
        self.history.push(value);
        log::trace!("{}: accepted {:.3} at {:.3}ms", self.name, value, timestamp);

        let display_max = self.max.max(sample.max_value);
        let scale = if display_max > 0.0 { 1.0 / display_max } else { 1.0 };

        self.paint_title(value);
        match self.mode {
            RenderMode::Soft => self.draw_soft(scale),
            RenderMode::Hardcore => self.draw_hardcore(value, scale),
        }
        true
    }

    /// Start the throttle window at `timestamp` if no sample was accepted yet.
    pub fn prime(&mut self, timestamp: f64) {
        if self.last_sample_time.is_none() {
            self.last_sample_time = Some(timestamp);
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Smallest value ever accepted.
    pub fn min(&self) -> Option<f64> {
        (!self.history.is_empty()).then_some(self.min)
    }

    /// Largest value ever accepted.
    pub fn max(&self) -> Option<f64> {
        (!self.history.is_empty()).then_some(self.max)
    }

    pub fn foreground(&self) -> Color {
        self.foreground
    }

    pub fn background(&self) -> Color {
        self.background
    }

    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    pub fn thresholds(&self) -> &[Threshold] {
        &self.thresholds
    }

    pub fn refresh_interval_ms(&self) -> f64 {
        self.refresh_interval_ms
    }

    pub fn last_sample_time(&self) -> Option<f64> {
        self.last_sample_time
    }

    pub fn history(&self) -> &RingHistory {
        &self.history
    }

    pub fn layout(&self) -> &PanelLayout {
        &self.layout
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn set_foreground(&mut self, color: Color) {
        self.foreground = color;
        self.last_title = None;
    }

    pub fn set_background(&mut self, color: Color) {
        self.background = color;
        self.last_title = None;
    }

    /// Bands are matched first-to-last; list them from highest value to lowest.
    pub fn set_thresholds(&mut self, thresholds: Vec<Threshold>) {
        self.thresholds = thresholds;
    }

    pub fn set_mode(&mut self, mode: RenderMode) {
        if mode != self.mode {
            log::debug!("{}: render mode {} -> {}", self.name, self.mode, mode);
        }
        self.mode = mode;
    }

    /// Title text for the given current value.
    pub fn title(&self, value: f64) -> String {
        format!(
            "{} {} ({}-{})",
            value.round() as i64,
            self.name,
            self.min.round() as i64,
            self.max.round() as i64
        )
    }

    fn paint_initial(&mut self) {
        let full = Rect::new(0.0, 0.0, self.layout.width as f32, self.layout.height as f32);
        self.surface.fill_rect(full, self.background);
        self.surface.fill_text(
            &self.name,
            self.layout.text_origin,
            self.layout.font_size,
            self.foreground,
        );
        let graph = self.layout.graph;
        self.paint_graph_backdrop(graph);
    }

    /// Foreground washed with translucent background, the empty-graph look.
    fn paint_graph_backdrop(&mut self, rect: Rect) {
        self.surface.fill_rect(rect, self.foreground);
        self.surface
            .fill_rect(rect, self.background.with_alpha(BACKDROP_ALPHA));
    }

    fn paint_title(&mut self, value: f64) {
        let key = (
            value.round() as i64,
            self.min.round() as i64,
            self.max.round() as i64,
        );
        if self.last_title == Some(key) {
            return;
        }
        self.last_title = Some(key);

        let band = Rect::new(0.0, 0.0, self.layout.width as f32, self.layout.graph.y);
        self.surface.fill_rect(band, self.background);
        let title = self.title(value);
        self.surface.fill_text(
            &title,
            self.layout.text_origin,
            self.layout.font_size,
            self.foreground,
        );
    }

    fn value_to_y(&self, value: f64, scale: f64) -> f32 {
        let graph = self.layout.graph;
        let y = (1.0 - value * scale) as f32 * graph.height + graph.y;
        y.clamp(graph.y, graph.bottom())
    }

    fn draw_soft(&mut self, scale: f64) {
        let graph = self.layout.graph;
        self.paint_graph_backdrop(graph);

        let len = self.history.len();
        if len == 0 {
            return;
        }

        // Newest first, so index 0 sits at the right edge of the drawn span
        let points: Vec<(Vec2, Color)> = self
            .history
            .iter_newest_first()
            .enumerate()
            .map(|(i, value)| {
                let x = graph.x + (len - 1 - i) as f32;
                let color = resolve_color(&self.thresholds, value, self.foreground);
                (Vec2::new(x, self.value_to_y(value, scale)), color)
            })
            .collect();

        // A segment takes the color of its newest point and ends where the
        // next point resolves to a different color.
        let line_width = self.layout.column_width();
        let mut segment = vec![points[0].0];
        let mut segment_color = points[0].1;
        for &(point, color) in &points[1..] {
            segment.push(point);
            if color != segment_color {
                self.surface
                    .stroke_polyline(&segment, segment_color, line_width);
                segment.clear();
                segment.push(point);
                segment_color = color;
            }
        }
        self.surface
            .stroke_polyline(&segment, segment_color, line_width);

        let mut area: Vec<Vec2> = points.iter().map(|(p, _)| *p).collect();
        let newest_x = points[0].0.x;
        let oldest_x = points[len - 1].0.x;
        area.push(Vec2::new(oldest_x, graph.bottom()));
        area.push(Vec2::new(newest_x, graph.bottom()));
        let gradient = VerticalGradient {
            top: graph.y,
            bottom: graph.bottom(),
            top_color: self.foreground.with_alpha(FILL_TOP_ALPHA),
            bottom_color: self.foreground.with_alpha(0.0),
        };
        self.surface.fill_polygon(&area, &gradient);
    }

    fn draw_hardcore(&mut self, value: f64, scale: f64) {
        if self.history.is_empty() {
            return;
        }

        let graph = self.layout.graph;
        let col = self.layout.column_width();
        self.surface.copy_region(
            Rect::new(graph.x + col, graph.y, graph.width - col, graph.height),
            Vec2::new(graph.x, graph.y),
        );

        let column = Rect::new(graph.right() - col, graph.y, col, graph.height);
        self.paint_graph_backdrop(column);

        let y = self.value_to_y(value, scale);
        let color = resolve_color(&self.thresholds, value, self.foreground);
        self.surface
            .fill_rect(Rect::new(column.x, y, col, graph.bottom() - y), color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{DrawCommand, RecordingSurface, RecordingSurfaceFactory};
    use std::cell::Cell;
    use std::rc::Rc;

    const BLUE: Color = Color::rgb(0x40, 0x80, 0xf0);

    fn constant_panel(value: f64, refresh: f64) -> Panel<RecordingSurface> {
        Panel::new(
            PanelOptions::new("TEST", BLUE).with_refresh_interval(refresh),
            move |_, _| Some(MetricSample::new(value, 100.0)),
            &mut RecordingSurfaceFactory,
        )
        .unwrap()
    }

    /// Panel whose supplier returns the values of `seq` one after another.
    fn sequence_panel(seq: Vec<f64>, mode: RenderMode) -> Panel<RecordingSurface> {
        let mut it = seq.into_iter();
        Panel::new(
            PanelOptions::new("SEQ", BLUE).with_mode(mode),
            move |_, _| it.next().map(|v| MetricSample::new(v, 100.0)),
            &mut RecordingSurfaceFactory,
        )
        .unwrap()
    }

    #[test]
    fn test_layout_scales_with_pixel_ratio() {
        let l1 = PanelLayout::new(1.0);
        assert_eq!((l1.width, l1.height), (100, 60));
        assert_eq!(l1.history_capacity(), 94);

        let l2 = PanelLayout::new(2.4);
        assert_eq!(l2.pixel_ratio, 2);
        assert_eq!((l2.width, l2.height), (200, 120));
        assert_eq!(l2.graph, Rect::new(6.0, 36.0, 188.0, 80.0));

        assert_eq!(PanelLayout::new(0.0).pixel_ratio, 1);
        assert_eq!(PanelLayout::new(f32::NAN).pixel_ratio, 1);
    }

    #[test]
    fn test_layout_clamps_huge_pixel_ratio() {
        let layout = PanelLayout::new(50_000_000.0);
        assert_eq!(layout.pixel_ratio, MAX_PIXEL_RATIO);
        assert_eq!(layout.width, LOGICAL_WIDTH * MAX_PIXEL_RATIO);
        assert_eq!(layout.height, LOGICAL_HEIGHT * MAX_PIXEL_RATIO);
        assert_eq!(PanelLayout::new(f32::INFINITY).pixel_ratio, 1);
    }

    #[test]
    fn test_construction_validates_inputs() {
        let empty = Panel::new(
            PanelOptions::new("  ", BLUE),
            |_, _| None,
            &mut RecordingSurfaceFactory,
        );
        assert!(matches!(empty, Err(OverlayError::EmptyPanelName)));

        let negative = Panel::new(
            PanelOptions::new("X", BLUE).with_refresh_interval(-1.0),
            |_, _| None,
            &mut RecordingSurfaceFactory,
        );
        assert!(matches!(negative, Err(OverlayError::InvalidRefreshInterval { .. })));
    }

    #[test]
    fn test_initial_paint_shows_name() {
        let panel = constant_panel(1.0, 0.0);
        assert_eq!(panel.surface().texts(), vec!["TEST"]);
        assert!(panel.history().is_empty());
        assert_eq!(panel.min(), None);
        assert_eq!(panel.max(), None);
    }

    #[test]
    fn test_throttle_scenario() {
        let mut panel = constant_panel(10.0, 100.0);
        assert!(panel.update(0.0));
        assert!(!panel.update(50.0));
        assert!(panel.update(150.0));
        assert_eq!(panel.history().len(), 2);
        assert_eq!(panel.min(), Some(10.0));
        assert_eq!(panel.max(), Some(10.0));
        assert_eq!(panel.last_sample_time(), Some(150.0));
    }

    #[test]
    fn test_throttled_update_touches_nothing() {
        let mut panel = constant_panel(10.0, 100.0);
        panel.update(0.0);
        let before = panel.surface().commands().len();
        for t in [10.0, 20.0, 99.9] {
            assert!(!panel.update(t));
        }
        assert_eq!(panel.surface().commands().len(), before);
        assert_eq!(panel.history().len(), 1);
    }

    #[test]
    fn test_supplier_receives_delta() {
        let seen = Rc::new(Cell::new(-1.0));
        let seen_in = seen.clone();
        let mut panel = Panel::new(
            PanelOptions::new("D", BLUE).with_refresh_interval(100.0),
            move |_, delta| {
                seen_in.set(delta);
                Some(MetricSample::new(1.0, 1.0))
            },
            &mut RecordingSurfaceFactory,
        )
        .unwrap();
        panel.prime(1000.0);
        assert!(!panel.update(1050.0));
        assert!(panel.update(1125.0));
        assert!((seen.get() - 125.0).abs() < 1e-9);
    }

    #[test]
    fn test_absent_sample_is_silent() {
        let mut panel = sequence_panel(vec![], RenderMode::Soft);
        let before = panel.surface().commands().len();
        assert!(!panel.update(0.0));
        assert_eq!(panel.last_sample_time(), None);
        assert_eq!(panel.surface().commands().len(), before);
    }

    #[test]
    fn test_non_finite_sample_is_dropped() {
        let mut panel = sequence_panel(vec![f64::NAN, 5.0], RenderMode::Soft);
        assert!(!panel.update(0.0));
        assert!(panel.update(1.0));
        assert_eq!(panel.min(), Some(5.0));
    }

    #[test]
    fn test_bounds_are_monotonic() {
        let values = vec![5.0, 3.0, 8.0, 4.0, 9.0, 1.0, 6.0];
        let mut panel = sequence_panel(values, RenderMode::Soft);
        let mut prev_min = f64::INFINITY;
        let mut prev_max = f64::NEG_INFINITY;
        for t in 0..7 {
            panel.update(t as f64);
            let (min, max) = (panel.min().unwrap(), panel.max().unwrap());
            assert!(min <= prev_min);
            assert!(max >= prev_max);
            prev_min = min;
            prev_max = max;
        }
        assert_eq!(panel.min(), Some(1.0));
        assert_eq!(panel.max(), Some(9.0));
    }

    #[test]
    fn test_history_saturates_at_capacity() {
        let capacity = PanelLayout::default().history_capacity();
        let total = capacity + 10;
        let values: Vec<f64> = (0..total).map(|v| v as f64).collect();
        let mut panel = sequence_panel(values, RenderMode::Hardcore);
        for t in 0..total {
            panel.update(t as f64);
        }
        assert_eq!(panel.history().len(), capacity);
        let kept: Vec<f64> = panel.history().iter_oldest_first().collect();
        let expected: Vec<f64> = (10..total).map(|v| v as f64).collect();
        assert_eq!(kept, expected);
    }

    #[test]
    fn test_all_zero_samples_do_not_divide_by_zero() {
        let mut panel = Panel::new(
            PanelOptions::new("Z", BLUE),
            |_, _| Some(MetricSample::new(0.0, 0.0)),
            &mut RecordingSurfaceFactory,
        )
        .unwrap();
        panel.update(0.0);
        panel.update(1.0);

        let floor = panel.layout().graph.bottom();
        let strokes = panel.surface().strokes();
        assert!(!strokes.is_empty());
        for (points, _) in &strokes {
            for p in *points {
                assert!(p.y.is_finite());
                assert!((p.y - floor).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn test_title_repaints_only_on_change() {
        let mut panel = sequence_panel(vec![10.0, 10.2, 11.0], RenderMode::Soft);
        panel.surface_mut().clear();

        panel.update(0.0);
        panel.update(1.0);
        assert_eq!(panel.surface().texts(), vec!["10 SEQ (10-10)"]);

        panel.update(2.0);
        assert_eq!(
            panel.surface().texts(),
            vec!["10 SEQ (10-10)", "11 SEQ (10-11)"]
        );
    }

    #[test]
    fn test_soft_mode_positions_newest_on_the_right() {
        let mut panel = sequence_panel(vec![0.0, 50.0, 100.0], RenderMode::Soft);
        for t in 0..3 {
            panel.update(t as f64);
        }
        let graph = panel.layout().graph;
        let strokes = panel.surface().strokes();
        let (points, _) = strokes.last().unwrap();
        // Newest (100) first at x = graph.x + 2, top of the graph
        let expected = [
            Vec2::new(graph.x + 2.0, graph.y),
            Vec2::new(graph.x + 1.0, graph.y + graph.height / 2.0),
            Vec2::new(graph.x, graph.bottom()),
        ];
        assert_eq!(points.len(), 3);
        for (p, e) in points.iter().zip(expected.iter()) {
            assert!(p.distance(*e) < 1e-3, "{:?} != {:?}", p, e);
        }
    }

    #[test]
    fn test_soft_mode_splits_segments_on_color_change() {
        let green = Color::rgb(0, 255, 0);
        let red = Color::rgb(255, 0, 0);
        let mut panel = sequence_panel(vec![10.0, 20.0, 80.0, 90.0], RenderMode::Soft);
        panel.set_thresholds(vec![Threshold::new(60.0, green), Threshold::new(0.0, red)]);
        for t in 0..3 {
            panel.update(t as f64);
        }
        panel.surface_mut().clear();
        panel.update(3.0);

        // Newest-first: 90 (green), 80 (green), 20 (red), 10 (red)
        let strokes = panel.surface().strokes();
        assert_eq!(strokes.len(), 2);
        assert_eq!(strokes[0].0.len(), 3);
        assert_eq!(strokes[0].1, green);
        assert_eq!(strokes[1].0.len(), 2);
        assert_eq!(strokes[1].1, red);
        // Segments share the boundary point
        assert_eq!(strokes[0].0[2], strokes[1].0[0]);
    }

    #[test]
    fn test_soft_mode_fills_area_to_floor() {
        let mut panel = sequence_panel(vec![50.0, 50.0], RenderMode::Soft);
        panel.update(0.0);
        panel.surface_mut().clear();
        panel.update(1.0);

        let graph = panel.layout().graph;
        let fill = panel
            .surface()
            .commands()
            .iter()
            .find_map(|cmd| match cmd {
                DrawCommand::FillPolygon { points, gradient } => Some((points.clone(), *gradient)),
                _ => None,
            })
            .unwrap();
        assert_eq!(fill.0.len(), 4);
        assert_eq!(fill.0[2].y, graph.bottom());
        assert_eq!(fill.0[3].y, graph.bottom());
        assert_eq!(fill.1.bottom_color.a, 0);
        assert!(fill.1.top_color.a > 0);
    }

    #[test]
    fn test_hardcore_mode_scrolls_and_paints_one_column() {
        let red = Color::rgb(255, 0, 0);
        let mut panel = sequence_panel(vec![25.0, 75.0], RenderMode::Hardcore);
        panel.set_thresholds(vec![Threshold::new(50.0, red)]);
        panel.update(0.0);
        panel.surface_mut().clear();
        panel.update(1.0);

        let graph = panel.layout().graph;
        let commands = panel.surface().commands();
        assert!(commands.iter().any(|cmd| matches!(
            cmd,
            DrawCommand::CopyRegion { src, dst }
                if src.x == graph.x + 1.0 && dst.x == graph.x
        )));
        assert!(panel.surface().strokes().is_empty());
        match commands.last().unwrap() {
            DrawCommand::FillRect { rect, color } => {
                assert_eq!(*color, red);
                assert_eq!(rect.x, graph.right() - 1.0);
                assert!((rect.bottom() - graph.bottom()).abs() < 1e-4);
                assert!((rect.y - (graph.y + graph.height * 0.25)).abs() < 1e-4);
            }
            other => panic!("expected column fill, got {:?}", other),
        }
    }

    #[test]
    fn test_mode_switch_keeps_buffer_state() {
        let values: Vec<f64> = (1..=6).map(|v| v as f64).collect();
        let mut panel = sequence_panel(values, RenderMode::Soft);
        for t in 0..3 {
            panel.update(t as f64);
        }
        let (len, idx) = (panel.history().len(), panel.history().write_index());
        panel.set_mode(RenderMode::Hardcore);
        assert_eq!(panel.history().len(), len);
        assert_eq!(panel.history().write_index(), idx);
        for t in 3..6 {
            panel.update(t as f64);
        }
        assert_eq!(panel.history().len(), 6);
        assert_eq!(
            panel.history().iter_oldest_first().collect::<Vec<_>>(),
            vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]
        );
    }

    #[test]
    fn test_render_mode_parse() {
        assert_eq!("soft".parse::<RenderMode>().unwrap(), RenderMode::Soft);
        assert_eq!("HARDCORE".parse::<RenderMode>().unwrap(), RenderMode::Hardcore);
        assert!("area".parse::<RenderMode>().is_err());
        assert_eq!(RenderMode::Hardcore.to_string(), "hardcore");
    }
}
