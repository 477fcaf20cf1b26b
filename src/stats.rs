//! The aggregator: tick bracketing, frame counting and panel dispatch.
//!
//! An embedding render loop calls [`Stats::begin`] and [`Stats::end`] once per
//! iteration (or [`Stats::update`] alone). Every `end` forwards the same
//! timestamp to all registered panels, each of which decides on its own
//! throttle whether to sample.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::clock::Clock;
use crate::color::Color;
use crate::config::{OverlayConfig, Theme};
use crate::error::{OverlayError, Result};
use crate::memory::MemoryProbe;
use crate::panel::{MetricSample, Panel, PanelOptions, RenderMode};
use crate::perf_profiling::{self, OverlaySnapshot, PanelSnapshot};
use crate::surface::SurfaceFactory;

/// Panels are shared so callers can keep a handle for later reconfiguration.
pub type SharedPanel<S> = Rc<RefCell<Panel<S>>>;

pub const FPS_PANEL: &str = "FPS";
pub const MS_PANEL: &str = "MS";
pub const MB_PANEL: &str = "MB";

const FPS_COLOR: Color = Color::rgb(0x40, 0x80, 0xf0);
const MS_COLOR: Color = Color::rgb(0x33, 0xa0, 0x33);
const MB_COLOR: Color = Color::rgb(0xff, 0x00, 0x88);

const FPS_REFRESH_MS: f64 = 100.0;
const MS_REFRESH_MS: f64 = 0.0;
const MB_REFRESH_MS: f64 = 100.0;

const FPS_SCALE_HINT: f64 = 100.0;
const MS_SCALE_HINT: f64 = 200.0;

pub struct Stats<F: SurfaceFactory> {
    factory: F,
    clock: Box<dyn Clock>,
    panels: Vec<SharedPanel<F::Surface>>,
    frame_counter: Rc<Cell<u32>>,
    begin_time: Rc<Cell<f64>>,
    active_panel_index: usize,
    background: Color,
    default_mode: RenderMode,
    pixel_ratio: f32,
}

impl<F: SurfaceFactory> Stats<F> {
    /// An aggregator with no panels registered.
    pub fn empty<C: Clock + 'static>(factory: F, clock: C, config: &OverlayConfig) -> Self {
        let begin = clock.now_ms();
        Self {
            factory,
            clock: Box::new(clock),
            panels: Vec::new(),
            frame_counter: Rc::new(Cell::new(0)),
            begin_time: Rc::new(Cell::new(begin)),
            active_panel_index: 0,
            background: config.background(),
            default_mode: config.mode,
            pixel_ratio: config.pixel_ratio,
        }
    }

    /// An aggregator with the built-in FPS and MS panels, plus MB when `memory`
    /// is supported and the config asks for it. Config overrides are applied
    /// and the first panel is shown.
    pub fn new<C, M>(factory: F, clock: C, memory: M, config: &OverlayConfig) -> Result<Self>
    where
        C: Clock + 'static,
        M: MemoryProbe + 'static,
    {
        config.validate()?;
        let mut stats = Self::empty(factory, clock, config);

        let frames = stats.frame_counter.clone();
        stats.register_panel(FPS_PANEL, FPS_COLOR, FPS_REFRESH_MS, move |_, delta| {
            if delta <= 0.0 {
                return None;
            }
            let fps = frames.get() as f64 * 1000.0 / delta;
            frames.set(0);
            Some(MetricSample::new(fps, FPS_SCALE_HINT))
        })?;

        let begin = stats.begin_time.clone();
        stats.register_panel(MS_PANEL, MS_COLOR, MS_REFRESH_MS, move |time, _| {
            Some(MetricSample::new(time - begin.get(), MS_SCALE_HINT))
        })?;

        if !config.show_memory {
            log::debug!("Memory panel disabled by config");
        } else if memory.is_supported() {
            let mut probe = memory;
            stats.register_panel(MB_PANEL, MB_COLOR, MB_REFRESH_MS, move |_, _| {
                probe
                    .sample()
                    .map(|heap| MetricSample::new(heap.used_mib(), heap.limit_mib()))
            })?;
        } else {
            log::info!("Memory statistics unsupported on this platform; MB panel omitted");
        }

        stats.apply_config(config);
        stats.show_panel(0)?;
        Ok(stats)
    }

    /// Create a panel with this aggregator's background, default mode and
    /// pixel ratio, append it, and return a handle for further configuration.
    pub fn register_panel<P>(
        &mut self,
        name: &str,
        foreground: Color,
        refresh_interval_ms: f64,
        supplier: P,
    ) -> Result<SharedPanel<F::Surface>>
    where
        P: FnMut(f64, f64) -> Option<MetricSample> + 'static,
    {
        let options = PanelOptions::new(name, foreground)
            .with_background(self.background)
            .with_refresh_interval(refresh_interval_ms)
            .with_mode(self.default_mode)
            .with_pixel_ratio(self.pixel_ratio);
        let panel = Panel::new(options, supplier, &mut self.factory)?;
        Ok(self.add_panel(panel))
    }

    /// Append an already constructed panel.
    pub fn add_panel(&mut self, mut panel: Panel<F::Surface>) -> SharedPanel<F::Surface> {
        panel.prime(self.clock.now_ms());
        log::debug!(
            "Registered panel '{}' (refresh {}ms, mode {})",
            panel.name(),
            panel.refresh_interval_ms(),
            panel.mode()
        );
        let shared = Rc::new(RefCell::new(panel));
        self.panels.push(shared.clone());
        shared
    }

    /// Mark the start of a timed work interval.
    pub fn begin(&mut self) {
        self.begin_time.set(self.clock.now_ms());
    }

    /// Stamp a tick, count a frame and update every panel in registration order.
    pub fn end(&mut self) -> f64 {
        let time = self.clock.now_ms();
        self.frame_counter
            .set(self.frame_counter.get().saturating_add(1));

        let panels = &self.panels;
        crate::perf_time!("stats.end", {
            for panel in panels {
                panel.borrow_mut().update(time);
            }
        });

        if perf_profiling::should_log_snapshot() {
            self.snapshot(time).log();
        }
        time
    }

    /// Single-call tick: `end()` then restart the interval at its timestamp.
    pub fn update(&mut self) {
        let time = self.end();
        self.begin_time.set(time);
    }

    /// Make the panel at `index` the visible one.
    pub fn show_panel(&mut self, index: usize) -> Result<()> {
        let count = self.panels.len();
        if index >= count {
            return Err(OverlayError::PanelIndexOutOfRange { index, count });
        }
        self.active_panel_index = index;
        log::debug!("Showing panel {} ({})", index, self.panels[index].borrow().name());
        Ok(())
    }

    /// Advance to the next panel, wrapping around. `None` without panels.
    pub fn cycle_panel(&mut self) -> Option<usize> {
        if self.panels.is_empty() {
            return None;
        }
        let next = (self.active_panel_index + 1) % self.panels.len();
        self.active_panel_index = next;
        Some(next)
    }

    pub fn active_panel_index(&self) -> usize {
        self.active_panel_index
    }

    /// Whether the panel at `index` is the one being shown.
    pub fn is_panel_visible(&self, index: usize) -> bool {
        index < self.panels.len() && index == self.active_panel_index
    }

    pub fn active_panel(&self) -> Option<SharedPanel<F::Surface>> {
        self.panels.get(self.active_panel_index).cloned()
    }

    /// First panel registered under `name`.
    pub fn panel(&self, name: &str) -> Option<SharedPanel<F::Surface>> {
        self.panels
            .iter()
            .find(|p| p.borrow().name() == name)
            .cloned()
    }

    pub fn panels(&self) -> &[SharedPanel<F::Surface>] {
        &self.panels
    }

    pub fn panel_count(&self) -> usize {
        self.panels.len()
    }

    /// Frames counted since the FPS supplier last consumed them.
    pub fn frame_count(&self) -> u32 {
        self.frame_counter.get()
    }

    pub fn begin_time(&self) -> f64 {
        self.begin_time.get()
    }

    pub fn now(&self) -> f64 {
        self.clock.now_ms()
    }

    pub fn background(&self) -> Color {
        self.background
    }

    /// Change the shared background; every panel picks it up on its next update.
    pub fn set_background(&mut self, color: Color) {
        self.background = color;
        for panel in &self.panels {
            panel.borrow_mut().set_background(color);
        }
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.set_background(theme.background());
    }

    pub fn default_mode(&self) -> RenderMode {
        self.default_mode
    }

    /// Mode for panels registered from now on. Existing panels keep theirs.
    pub fn set_default_mode(&mut self, mode: RenderMode) {
        self.default_mode = mode;
    }

    pub fn pixel_ratio(&self) -> f32 {
        self.pixel_ratio
    }

    /// Apply theme, default mode and per-panel overrides from `config`.
    pub fn apply_config(&mut self, config: &OverlayConfig) {
        self.set_theme(config.theme);
        self.default_mode = config.mode;

        for overrides in &config.panels {
            let Some(panel) = self.panel(&overrides.name) else {
                log::warn!("Config names unknown panel '{}'; ignored", overrides.name);
                continue;
            };
            let mut panel = panel.borrow_mut();
            if let Some(color) = overrides.foreground {
                panel.set_foreground(color);
            }
            if let Some(mode) = overrides.mode {
                panel.set_mode(mode);
            }
            if let Some(thresholds) = &overrides.thresholds {
                panel.set_thresholds(thresholds.clone());
            }
        }
    }

    pub fn snapshot(&self, time: f64) -> OverlaySnapshot {
        OverlaySnapshot {
            time,
            panels: self
                .panels
                .iter()
                .map(|p| {
                    let p = p.borrow();
                    PanelSnapshot {
                        name: p.name().to_string(),
                        samples: p.history().len(),
                        min: p.min(),
                        max: p.max(),
                        last_sample_time: p.last_sample_time(),
                    }
                })
                .collect(),
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl Stats<crate::surface::PixelSurfaceFactory> {
    /// Software-rendered overlay on the wall clock with process memory stats.
    pub fn with_defaults(config: &OverlayConfig) -> Result<Self> {
        Self::new(
            crate::surface::PixelSurfaceFactory,
            crate::clock::MonotonicClock::new(),
            crate::memory::SysinfoMemoryProbe::new(),
            config,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::memory::{HeapStats, NoMemoryProbe, BYTES_PER_MIB};
    use crate::surface::{RecordingSurface, RecordingSurfaceFactory, Surface};

    struct FixedProbe(f64);

    impl MemoryProbe for FixedProbe {
        fn is_supported(&self) -> bool {
            true
        }

        fn sample(&mut self) -> Option<HeapStats> {
            Some(HeapStats {
                used_bytes: self.0 * BYTES_PER_MIB,
                limit_bytes: 1024.0 * BYTES_PER_MIB,
            })
        }
    }

    struct FailingFactory;

    impl SurfaceFactory for FailingFactory {
        type Surface = RecordingSurface;

        fn create_surface(&mut self, label: &str, _: u32, _: u32) -> Result<RecordingSurface> {
            Err(OverlayError::surface_unavailable(label, "no 2d context"))
        }
    }

    fn stats_with(
        clock: &ManualClock,
        config: &OverlayConfig,
    ) -> Stats<RecordingSurfaceFactory> {
        Stats::new(RecordingSurfaceFactory, clock.clone(), NoMemoryProbe, config).unwrap()
    }

    fn newest(panel: &SharedPanel<RecordingSurface>) -> Option<f64> {
        panel.borrow().history().newest(0)
    }

    #[test]
    fn test_builtin_panels_without_memory() {
        let clock = ManualClock::new(0.0);
        let stats = stats_with(&clock, &OverlayConfig::default());
        let names: Vec<String> = stats
            .panels()
            .iter()
            .map(|p| p.borrow().name().to_string())
            .collect();
        assert_eq!(names, vec!["FPS", "MS"]);
        assert_eq!(stats.active_panel_index(), 0);
    }

    #[test]
    fn test_memory_panel_when_supported() {
        let clock = ManualClock::new(0.0);
        let mut stats = Stats::new(
            RecordingSurfaceFactory,
            clock.clone(),
            FixedProbe(12.0),
            &OverlayConfig::default(),
        )
        .unwrap();
        assert_eq!(stats.panel_count(), 3);

        clock.set(100.0);
        stats.update();
        let mb = stats.panel(MB_PANEL).unwrap();
        assert_eq!(newest(&mb), Some(12.0));
    }

    #[test]
    fn test_memory_panel_disabled_by_config() {
        let clock = ManualClock::new(0.0);
        let config = OverlayConfig {
            show_memory: false,
            ..Default::default()
        };
        let stats =
            Stats::new(RecordingSurfaceFactory, clock, FixedProbe(1.0), &config).unwrap();
        assert!(stats.panel(MB_PANEL).is_none());
    }

    #[test]
    fn test_fps_is_averaged_over_throttle_window() {
        let clock = ManualClock::new(0.0);
        let mut stats = stats_with(&clock, &OverlayConfig::default());
        let fps = stats.panel(FPS_PANEL).unwrap();

        for t in [10.0, 20.0, 30.0, 40.0, 50.0] {
            clock.set(t);
            stats.update();
        }
        assert_eq!(stats.frame_count(), 5);
        assert!(fps.borrow().history().is_empty());

        clock.set(100.0);
        stats.update();
        assert_eq!(newest(&fps), Some(60.0));
        assert_eq!(stats.frame_count(), 0);
    }

    #[test]
    fn test_ms_panel_measures_begin_to_end() {
        let clock = ManualClock::new(0.0);
        let mut stats = stats_with(&clock, &OverlayConfig::default());
        let ms = stats.panel(MS_PANEL).unwrap();

        clock.set(1000.0);
        stats.begin();
        clock.set(1016.5);
        let t = stats.end();
        assert_eq!(t, 1016.5);
        assert!((newest(&ms).unwrap() - 16.5).abs() < 1e-9);
    }

    #[test]
    fn test_update_restarts_interval() {
        let clock = ManualClock::new(0.0);
        let mut stats = stats_with(&clock, &OverlayConfig::default());
        clock.set(40.0);
        stats.update();
        assert_eq!(stats.begin_time(), 40.0);

        clock.set(57.0);
        stats.update();
        let ms = stats.panel(MS_PANEL).unwrap();
        assert!((newest(&ms).unwrap() - 17.0).abs() < 1e-9);
    }

    #[test]
    fn test_register_panel_inherits_defaults() {
        let clock = ManualClock::new(0.0);
        let config = OverlayConfig {
            theme: Theme::Dark,
            mode: RenderMode::Hardcore,
            pixel_ratio: 2.0,
            ..Default::default()
        };
        let mut stats = stats_with(&clock, &config);
        let custom = stats
            .register_panel("DRAW", Color::rgb(1, 2, 3), 0.0, |_, _| {
                Some(MetricSample::new(3.0, 10.0))
            })
            .unwrap();

        let panel = custom.borrow();
        assert_eq!(panel.background(), Color::BLACK);
        assert_eq!(panel.mode(), RenderMode::Hardcore);
        assert_eq!(panel.surface().width(), 200);
        drop(panel);
        assert_eq!(stats.panel_count(), 3);
        assert!(Rc::ptr_eq(&stats.panel("DRAW").unwrap(), &custom));
    }

    #[test]
    fn test_default_mode_applies_to_later_panels() {
        let clock = ManualClock::new(0.0);
        let config = OverlayConfig {
            pixel_ratio: 3.0,
            ..Default::default()
        };
        let mut stats = stats_with(&clock, &config);
        assert_eq!(stats.pixel_ratio(), 3.0);
        assert_eq!(stats.default_mode(), RenderMode::Soft);

        stats.set_default_mode(RenderMode::Hardcore);
        let late = stats
            .register_panel("LATE", Color::BLACK, 0.0, |_, _| None)
            .unwrap();
        assert_eq!(late.borrow().mode(), RenderMode::Hardcore);
        assert_eq!(late.borrow().layout().pixel_ratio, 3);
        // Existing panels keep their mode
        let fps = stats.panel(FPS_PANEL).unwrap();
        assert_eq!(fps.borrow().mode(), RenderMode::Soft);
    }

    #[test]
    fn test_now_reads_the_clock() {
        let clock = ManualClock::new(12.5);
        let stats = stats_with(&clock, &OverlayConfig::default());
        assert_eq!(stats.now(), 12.5);
        clock.advance(4.0);
        assert_eq!(stats.now(), 16.5);
    }

    #[test]
    fn test_surface_failure_is_fatal() {
        let clock = ManualClock::new(0.0);
        let result = Stats::new(FailingFactory, clock, NoMemoryProbe, &OverlayConfig::default());
        assert!(matches!(
            result,
            Err(OverlayError::SurfaceUnavailable { ref panel, .. }) if panel == "FPS"
        ));
    }

    #[test]
    fn test_oversized_pixel_ratio_is_rejected_before_allocation() {
        let clock = ManualClock::new(0.0);
        let config = OverlayConfig {
            pixel_ratio: 50_000_000.0,
            ..Default::default()
        };
        let result = Stats::new(RecordingSurfaceFactory, clock, NoMemoryProbe, &config);
        assert!(matches!(result, Err(OverlayError::Config(_))));
    }

    #[test]
    fn test_show_panel_validates_index() {
        let clock = ManualClock::new(0.0);
        let mut stats = stats_with(&clock, &OverlayConfig::default());
        assert!(stats.show_panel(1).is_ok());
        assert_eq!(stats.active_panel_index(), 1);
        assert!(stats.is_panel_visible(1));
        assert!(!stats.is_panel_visible(0));
        assert!(matches!(
            stats.show_panel(2),
            Err(OverlayError::PanelIndexOutOfRange { index: 2, count: 2 })
        ));
        assert_eq!(stats.active_panel_index(), 1);
        assert!(!stats.is_panel_visible(2));
    }

    #[test]
    fn test_cycle_panel_wraps() {
        let clock = ManualClock::new(0.0);
        let mut stats = stats_with(&clock, &OverlayConfig::default());
        assert_eq!(stats.cycle_panel(), Some(1));
        assert_eq!(stats.cycle_panel(), Some(0));
        assert_eq!(stats.active_panel().unwrap().borrow().name(), "FPS");

        let mut empty = Stats::empty(RecordingSurfaceFactory, clock, &OverlayConfig::default());
        assert_eq!(empty.cycle_panel(), None);
    }

    #[test]
    fn test_set_theme_reaches_every_panel() {
        let clock = ManualClock::new(0.0);
        let mut stats = stats_with(&clock, &OverlayConfig::default());
        stats.set_theme(Theme::Dark);
        assert_eq!(stats.background(), Color::BLACK);
        for panel in stats.panels() {
            assert_eq!(panel.borrow().background(), Color::BLACK);
        }
    }

    #[test]
    fn test_config_overrides_apply_by_name() {
        let json = r##"{
            "panels": [
                { "name": "FPS", "mode": "hardcore", "thresholds": [
                    { "value": 30, "color": "#00ff00" } ] },
                { "name": "MS", "foreground": "#010203" },
                { "name": "GPU", "mode": "soft" }
            ]
        }"##;
        let config = OverlayConfig::from_json(json).unwrap();
        let clock = ManualClock::new(0.0);
        let stats = stats_with(&clock, &config);

        let fps = stats.panel(FPS_PANEL).unwrap();
        assert_eq!(fps.borrow().mode(), RenderMode::Hardcore);
        assert_eq!(fps.borrow().thresholds().len(), 1);
        let ms = stats.panel(MS_PANEL).unwrap();
        assert_eq!(ms.borrow().foreground(), Color::rgb(1, 2, 3));
    }

    #[test]
    fn test_snapshot_reflects_panels() {
        let clock = ManualClock::new(0.0);
        let mut stats = stats_with(&clock, &OverlayConfig::default());
        clock.set(5.0);
        stats.begin();
        clock.set(9.0);
        stats.end();

        let snapshot = stats.snapshot(9.0);
        assert_eq!(snapshot.panels.len(), 2);
        assert_eq!(snapshot.panels[0].samples, 0);
        assert_eq!(snapshot.panels[1].samples, 1);
        assert_eq!(snapshot.panels[1].max, Some(4.0));
    }
}
