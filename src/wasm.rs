use wasm_bindgen::prelude::*;
use web_sys::HtmlCanvasElement;

use crate::clock::PerformanceClock;
use crate::config::{OverlayConfig, Theme};
use crate::error::OverlayError;
use crate::memory::BrowserHeapProbe;
use crate::panel::{RenderMode, MAX_PIXEL_RATIO};
use crate::stats::Stats;
use crate::surface::canvas::CanvasSurfaceFactory;

fn to_js(e: OverlayError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

#[wasm_bindgen]
pub fn init_panic_hook() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
}

fn prefers_dark() -> bool {
    web_sys::window()
        .and_then(|w| w.match_media("(prefers-color-scheme: dark)").ok().flatten())
        .map(|query| query.matches())
        .unwrap_or(false)
}

fn set_style(canvas: &HtmlCanvasElement, property: &str, value: &str) {
    if let Err(e) = canvas.style().set_property(property, value) {
        log::warn!("Failed to set canvas {}: {:?}", property, e);
    }
}

/// Browser overlay. The host page mounts the `panel_canvas(i)` elements; only
/// the active panel's canvas is displayed.
#[wasm_bindgen]
pub struct WasmStats {
    inner: Stats<CanvasSurfaceFactory>,
}

impl WasmStats {
    /// Display only the active panel's canvas.
    fn sync_visibility(&self) {
        for (i, panel) in self.inner.panels().iter().enumerate() {
            let display = if self.inner.is_panel_visible(i) { "block" } else { "none" };
            set_style(panel.borrow().surface().canvas(), "display", display);
        }
    }
}

#[wasm_bindgen]
impl WasmStats {
    /// Build the overlay from an optional JSON config. Without one, the
    /// window's device pixel ratio and preferred color scheme are used.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<WasmStats, JsValue> {
        let config = match config_json {
            Some(json) => OverlayConfig::from_json(&json).map_err(to_js)?,
            None => {
                let ratio = web_sys::window()
                    .map(|w| w.device_pixel_ratio())
                    .unwrap_or(1.0);
                let theme = if prefers_dark() { Theme::Dark } else { Theme::Light };
                OverlayConfig {
                    pixel_ratio: (ratio as f32).min(MAX_PIXEL_RATIO as f32),
                    theme,
                    ..Default::default()
                }
            }
        };

        let factory = CanvasSurfaceFactory::new()
            .ok_or_else(|| JsValue::from_str("No document available for canvas creation"))?;
        let clock = PerformanceClock::new()
            .ok_or_else(|| JsValue::from_str("performance.now() unavailable"))?;

        let inner = Stats::new(factory, clock, BrowserHeapProbe, &config).map_err(to_js)?;
        let opacity = config.container.opacity().to_string();
        for panel in inner.panels() {
            set_style(panel.borrow().surface().canvas(), "opacity", &opacity);
        }
        log::info!("Stats overlay ready with {} panels", inner.panel_count());

        let stats = WasmStats { inner };
        stats.sync_visibility();
        Ok(stats)
    }

    pub fn begin(&mut self) {
        self.inner.begin();
    }

    pub fn end(&mut self) -> f64 {
        self.inner.end()
    }

    pub fn update(&mut self) {
        self.inner.update();
    }

    pub fn show_panel(&mut self, index: usize) -> Result<(), JsValue> {
        self.inner.show_panel(index).map_err(to_js)?;
        self.sync_visibility();
        Ok(())
    }

    /// Show the next panel; returns its index, or -1 without panels.
    pub fn cycle_panel(&mut self) -> i32 {
        let next = self.inner.cycle_panel();
        self.sync_visibility();
        next.map(|i| i as i32).unwrap_or(-1)
    }

    pub fn panel_count(&self) -> usize {
        self.inner.panel_count()
    }

    pub fn active_panel_index(&self) -> usize {
        self.inner.active_panel_index()
    }

    pub fn panel_canvas(&self, index: usize) -> Option<HtmlCanvasElement> {
        self.inner
            .panels()
            .get(index)
            .map(|p| p.borrow().surface().canvas().clone())
    }

    pub fn set_dark_mode(&mut self, dark: bool) {
        self.inner
            .set_theme(if dark { Theme::Dark } else { Theme::Light });
    }

    pub fn set_panel_mode(&mut self, name: &str, mode: &str) -> Result<(), JsValue> {
        let mode: RenderMode = mode.parse().map_err(|e: String| JsValue::from_str(&e))?;
        let panel = self
            .inner
            .panel(name)
            .ok_or_else(|| JsValue::from_str(&format!("Unknown panel '{}'", name)))?;
        panel.borrow_mut().set_mode(mode);
        Ok(())
    }
}
