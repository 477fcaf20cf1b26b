//! Self-profiling for the overlay.
//!
//! This module provides:
//! - Timing wrappers (`console.time` on WASM, `Instant` + `log` natively)
//! - Periodic snapshots of panel state for spotting stalled suppliers
//! - A runtime toggle, off by default
//!
//! All profiling is controlled via `set_profiling_enabled()`.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Global flag to enable/disable profiling.
static PROFILING_ENABLED: AtomicBool = AtomicBool::new(false);

/// Tick counter for periodic snapshot logging.
static TICK_COUNTER: AtomicU64 = AtomicU64::new(0);

/// How often to log a snapshot (every N ticks).
const SNAPSHOT_LOG_INTERVAL: u64 = 300; // ~5 seconds at 60fps

pub fn is_profiling_enabled() -> bool {
    PROFILING_ENABLED.load(Ordering::Relaxed)
}

pub fn set_profiling_enabled(enabled: bool) {
    PROFILING_ENABLED.store(enabled, Ordering::Relaxed);
    if enabled {
        log::info!("Overlay profiling ENABLED");
    } else {
        log::info!("Overlay profiling DISABLED");
    }
}

/// Count a tick and return true if a snapshot should be logged on it.
pub fn should_log_snapshot() -> bool {
    if !is_profiling_enabled() {
        return false;
    }
    let tick = TICK_COUNTER.fetch_add(1, Ordering::Relaxed);
    tick % SNAPSHOT_LOG_INTERVAL == 0
}

pub fn reset_tick_counter() {
    TICK_COUNTER.store(0, Ordering::Relaxed);
}

#[cfg(target_arch = "wasm32")]
mod timing {
    use super::is_profiling_enabled;
    use web_sys::console;

    /// Execute a closure inside a `console.time` / `console.timeEnd` pair.
    pub fn timed<T, F: FnOnce() -> T>(label: &str, f: F) -> T {
        if is_profiling_enabled() {
            console::time_with_label(label);
            let result = f();
            console::time_end_with_label(label);
            result
        } else {
            f()
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod timing {
    use super::is_profiling_enabled;
    use std::time::Instant;

    /// Execute a closure and log how long it took.
    pub fn timed<T, F: FnOnce() -> T>(label: &str, f: F) -> T {
        if is_profiling_enabled() {
            let start = Instant::now();
            let result = f();
            log::debug!(
                "[PERF] {}: {:.3}ms",
                label,
                start.elapsed().as_secs_f64() * 1000.0
            );
            result
        } else {
            f()
        }
    }
}

pub use timing::timed;

/// State of one panel at snapshot time.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelSnapshot {
    pub name: String,
    pub samples: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub last_sample_time: Option<f64>,
}

/// State of every panel at one tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverlaySnapshot {
    pub time: f64,
    pub panels: Vec<PanelSnapshot>,
}

impl OverlaySnapshot {
    pub fn log(&self) {
        let lines: Vec<String> = self
            .panels
            .iter()
            .map(|p| {
                format!(
                    "{}: samples={} min={} max={}",
                    p.name,
                    p.samples,
                    fmt_opt(p.min),
                    fmt_opt(p.max)
                )
            })
            .collect();
        log::info!("[PERF] t={:.1}ms {}", self.time, lines.join(", "));
    }

    /// Panels that have not accepted a sample for longer than `stale_after_ms`.
    pub fn stale_panels(&self, stale_after_ms: f64) -> Vec<&str> {
        self.panels
            .iter()
            .filter(|p| match p.last_sample_time {
                Some(t) => self.time - t > stale_after_ms,
                None => true,
            })
            .map(|p| p.name.as_str())
            .collect()
    }
}

fn fmt_opt(v: Option<f64>) -> String {
    match v {
        Some(v) => format!("{:.2}", v),
        None => "-".to_string(),
    }
}

/// Macro to time a block of code.
/// Usage: `perf_time!("label", { expensive_operation() })`
#[macro_export]
macro_rules! perf_time {
    ($label:expr, $body:expr) => {
        $crate::perf_profiling::timed($label, || $body)
    };
}
