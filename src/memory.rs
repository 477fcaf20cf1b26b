//! Runtime memory statistics used by the built-in MB panel.
//!
//! Memory reporting is a capability, not a guarantee: when the platform has
//! no usable source the probe says so and the aggregator omits the panel.

/// Bytes per mebibyte.
pub const BYTES_PER_MIB: f64 = 1_048_576.0;

/// Used and available heap, in bytes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeapStats {
    pub used_bytes: f64,
    pub limit_bytes: f64,
}

impl HeapStats {
    pub fn used_mib(&self) -> f64 {
        self.used_bytes / BYTES_PER_MIB
    }

    pub fn limit_mib(&self) -> f64 {
        self.limit_bytes / BYTES_PER_MIB
    }
}

/// Source of heap statistics.
pub trait MemoryProbe {
    /// Whether this platform can report memory at all.
    fn is_supported(&self) -> bool;

    /// Current statistics, or `None` if they could not be read this time.
    fn sample(&mut self) -> Option<HeapStats>;
}

/// Probe for platforms without memory statistics.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoMemoryProbe;

impl MemoryProbe for NoMemoryProbe {
    fn is_supported(&self) -> bool {
        false
    }

    fn sample(&mut self) -> Option<HeapStats> {
        None
    }
}

/// Resident memory of the current process against total system RAM.
#[cfg(not(target_arch = "wasm32"))]
pub struct SysinfoMemoryProbe {
    system: sysinfo::System,
    pid: Option<sysinfo::Pid>,
}

#[cfg(not(target_arch = "wasm32"))]
impl SysinfoMemoryProbe {
    pub fn new() -> Self {
        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => Some(pid),
            Err(e) => {
                log::debug!("Current pid unavailable: {}", e);
                None
            }
        };
        Self {
            system: sysinfo::System::new(),
            pid,
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl Default for SysinfoMemoryProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl MemoryProbe for SysinfoMemoryProbe {
    fn is_supported(&self) -> bool {
        sysinfo::IS_SUPPORTED_SYSTEM && self.pid.is_some()
    }

    fn sample(&mut self) -> Option<HeapStats> {
        use sysinfo::{ProcessRefreshKind, ProcessesToUpdate};

        let pid = self.pid?;
        self.system.refresh_memory();
        self.system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            true,
            ProcessRefreshKind::nothing().with_memory(),
        );

        let total = self.system.total_memory();
        if total == 0 {
            return None;
        }
        let used = self.system.process(pid)?.memory();
        Some(HeapStats {
            used_bytes: used as f64,
            limit_bytes: total as f64,
        })
    }
}

#[cfg(target_arch = "wasm32")]
mod browser {
    use wasm_bindgen::prelude::*;

    #[wasm_bindgen(inline_js = "
        export function heap_used() {
            const m = globalThis.performance && globalThis.performance.memory;
            return m ? m.usedJSHeapSize : undefined;
        }
        export function heap_limit() {
            const m = globalThis.performance && globalThis.performance.memory;
            return m ? m.jsHeapSizeLimit : undefined;
        }
    ")]
    extern "C" {
        pub fn heap_used() -> Option<f64>;
        pub fn heap_limit() -> Option<f64>;
    }
}

/// `performance.memory` (Chromium only).
#[cfg(target_arch = "wasm32")]
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserHeapProbe;

#[cfg(target_arch = "wasm32")]
impl MemoryProbe for BrowserHeapProbe {
    fn is_supported(&self) -> bool {
        browser::heap_used().is_some()
    }

    fn sample(&mut self) -> Option<HeapStats> {
        Some(HeapStats {
            used_bytes: browser::heap_used()?,
            limit_bytes: browser::heap_limit()?,
        })
    }
}
