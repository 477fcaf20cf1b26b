pub mod clock;
pub mod color;
pub mod config;
pub mod error;
pub mod history;
pub mod memory;
pub mod panel;
pub mod perf_profiling;
pub mod stats;
pub mod surface;
pub mod threshold;

#[cfg(not(target_arch = "wasm32"))]
pub mod cli;

#[cfg(target_arch = "wasm32")]
pub mod wasm;

pub use color::Color;
pub use config::{ContainerStyle, OverlayConfig, PanelOverride, Theme};
pub use error::{OverlayError, Result};
pub use panel::{MetricSample, Panel, PanelLayout, PanelOptions, RenderMode, SampleSupplier};
pub use stats::{SharedPanel, Stats};
pub use surface::{Rect, Surface, SurfaceFactory, VerticalGradient};
pub use threshold::Threshold;
