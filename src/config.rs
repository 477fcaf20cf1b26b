//! Overlay configuration, loaded from JSON.
//!
//! ```json
//! {
//!   "pixel_ratio": 2,
//!   "theme": "dark",
//!   "mode": "hardcore",
//!   "panels": [
//!     { "name": "FPS", "thresholds": [
//!         { "value": 60, "color": "#00ff00" },
//!         { "value": 30, "color": "#ffff00" },
//!         { "value": 0,  "color": "#ff0000" } ] }
//!   ]
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::error::{OverlayError, Result};
use crate::panel::{RenderMode, MAX_PIXEL_RATIO};
use crate::threshold::Threshold;

/// Light or dark color scheme; selects the shared panel background.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn background(&self) -> Color {
        match self {
            Theme::Light => Color::WHITE,
            Theme::Dark => Color::BLACK,
        }
    }
}

/// Visual style of the container holding the panels. Cosmetic only.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerStyle {
    #[default]
    Glass,
    Opaque,
}

impl ContainerStyle {
    pub fn opacity(&self) -> f32 {
        match self {
            ContainerStyle::Glass => 0.9,
            ContainerStyle::Opaque => 1.0,
        }
    }
}

/// Per-panel settings applied on top of the defaults, matched by name.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PanelOverride {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreground: Option<Color>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<RenderMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thresholds: Option<Vec<Threshold>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Device pixels per logical unit.
    pub pixel_ratio: f32,
    pub theme: Theme,
    pub container: ContainerStyle,
    /// Render mode for panels registered after the config is applied.
    pub mode: RenderMode,
    /// Register the MB panel when the platform supports it.
    pub show_memory: bool,
    pub panels: Vec<PanelOverride>,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            pixel_ratio: 1.0,
            theme: Theme::Light,
            container: ContainerStyle::Glass,
            mode: RenderMode::Soft,
            show_memory: true,
            panels: Vec::new(),
        }
    }
}

impl OverlayConfig {
    /// Read and validate a JSON config file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_json(&contents)?;
        log::debug!("Loaded overlay config from {:?}", path);
        Ok(config)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: OverlayConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.pixel_ratio.is_finite()
            || self.pixel_ratio <= 0.0
            || self.pixel_ratio > MAX_PIXEL_RATIO as f32
        {
            return Err(OverlayError::config(format!(
                "pixel_ratio must be in (0, {}], got {}",
                MAX_PIXEL_RATIO, self.pixel_ratio
            )));
        }
        for panel in &self.panels {
            if panel.name.trim().is_empty() {
                return Err(OverlayError::config("panel override with empty name"));
            }
            if let Some(thresholds) = &panel.thresholds {
                if thresholds.iter().any(|t| !t.value.is_finite()) {
                    return Err(OverlayError::config(format!(
                        "panel '{}' has a non-finite threshold value",
                        panel.name
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn background(&self) -> Color {
        self.theme.background()
    }

    pub fn override_for(&self, name: &str) -> Option<&PanelOverride> {
        self.panels.iter().find(|p| p.name == name)
    }
}
