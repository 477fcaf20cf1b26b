//! Error types for the overlay library.

use std::io;
use thiserror::Error;

/// Errors raised while building or driving the overlay.
#[derive(Error, Debug)]
pub enum OverlayError {
    /// The drawing surface for a panel could not be created. Fatal to that panel.
    #[error("Drawing surface unavailable for panel '{panel}': {reason}")]
    SurfaceUnavailable { panel: String, reason: String },

    #[error("Panel name must not be empty")]
    EmptyPanelName,

    #[error("Invalid refresh interval for panel '{panel}': {interval_ms}ms")]
    InvalidRefreshInterval { panel: String, interval_ms: f64 },

    #[error("Panel index {index} out of range (panel count: {count})")]
    PanelIndexOutOfRange { index: usize, count: usize },

    #[error("Invalid color '{0}'")]
    InvalidColor(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for the overlay library.
pub type Result<T> = std::result::Result<T, OverlayError>;

impl OverlayError {
    /// Create a surface-unavailable error for the named panel.
    pub fn surface_unavailable<S: Into<String>, R: Into<String>>(panel: S, reason: R) -> Self {
        OverlayError::SurfaceUnavailable {
            panel: panel.into(),
            reason: reason.into(),
        }
    }

    /// Create a config error.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        OverlayError::Config(msg.into())
    }
}
