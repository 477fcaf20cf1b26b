//! Threshold bands that recolor a panel's line by sample magnitude.

use serde::{Deserialize, Serialize};

use crate::color::Color;

/// A single `{ value, color }` rule.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Threshold {
    pub value: f64,
    pub color: Color,
}

impl Threshold {
    pub fn new(value: f64, color: Color) -> Self {
        Self { value, color }
    }
}

/// Resolve the color for `sample`.
///
/// Returns the color of the first threshold, in declaration order, whose
/// `value <= sample`, falling back to `base`. The list is not sorted: declare
/// bands from the highest value to the lowest to get the usual band behavior.
pub fn resolve_color(thresholds: &[Threshold], sample: f64, base: Color) -> Color {
    thresholds
        .iter()
        .find(|t| t.value <= sample)
        .map(|t| t.color)
        .unwrap_or(base)
}
