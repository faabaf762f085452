//! Graduated point style for the score column

use super::engine::ClassificationEngine;
use crate::classification::ClassificationMode;
use coopaccess_colormap::Rgb;
use coopaccess_core::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Parameters for the graduated style
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleParams {
    /// Requested number of classes (default: 5)
    pub num_classes: usize,
    /// Break method (default: Jenks)
    pub mode: ClassificationMode,
    /// Point size of the lowest class; each class adds 1 (default: 2.0)
    pub base_size: f64,
    /// Color of the lowest class (default: red)
    pub low: Rgb,
    /// Color of the highest class (default: green)
    pub high: Rgb,
}

impl Default for StyleParams {
    fn default() -> Self {
        Self {
            num_classes: 5,
            mode: ClassificationMode::Jenks,
            base_size: 2.0,
            low: Rgb::RED,
            high: Rgb::GREEN,
        }
    }
}

/// One class of a graduated style
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleClass {
    pub lower: f64,
    pub upper: f64,
    pub size: f64,
    pub color: Rgb,
}

impl StyleClass {
    /// Legend label, e.g. `"45.00 - 86.00"`
    pub fn label(&self) -> String {
        format!("{:.2} - {:.2}", self.lower, self.upper)
    }
}

/// Graduated style bound to one attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraduatedStyle {
    pub field: String,
    pub mode: ClassificationMode,
    pub classes: Vec<StyleClass>,
}

impl GraduatedStyle {
    /// Index of the class a value falls in.
    ///
    /// Values below the first class map to it, values above the last
    /// class to the last one. `None` when there are no classes or the
    /// value is NaN.
    pub fn class_for(&self, value: f64) -> Option<usize> {
        if self.classes.is_empty() || value.is_nan() {
            return None;
        }
        let idx = self
            .classes
            .iter()
            .position(|c| value <= c.upper)
            .unwrap_or(self.classes.len() - 1);
        Some(idx)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

/// Classify a score column into a graduated style.
///
/// Class `i` of `n` gets size `base_size + i` and the ramp color at
/// `i / (n - 1)`. Fewer distinct values than requested classes gives
/// fewer classes; an empty column gives no classes.
pub fn classify_and_style<C>(
    field: &str,
    scores: &[f64],
    engine: &C,
    params: &StyleParams,
) -> Result<GraduatedStyle>
where
    C: ClassificationEngine + ?Sized,
{
    let breaks = engine.breaks(scores, params.num_classes, params.mode)?;
    let min = scores
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(f64::INFINITY, f64::min);

    let n = breaks.len();
    let classes = breaks
        .iter()
        .enumerate()
        .map(|(i, &upper)| {
            let lower = if i == 0 { min.min(upper) } else { breaks[i - 1] };
            let t = if n > 1 { i as f64 / (n - 1) as f64 } else { 0.0 };
            StyleClass {
                lower,
                upper,
                size: params.base_size + i as f64,
                color: engine.ramp_color(params.low, params.high, t),
            }
        })
        .collect();

    debug!(mode = params.mode.name(), ?breaks, "score classes");
    Ok(GraduatedStyle {
        field: field.to_string(),
        mode: params.mode,
        classes,
    })
}
