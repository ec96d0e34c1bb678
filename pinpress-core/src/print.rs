//! Print Density System
//!
//! Pins the numbers the preview and the print path must agree on.

use serde::{Deserialize, Serialize};

pub const CM_PER_INCH: f64 = 2.54;
pub const METERS_PER_INCH: f64 = 0.0254;

/// Print specifications for physical output
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PrintSpec {
    pub dpi: u32,
    /// Side of the square preview surface the stored pan offsets come from.
    pub preview_side: u32,
    /// Gap between the preview surface edge and the cut line.
    pub preview_margin: u32,
}

impl Default for PrintSpec {
    fn default() -> Self {
        Self {
            dpi: 300,
            preview_side: 400,
            preview_margin: 10,
        }
    }
}

impl PrintSpec {
    /// Create from user input with validation
    pub fn from_user(dpi: u32, preview_side: u32, preview_margin: u32) -> Result<Self, &'static str> {
        if !(72..=1200).contains(&dpi) {
            return Err("DPI must be between 72 and 1200");
        }
        if preview_side <= preview_margin.saturating_mul(2) {
            return Err("Preview side must leave room for the margin");
        }
        Ok(Self {
            dpi,
            preview_side,
            preview_margin,
        })
    }

    pub fn validate(&self) -> Result<(), &'static str> {
        Self::from_user(self.dpi, self.preview_side, self.preview_margin).map(|_| ())
    }

    /// Canvas side for a physical diameter.
    pub fn pixels_for_cm(&self, cm: f64) -> u32 {
        (cm / CM_PER_INCH * self.dpi as f64).round() as u32
    }

    pub fn pixels_per_meter(&self) -> u32 {
        pixels_per_meter(self.dpi)
    }
}

/// Density in pixels per meter, as PNG `pHYs` stores it.
pub fn pixels_per_meter(dpi: u32) -> u32 {
    (dpi as f64 / METERS_PER_INCH).round() as u32
}
