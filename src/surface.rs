//! Rendering surface parameters.
//!
//! The surface has a fixed square logical size. Only the backing buffer
//! scales with the device pixel ratio, which is clamped to 1..=2 so high
//! density displays can't grow the buffer without bound.

use serde::{Deserialize, Serialize};

use crate::error::{CompositorError, Result};
use crate::geometry::{RectF, SizePx};

pub const MIN_PIXEL_RATIO: f32 = 1.0;
pub const MAX_PIXEL_RATIO: f32 = 2.0;

/// Clamps a device pixel ratio to 1..=2. Non-finite ratios become 1.
pub fn clamp_pixel_ratio(ratio: f32) -> f32 {
    if ratio.is_finite() {
        ratio.clamp(MIN_PIXEL_RATIO, MAX_PIXEL_RATIO)
    } else {
        MIN_PIXEL_RATIO
    }
}

/// Geometry of the lid surface.
///
/// ```json
/// {
///   "logicalSize": 640,
///   "pixelRatio": 2.0,
///   "safeAreaInset": 28.0,
///   "cornerRadius": 34.0,
///   "bleedInset": 16.0
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase", default)]
pub struct SurfaceSpec {
    /// Width and height of the square surface in logical units.
    pub logical_size: u32,

    /// Device pixel ratio requested by the host. Clamped on use.
    pub pixel_ratio: f32,

    /// Margin between the surface edge and the safe area.
    pub safe_area_inset: f32,

    /// Corner radius of the safe area.
    pub corner_radius: f32,

    /// Inset of the dashed bleed guide, measured from the safe area.
    pub bleed_inset: f32,
}

impl Default for SurfaceSpec {
    fn default() -> Self {
        Self {
            logical_size: 640,
            pixel_ratio: 1.0,
            safe_area_inset: 28.0,
            corner_radius: 34.0,
            bleed_inset: 16.0,
        }
    }
}

impl SurfaceSpec {
    /// Returns a copy with a different device pixel ratio.
    pub fn with_pixel_ratio(mut self, ratio: f32) -> Self {
        self.pixel_ratio = ratio;
        self
    }

    /// The pixel ratio actually used for the backing buffer.
    pub fn effective_pixel_ratio(&self) -> f32 {
        clamp_pixel_ratio(self.pixel_ratio)
    }

    /// The full surface in logical units.
    pub fn logical_rect(&self) -> RectF {
        let size = self.logical_size as f32;
        RectF::from_size(size, size)
    }

    /// Size of the backing buffer in device pixels.
    pub fn backing_size(&self) -> SizePx {
        let side = (self.logical_size as f32 * self.effective_pixel_ratio()).round() as u32;
        SizePx::new(side, side)
    }

    /// The rounded-rectangle region texture and artwork are clipped to.
    pub fn safe_area(&self) -> RectF {
        self.logical_rect().inset(self.safe_area_inset)
    }

    /// The dashed guide rectangle nested inside the safe area.
    pub fn bleed_guide(&self) -> RectF {
        self.safe_area().inset(self.bleed_inset)
    }

    /// Corner radius limited to half the safe area's shorter side.
    pub fn effective_corner_radius(&self) -> f32 {
        let area = self.safe_area();
        self.corner_radius
            .max(0.0)
            .min(area.width.min(area.height) / 2.0)
    }

    pub fn validate(&self) -> Result<()> {
        if self.logical_size == 0 {
            return Err(CompositorError::config("surface logical size must be positive"));
        }
        for (name, value) in [
            ("safeAreaInset", self.safe_area_inset),
            ("cornerRadius", self.corner_radius),
            ("bleedInset", self.bleed_inset),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(CompositorError::config(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        let area = self.safe_area();
        if area.width <= 0.0 || area.height <= 0.0 {
            return Err(CompositorError::config(
                "safe area inset leaves no drawable area",
            ));
        }
        let guide = self.bleed_guide();
        if guide.width <= 0.0 || guide.height <= 0.0 {
            return Err(CompositorError::config(
                "bleed inset must fit inside the safe area",
            ));
        }
        Ok(())
    }
}
