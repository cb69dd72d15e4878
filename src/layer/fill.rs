//! Safe-area fills: the chosen texture and the gloss sheen over it.

use resvg::tiny_skia::{self as skia, GradientStop, LinearGradient, Paint, SpreadMode};

use super::{LayerEffect, RenderContext, Scene};
use crate::geometry::cover_rect;

// ============================================================================
// TextureFillLayer
// ============================================================================

/// Fills the safe area with the texture bitmap (cover-scaled) or, when the
/// bitmap is missing, the texture's fallback color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextureFillLayer;

impl LayerEffect for TextureFillLayer {
    fn draw(&self, ctx: &mut RenderContext, scene: &Scene<'_>) {
        let area = ctx.spec().safe_area();
        match scene.texture_bitmap {
            Some(bitmap) => {
                let dest = cover_rect(bitmap.size(), area);
                ctx.draw_bitmap_into(bitmap, dest);
            }
            None => {
                let color = scene.texture.fallback_color.unwrap_or(scene.default_fallback);
                ctx.fill_color(area, color);
            }
        }
    }
}

// ============================================================================
// GlossConfig
// ============================================================================

/// One stop of the gloss gradient: white at `alpha` opacity, `offset` of the
/// way down the safe area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlossStop {
    pub offset: f32,
    pub alpha: f32,
}

/// A top-to-bottom white sheen across the safe area.
///
/// Past the last stop the gradient stays at that stop's opacity.
#[derive(Debug, Clone, PartialEq)]
pub struct GlossConfig {
    pub stops: Vec<GlossStop>,
}

impl Default for GlossConfig {
    fn default() -> Self {
        Self {
            stops: vec![
                GlossStop { offset: 0.0, alpha: 0.25 },
                GlossStop { offset: 0.08, alpha: 0.06 },
                GlossStop { offset: 0.4, alpha: 0.0 },
            ],
        }
    }
}

impl LayerEffect for GlossConfig {
    fn draw(&self, ctx: &mut RenderContext, _scene: &Scene<'_>) {
        let area = ctx.spec().safe_area();
        let stops: Vec<GradientStop> = self
            .stops
            .iter()
            .map(|s| {
                let alpha = (s.alpha.clamp(0.0, 1.0) * 255.0).round() as u8;
                GradientStop::new(s.offset.clamp(0.0, 1.0), skia::Color::from_rgba8(255, 255, 255, alpha))
            })
            .collect();

        let Some(shader) = LinearGradient::new(
            skia::Point::from_xy(0.0, area.y),
            skia::Point::from_xy(0.0, area.bottom()),
            stops,
            SpreadMode::Pad,
            skia::Transform::identity(),
        ) else {
            return;
        };

        let paint = Paint {
            shader,
            ..Paint::default()
        };
        ctx.fill_rect(area, &paint);
    }
}
