//! Bleed guide layer.

use resvg::tiny_skia::{Paint, Stroke, StrokeDash};

use super::{LayerEffect, RenderContext, Scene};

/// Style of the dashed bleed outline.
///
/// The outline is drawn after the safe-area clip is released and is part of
/// exported snapshots.
#[derive(Debug, Clone, PartialEq)]
pub struct GuideConfig {
    pub width: f32,
    /// Alternating dash and gap lengths in logical units.
    pub dash: Vec<f32>,
    /// White at this opacity.
    pub alpha: f32,
}

impl Default for GuideConfig {
    fn default() -> Self {
        Self {
            width: 2.0,
            dash: vec![6.0, 8.0],
            alpha: 0.25,
        }
    }
}

impl LayerEffect for GuideConfig {
    fn draw(&self, ctx: &mut RenderContext, _scene: &Scene<'_>) {
        let rect = ctx.spec().bleed_guide();
        let mut paint = Paint::default();
        let alpha = (self.alpha.clamp(0.0, 1.0) * 255.0).round() as u8;
        paint.set_color_rgba8(255, 255, 255, alpha);

        let stroke = Stroke {
            width: self.width,
            dash: StrokeDash::new(self.dash.clone(), 0.0),
            ..Stroke::default()
        };
        ctx.stroke_rect(rect, &paint, &stroke);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Transform;
    use crate::layer::tests::{context, rgba_at};
    use crate::surface::SurfaceSpec;
    use crate::texture::{HexColor, Texture};

    #[test]
    fn guide_is_dashed_along_bleed_rect() {
        let texture = Texture::solid("plain", "Plain", HexColor::new(0, 0, 0));
        let scene = Scene {
            template: None,
            template_fallback: HexColor::new(0, 0, 0),
            texture: &texture,
            texture_bitmap: None,
            default_fallback: HexColor::new(0, 0, 0),
            artwork: None,
            transform: Transform::default(),
        };
        let mut ctx = context(SurfaceSpec::default());
        GuideConfig::default().draw(&mut ctx, &scene);

        // Top edge of the guide runs along y = 44. The first dash covers
        // x in 44..50 and the first gap x in 50..58.
        assert!(rgba_at(&ctx, 47.0, 44.0)[3] > 0);
        assert_eq!(rgba_at(&ctx, 54.0, 44.0)[3], 0);
        // Nothing away from the outline.
        assert_eq!(rgba_at(&ctx, 320.0, 320.0)[3], 0);
    }
}
