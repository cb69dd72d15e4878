//! Background layer: the product template behind the lid.

use super::{LayerEffect, RenderContext, Scene};
use crate::geometry::cover_rect;

/// Draws the template cover-scaled over the whole surface, or a solid fill
/// when no template is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BackgroundLayer;

impl LayerEffect for BackgroundLayer {
    fn draw(&self, ctx: &mut RenderContext, scene: &Scene<'_>) {
        let surface = ctx.spec().logical_rect();
        match scene.template {
            Some(template) => {
                let dest = cover_rect(template.size(), surface);
                ctx.draw_bitmap_into(template, dest);
            }
            None => ctx.fill_color(surface, scene.template_fallback),
        }
    }
}
