//! Artwork layer: the buyer's upload, placed by the user transform.

use resvg::tiny_skia as skia;

use super::{LayerEffect, RenderContext, Scene};
use crate::geometry::place_artwork;

/// Draws the artwork, if any, at the placement computed from the scene's
/// transform. Clipping is inherited from the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ArtworkLayer;

impl LayerEffect for ArtworkLayer {
    fn draw(&self, ctx: &mut RenderContext, scene: &Scene<'_>) {
        let Some(artwork) = scene.artwork else {
            return;
        };
        let placement = place_artwork(&scene.transform, artwork.natural_size(), ctx.spec().safe_area());
        let [sx, ky, kx, sy, tx, ty] = placement.to_row();
        ctx.draw_bitmap(artwork.bitmap(), skia::Transform::from_row(sx, ky, kx, sy, tx, ty));
    }
}
