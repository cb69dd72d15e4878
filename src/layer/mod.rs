//! Layer infrastructure for the lid compositor.
//!
//! Each layer is a small config type implementing [`LayerEffect`]. A
//! [`Layer`] wraps a config with an enabled flag so hosts can switch a
//! layer off without losing its settings. [`LayerPipeline`] fixes the draw
//! order and owns the safe-area clip around the layers that need it.
//!
//! # Draw order
//!
//! ```text
//! ┌──────────────┐
//! │  Background  │ ◄── template cover-scaled to the whole surface
//! └──────┬───────┘
//!        │   ┌─────────── safe-area clip pushed ───────────┐
//!        ▼   │                                              │
//! ┌──────────────┐                                          │
//! │   Texture    │ ◄── bitmap cover-scaled, or fallback fill│
//! └──────┬───────┘                                          │
//!        ▼                                                  │
//! ┌──────────────┐                                          │
//! │    Gloss     │ ◄── vertical translucency gradient       │
//! └──────┬───────┘                                          │
//!        ▼                                                  │
//! ┌──────────────┐                                          │
//! │   Artwork    │ ◄── user transform                       │
//! └──────┬───────┘                                          │
//!        │   └─────────── safe-area clip released ─────────┘
//!        ▼
//! ┌──────────────┐
//! │    Guides    │ ◄── dashed bleed outline, unclipped
//! └──────────────┘
//! ```

pub mod artwork;
pub mod background;
pub mod fill;
pub mod guides;
pub mod raster;

pub use artwork::ArtworkLayer;
pub use background::BackgroundLayer;
pub use fill::{GlossConfig, GlossStop, TextureFillLayer};
pub use guides::GuideConfig;

use resvg::tiny_skia::{
    self as skia, FillRule, FilterQuality, Mask, Paint, PathBuilder, Pixmap, PixmapPaint, Stroke,
};

use crate::assets::{ArtworkAsset, Bitmap};
use crate::geometry::{RectF, Transform};
use crate::surface::SurfaceSpec;
use crate::texture::{HexColor, Texture};

// ============================================================================
// Scene
// ============================================================================

/// Everything a render pass reads. Built fresh for every pass so layers
/// never see hidden state.
#[derive(Debug, Clone, Copy)]
pub struct Scene<'a> {
    pub template: Option<&'a Bitmap>,
    /// Background fill when the template is unavailable.
    pub template_fallback: HexColor,
    pub texture: &'a Texture,
    pub texture_bitmap: Option<&'a Bitmap>,
    /// Safe-area fill when the texture has neither bitmap nor color.
    pub default_fallback: HexColor,
    pub artwork: Option<&'a ArtworkAsset>,
    pub transform: Transform,
}

// ============================================================================
// Render Context
// ============================================================================

/// The surface being drawn plus the state a canvas would carry: the device
/// pixel ratio transform and the active clip.
pub struct RenderContext {
    pixmap: Pixmap,
    spec: SurfaceSpec,
    base: skia::Transform,
    clip: Option<Mask>,
}

impl RenderContext {
    /// Wraps a backing pixmap sized for `spec`. The pixmap is cleared.
    pub fn new(mut pixmap: Pixmap, spec: SurfaceSpec) -> Self {
        pixmap.fill(skia::Color::TRANSPARENT);
        let ratio = pixmap.width() as f32 / spec.logical_size.max(1) as f32;
        Self {
            pixmap,
            spec,
            base: skia::Transform::from_scale(ratio, ratio),
            clip: None,
        }
    }

    pub fn spec(&self) -> &SurfaceSpec {
        &self.spec
    }

    /// Maps logical units onto backing pixels.
    pub fn base_transform(&self) -> skia::Transform {
        self.base
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    pub fn into_pixmap(self) -> Pixmap {
        self.pixmap
    }

    pub fn is_clipped(&self) -> bool {
        self.clip.is_some()
    }

    /// Restricts subsequent drawing to a rounded rectangle.
    pub fn clip_to_rounded_rect(&mut self, rect: RectF, radius: f32) {
        let Some(path) = rounded_rect_path(rect, radius) else {
            tracing::debug!(?rect, "clip rectangle is empty, leaving surface unclipped");
            return;
        };
        let Some(mut mask) = Mask::new(self.pixmap.width(), self.pixmap.height()) else {
            return;
        };
        mask.fill_path(&path, FillRule::Winding, true, self.base);
        self.clip = Some(mask);
    }

    pub fn release_clip(&mut self) {
        self.clip = None;
    }

    /// Fills a logical rectangle with `paint`, honoring the clip.
    pub fn fill_rect(&mut self, rect: RectF, paint: &Paint<'_>) {
        let Some(rect) = skia::Rect::from_xywh(rect.x, rect.y, rect.width, rect.height) else {
            return;
        };
        self.pixmap
            .fill_rect(rect, paint, self.base, self.clip.as_ref());
    }

    pub fn fill_color(&mut self, rect: RectF, color: HexColor) {
        let mut paint = Paint::default();
        paint.set_color_rgba8(color.r, color.g, color.b, 255);
        self.fill_rect(rect, &paint);
    }

    /// Draws a bitmap through a logical-space transform (bitmap pixels to
    /// logical units), honoring the clip.
    pub fn draw_bitmap(&mut self, bitmap: &Bitmap, transform: skia::Transform) {
        let paint = PixmapPaint {
            quality: FilterQuality::Bicubic,
            ..PixmapPaint::default()
        };
        self.pixmap.draw_pixmap(
            0,
            0,
            bitmap.pixmap().as_ref(),
            &paint,
            self.base.pre_concat(transform),
            self.clip.as_ref(),
        );
    }

    /// Stretches a bitmap over a logical rectangle.
    pub fn draw_bitmap_into(&mut self, bitmap: &Bitmap, dest: RectF) {
        let sx = dest.width / bitmap.width() as f32;
        let sy = dest.height / bitmap.height() as f32;
        let transform = skia::Transform::from_translate(dest.x, dest.y).pre_scale(sx, sy);
        self.draw_bitmap(bitmap, transform);
    }

    /// Strokes the outline of a logical rectangle, honoring the clip.
    pub fn stroke_rect(&mut self, rect: RectF, paint: &Paint<'_>, stroke: &Stroke) {
        let Some(rect) = skia::Rect::from_xywh(rect.x, rect.y, rect.width, rect.height) else {
            return;
        };
        let path = PathBuilder::from_rect(rect);
        self.pixmap
            .stroke_path(&path, paint, stroke, self.base, self.clip.as_ref());
    }
}

/// Builds a rounded rectangle path with circular corners.
pub fn rounded_rect_path(rect: RectF, radius: f32) -> Option<skia::Path> {
    if rect.width <= 0.0 || rect.height <= 0.0 {
        return None;
    }
    let r = radius.max(0.0).min(rect.width.min(rect.height) / 2.0);
    // Cubic approximation of a quarter circle.
    let k = 0.552_284_8 * r;
    let (x, y) = (rect.x, rect.y);
    let (right, bottom) = (rect.right(), rect.bottom());

    let mut pb = PathBuilder::new();
    pb.move_to(x + r, y);
    pb.line_to(right - r, y);
    pb.cubic_to(right - r + k, y, right, y + r - k, right, y + r);
    pb.line_to(right, bottom - r);
    pb.cubic_to(right, bottom - r + k, right - r + k, bottom, right - r, bottom);
    pb.line_to(x + r, bottom);
    pb.cubic_to(x + r - k, bottom, x, bottom - r + k, x, bottom - r);
    pb.line_to(x, y + r);
    pb.cubic_to(x, y + r - k, x + r - k, y, x + r, y);
    pb.close();
    pb.finish()
}

// ============================================================================
// Layer Traits
// ============================================================================

/// A layer that knows how to draw itself onto the surface.
///
/// Implementations must be pure functions of the context and scene: the
/// same inputs always produce the same pixels.
pub trait LayerEffect {
    fn draw(&self, ctx: &mut RenderContext, scene: &Scene<'_>);
}

// ============================================================================
// Generic Layer
// ============================================================================

/// A layer config plus an enabled flag. Disabling a layer keeps its config.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer<C> {
    config: C,
    enabled: bool,
}

impl<C: Default> Default for Layer<C> {
    fn default() -> Self {
        Self::new(C::default())
    }
}

impl<C> Layer<C> {
    pub fn new(config: C) -> Self {
        Self {
            config,
            enabled: true,
        }
    }

    pub fn config(&self) -> &C {
        &self.config
    }

    pub fn set_config(&mut self, config: C) {
        self.config = config;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Sets whether the layer is drawn. Returns true if the state changed.
    pub fn set_enabled(&mut self, enabled: bool) -> bool {
        let changed = self.enabled != enabled;
        self.enabled = enabled;
        changed
    }
}

impl<C: LayerEffect> Layer<C> {
    /// Draws the layer if it is enabled.
    pub fn apply(&self, ctx: &mut RenderContext, scene: &Scene<'_>) {
        if self.enabled {
            self.config.draw(ctx, scene);
        }
    }
}

// ============================================================================
// Layer Pipeline
// ============================================================================

/// Names one layer of the [`LayerPipeline`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerKind {
    Background,
    Texture,
    Gloss,
    Artwork,
    Guides,
}

impl LayerKind {
    /// Every layer in draw order.
    pub const ALL: [LayerKind; 5] = [
        LayerKind::Background,
        LayerKind::Texture,
        LayerKind::Gloss,
        LayerKind::Artwork,
        LayerKind::Guides,
    ];
}

/// The fixed stack of layers.
#[derive(Debug, Clone, Default)]
pub struct LayerPipeline {
    pub background: Layer<BackgroundLayer>,
    pub texture: Layer<TextureFillLayer>,
    pub gloss: Layer<GlossConfig>,
    pub artwork: Layer<ArtworkLayer>,
    pub guides: Layer<GuideConfig>,
}

impl LayerPipeline {
    pub fn is_enabled(&self, kind: LayerKind) -> bool {
        match kind {
            LayerKind::Background => self.background.is_enabled(),
            LayerKind::Texture => self.texture.is_enabled(),
            LayerKind::Gloss => self.gloss.is_enabled(),
            LayerKind::Artwork => self.artwork.is_enabled(),
            LayerKind::Guides => self.guides.is_enabled(),
        }
    }

    /// Enables or disables one layer, keeping its config. Returns true if
    /// the state changed.
    pub fn set_enabled(&mut self, kind: LayerKind, enabled: bool) -> bool {
        match kind {
            LayerKind::Background => self.background.set_enabled(enabled),
            LayerKind::Texture => self.texture.set_enabled(enabled),
            LayerKind::Gloss => self.gloss.set_enabled(enabled),
            LayerKind::Artwork => self.artwork.set_enabled(enabled),
            LayerKind::Guides => self.guides.set_enabled(enabled),
        }
    }

    /// Draws every enabled layer in order.
    pub fn render(&self, ctx: &mut RenderContext, scene: &Scene<'_>) {
        self.background.apply(ctx, scene);

        let safe_area = ctx.spec().safe_area();
        let radius = ctx.spec().effective_corner_radius();
        ctx.clip_to_rounded_rect(safe_area, radius);

        self.texture.apply(ctx, scene);
        self.gloss.apply(ctx, scene);
        self.artwork.apply(ctx, scene);

        ctx.release_clip();
        self.guides.apply(ctx, scene);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn context(spec: SurfaceSpec) -> RenderContext {
        let size = spec.backing_size();
        RenderContext::new(Pixmap::new(size.width, size.height).unwrap(), spec)
    }

    pub(crate) fn rgba_at(ctx: &RenderContext, logical_x: f32, logical_y: f32) -> [u8; 4] {
        let ratio = ctx.pixmap().width() as f32 / ctx.spec().logical_size as f32;
        let px = ctx
            .pixmap()
            .pixel((logical_x * ratio) as u32, (logical_y * ratio) as u32)
            .unwrap();
        [px.red(), px.green(), px.blue(), px.alpha()]
    }

    /// Compares pixels allowing for filter rounding.
    pub(crate) fn assert_rgba_close(actual: [u8; 4], expected: [u8; 4]) {
        let close = actual
            .iter()
            .zip(expected.iter())
            .all(|(a, e)| a.abs_diff(*e) <= 2);
        assert!(close, "{actual:?} is not close to {expected:?}");
    }

    #[test]
    fn pipeline_toggles_by_kind() {
        let mut pipeline = LayerPipeline::default();
        assert!(LayerKind::ALL.iter().all(|&k| pipeline.is_enabled(k)));

        assert!(pipeline.set_enabled(LayerKind::Guides, false));
        assert!(!pipeline.set_enabled(LayerKind::Guides, false));
        assert!(!pipeline.is_enabled(LayerKind::Guides));
        assert!(!pipeline.guides.is_enabled());
        assert!(pipeline.is_enabled(LayerKind::Gloss));

        assert!(pipeline.set_enabled(LayerKind::Guides, true));
        assert!(pipeline.guides.is_enabled());
    }

    #[test]
    fn rounded_rect_rejects_empty() {
        assert!(rounded_rect_path(RectF::new(0.0, 0.0, 0.0, 10.0), 4.0).is_none());
        assert!(rounded_rect_path(RectF::new(0.0, 0.0, 10.0, 10.0), 40.0).is_some());
    }

    #[test]
    fn clip_excludes_corners() {
        let spec = SurfaceSpec::default();
        let mut ctx = context(spec);
        ctx.clip_to_rounded_rect(spec.safe_area(), spec.effective_corner_radius());
        assert!(ctx.is_clipped());
        ctx.fill_color(spec.logical_rect(), HexColor::new(255, 0, 0));

        // Inside the safe area.
        assert_eq!(rgba_at(&ctx, 320.0, 320.0), [255, 0, 0, 255]);
        // Outer margin.
        assert_eq!(rgba_at(&ctx, 5.0, 320.0), [0, 0, 0, 0]);
        // Rounded corner of the safe area.
        assert_eq!(rgba_at(&ctx, 30.0, 30.0), [0, 0, 0, 0]);

        ctx.release_clip();
        ctx.fill_color(RectF::new(0.0, 0.0, 10.0, 10.0), HexColor::new(0, 0, 255));
        assert_eq!(rgba_at(&ctx, 5.0, 5.0), [0, 0, 255, 255]);
    }

    #[test]
    fn base_transform_follows_pixel_ratio() {
        let spec = SurfaceSpec::default().with_pixel_ratio(2.0);
        let mut ctx = context(spec);
        assert_eq!(ctx.pixmap().width(), 1280);
        ctx.fill_color(RectF::new(0.0, 0.0, 10.0, 10.0), HexColor::new(0, 255, 0));
        // Logical (9, 9) is device (18, 18).
        let px = ctx.pixmap().pixel(18, 18).unwrap();
        assert_eq!(px.green(), 255);
        let outside = ctx.pixmap().pixel(21, 21).unwrap();
        assert_eq!(outside.alpha(), 0);
    }

    #[test]
    fn disabled_layer_keeps_config() {
        let mut layer = Layer::new(GuideConfig::default());
        assert!(layer.set_enabled(false));
        assert!(!layer.set_enabled(false));
        assert!(!layer.is_enabled());
        assert_eq!(layer.config(), &GuideConfig::default());
    }
}
