//! The rendering surface and its render pass.
//!
//! A [`Compositor`] owns one backing buffer sized from its [`SurfaceSpec`]
//! and redraws it from scratch on every [`render`](Compositor::render). It
//! keeps no other state between passes, so rendering the same scene twice
//! yields the same bytes.

use resvg::tiny_skia::Pixmap;

use crate::error::{CompositorError, Result};
use crate::layer::{LayerPipeline, RenderContext, Scene};
use crate::surface::SurfaceSpec;

pub struct Compositor {
    spec: SurfaceSpec,
    /// Layers to draw. Hosts may toggle individual layers.
    pub pipeline: LayerPipeline,
    surface: Option<Pixmap>,
    passes: u64,
}

impl std::fmt::Debug for Compositor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compositor")
            .field("spec", &self.spec)
            .field("pipeline", &self.pipeline)
            .field("rendered", &self.surface.is_some())
            .field("passes", &self.passes)
            .finish()
    }
}

impl Compositor {
    /// Creates a compositor with every layer enabled. Nothing is allocated
    /// until the first render.
    pub fn new(spec: SurfaceSpec) -> Result<Self> {
        spec.validate()?;
        Ok(Self {
            spec,
            pipeline: LayerPipeline::default(),
            surface: None,
            passes: 0,
        })
    }

    pub fn spec(&self) -> &SurfaceSpec {
        &self.spec
    }

    /// Changes the device pixel ratio. The next render reallocates the
    /// backing buffer; until then the previous surface is kept.
    pub fn set_pixel_ratio(&mut self, ratio: f32) {
        self.spec = self.spec.with_pixel_ratio(ratio);
    }

    /// Draws `scene` onto the backing buffer and returns it.
    #[tracing::instrument(level = "debug", skip_all, fields(texture = %scene.texture.id))]
    pub fn render(&mut self, scene: &Scene<'_>) -> Result<&Pixmap> {
        let size = self.spec.backing_size();
        // A failed allocation keeps the previous surface for export.
        let reused = self
            .surface
            .take_if(|p| p.width() == size.width && p.height() == size.height);
        let pixmap = match reused {
            Some(p) => p,
            None => Pixmap::new(size.width, size.height).ok_or_else(|| {
                CompositorError::config(format!(
                    "cannot allocate a {}x{} surface",
                    size.width, size.height
                ))
            })?,
        };

        let mut ctx = RenderContext::new(pixmap, self.spec);
        self.pipeline.render(&mut ctx, scene);
        self.passes += 1;
        tracing::debug!(
            width = size.width,
            height = size.height,
            artwork = scene.artwork.is_some(),
            pass = self.passes,
            "render pass complete"
        );

        Ok(self.surface.insert(ctx.into_pixmap()))
    }

    /// The last rendered surface, if any pass has completed.
    pub fn surface(&self) -> Option<&Pixmap> {
        self.surface.as_ref()
    }

    /// True once a render pass has completed.
    pub fn has_rendered(&self) -> bool {
        self.surface.is_some()
    }

    /// Number of completed render passes.
    pub fn passes(&self) -> u64 {
        self.passes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{ArtworkAsset, Bitmap};
    use crate::geometry::Transform;
    use crate::texture::{HexColor, Texture};
    use image::{Rgba, RgbaImage};

    fn plain() -> Texture {
        Texture::solid("plain", "Plain", HexColor::new(0xf3, 0xf4, 0xf6))
    }

    fn scene<'a>(texture: &'a Texture, artwork: Option<&'a ArtworkAsset>) -> Scene<'a> {
        Scene {
            template: None,
            template_fallback: HexColor::new(0x0b, 0x0f, 0x1a),
            texture,
            texture_bitmap: None,
            default_fallback: HexColor::new(0xec, 0xef, 0xf1),
            artwork,
            transform: Transform::new(12.0, -30.0, 0.8, 33.0),
        }
    }

    #[test]
    fn nothing_rendered_initially() {
        let compositor = Compositor::new(SurfaceSpec::default()).unwrap();
        assert!(!compositor.has_rendered());
        assert!(compositor.surface().is_none());
    }

    #[test]
    fn invalid_spec_is_rejected() {
        let spec = SurfaceSpec {
            logical_size: 0,
            ..SurfaceSpec::default()
        };
        assert!(matches!(Compositor::new(spec), Err(CompositorError::Config(_))));
    }

    #[test]
    fn render_is_idempotent() {
        let texture = plain();
        let bitmap = Bitmap::from_rgba(RgbaImage::from_fn(37, 19, |x, y| {
            Rgba([(x * 7) as u8, (y * 13) as u8, 90, 255])
        }))
        .unwrap();
        let art = ArtworkAsset::new(bitmap, None);

        let mut compositor = Compositor::new(SurfaceSpec::default()).unwrap();
        let first = compositor.render(&scene(&texture, Some(&art))).unwrap().data().to_vec();
        let second = compositor.render(&scene(&texture, Some(&art))).unwrap().data().to_vec();
        assert_eq!(first, second);
        assert_eq!(compositor.passes(), 2);
    }

    #[test]
    fn surface_matches_pixel_ratio() {
        let texture = plain();
        let mut compositor = Compositor::new(SurfaceSpec::default()).unwrap();
        let pixmap = compositor.render(&scene(&texture, None)).unwrap();
        assert_eq!((pixmap.width(), pixmap.height()), (640, 640));

        compositor.set_pixel_ratio(2.0);
        let pixmap = compositor.render(&scene(&texture, None)).unwrap();
        assert_eq!((pixmap.width(), pixmap.height()), (1280, 1280));

        compositor.set_pixel_ratio(3.5);
        let pixmap = compositor.render(&scene(&texture, None)).unwrap();
        assert_eq!(pixmap.width(), 1280);
    }

    #[test]
    fn failed_allocation_keeps_previous_surface() {
        let texture = plain();
        let mut compositor = Compositor::new(SurfaceSpec::default()).unwrap();
        let before = compositor.render(&scene(&texture, None)).unwrap().clone();

        // Too wide for tiny-skia to allocate.
        compositor.spec.logical_size = 1 << 30;
        assert!(matches!(
            compositor.render(&scene(&texture, None)),
            Err(CompositorError::Config(_))
        ));

        let kept = compositor.surface().unwrap();
        assert_eq!(kept.width(), 640);
        assert_eq!(kept.data(), before.data());
        assert_eq!(compositor.passes(), 1);
    }

    #[test]
    fn default_scene_layers_in_order() {
        let texture = plain();
        let mut compositor = Compositor::new(SurfaceSpec::default()).unwrap();
        let pixmap = compositor.render(&scene(&texture, None)).unwrap();

        // Outer margin shows the template fallback.
        let margin = pixmap.pixel(5, 320).unwrap();
        assert_eq!(
            (margin.red(), margin.green(), margin.blue(), margin.alpha()),
            (0x0b, 0x0f, 0x1a, 255)
        );
        // Middle of the safe area is the texture fill, below the gloss.
        let middle = pixmap.pixel(320, 400).unwrap();
        assert_eq!(
            (middle.red(), middle.green(), middle.blue()),
            (0xf3, 0xf4, 0xf6)
        );
    }

    #[test]
    fn disabled_guides_are_not_drawn() {
        let texture = plain();
        let mut compositor = Compositor::new(SurfaceSpec::default()).unwrap();
        let with_guides = compositor.render(&scene(&texture, None)).unwrap().clone();

        compositor.pipeline.guides.set_enabled(false);
        let without = compositor.render(&scene(&texture, None)).unwrap();

        // (47, 44) sits on the top edge of the bleed guide, inside the first dash.
        assert_ne!(with_guides.pixel(47, 44), without.pixel(47, 44));
        assert_eq!(with_guides.pixel(320, 400), without.pixel(320, 400));
    }
}
