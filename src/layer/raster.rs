//! Conversions between decoded images and tiny-skia pixmaps.
//!
//! tiny-skia works in premultiplied alpha while the `image` crate hands out
//! straight alpha, so every bitmap crossing that boundary goes through here.

use image::{Rgba, RgbaImage};
use resvg::tiny_skia::{ColorU8, Pixmap, Transform};
use resvg::usvg::{Options, Tree};

use crate::error::{CompositorError, Result};

/// Converts a straight-alpha RGBA image into a premultiplied pixmap.
pub fn rgba_image_to_pixmap(img: RgbaImage) -> Result<Pixmap> {
    let (width, height) = img.dimensions();
    let mut pixmap = Pixmap::new(width, height)
        .ok_or_else(|| CompositorError::unsupported_image("image has zero width or height"))?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(img.pixels()) {
        let [r, g, b, a] = src.0;
        *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    Ok(pixmap)
}

/// Converts a tiny_skia Pixmap to an image::RgbaImage.
pub fn pixmap_to_rgba_image(pixmap: &Pixmap) -> RgbaImage {
    let mut img = RgbaImage::new(pixmap.width(), pixmap.height());
    for (dst, src) in img.pixels_mut().zip(pixmap.pixels()) {
        let c = src.demultiply();
        *dst = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
    }
    img
}

/// Returns true if `bytes` look like SVG markup rather than a raster image.
pub fn looks_like_svg(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(512)];
    let text = String::from_utf8_lossy(head);
    let text = text.trim_start_matches('\u{feff}').trim_start();
    text.starts_with("<svg") || (text.starts_with("<?xml") && text.contains("<svg"))
}

/// Rasterizes SVG markup at its intrinsic size.
pub fn rasterize_svg(bytes: &[u8]) -> Result<Pixmap> {
    let opts = Options::default();
    let tree = Tree::from_data(bytes, &opts)
        .map_err(|e| CompositorError::unsupported_image(format!("invalid svg: {e}")))?;

    let size = tree.size();
    let width = size.width().ceil().max(1.0) as u32;
    let height = size.height().ceil().max(1.0) as u32;

    let mut pixmap = Pixmap::new(width, height)
        .ok_or_else(|| CompositorError::unsupported_image("svg has no drawable area"))?;
    resvg::render(&tree, Transform::identity(), &mut pixmap.as_mut());
    Ok(pixmap)
}
