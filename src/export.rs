//! Snapshot export: the rendered surface as PNG.

use std::io::Cursor;

use base64::Engine;
use image::ImageFormat;
use resvg::tiny_skia::Pixmap;

use crate::compositor::Compositor;
use crate::error::{CompositorError, Result};
use crate::layer::raster::pixmap_to_rgba_image;

const DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// A PNG encoding of the surface at full backing-buffer resolution,
/// guides included.
#[derive(Clone, PartialEq, Eq)]
pub struct Snapshot {
    width: u32,
    height: u32,
    png: Vec<u8>,
    revision: u64,
}

impl std::fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Snapshot")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("png_len", &self.png.len())
            .field("revision", &self.revision)
            .finish()
    }
}

impl Snapshot {
    /// Encodes `pixmap`. `revision` identifies the design state it shows.
    pub fn encode(pixmap: &Pixmap, revision: u64) -> Result<Self> {
        let img = pixmap_to_rgba_image(pixmap);
        let mut png = Vec::new();
        img.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(CompositorError::encode)?;
        Ok(Self {
            width: pixmap.width(),
            height: pixmap.height(),
            png,
            revision,
        })
    }

    /// Width in device pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in device pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// The encoded PNG file.
    pub fn png_bytes(&self) -> &[u8] {
        &self.png
    }

    pub fn into_png_bytes(self) -> Vec<u8> {
        self.png
    }

    /// Session revision the snapshot was taken at.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// The `data:image/png;base64,...` form handed to the cart.
    pub fn to_data_url(&self) -> String {
        let encoded = base64::engine::general_purpose::STANDARD.encode(&self.png);
        let mut url = String::with_capacity(DATA_URL_PREFIX.len() + encoded.len());
        url.push_str(DATA_URL_PREFIX);
        url.push_str(&encoded);
        url
    }
}

/// Encodes the compositor's current surface.
///
/// Fails with [`CompositorError::ExportUnavailable`] until a render pass has
/// completed.
pub fn export(compositor: &Compositor, revision: u64) -> Result<Snapshot> {
    let pixmap = compositor.surface().ok_or(CompositorError::ExportUnavailable)?;
    let snapshot = Snapshot::encode(pixmap, revision)?;
    tracing::info!(
        width = snapshot.width,
        height = snapshot.height,
        bytes = snapshot.png.len(),
        revision,
        "snapshot exported"
    );
    Ok(snapshot)
}
