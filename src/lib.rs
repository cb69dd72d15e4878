//! lid-compositor: interactive design compositor for custom box lids
//!
//! A buyer picks a texture, drops in artwork, drags/scales/rotates it and
//! exports a PNG snapshot for the cart. This crate holds the whole pipeline
//! behind that: placement math, asset decoding with stale-load protection,
//! the layered renderer and the snapshot encoder.
//!
//! # Example
//!
//! ```
//! use lid_compositor::{CompositorConfig, DesignSession, MemoryAssetSource, UploadFile};
//!
//! # fn png() -> Vec<u8> {
//! #     let img = image::RgbaImage::from_pixel(40, 20, image::Rgba([200, 30, 30, 255]));
//! #     let mut out = Vec::new();
//! #     img.write_to(&mut std::io::Cursor::new(&mut out), image::ImageFormat::Png).unwrap();
//! #     out
//! # }
//! let assets = MemoryAssetSource::new();
//! let mut session = DesignSession::new(CompositorConfig::default(), assets)?;
//!
//! // Texture bitmaps load through tickets; failures fall back to solid fills.
//! session.select_texture("carbon")?;
//! session.resolve_pending();
//!
//! session.import_file(UploadFile::new("logo.png", "image/png", png()))?;
//! session.set_scale(1.0);
//! session.set_rotation(90.0);
//!
//! let preview = session.snapshot()?.to_data_url();
//! assert!(preview.starts_with("data:image/png;base64,"));
//!
//! let item = session.cart_item();
//! assert_eq!(item.texture_id, "carbon");
//! # Ok::<(), lid_compositor::CompositorError>(())
//! ```
//!
//! # Headless rendering
//!
//! A saved [`DesignProfile`] can be rendered without a session through
//! [`render_design`]; the pixels match what the session showed.

mod assets;
mod cart;
mod compositor;
mod config;
mod error;
mod export;
mod geometry;
mod layer;
mod profile;
mod session;
mod surface;
mod texture;

pub use assets::{
    ArtworkAsset, AssetLoader, AssetSource, Bitmap, FsAssetSource, LoadOutcome, LoadTicket,
    MemoryAssetSource, SlotKind, UploadFile, decode_upload,
};
pub use cart::{CartItem, PRODUCT_NAME};
pub use compositor::Compositor;
pub use config::{CompositorConfig, DEFAULT_BASE_PRICE};
pub use error::{CompositorError, Result};
pub use export::{Snapshot, export};
pub use geometry::{
    DEFAULT_SCALE, MAX_SCALE, MIN_SCALE, Placement, PointF, RectF, SizePx, Transform, cover_rect,
    cover_scale, fit_scale, normalize_rotation, place_artwork,
};
pub use layer::{
    ArtworkLayer, BackgroundLayer, GlossConfig, GlossStop, GuideConfig, Layer, LayerEffect,
    LayerKind, LayerPipeline, RenderContext, Scene, TextureFillLayer,
};
pub use profile::{DesignProfile, LayerSettings, TransformSettings};
pub use session::{Configurable, DesignSession, DesignState, render_design};
pub use surface::{MAX_PIXEL_RATIO, MIN_PIXEL_RATIO, SurfaceSpec, clamp_pixel_ratio};
pub use texture::{HexColor, Texture, TextureCatalog, stock_textures, unit_price};

/// Re-exported so hosts can read rendered surfaces without depending on
/// tiny-skia directly.
pub use resvg::tiny_skia::Pixmap;
