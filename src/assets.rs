//! Asset loading: textures, the background template and uploaded artwork.
//!
//! Loads happen in two steps so a host can run the fetch/decode wherever it
//! likes. [`AssetLoader::begin_texture`] (and friends) hand out a
//! [`LoadTicket`]; the host later passes the fetched bytes back with that
//! ticket. Each slot (template, active texture, artwork) has a generation
//! counter, and a ticket whose generation is no longer current is discarded
//! on completion, so a slow decode can never overwrite newer state.

use std::collections::HashMap;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use resvg::tiny_skia::Pixmap;

use crate::error::{CompositorError, Result};
use crate::geometry::SizePx;
use crate::layer::raster::{looks_like_svg, rasterize_svg, rgba_image_to_pixmap};
use crate::texture::Texture;

// ============================================================================
// AssetSource
// ============================================================================

/// Where texture and template bytes come from.
pub trait AssetSource {
    /// Fetches the raw bytes behind an asset reference such as `/photos/lid1.png`.
    fn fetch(&self, reference: &str) -> Result<Vec<u8>>;
}

/// Serves asset references as paths relative to a root directory.
#[derive(Debug, Clone)]
pub struct FsAssetSource {
    root: PathBuf,
}

impl FsAssetSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolves a reference to a path under the root, refusing to escape it.
    pub fn resolve(&self, reference: &str) -> Result<PathBuf> {
        let relative = Path::new(reference.trim_start_matches('/'));
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(CompositorError::asset_load(
                reference,
                "reference escapes the asset root",
            ));
        }
        Ok(self.root.join(relative))
    }
}

impl AssetSource for FsAssetSource {
    fn fetch(&self, reference: &str) -> Result<Vec<u8>> {
        let path = self.resolve(reference)?;
        std::fs::read(&path).map_err(|e| CompositorError::asset_load(reference, e))
    }
}

/// In-memory asset table, keyed by reference.
#[derive(Debug, Clone, Default)]
pub struct MemoryAssetSource {
    entries: HashMap<String, Vec<u8>>,
}

impl MemoryAssetSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, reference: impl Into<String>, bytes: Vec<u8>) {
        self.entries.insert(reference.into(), bytes);
    }

    pub fn with(mut self, reference: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.insert(reference, bytes);
        self
    }
}

impl AssetSource for MemoryAssetSource {
    fn fetch(&self, reference: &str) -> Result<Vec<u8>> {
        self.entries
            .get(reference)
            .cloned()
            .ok_or_else(|| CompositorError::asset_load(reference, "not found"))
    }
}

// ============================================================================
// Bitmap / ArtworkAsset
// ============================================================================

/// A decoded, premultiplied bitmap. Cheap to clone.
#[derive(Clone, PartialEq)]
pub struct Bitmap {
    pixmap: Arc<Pixmap>,
}

impl fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bitmap")
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}

impl Bitmap {
    pub fn from_pixmap(pixmap: Pixmap) -> Self {
        Self {
            pixmap: Arc::new(pixmap),
        }
    }

    pub fn from_rgba(img: image::RgbaImage) -> Result<Self> {
        rgba_image_to_pixmap(img).map(Self::from_pixmap)
    }

    /// Decodes a raster image (PNG, JPEG, GIF, WebP, ...).
    ///
    /// SVG and anything `image` can't identify is rejected with
    /// [`CompositorError::UnsupportedImage`].
    pub fn decode_raster(bytes: &[u8]) -> Result<Self> {
        if looks_like_svg(bytes) {
            return Err(CompositorError::unsupported_image(
                "vector images are not accepted, upload a raster image",
            ));
        }
        let format = image::guess_format(bytes)
            .map_err(|e| CompositorError::unsupported_image(e.to_string()))?;
        let decoded = image::load_from_memory_with_format(bytes, format)
            .map_err(|e| CompositorError::unsupported_image(e.to_string()))?;
        Self::from_rgba(decoded.to_rgba8())
    }

    /// Decodes a catalog asset, which may be raster or SVG.
    pub fn decode_asset(bytes: &[u8]) -> Result<Self> {
        if looks_like_svg(bytes) {
            rasterize_svg(bytes).map(Self::from_pixmap)
        } else {
            Self::decode_raster(bytes)
        }
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn size(&self) -> SizePx {
        SizePx::new(self.width(), self.height())
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }
}

/// The buyer's uploaded artwork. Replaced wholesale on every new upload.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtworkAsset {
    bitmap: Bitmap,
    label: Option<String>,
}

impl ArtworkAsset {
    pub fn new(bitmap: Bitmap, label: Option<String>) -> Self {
        Self { bitmap, label }
    }

    pub fn bitmap(&self) -> &Bitmap {
        &self.bitmap
    }

    /// File name or reference the artwork was loaded from, if known.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = Some(label.into());
    }

    pub fn natural_width(&self) -> u32 {
        self.bitmap.width()
    }

    pub fn natural_height(&self) -> u32 {
        self.bitmap.height()
    }

    pub fn natural_size(&self) -> SizePx {
        self.bitmap.size()
    }
}

/// A file handed over by a picker or a drop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub name: String,
    /// MIME type as reported by the host, e.g. `image/png`.
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            bytes,
        }
    }

    /// True if the host reports an image MIME type.
    pub fn is_image(&self) -> bool {
        self.media_type
            .trim()
            .to_ascii_lowercase()
            .starts_with("image/")
    }
}

/// Decodes an upload into artwork.
///
/// The byte buffer is consumed and released when this returns, on success
/// and on failure alike.
pub fn decode_upload(bytes: Vec<u8>, label: Option<String>) -> Result<ArtworkAsset> {
    let bitmap = Bitmap::decode_raster(&bytes)?;
    Ok(ArtworkAsset::new(bitmap, label))
}

// ============================================================================
// Tickets
// ============================================================================

/// The logical slot a load writes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotKind {
    Template,
    Texture,
    Artwork,
}

/// Identifies one in-flight load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    kind: SlotKind,
    generation: u64,
    reference: String,
    texture_id: Option<String>,
}

impl LoadTicket {
    pub fn kind(&self) -> SlotKind {
        self.kind
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The asset reference (or upload file name) being loaded.
    pub fn reference(&self) -> &str {
        &self.reference
    }

    /// The texture id for texture loads.
    pub fn texture_id(&self) -> Option<&str> {
        self.texture_id.as_deref()
    }
}

/// Result of completing a load.
#[derive(Debug)]
pub enum LoadOutcome<T> {
    /// The result was stored.
    Committed(T),
    /// A newer load for the same slot started since; the result was dropped.
    Stale,
    /// Fetch or decode failed. For textures and the template the renderer
    /// falls back to a solid fill.
    Failed(CompositorError),
}

impl<T> LoadOutcome<T> {
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed(_))
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, Self::Stale)
    }

    /// True when the slot changed in a way the surface should reflect.
    pub fn needs_redraw(&self) -> bool {
        !self.is_stale()
    }
}

// ============================================================================
// AssetLoader
// ============================================================================

/// Session-scoped asset state: the decoded texture cache, the template and
/// per-slot generations.
pub struct AssetLoader {
    source: Box<dyn AssetSource>,
    textures: HashMap<String, Bitmap>,
    template: Option<Bitmap>,
    generations: HashMap<SlotKind, u64>,
}

impl AssetLoader {
    pub fn new(source: impl AssetSource + 'static) -> Self {
        Self::from_boxed(Box::new(source))
    }

    pub fn from_boxed(source: Box<dyn AssetSource>) -> Self {
        Self {
            source,
            textures: HashMap::new(),
            template: None,
            generations: HashMap::new(),
        }
    }

    fn next_ticket(
        &mut self,
        kind: SlotKind,
        reference: impl Into<String>,
        texture_id: Option<String>,
    ) -> LoadTicket {
        let generation = self.generations.entry(kind).or_insert(0);
        *generation += 1;
        LoadTicket {
            kind,
            generation: *generation,
            reference: reference.into(),
            texture_id,
        }
    }

    /// True if no newer load for the ticket's slot has started.
    pub fn is_current(&self, ticket: &LoadTicket) -> bool {
        self.generations.get(&ticket.kind).copied().unwrap_or(0) == ticket.generation
    }

    /// Starts loading the background template.
    pub fn begin_template(&mut self, reference: &str) -> LoadTicket {
        self.next_ticket(SlotKind::Template, reference, None)
    }

    /// Starts loading the bitmap for a newly selected texture.
    ///
    /// Returns `None` when nothing needs fetching: the texture is a solid
    /// fill or its bitmap is already cached. Either way any load still in
    /// flight for a previous selection becomes stale.
    pub fn begin_texture(&mut self, texture: &Texture) -> Option<LoadTicket> {
        let ticket = self.next_ticket(
            SlotKind::Texture,
            texture.image_ref.clone().unwrap_or_default(),
            Some(texture.id.clone()),
        );
        if texture.image_ref.is_none() || self.textures.contains_key(&texture.id) {
            return None;
        }
        Some(ticket)
    }

    /// Starts decoding an uploaded file into the artwork slot.
    pub fn begin_upload(&mut self, label: &str) -> LoadTicket {
        self.next_ticket(SlotKind::Artwork, label, None)
    }

    /// Fetches the bytes for a template or texture ticket from the source.
    pub fn fetch(&self, ticket: &LoadTicket) -> Result<Vec<u8>> {
        self.source.fetch(&ticket.reference)
    }

    fn check_ticket(&self, ticket: &LoadTicket, kind: SlotKind) -> bool {
        if ticket.kind != kind || !self.is_current(ticket) {
            tracing::debug!(
                slot = ?ticket.kind,
                generation = ticket.generation,
                reference = %ticket.reference,
                "discarding stale asset load"
            );
            return false;
        }
        true
    }

    /// Completes a template load.
    pub fn finish_template(&mut self, ticket: &LoadTicket, bytes: Result<Vec<u8>>) -> LoadOutcome<()> {
        if !self.check_ticket(ticket, SlotKind::Template) {
            return LoadOutcome::Stale;
        }
        match bytes.and_then(|b| Bitmap::decode_asset(&b)) {
            Ok(bitmap) => {
                self.template = Some(bitmap);
                LoadOutcome::Committed(())
            }
            Err(err) => {
                let err = as_asset_error(&ticket.reference, err);
                tracing::warn!(error = %err, "could not load preview template, using solid background");
                LoadOutcome::Failed(err)
            }
        }
    }

    /// Completes a texture load.
    pub fn finish_texture(&mut self, ticket: &LoadTicket, bytes: Result<Vec<u8>>) -> LoadOutcome<()> {
        if !self.check_ticket(ticket, SlotKind::Texture) {
            return LoadOutcome::Stale;
        }
        let Some(id) = ticket.texture_id.clone() else {
            return LoadOutcome::Stale;
        };
        match bytes.and_then(|b| Bitmap::decode_asset(&b)) {
            Ok(bitmap) => {
                tracing::debug!(texture = %id, width = bitmap.width(), height = bitmap.height(), "texture decoded");
                self.textures.insert(id, bitmap);
                LoadOutcome::Committed(())
            }
            Err(err) => {
                let err = as_asset_error(&ticket.reference, err);
                tracing::warn!(texture = %id, error = %err, "texture failed to load, using fallback color");
                LoadOutcome::Failed(err)
            }
        }
    }

    /// Completes an upload. The artwork is returned for the caller to store;
    /// on failure the caller's current artwork must stay as it is.
    pub fn finish_upload(&mut self, ticket: &LoadTicket, bytes: Vec<u8>) -> LoadOutcome<ArtworkAsset> {
        if !self.check_ticket(ticket, SlotKind::Artwork) {
            return LoadOutcome::Stale;
        }
        match decode_upload(bytes, Some(ticket.reference.clone())) {
            Ok(asset) => LoadOutcome::Committed(asset),
            Err(err) => {
                tracing::warn!(file = %ticket.reference, error = %err, "upload rejected");
                LoadOutcome::Failed(err)
            }
        }
    }

    /// Fetches and completes a template or texture ticket in one step.
    pub fn resolve(&mut self, ticket: &LoadTicket) -> LoadOutcome<()> {
        let bytes = self.fetch(ticket);
        match ticket.kind {
            SlotKind::Template => self.finish_template(ticket, bytes),
            SlotKind::Texture => self.finish_texture(ticket, bytes),
            SlotKind::Artwork => LoadOutcome::Failed(CompositorError::unsupported_image(
                "uploads are completed with their file bytes",
            )),
        }
    }

    pub fn template(&self) -> Option<&Bitmap> {
        self.template.as_ref()
    }

    pub fn texture_bitmap(&self, texture_id: &str) -> Option<&Bitmap> {
        self.textures.get(texture_id)
    }

    /// Seeds the cache with an already decoded texture.
    pub fn insert_texture(&mut self, texture_id: impl Into<String>, bitmap: Bitmap) {
        self.textures.insert(texture_id.into(), bitmap);
    }

    pub fn set_template(&mut self, bitmap: Option<Bitmap>) {
        self.template = bitmap;
    }

    pub fn cached_textures(&self) -> usize {
        self.textures.len()
    }
}

fn as_asset_error(reference: &str, err: CompositorError) -> CompositorError {
    if err.is_asset_fallback() {
        err
    } else {
        CompositorError::asset_load(reference, err)
    }
}

// ============================================================================
// Tests
// ============================================================================
