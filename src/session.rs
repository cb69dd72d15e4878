//! The interactive design session.
//!
//! [`DesignSession`] owns the [`DesignState`], the asset loader and the
//! compositor. Input events (pointer drags, slider values, file imports,
//! texture picks) mutate the state and redraw in the same call, so the
//! surface always shows the latest state.
//!
//! # Example
//!
//! ```
//! use lid_compositor::{CompositorConfig, DesignSession, MemoryAssetSource, PointF};
//!
//! let mut session = DesignSession::new(CompositorConfig::default(), MemoryAssetSource::new())?;
//! session.resolve_pending();
//!
//! session.set_scale(2.0);
//! session.pointer_down(PointF::new(320.0, 320.0));
//! session.pointer_move(PointF::new(340.0, 300.0));
//! session.pointer_up();
//! assert_eq!(session.state().transform().translate_x(), 20.0);
//!
//! let snapshot = session.snapshot()?;
//! assert_eq!(snapshot.width(), 640);
//! # Ok::<(), lid_compositor::CompositorError>(())
//! ```

use resvg::tiny_skia::Pixmap;

use crate::assets::{
    ArtworkAsset, AssetLoader, AssetSource, LoadOutcome, LoadTicket, SlotKind, UploadFile,
};
use crate::cart::CartItem;
use crate::compositor::Compositor;
use crate::config::CompositorConfig;
use crate::error::{CompositorError, Result};
use crate::export::{Snapshot, export};
use crate::geometry::{PointF, Transform};
use crate::layer::{LayerKind, Scene};
use crate::profile::{DesignProfile, LayerSettings};
use crate::texture::{Texture, TextureCatalog, unit_price};

// ============================================================================
// Configurable Trait
// ============================================================================

/// Trait for types that can be configured via [`DesignProfile`].
pub trait Configurable {
    /// Applies a profile's settings to this instance.
    fn apply_profile(&mut self, profile: &DesignProfile) -> Result<()>;

    /// Exports the current settings as a profile.
    fn export_profile(&self) -> DesignProfile;
}

// ============================================================================
// DesignState
// ============================================================================

/// The chosen texture, the artwork and its transform.
#[derive(Debug, Clone)]
pub struct DesignState {
    texture: Texture,
    artwork: Option<ArtworkAsset>,
    transform: Transform,
}

impl DesignState {
    /// A design on `texture` with no artwork and the default transform.
    pub fn new(texture: Texture) -> Self {
        Self {
            texture,
            artwork: None,
            transform: Transform::default(),
        }
    }

    pub fn texture(&self) -> &Texture {
        &self.texture
    }

    /// The current artwork, if one has been imported.
    pub fn artwork(&self) -> Option<&ArtworkAsset> {
        self.artwork.as_ref()
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    /// Base price plus the texture's price delta.
    pub fn unit_price(&self, base_price: f64) -> f64 {
        unit_price(base_price, &self.texture)
    }
}

fn scene<'a>(
    config: &'a CompositorConfig,
    loader: &'a AssetLoader,
    state: &'a DesignState,
) -> Scene<'a> {
    Scene {
        template: loader.template(),
        template_fallback: config.template_fallback_color,
        texture: &state.texture,
        texture_bitmap: loader.texture_bitmap(&state.texture.id),
        default_fallback: config.default_fallback_color,
        artwork: state.artwork.as_ref(),
        transform: state.transform,
    }
}

// ============================================================================
// DesignSession
// ============================================================================

/// A single buyer's editing session.
///
/// Loads started here are returned as [`LoadTicket`]s and also queued. A
/// host with its own I/O completes them with
/// [`complete_load`](Self::complete_load); otherwise
/// [`resolve_pending`](Self::resolve_pending) fetches them from the
/// session's [`AssetSource`].
pub struct DesignSession {
    config: CompositorConfig,
    catalog: TextureCatalog,
    state: DesignState,
    loader: AssetLoader,
    compositor: Compositor,
    pending: Vec<LoadTicket>,
    /// Pointer position minus translation at pointer-down.
    drag_offset: Option<PointF>,
    revision: u64,
    last_snapshot: Option<Snapshot>,
    cart_items: u64,
}

impl DesignSession {
    /// Starts a session on the catalog's default texture with no artwork.
    ///
    /// The template load, if configured, is queued. Nothing is drawn until
    /// the first mutation or [`render`](Self::render).
    pub fn new(config: CompositorConfig, source: impl AssetSource + 'static) -> Result<Self> {
        config.validate()?;
        let catalog = config.catalog()?;
        let state = DesignState::new(catalog.default_texture().clone());
        let compositor = Compositor::new(config.surface)?;
        let mut loader = AssetLoader::new(source);

        let mut pending = Vec::new();
        if let Some(reference) = config.template_ref.as_deref() {
            pending.push(loader.begin_template(reference));
        }

        Ok(Self {
            config,
            catalog,
            state,
            loader,
            compositor,
            pending,
            drag_offset: None,
            revision: 0,
            last_snapshot: None,
            cart_items: 0,
        })
    }

    /// The design as currently drawn.
    pub fn state(&self) -> &DesignState {
        &self.state
    }

    /// The validated config the session was started with.
    pub fn config(&self) -> &CompositorConfig {
        &self.config
    }

    /// Textures the buyer can pick from.
    pub fn catalog(&self) -> &TextureCatalog {
        &self.catalog
    }

    /// The compositor, for reading the rendered surface. Layers are
    /// toggled through [`set_layer_enabled`](Self::set_layer_enabled) so
    /// the surface and revision stay in step.
    pub fn compositor(&self) -> &Compositor {
        &self.compositor
    }

    /// The asset loader and its texture cache.
    pub fn loader(&self) -> &AssetLoader {
        &self.loader
    }

    /// Price of one lid in the current state.
    pub fn unit_price(&self) -> f64 {
        self.state.unit_price(self.config.base_price)
    }

    /// Increases on every change that alters the rendered surface.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Loads started but not yet completed.
    pub fn pending_loads(&self) -> &[LoadTicket] {
        &self.pending
    }

    // ------------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------------

    /// Redraws the surface from the current state.
    pub fn render(&mut self) -> Result<&Pixmap> {
        let scene = scene(&self.config, &self.loader, &self.state);
        self.compositor.render(&scene)
    }

    fn redraw(&mut self) {
        if let Err(err) = self.render() {
            tracing::warn!(error = %err, "redraw failed");
        }
    }

    fn changed(&mut self) {
        self.revision += 1;
        self.redraw();
    }

    /// Changes the device pixel ratio and redraws at the new resolution.
    pub fn set_pixel_ratio(&mut self, ratio: f32) {
        self.compositor.set_pixel_ratio(ratio);
        self.changed();
    }

    pub fn layer_enabled(&self, kind: LayerKind) -> bool {
        self.compositor.pipeline.is_enabled(kind)
    }

    /// Shows or hides one layer and redraws. Returns true if the layer
    /// changed; snapshots taken before the change are no longer current.
    pub fn set_layer_enabled(&mut self, kind: LayerKind, enabled: bool) -> bool {
        if !self.compositor.pipeline.set_enabled(kind, enabled) {
            return false;
        }
        tracing::debug!(layer = ?kind, enabled, "layer toggled");
        self.changed();
        true
    }

    // ------------------------------------------------------------------------
    // Textures and asset loads
    // ------------------------------------------------------------------------

    /// Selects a texture by id.
    ///
    /// The surface redraws straight away, using the texture's fallback
    /// color until its bitmap arrives. Returns the load to complete, if the
    /// bitmap is not cached yet. Unknown ids leave the state untouched.
    pub fn select_texture(&mut self, id: &str) -> Result<Option<LoadTicket>> {
        let texture = self.catalog.require(id)?.clone();
        tracing::debug!(texture = %texture.id, "texture selected");

        let ticket = self.loader.begin_texture(&texture);
        self.state.texture = texture;
        let loader = &self.loader;
        self.pending.retain(|t| loader.is_current(t));
        if let Some(ticket) = &ticket {
            self.pending.push(ticket.clone());
        }

        self.changed();
        Ok(ticket)
    }

    /// Completes a template or texture load with bytes fetched by the host.
    ///
    /// Failures are reported in the outcome and rendered as the fallback
    /// fill. Stale tickets change nothing.
    pub fn complete_load(&mut self, ticket: &LoadTicket, bytes: Result<Vec<u8>>) -> LoadOutcome<()> {
        self.pending.retain(|t| t != ticket);
        let outcome = match ticket.kind() {
            SlotKind::Template => self.loader.finish_template(ticket, bytes),
            SlotKind::Texture => self.loader.finish_texture(ticket, bytes),
            SlotKind::Artwork => {
                return LoadOutcome::Failed(CompositorError::unsupported_image(
                    "artwork loads are completed with complete_upload",
                ));
            }
        };
        if outcome.needs_redraw() {
            self.changed();
        }
        outcome
    }

    /// Fetches and completes every queued load from the asset source.
    pub fn resolve_pending(&mut self) -> Vec<LoadOutcome<()>> {
        let tickets = std::mem::take(&mut self.pending);
        tickets
            .iter()
            .map(|ticket| {
                let bytes = self.loader.fetch(ticket);
                self.complete_load(ticket, bytes)
            })
            .collect()
    }

    // ------------------------------------------------------------------------
    // Pointer drag
    // ------------------------------------------------------------------------

    /// Starts a drag at `point` (logical units). Presses outside the surface
    /// are ignored. Returns true if the drag was captured.
    pub fn pointer_down(&mut self, point: PointF) -> bool {
        if !self.config.surface.logical_rect().contains(point) {
            return false;
        }
        let t = self.state.transform;
        self.drag_offset = Some(PointF::new(
            point.x - t.translate_x(),
            point.y - t.translate_y(),
        ));
        true
    }

    /// Moves the artwork while a drag is captured. Returns true if the
    /// translation changed.
    pub fn pointer_move(&mut self, point: PointF) -> bool {
        let Some(offset) = self.drag_offset else {
            return false;
        };
        let before = self.state.transform;
        self.state
            .transform
            .set_translation(point.x - offset.x, point.y - offset.y);
        if self.state.transform == before {
            return false;
        }
        self.changed();
        true
    }

    /// Ends any drag.
    pub fn pointer_up(&mut self) {
        self.drag_offset = None;
    }

    /// The pointer left the surface; ends any drag like pointer-up.
    pub fn pointer_leave(&mut self) {
        self.pointer_up();
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_offset.is_some()
    }

    // ------------------------------------------------------------------------
    // Sliders
    // ------------------------------------------------------------------------

    /// Sets the artwork scale. Returns the clamped value stored.
    pub fn set_scale(&mut self, scale: f32) -> f32 {
        let stored = self.state.transform.set_scale(scale);
        self.changed();
        stored
    }

    /// Sets the artwork rotation in degrees. Returns the normalized value
    /// stored.
    pub fn set_rotation(&mut self, degrees: f32) -> f32 {
        let stored = self.state.transform.set_rotation(degrees);
        self.changed();
        stored
    }

    /// Restores the default transform. Artwork and texture are kept.
    pub fn reset_transform(&mut self) {
        self.state.transform = Transform::default();
        self.changed();
    }

    // ------------------------------------------------------------------------
    // Artwork import
    // ------------------------------------------------------------------------

    /// Starts an upload whose bytes the host will decode later.
    pub fn begin_upload(&mut self, label: &str) -> LoadTicket {
        self.loader.begin_upload(label)
    }

    /// Completes an upload. On failure the current artwork is kept.
    pub fn complete_upload(&mut self, ticket: &LoadTicket, bytes: Vec<u8>) -> LoadOutcome<()> {
        match self.loader.finish_upload(ticket, bytes) {
            LoadOutcome::Committed(asset) => {
                tracing::debug!(
                    width = asset.natural_width(),
                    height = asset.natural_height(),
                    label = asset.label().unwrap_or_default(),
                    "artwork replaced"
                );
                self.state.artwork = Some(asset);
                self.changed();
                LoadOutcome::Committed(())
            }
            LoadOutcome::Failed(err) => {
                self.redraw();
                LoadOutcome::Failed(err)
            }
            LoadOutcome::Stale => LoadOutcome::Stale,
        }
    }

    /// Imports a file chosen with the file picker. The bytes decide whether
    /// it is an image; failures leave the current artwork in place.
    pub fn import_file(&mut self, file: UploadFile) -> Result<()> {
        let ticket = self.begin_upload(&file.name);
        match self.complete_upload(&ticket, file.bytes) {
            LoadOutcome::Failed(err) => Err(err),
            // Nothing can start another upload between begin and complete.
            LoadOutcome::Committed(()) | LoadOutcome::Stale => Ok(()),
        }
    }

    /// Imports the first image among dropped files. Non-image files are
    /// skipped. Returns false if nothing was an image.
    pub fn drop_files(&mut self, files: Vec<UploadFile>) -> Result<bool> {
        let Some(file) = files.into_iter().find(UploadFile::is_image) else {
            tracing::debug!("drop contained no image files");
            return Ok(false);
        };
        self.import_file(file)?;
        Ok(true)
    }

    /// Removes the artwork.
    pub fn clear_artwork(&mut self) {
        if self.state.artwork.take().is_some() {
            self.changed();
        }
    }

    /// Records where the host stored the current artwork's bytes, so
    /// [`export_profile`](Configurable::export_profile) writes a reference
    /// the asset source can fetch. Returns false if there is no artwork.
    pub fn set_artwork_ref(&mut self, reference: impl Into<String>) -> bool {
        match self.state.artwork.as_mut() {
            Some(artwork) => {
                artwork.set_label(reference);
                true
            }
            None => false,
        }
    }

    // ------------------------------------------------------------------------
    // Export and cart
    // ------------------------------------------------------------------------

    /// Encodes the current surface. Fails with
    /// [`CompositorError::ExportUnavailable`] before the first render.
    pub fn snapshot(&mut self) -> Result<&Snapshot> {
        let snapshot = export(&self.compositor, self.revision)?;
        Ok(self.last_snapshot.insert(snapshot))
    }

    /// The most recent snapshot, which may predate later edits.
    pub fn last_snapshot(&self) -> Option<&Snapshot> {
        self.last_snapshot.as_ref()
    }

    /// True if the last snapshot shows the current state.
    pub fn snapshot_is_current(&self) -> bool {
        self.last_snapshot
            .as_ref()
            .is_some_and(|s| s.revision() == self.revision)
    }

    /// A cart line for the current design, previewed with the last
    /// snapshot. Hosts should only offer add-to-cart once a snapshot exists.
    pub fn cart_item(&mut self) -> CartItem {
        self.cart_items += 1;
        let mut item = CartItem::new(
            format!("lid-{}-{}", self.revision, self.cart_items),
            self.unit_price(),
            self.state.texture.id.clone(),
        );
        if let Some(snapshot) = &self.last_snapshot {
            item = item.with_preview(snapshot.to_data_url());
        }
        item
    }
}

impl std::fmt::Debug for DesignSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DesignSession")
            .field("state", &self.state)
            .field("compositor", &self.compositor)
            .field("pending", &self.pending)
            .field("revision", &self.revision)
            .finish_non_exhaustive()
    }
}

impl Configurable for DesignSession {
    /// Selects the profile's texture, applies its transform and layer
    /// settings and replaces the artwork with the referenced file (or
    /// removes it). The texture bitmap and artwork are fetched from the
    /// session's asset source.
    fn apply_profile(&mut self, profile: &DesignProfile) -> Result<()> {
        self.catalog.require(&profile.texture_id)?;

        let artwork = match profile.artwork_ref.as_deref() {
            Some(reference) => {
                let ticket = self.loader.begin_upload(reference);
                let bytes = self.loader.fetch(&ticket)?;
                match self.loader.finish_upload(&ticket, bytes) {
                    LoadOutcome::Committed(asset) => Some(asset),
                    LoadOutcome::Failed(err) => return Err(err),
                    LoadOutcome::Stale => self.state.artwork.clone(),
                }
            }
            None => None,
        };

        if let Some(ticket) = self.select_texture(&profile.texture_id)? {
            let bytes = self.loader.fetch(&ticket);
            self.complete_load(&ticket, bytes);
        }
        self.state.transform = profile.transform();
        self.state.artwork = artwork;
        let pipeline = &mut self.compositor.pipeline;
        pipeline.set_enabled(LayerKind::Gloss, profile.layers.gloss);
        pipeline.set_enabled(LayerKind::Guides, profile.layers.guides);
        self.changed();
        Ok(())
    }

    /// The artwork reference is the file name it was imported under unless
    /// the host recorded a fetchable one with
    /// [`set_artwork_ref`](DesignSession::set_artwork_ref). A picker file
    /// name alone will not resolve when the profile is replayed.
    fn export_profile(&self) -> DesignProfile {
        let layers = LayerSettings {
            gloss: self.layer_enabled(LayerKind::Gloss),
            guides: self.layer_enabled(LayerKind::Guides),
        };
        let mut profile = DesignProfile::new(self.state.texture.id.clone())
            .with_transform(self.state.transform.into())
            .with_layers(layers);
        if let Some(label) = self.state.artwork.as_ref().and_then(ArtworkAsset::label) {
            profile = profile.with_artwork_ref(label);
        }
        profile
    }
}

/// Renders a profile without an interactive session.
///
/// Pixels match a session brought to the same state. Texture and template
/// failures fall back to solid fills; a missing or undecodable artwork is
/// an error.
pub fn render_design(
    config: CompositorConfig,
    profile: &DesignProfile,
    source: impl AssetSource + 'static,
) -> Result<Pixmap> {
    let mut session = DesignSession::new(config, source)?;
    session.resolve_pending();
    session.apply_profile(profile)?;
    Ok(session.render()?.clone())
}
