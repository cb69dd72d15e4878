//! Compositor configuration.
//!
//! Every field has a default matching the storefront, so an empty JSON
//! object is a valid config:
//!
//! ```json
//! {
//!   "basePrice": 29.99,
//!   "currency": "GBP",
//!   "surface": { "logicalSize": 640, "pixelRatio": 2.0 },
//!   "templateRef": "/preview.png",
//!   "templateFallbackColor": "#0b0f1a",
//!   "defaultFallbackColor": "#eceff1",
//!   "defaultTexture": "plain",
//!   "catalog": [
//!     { "id": "plain", "displayName": "Plain", "fallbackColor": "#f3f4f6" },
//!     { "id": "carbon", "displayName": "Carbon Weave", "imageRef": "/photos/lid10.png" }
//!   ]
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CompositorError, Result};
use crate::surface::SurfaceSpec;
use crate::texture::{HexColor, Texture, TextureCatalog, stock_textures};

pub const DEFAULT_BASE_PRICE: f64 = 29.99;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase", default)]
pub struct CompositorConfig {
    /// Price of a lid before the texture's delta.
    pub base_price: f64,
    /// ISO 4217 code, used for display only.
    pub currency: String,
    pub surface: SurfaceSpec,

    /// Background template drawn behind the lid. `None` always uses
    /// `template_fallback_color`.
    pub template_ref: Option<String>,
    pub template_fallback_color: HexColor,

    /// Safe-area fill for textures with neither a decoded bitmap nor their
    /// own fallback color.
    pub default_fallback_color: HexColor,

    pub catalog: Vec<Texture>,
    pub default_texture: String,
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self {
            base_price: DEFAULT_BASE_PRICE,
            currency: "GBP".to_string(),
            surface: SurfaceSpec::default(),
            template_ref: Some("/preview.png".to_string()),
            template_fallback_color: HexColor::new(0x0b, 0x0f, 0x1a),
            default_fallback_color: HexColor::new(0xec, 0xef, 0xf1),
            catalog: stock_textures(),
            default_texture: "plain".to_string(),
        }
    }
}

impl CompositorConfig {
    /// Checks the whole config, returning the first problem found.
    pub fn validate(&self) -> Result<()> {
        if !self.base_price.is_finite() || self.base_price < 0.0 {
            return Err(CompositorError::config(format!(
                "basePrice must be a non-negative number, got {}",
                self.base_price
            )));
        }
        if self.catalog.is_empty() {
            return Err(CompositorError::config("texture catalog is empty"));
        }
        self.surface.validate()?;
        self.catalog()?;
        Ok(())
    }

    /// Builds the validated texture catalog.
    pub fn catalog(&self) -> Result<TextureCatalog> {
        TextureCatalog::new(self.catalog.clone(), &self.default_texture)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| CompositorError::config(format!("invalid config JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| CompositorError::config(format!("cannot serialize config: {e}")))
    }

    /// Reads and validates a JSON config file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        tracing::debug!(path = %path.display(), "loaded compositor config");
        Self::from_json(&json)
    }
}
