//! Texture catalog entries and colors.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use palette::Srgb;
use serde::{Deserialize, Serialize};

use crate::error::{CompositorError, Result};

// ============================================================================
// HexColor
// ============================================================================

/// An opaque sRGB color written as `#rrggbb` (or `#rgb`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HexColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl HexColor {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn as_tuple(&self) -> (u8, u8, u8, u8) {
        (self.r, self.g, self.b, 255)
    }
}

impl FromStr for HexColor {
    type Err = CompositorError;

    fn from_str(s: &str) -> Result<Self> {
        let rgb: Srgb<u8> = s
            .trim()
            .parse()
            .map_err(|e| CompositorError::config(format!("invalid color `{s}`: {e}")))?;
        Ok(Self::new(rgb.red, rgb.green, rgb.blue))
    }
}

impl TryFrom<String> for HexColor {
    type Error = CompositorError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<HexColor> for String {
    fn from(c: HexColor) -> Self {
        c.to_string()
    }
}

#[cfg(feature = "jsonschema")]
impl schemars::JsonSchema for HexColor {
    fn schema_name() -> String {
        "HexColor".to_string()
    }

    fn json_schema(generator: &mut schemars::r#gen::SchemaGenerator) -> schemars::schema::Schema {
        String::json_schema(generator)
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

// ============================================================================
// Texture
// ============================================================================

/// A base texture the buyer can pick for the lid.
///
/// When `image_ref` decodes it is drawn; otherwise `fallback_color` fills the
/// safe area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct Texture {
    pub id: String,
    pub display_name: String,

    /// Added to the base price when this texture is chosen.
    #[serde(default)]
    pub price_delta: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_color: Option<HexColor>,
}

impl Texture {
    /// A texture that only ever renders as a solid color.
    pub fn solid(id: impl Into<String>, display_name: impl Into<String>, color: HexColor) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            price_delta: 0.0,
            image_ref: None,
            fallback_color: Some(color),
        }
    }

    /// A texture backed by an image asset.
    pub fn image(
        id: impl Into<String>,
        display_name: impl Into<String>,
        image_ref: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            price_delta: 0.0,
            image_ref: Some(image_ref.into()),
            fallback_color: None,
        }
    }

    pub fn with_price_delta(mut self, delta: f64) -> Self {
        self.price_delta = delta;
        self
    }

    pub fn with_fallback_color(mut self, color: HexColor) -> Self {
        self.fallback_color = Some(color);
        self
    }
}

/// Price of one lid with `texture` chosen.
pub fn unit_price(base_price: f64, texture: &Texture) -> f64 {
    base_price + texture.price_delta
}

// ============================================================================
// TextureCatalog
// ============================================================================

/// The static list of textures offered to buyers, in display order.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureCatalog {
    textures: Vec<Texture>,
    default_index: usize,
}

impl TextureCatalog {
    /// Builds a catalog, checking that ids are unique, prices are sane and
    /// the default entry exists and renders without an image.
    pub fn new(textures: Vec<Texture>, default_id: &str) -> Result<Self> {
        let mut seen = HashSet::new();
        for t in &textures {
            if t.id.is_empty() {
                return Err(CompositorError::config("texture id must not be empty"));
            }
            if !seen.insert(t.id.as_str()) {
                return Err(CompositorError::config(format!(
                    "duplicate texture id `{}`",
                    t.id
                )));
            }
            if !t.price_delta.is_finite() || t.price_delta < 0.0 {
                return Err(CompositorError::config(format!(
                    "texture `{}` has invalid price delta {}",
                    t.id, t.price_delta
                )));
            }
        }
        let default_index = textures
            .iter()
            .position(|t| t.id == default_id)
            .ok_or_else(|| {
                CompositorError::config(format!("default texture `{default_id}` is not in the catalog"))
            })?;
        if textures[default_index].image_ref.is_some() {
            return Err(CompositorError::config(format!(
                "default texture `{default_id}` must be a solid fill"
            )));
        }
        Ok(Self {
            textures,
            default_index,
        })
    }

    pub fn get(&self, id: &str) -> Option<&Texture> {
        self.textures.iter().find(|t| t.id == id)
    }

    /// Looks up a texture, failing with [`CompositorError::UnknownTexture`].
    pub fn require(&self, id: &str) -> Result<&Texture> {
        self.get(id)
            .ok_or_else(|| CompositorError::UnknownTexture(id.to_string()))
    }

    pub fn default_texture(&self) -> &Texture {
        &self.textures[self.default_index]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Texture> {
        self.textures.iter()
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }
}

/// The storefront's stock textures.
pub fn stock_textures() -> Vec<Texture> {
    let mut textures = vec![Texture::solid(
        "plain",
        "Plain (Upload Art)",
        HexColor::new(0xf3, 0xf4, 0xf6),
    )];
    let photos = [
        ("cosmic-nova", "Cosmic Nova"),
        ("volcano-lava", "Volcano Lava"),
        ("ice-crystal", "Ice Crystal"),
        ("neon-lattice", "Neon Lattice"),
        ("camo-volt", "Camo Volt"),
        ("dragon-fire", "Dragon Fire Scales"),
        ("sea-dragon", "Sea Dragon Scales"),
        ("caramel-croc", "Caramel Croc"),
        ("green-viper", "Green Viper"),
        ("carbon", "Carbon Weave"),
    ];
    textures.extend(
        photos
            .iter()
            .enumerate()
            .map(|(i, (id, name))| Texture::image(*id, *name, format!("/photos/lid{}.png", i + 1))),
    );
    textures
}
