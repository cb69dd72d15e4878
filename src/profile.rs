//! Serializable design profile.
//!
//! A [`DesignProfile`] captures everything needed to reproduce a design: the
//! chosen texture, the artwork transform and a reference to the artwork
//! file. It can be saved as JSON and replayed later, either into a live
//! session or headlessly.
//!
//! # Example
//!
//! ```
//! use lid_compositor::{DesignProfile, TransformSettings};
//!
//! let profile = DesignProfile::new("cosmic-nova")
//!     .with_transform(TransformSettings {
//!         translate_x: 12.0,
//!         translate_y: -4.0,
//!         scale: 1.2,
//!         rotation_degrees: 45.0,
//!     })
//!     .with_artwork_ref("uploads/logo.png");
//!
//! let json = profile.to_json().unwrap();
//! let restored = DesignProfile::from_json(&json).unwrap();
//! assert_eq!(restored.texture_id, "cosmic-nova");
//! ```

use serde::{Deserialize, Serialize};

use crate::geometry::{DEFAULT_SCALE, Transform};

// ============================================================================
// Transform Settings
// ============================================================================

/// Serializable version of [`Transform`].
///
/// Values are not validated on deserialize; converting into a [`Transform`]
/// clamps them the same way the interactive controls do.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase", default)]
pub struct TransformSettings {
    pub translate_x: f32,
    pub translate_y: f32,
    pub scale: f32,
    pub rotation_degrees: f32,
}

impl Default for TransformSettings {
    fn default() -> Self {
        Self {
            translate_x: 0.0,
            translate_y: 0.0,
            scale: DEFAULT_SCALE,
            rotation_degrees: 0.0,
        }
    }
}

impl From<Transform> for TransformSettings {
    fn from(t: Transform) -> Self {
        Self {
            translate_x: t.translate_x(),
            translate_y: t.translate_y(),
            scale: t.scale(),
            rotation_degrees: t.rotation_degrees(),
        }
    }
}

impl From<TransformSettings> for Transform {
    fn from(s: TransformSettings) -> Self {
        Transform::new(s.translate_x, s.translate_y, s.scale, s.rotation_degrees)
    }
}

// ============================================================================
// Layer Settings
// ============================================================================

/// Which optional layers a design is drawn with.
///
/// The background, texture and artwork layers always draw when replaying a
/// profile. Turning `guides` off gives production artwork without the
/// dashed bleed outline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase", default)]
pub struct LayerSettings {
    pub gloss: bool,
    pub guides: bool,
}

impl Default for LayerSettings {
    fn default() -> Self {
        Self {
            gloss: true,
            guides: true,
        }
    }
}

// ============================================================================
// DesignProfile
// ============================================================================

/// A serializable description of one design.
///
/// # JSON Format
///
/// ```json
/// {
///   "textureId": "cosmic-nova",
///   "transform": {
///     "translateX": 12.0,
///     "translateY": -4.0,
///     "scale": 1.2,
///     "rotationDegrees": 45.0
///   },
///   "artworkRef": "uploads/logo.png",
///   "layers": { "gloss": true, "guides": false }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct DesignProfile {
    pub texture_id: String,

    #[serde(default)]
    pub transform: TransformSettings,

    /// Where the artwork bytes can be fetched from. `None` means no artwork.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artwork_ref: Option<String>,

    #[serde(default)]
    pub layers: LayerSettings,
}

impl DesignProfile {
    /// A profile with the given texture, default transform and no artwork.
    pub fn new(texture_id: impl Into<String>) -> Self {
        Self {
            texture_id: texture_id.into(),
            transform: TransformSettings::default(),
            artwork_ref: None,
            layers: LayerSettings::default(),
        }
    }

    pub fn with_transform(mut self, transform: TransformSettings) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_artwork_ref(mut self, artwork_ref: impl Into<String>) -> Self {
        self.artwork_ref = Some(artwork_ref.into());
        self
    }

    pub fn with_layers(mut self, layers: LayerSettings) -> Self {
        self.layers = layers;
        self
    }

    /// The clamped transform this profile describes.
    pub fn transform(&self) -> Transform {
        self.transform.into()
    }

    /// Serializes the profile to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serializes the profile to a pretty-printed JSON string.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserializes a profile from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

// ============================================================================
// Tests
// ============================================================================
