//! Error taxonomy for the compositor.
//!
//! Every failure in this crate is local and recoverable: asset failures fall
//! back to solid fills, failed uploads leave the current artwork untouched and
//! exports requested too early yield [`CompositorError::ExportUnavailable`].

pub type Result<T> = std::result::Result<T, CompositorError>;

#[derive(thiserror::Error, Debug)]
pub enum CompositorError {
    /// A texture or template could not be fetched or decoded.
    #[error("asset load error: `{reference}`: {reason}")]
    AssetLoad { reference: String, reason: String },

    /// An uploaded or dropped file is not a decodable raster image.
    #[error("unsupported image: {0}")]
    UnsupportedImage(String),

    /// A snapshot was requested before any render pass completed.
    #[error("export unavailable: nothing has been rendered yet")]
    ExportUnavailable,

    #[error("unknown texture: `{0}`")]
    UnknownTexture(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("encoding error: {0}")]
    Encode(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CompositorError {
    pub fn asset_load(reference: impl Into<String>, reason: impl ToString) -> Self {
        Self::AssetLoad {
            reference: reference.into(),
            reason: reason.to_string(),
        }
    }

    pub fn unsupported_image(msg: impl Into<String>) -> Self {
        Self::UnsupportedImage(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn encode(msg: impl ToString) -> Self {
        Self::Encode(msg.to_string())
    }

    /// Returns true for failures the session recovers from by falling back
    /// to a solid fill rather than surfacing to the caller.
    pub fn is_asset_fallback(&self) -> bool {
        matches!(self, Self::AssetLoad { .. })
    }
}
