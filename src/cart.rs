//! The line item handed to the cart.

use serde::{Deserialize, Serialize};

/// Product name used for every customized lid.
pub const PRODUCT_NAME: &str = "Custom Box Lid";

/// A cart line.
///
/// ```json
/// {
///   "id": "lid-3",
///   "name": "Custom Box Lid",
///   "price": 29.99,
///   "qty": 1,
///   "preview": "data:image/png;base64,...",
///   "textureId": "cosmic-nova"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: String,
    pub name: String,
    /// Unit price.
    pub price: f64,
    pub qty: u32,
    /// Encoded snapshot. Absent when no snapshot was taken.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
    pub texture_id: String,
}

impl CartItem {
    /// A single lid at `price`.
    pub fn new(id: impl Into<String>, price: f64, texture_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: PRODUCT_NAME.to_string(),
            price,
            qty: 1,
            preview: None,
            texture_id: texture_id.into(),
        }
    }

    pub fn with_preview(mut self, preview: impl Into<String>) -> Self {
        self.preview = Some(preview.into());
        self
    }

    /// Sets the quantity, never below one.
    pub fn with_qty(mut self, qty: u32) -> Self {
        self.qty = qty.max(1);
        self
    }

    pub fn has_preview(&self) -> bool {
        self.preview.is_some()
    }

    pub fn line_total(&self) -> f64 {
        self.price * f64::from(self.qty.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_shape() {
        let item = CartItem::new("lid-1", 29.99, "carbon");
        let json = serde_json::to_string(&item).unwrap();
        assert!(json.contains("\"textureId\":\"carbon\""));
        assert!(json.contains("\"name\":\"Custom Box Lid\""));
        assert!(json.contains("\"qty\":1"));
        assert!(!json.contains("preview"));

        let with_preview = item.with_preview("data:image/png;base64,AAAA");
        let json = serde_json::to_string(&with_preview).unwrap();
        assert!(json.contains("\"preview\":\"data:image/png;base64,AAAA\""));
    }

    #[test]
    fn quantity_is_at_least_one() {
        let item = CartItem::new("lid-1", 10.0, "plain").with_qty(0);
        assert_eq!(item.qty, 1);
        let item = item.with_qty(3);
        assert!((item.line_total() - 30.0).abs() < 1e-9);
    }
}
