//! Cart line items.

use serde::{Deserialize, Serialize};

use skybox_core::{Money, VariantId};

/// A product option chosen for a variant (e.g. size = "Grande").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedOption {
    pub name: String,
    pub value: String,
}

/// One line in the cart.
///
/// Identity is the variant ID; the product fields are copied from the
/// catalogue at add time so the cart renders without a network call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Shopify product variant GID.
    pub variant_id: VariantId,
    /// Always positive while the item is in a cart.
    pub quantity: u32,
    pub product_title: String,
    pub product_handle: String,
    pub variant_title: String,
    /// Unit price.
    pub price: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub selected_options: Vec<SelectedOption>,
}

impl CartItem {
    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.price.times(self.quantity)
    }
}
