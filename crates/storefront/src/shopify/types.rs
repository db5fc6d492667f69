//! Domain types for Storefront API responses.

use serde::{Deserialize, Serialize};

use skybox_core::{Money, VariantId};

use super::queries::get_products;
use crate::cart::{CartItem, SelectedOption};

/// A product image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub url: String,
    pub alt_text: Option<String>,
}

/// A product option and its possible values (e.g. Tamaño: Pequeño, Grande).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductOption {
    pub name: String,
    pub values: Vec<String>,
}

/// A purchasable variant of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductVariant {
    pub id: VariantId,
    pub title: String,
    pub price: Money,
    pub available_for_sale: bool,
    pub selected_options: Vec<SelectedOption>,
}

/// A catalogue product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub title: String,
    pub description: String,
    pub handle: String,
    /// Lowest variant price.
    pub min_price: Money,
    pub images: Vec<Image>,
    pub variants: Vec<ProductVariant>,
    pub options: Vec<ProductOption>,
}

/// A cart created upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedCart {
    pub id: String,
    /// Checkout URL with the sales channel parameter applied.
    pub checkout_url: String,
    pub total_quantity: i64,
}

impl Product {
    /// Find a variant by ID, or the first variant when `id` is `None`.
    #[must_use]
    pub fn variant(&self, id: Option<&VariantId>) -> Option<&ProductVariant> {
        match id {
            Some(id) => self.variants.iter().find(|v| &v.id == id),
            None => self.variants.first(),
        }
    }

    /// Build a cart line for one of this product's variants.
    #[must_use]
    pub fn cart_item(&self, variant: &ProductVariant, quantity: u32) -> CartItem {
        CartItem {
            variant_id: variant.id.clone(),
            quantity,
            product_title: self.title.clone(),
            product_handle: self.handle.clone(),
            variant_title: variant.title.clone(),
            price: variant.price.clone(),
            image_url: self.images.first().map(|i| i.url.clone()),
            selected_options: variant.selected_options.clone(),
        }
    }
}

pub(super) fn convert_product(node: get_products::ProductNode) -> Product {
    Product {
        id: node.id,
        title: node.title,
        description: node.description,
        handle: node.handle,
        min_price: node.price_range.min_variant_price,
        images: node
            .images
            .edges
            .into_iter()
            .map(|edge| Image {
                url: edge.node.url,
                alt_text: edge.node.alt_text,
            })
            .collect(),
        variants: node
            .variants
            .edges
            .into_iter()
            .map(|edge| {
                let v = edge.node;
                ProductVariant {
                    id: VariantId::new(v.id),
                    title: v.title,
                    price: v.price,
                    available_for_sale: v.available_for_sale,
                    selected_options: v
                        .selected_options
                        .into_iter()
                        .map(|o| SelectedOption {
                            name: o.name,
                            value: o.value,
                        })
                        .collect(),
                }
            })
            .collect(),
        options: node
            .options
            .into_iter()
            .map(|o| ProductOption {
                name: o.name,
                values: o.values,
            })
            .collect(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product_json() -> serde_json::Value {
        serde_json::json!({
            "id": "gid://shopify/Product/1",
            "title": "Michelada",
            "description": "Cerveza preparada",
            "handle": "michelada",
            "priceRange": { "minVariantPrice": { "amount": "18000.0", "currencyCode": "COP" } },
            "images": { "edges": [ { "node": { "url": "https://cdn.test/m.png", "altText": null } } ] },
            "variants": { "edges": [
                { "node": {
                    "id": "gid://shopify/ProductVariant/11",
                    "title": "Grande",
                    "price": { "amount": "22000.0", "currencyCode": "COP" },
                    "availableForSale": true,
                    "selectedOptions": [ { "name": "Tamaño", "value": "Grande" } ]
                } }
            ] },
            "options": [ { "name": "Tamaño", "values": ["Grande"] } ]
        })
    }

    #[test]
    fn test_convert_product_flattens_edges() {
        let node: get_products::ProductNode = serde_json::from_value(product_json()).unwrap();
        let product = convert_product(node);

        assert_eq!(product.handle, "michelada");
        assert_eq!(product.min_price.currency_code, "COP");
        assert_eq!(product.images.len(), 1);
        assert_eq!(product.variants[0].id.as_str(), "gid://shopify/ProductVariant/11");
        assert_eq!(product.options[0].values, vec!["Grande".to_string()]);
    }

    #[test]
    fn test_cart_item_copies_display_fields() {
        let node: get_products::ProductNode = serde_json::from_value(product_json()).unwrap();
        let product = convert_product(node);
        let variant = product.variant(None).unwrap();

        let item = product.cart_item(variant, 2);

        assert_eq!(item.quantity, 2);
        assert_eq!(item.product_title, "Michelada");
        assert_eq!(item.variant_title, "Grande");
        assert_eq!(item.image_url.as_deref(), Some("https://cdn.test/m.png"));
        assert_eq!(item.selected_options[0].value, "Grande");
    }

    #[test]
    fn test_variant_lookup_by_id() {
        let node: get_products::ProductNode = serde_json::from_value(product_json()).unwrap();
        let product = convert_product(node);

        assert!(product.variant(Some(&VariantId::new("gid://shopify/ProductVariant/11"))).is_some());
        assert!(product.variant(Some(&VariantId::new("gid://shopify/ProductVariant/99"))).is_none());
    }
}
