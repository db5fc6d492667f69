//! Catalogue listing.

use skybox_storefront::ClientConfig;
use skybox_storefront::shopify::Product;

use super::{CommandError, storefront};

/// Products fetched per listing.
pub const PAGE_SIZE: i64 = 50;

/// Print the first `limit` products and their variants.
///
/// # Errors
///
/// Returns an error if Shopify is not configured or the request fails.
pub async fn list(config: &ClientConfig, limit: i64) -> Result<(), CommandError> {
    let products = storefront(config)?.products(limit).await?;
    tracing::debug!(count = products.len(), "Fetched products");

    #[allow(clippy::print_stdout)]
    {
        for product in &products {
            println!("{}", render(product));
        }
    }
    Ok(())
}

fn render(product: &Product) -> String {
    let mut lines = vec![format!(
        "{} [{}] from {}",
        product.title, product.handle, product.min_price
    )];
    lines.extend(product.variants.iter().map(|v| {
        let availability = if v.available_for_sale { "" } else { " (agotado)" };
        format!("  - {} {}{availability}  {}", v.title, v.price, v.id)
    }));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use skybox_core::{Money, VariantId};
    use skybox_storefront::shopify::ProductVariant;

    use super::*;

    #[test]
    fn test_render_marks_sold_out() {
        let product = Product {
            id: "gid://shopify/Product/1".to_owned(),
            title: "Alitas".to_owned(),
            description: String::new(),
            handle: "alitas".to_owned(),
            min_price: Money::new(32000.into(), "COP"),
            images: vec![],
            variants: vec![ProductVariant {
                id: VariantId::new("gid://shopify/ProductVariant/7"),
                title: "x12".to_owned(),
                price: Money::new(32000.into(), "COP"),
                available_for_sale: false,
                selected_options: vec![],
            }],
            options: vec![],
        };

        assert_eq!(
            render(&product),
            "Alitas [alitas] from 32000 COP\n  - x12 32000 COP (agotado)  gid://shopify/ProductVariant/7"
        );
    }
}
