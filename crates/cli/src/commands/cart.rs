//! Cart commands.
//!
//! # Usage
//!
//! ```bash
//! skybox cart add michelada --quantity 2
//! skybox cart update gid://shopify/ProductVariant/11 3
//! skybox cart show
//! skybox cart checkout
//! ```
//!
//! The cart lives in `$SKYBOX_DATA_DIR/shopify-cart.json`.

use std::fmt::Write as _;

use skybox_core::VariantId;
use skybox_storefront::cart::{CartStorage, CartStore, JsonFileStorage};
use skybox_storefront::{CartError, ClientConfig};

use super::{CommandError, products::PAGE_SIZE, storefront};

/// Load the cart from the data directory.
///
/// A corrupt cart file is reported and replaced by an empty cart on the next
/// save.
fn open(config: &ClientConfig) -> Result<CartStore<JsonFileStorage>, CommandError> {
    let storage = JsonFileStorage::in_dir(&config.data_dir);
    match CartStore::load(storage.clone()) {
        Ok(cart) => Ok(cart),
        Err(CartError::Corrupt(e)) => {
            tracing::warn!(path = %storage.path().display(), error = %e, "Saved cart is corrupt, starting empty");
            Ok(CartStore::empty(storage))
        }
        Err(e) => Err(e.into()),
    }
}

/// Add a product to the cart by handle.
///
/// # Errors
///
/// Returns an error if Shopify is not configured, the product or variant does
/// not exist, or the cart cannot be saved.
pub async fn add(
    config: &ClientConfig,
    handle: &str,
    variant: Option<String>,
    quantity: u32,
) -> Result<(), CommandError> {
    let client = storefront(config)?;
    let product = client
        .product_by_handle(handle, PAGE_SIZE)
        .await?
        .ok_or_else(|| CommandError::ProductNotFound(handle.to_owned()))?;

    let variant_id = variant.map(VariantId::new);
    let chosen = product
        .variant(variant_id.as_ref())
        .ok_or_else(|| CommandError::VariantNotFound {
            handle: handle.to_owned(),
            variant: variant_id
                .as_ref()
                .map_or_else(|| "(default)".to_owned(), ToString::to_string),
        })?;

    let mut cart = open(config)?;
    cart.add_item(product.cart_item(chosen, quantity))?;
    tracing::info!(handle, variant = %chosen.id, quantity, "Added to cart");
    print(&render(&cart));
    Ok(())
}

/// Set a line's quantity; zero or less removes it.
///
/// # Errors
///
/// Returns an error if the cart cannot be loaded or saved.
pub fn update(config: &ClientConfig, variant: &str, quantity: i64) -> Result<(), CommandError> {
    let mut cart = open(config)?;
    cart.update_quantity(&VariantId::new(variant), quantity)?;
    print(&render(&cart));
    Ok(())
}

/// Remove a line.
///
/// # Errors
///
/// Returns an error if the cart cannot be loaded or saved.
pub fn remove(config: &ClientConfig, variant: &str) -> Result<(), CommandError> {
    let mut cart = open(config)?;
    cart.remove_item(&VariantId::new(variant))?;
    print(&render(&cart));
    Ok(())
}

/// Empty the cart.
///
/// # Errors
///
/// Returns an error if the cart cannot be saved.
pub fn clear(config: &ClientConfig) -> Result<(), CommandError> {
    let mut cart = open(config)?;
    cart.clear_cart()?;
    print("Cart cleared");
    Ok(())
}

/// Print the cart.
///
/// # Errors
///
/// Returns an error if the cart cannot be loaded.
pub fn show(config: &ClientConfig) -> Result<(), CommandError> {
    print(&render(&open(config)?));
    Ok(())
}

/// Create a Shopify checkout and print its URL.
///
/// # Errors
///
/// Returns an error if Shopify is not configured or rejects the cart.
pub async fn checkout(config: &ClientConfig) -> Result<(), CommandError> {
    let client = storefront(config)?;
    let mut cart = open(config)?;

    match cart.create_checkout(&client).await? {
        Some(url) => print(&format!("Checkout: {url}")),
        None => print("Cart is empty"),
    }
    Ok(())
}

fn render<S: CartStorage>(cart: &CartStore<S>) -> String {
    if cart.items().is_empty() {
        return "Cart is empty".to_owned();
    }

    let mut out = String::new();
    for item in cart.items() {
        let _ = writeln!(
            out,
            "{} x {} ({}) @ {} = {}\n    {}",
            item.quantity,
            item.product_title,
            item.variant_title,
            item.price,
            item.line_total(),
            item.variant_id,
        );
    }
    let _ = writeln!(out, "Items: {}", cart.item_count());
    if let Some(subtotal) = cart.subtotal() {
        let _ = writeln!(out, "Subtotal: {subtotal}");
    }
    if let Some(url) = cart.checkout_url() {
        let _ = writeln!(out, "Checkout: {url}");
    }
    out.trim_end().to_owned()
}

#[allow(clippy::print_stdout)]
fn print(text: &str) {
    println!("{text}");
}
