//! Persisted shopping cart.
//!
//! [`CartStore`] is an explicit state container: the caller creates it with
//! [`CartStore::load`] at startup and every mutation is written back through
//! its [`CartStorage`] before the method returns. Nothing here is global.
//!
//! Checkout goes through a [`CheckoutCreator`] so the store can be driven
//! against Shopify in production and a fake in tests.

mod item;
mod storage;
mod store;

use async_trait::async_trait;
use thiserror::Error;

use crate::shopify::ShopifyError;

pub use item::{CartItem, SelectedOption};
pub use storage::{CART_STORAGE_KEY, CartStorage, JsonFileStorage, MemoryStorage, PersistedCart};
pub use store::CartStore;

/// Errors raised by cart persistence and checkout.
#[derive(Debug, Error)]
pub enum CartError {
    /// Reading or writing the storage failed.
    #[error("Cart storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// Saved cart could not be (de)serialized.
    #[error("Saved cart is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    /// The checkout could not be created.
    #[error("Checkout failed: {0}")]
    Checkout(#[from] ShopifyError),
}

/// Creates a hosted checkout for a set of cart lines.
#[async_trait]
pub trait CheckoutCreator: Send + Sync {
    /// Create a checkout and return its URL.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError` if the upstream rejects the cart.
    async fn create_checkout(&self, items: &[CartItem]) -> Result<String, ShopifyError>;
}
