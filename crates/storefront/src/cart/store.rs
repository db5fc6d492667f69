//! The cart state container.

use rust_decimal::Decimal;

use skybox_core::{Money, VariantId};

use super::{CartError, CartItem, CartStorage, CheckoutCreator, PersistedCart};
use crate::hooks::InFlight;

/// A cart bound to its storage.
///
/// Methods take `&mut self`, so mutations are serialized by ownership. Each
/// successful mutation is saved before returning; if the save fails the
/// in-memory change is kept and the error is returned.
///
/// The busy flag is shared: [`CartStore::busy_flag`] hands out a handle that
/// can be read while [`CartStore::create_checkout`] holds the cart.
#[derive(Debug)]
pub struct CartStore<S> {
    items: Vec<CartItem>,
    cart_id: Option<String>,
    checkout_url: Option<String>,
    busy: InFlight,
    storage: S,
}

impl<S: CartStorage> CartStore<S> {
    /// Load the saved cart, or start empty when nothing was saved.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the saved cart exists but cannot be read.
    pub fn load(storage: S) -> Result<Self, CartError> {
        let saved = storage.load()?.unwrap_or_default();
        tracing::debug!(items = saved.items.len(), "Cart loaded");
        Ok(Self::from_parts(saved, storage))
    }

    /// An empty cart that will save to `storage`. Existing saved data is
    /// overwritten on the first mutation.
    #[must_use]
    pub fn empty(storage: S) -> Self {
        Self::from_parts(PersistedCart::default(), storage)
    }

    fn from_parts(saved: PersistedCart, storage: S) -> Self {
        Self {
            items: saved.items,
            cart_id: saved.cart_id,
            checkout_url: saved.checkout_url,
            busy: InFlight::default(),
            storage,
        }
    }

    fn save(&self) -> Result<(), CartError> {
        self.storage.save(&PersistedCart {
            items: self.items.clone(),
            cart_id: self.cart_id.clone(),
            checkout_url: self.checkout_url.clone(),
        })
    }

    /// Add an item, merging with an existing line for the same variant.
    ///
    /// A zero quantity leaves the cart unchanged.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the cart cannot be saved.
    pub fn add_item(&mut self, item: CartItem) -> Result<(), CartError> {
        if item.quantity == 0 {
            return Ok(());
        }

        match self.items.iter_mut().find(|i| i.variant_id == item.variant_id) {
            Some(existing) => {
                existing.quantity = existing.quantity.saturating_add(item.quantity);
            }
            None => self.items.push(item),
        }
        self.save()
    }

    /// Set the quantity of a line. Zero or negative removes it.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the cart cannot be saved.
    pub fn update_quantity(&mut self, variant_id: &VariantId, quantity: i64) -> Result<(), CartError> {
        if quantity <= 0 {
            return self.remove_item(variant_id);
        }
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);

        if let Some(item) = self.items.iter_mut().find(|i| &i.variant_id == variant_id) {
            item.quantity = quantity;
        }
        self.save()
    }

    /// Remove a line. Unknown variants are ignored.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the cart cannot be saved.
    pub fn remove_item(&mut self, variant_id: &VariantId) -> Result<(), CartError> {
        self.items.retain(|i| &i.variant_id != variant_id);
        self.save()
    }

    /// Empty the cart and forget the cart ID and checkout URL.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the cart cannot be saved.
    pub fn clear_cart(&mut self) -> Result<(), CartError> {
        self.items.clear();
        self.cart_id = None;
        self.checkout_url = None;
        self.save()
    }

    /// Record the upstream cart ID.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the cart cannot be saved.
    pub fn set_cart_id(&mut self, cart_id: impl Into<String>) -> Result<(), CartError> {
        self.cart_id = Some(cart_id.into());
        self.save()
    }

    /// Record a checkout URL.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the cart cannot be saved.
    pub fn set_checkout_url(&mut self, url: impl Into<String>) -> Result<(), CartError> {
        self.checkout_url = Some(url.into());
        self.save()
    }

    /// Create a checkout for the current items.
    ///
    /// Returns `Ok(None)` without calling `creator` when the cart is empty.
    /// On success the URL is stored; items stay in the cart. On failure the
    /// cart is left as it was. The busy flag is lowered on every exit,
    /// including when the returned future is dropped mid-request.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Checkout` if the creator fails, or
    /// `CartError::Storage` if the URL cannot be saved.
    #[tracing::instrument(skip_all, fields(lines = self.items.len()))]
    pub async fn create_checkout<C>(&mut self, creator: &C) -> Result<Option<String>, CartError>
    where
        C: CheckoutCreator + ?Sized,
    {
        if self.items.is_empty() {
            return Ok(None);
        }

        let result = {
            let _busy = self.busy.raise();
            creator.create_checkout(&self.items).await
        };

        let url = result.inspect_err(|e| tracing::warn!(error = %e, "Checkout creation failed"))?;
        self.checkout_url = Some(url.clone());
        self.save()?;
        Ok(Some(url))
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    #[must_use]
    pub fn cart_id(&self) -> Option<&str> {
        self.cart_id.as_deref()
    }

    #[must_use]
    pub fn checkout_url(&self) -> Option<&str> {
        self.checkout_url.as_deref()
    }

    /// Whether a checkout request is in flight.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy.get()
    }

    /// A handle on the busy flag for observers that cannot borrow the cart.
    #[must_use]
    pub fn busy_flag(&self) -> InFlight {
        self.busy.clone()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|i| u64::from(i.quantity)).sum()
    }

    /// Sum of line totals in the first line's currency.
    ///
    /// Lines priced in another currency are left out. `None` for an empty
    /// cart.
    #[must_use]
    pub fn subtotal(&self) -> Option<Money> {
        let currency = &self.items.first()?.price.currency_code;
        let amount: Decimal = self
            .items
            .iter()
            .filter(|i| &i.price.currency_code == currency)
            .map(|i| i.line_total().amount)
            .sum();
        Some(Money::new(amount, currency.clone()))
    }

    /// The backing storage.
    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::sync::Notify;

    use super::*;
    use crate::cart::{JsonFileStorage, MemoryStorage, SelectedOption};
    use crate::shopify::ShopifyError;

    fn item(variant: &str, quantity: u32, cents: i64) -> CartItem {
        CartItem {
            variant_id: VariantId::new(format!("gid://shopify/ProductVariant/{variant}")),
            quantity,
            product_title: format!("Product {variant}"),
            product_handle: format!("product-{variant}"),
            variant_title: "Default Title".to_string(),
            price: Money::new(Decimal::new(cents, 2), "COP"),
            image_url: None,
            selected_options: vec![SelectedOption {
                name: "Tamaño".to_string(),
                value: "Grande".to_string(),
            }],
        }
    }

    struct FakeCheckout {
        calls: AtomicUsize,
        fail: bool,
    }

    impl FakeCheckout {
        fn new(fail: bool) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail,
            }
        }
    }

    #[async_trait]
    impl CheckoutCreator for FakeCheckout {
        async fn create_checkout(&self, items: &[CartItem]) -> Result<String, ShopifyError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ShopifyError::UserError("Merchandise is out of stock".to_string()));
            }
            Ok(format!(
                "https://skybox.myshopify.com/cart/c/1?lines={}&channel=online_store",
                items.len()
            ))
        }
    }

    #[test]
    fn test_add_item_merges_by_variant() {
        let mut cart = CartStore::empty(MemoryStorage::new());
        cart.add_item(item("1", 2, 1000)).unwrap();
        cart.add_item(item("2", 1, 500)).unwrap();
        cart.add_item(item("1", 3, 1000)).unwrap();

        assert_eq!(cart.items().len(), 2);
        assert_eq!(cart.items()[0].quantity, 5);
        assert_eq!(cart.item_count(), 6);
        assert_eq!(cart.storage().snapshot().unwrap().items, cart.items());
    }

    #[test]
    fn test_add_zero_quantity_is_ignored() {
        let mut cart = CartStore::empty(MemoryStorage::new());
        cart.add_item(item("1", 0, 1000)).unwrap();
        assert!(cart.items().is_empty());
        assert!(cart.storage().snapshot().is_none());
    }

    #[test]
    fn test_update_quantity_non_positive_removes() {
        let mut cart = CartStore::empty(MemoryStorage::new());
        cart.add_item(item("1", 2, 1000)).unwrap();
        cart.add_item(item("2", 2, 1000)).unwrap();

        cart.update_quantity(&item("1", 0, 0).variant_id, 7).unwrap();
        assert_eq!(cart.items()[0].quantity, 7);

        cart.update_quantity(&item("1", 0, 0).variant_id, 0).unwrap();
        cart.update_quantity(&item("2", 0, 0).variant_id, -3).unwrap();
        assert!(cart.items().is_empty());
    }

    #[test]
    fn test_remove_unknown_is_noop() {
        let mut cart = CartStore::empty(MemoryStorage::new());
        cart.add_item(item("1", 1, 1000)).unwrap();
        cart.remove_item(&VariantId::new("gid://shopify/ProductVariant/404")).unwrap();
        assert_eq!(cart.items().len(), 1);
    }

    #[test]
    fn test_clear_resets_ids() {
        let mut cart = CartStore::empty(MemoryStorage::new());
        cart.add_item(item("1", 1, 1000)).unwrap();
        cart.set_cart_id("gid://shopify/Cart/abc").unwrap();
        cart.set_checkout_url("https://example.test/checkout").unwrap();

        cart.clear_cart().unwrap();

        assert!(cart.items().is_empty());
        assert!(cart.cart_id().is_none());
        assert!(cart.checkout_url().is_none());
        assert_eq!(cart.storage().snapshot(), Some(PersistedCart::default()));
    }

    #[test]
    fn test_subtotal() {
        let mut cart = CartStore::empty(MemoryStorage::new());
        assert!(cart.subtotal().is_none());

        cart.add_item(item("1", 2, 1250)).unwrap();
        cart.add_item(item("2", 1, 500)).unwrap();
        assert_eq!(cart.subtotal(), Some(Money::new(Decimal::new(3000, 2), "COP")));
    }

    #[test]
    fn test_persists_across_reload() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut cart = CartStore::load(JsonFileStorage::in_dir(dir.path())).unwrap();
            cart.add_item(item("1", 2, 1000)).unwrap();
            cart.set_cart_id("gid://shopify/Cart/abc").unwrap();
        }

        let cart = CartStore::load(JsonFileStorage::in_dir(dir.path())).unwrap();
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].quantity, 2);
        assert_eq!(cart.cart_id(), Some("gid://shopify/Cart/abc"));
        assert!(!cart.is_busy());
    }

    #[tokio::test]
    async fn test_checkout_empty_cart_skips_network() {
        let creator = FakeCheckout::new(false);
        let mut cart = CartStore::empty(MemoryStorage::new());

        assert_eq!(cart.create_checkout(&creator).await.unwrap(), None);
        assert_eq!(creator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_checkout_stores_url_and_keeps_items() {
        let creator = FakeCheckout::new(false);
        let mut cart = CartStore::empty(MemoryStorage::new());
        cart.add_item(item("1", 1, 1000)).unwrap();

        let url = cart.create_checkout(&creator).await.unwrap().unwrap();

        assert!(url.ends_with("channel=online_store"));
        assert_eq!(cart.checkout_url(), Some(url.as_str()));
        assert_eq!(cart.items().len(), 1);
        assert!(!cart.is_busy());
        assert_eq!(
            cart.storage().snapshot().unwrap().checkout_url.as_deref(),
            Some(url.as_str())
        );
    }

    #[tokio::test]
    async fn test_checkout_failure_leaves_cart() {
        let creator = FakeCheckout::new(true);
        let mut cart = CartStore::empty(MemoryStorage::new());
        cart.add_item(item("1", 1, 1000)).unwrap();

        let err = cart.create_checkout(&creator).await.unwrap_err();

        assert!(matches!(err, CartError::Checkout(ShopifyError::UserError(_))));
        assert_eq!(cart.items().len(), 1);
        assert!(cart.checkout_url().is_none());
        assert!(!cart.is_busy());
        assert_eq!(creator.calls.load(Ordering::SeqCst), 1);
    }

    /// Parks inside the request until released.
    #[derive(Default)]
    struct GatedCheckout {
        entered: Notify,
        release: Notify,
    }

    #[async_trait]
    impl CheckoutCreator for GatedCheckout {
        async fn create_checkout(&self, _items: &[CartItem]) -> Result<String, ShopifyError> {
            self.entered.notify_one();
            self.release.notified().await;
            Ok("https://skybox.myshopify.com/cart/c/2?channel=online_store".to_string())
        }
    }

    struct NeverAnswers;

    #[async_trait]
    impl CheckoutCreator for NeverAnswers {
        async fn create_checkout(&self, _items: &[CartItem]) -> Result<String, ShopifyError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_busy_visible_during_checkout() {
        let creator = GatedCheckout::default();
        let mut cart = CartStore::empty(MemoryStorage::new());
        cart.add_item(item("1", 1, 1000)).unwrap();
        let busy = cart.busy_flag();
        assert!(!busy.get());

        let observe = async {
            creator.entered.notified().await;
            let seen = busy.get();
            creator.release.notify_one();
            seen
        };
        let (result, seen) = tokio::join!(cart.create_checkout(&creator), observe);

        assert!(seen);
        assert!(result.unwrap().is_some());
        assert!(!busy.get());
    }

    #[tokio::test]
    async fn test_cancelled_checkout_clears_busy() {
        let mut cart = CartStore::empty(MemoryStorage::new());
        cart.add_item(item("1", 1, 1000)).unwrap();

        let outcome = tokio::time::timeout(
            Duration::from_millis(20),
            cart.create_checkout(&NeverAnswers),
        )
        .await;

        assert!(outcome.is_err());
        assert!(!cart.is_busy());
        assert!(cart.checkout_url().is_none());
        assert_eq!(cart.items().len(), 1);
    }
}
