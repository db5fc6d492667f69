//! Storefront API client implementation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use graphql_client::{GraphQLQuery, Response};
use moka::future::Cache;
use secrecy::ExposeSecret;
use tracing::{debug, instrument};
use url::Url;

use super::queries::{CreateCart, GetProducts, create_cart, get_products};
use super::types::{CreatedCart, Product, convert_product};
use super::{GraphQLError, GraphQLErrorLocation, ShopifyError};
use crate::cart::{CartItem, CheckoutCreator};
use crate::config::ShopifyConfig;

/// Public Storefront access token header.
const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Storefront-Access-Token";

/// Sales channel appended to checkout URLs.
const CHECKOUT_CHANNEL: &str = "online_store";

/// Client for the Shopify Storefront API.
///
/// Product listings are cached for 5 minutes, keyed by page size.
#[derive(Clone)]
pub struct StorefrontClient {
    inner: Arc<StorefrontClientInner>,
}

struct StorefrontClientInner {
    client: reqwest::Client,
    endpoint: String,
    access_token: String,
    cache: Cache<i64, Vec<Product>>,
}

impl std::fmt::Debug for StorefrontClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorefrontClient")
            .field("endpoint", &self.inner.endpoint)
            .finish_non_exhaustive()
    }
}

impl StorefrontClient {
    /// Create a client for the configured store.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &ShopifyConfig) -> Result<Self, ShopifyError> {
        Self::with_endpoint(config, config.endpoint())
    }

    /// Create a client that posts to `endpoint` instead of the store's
    /// public GraphQL URL.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn with_endpoint(
        config: &ShopifyConfig,
        endpoint: impl Into<String>,
    ) -> Result<Self, ShopifyError> {
        let cache = Cache::builder()
            .max_capacity(100)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Ok(Self {
            inner: Arc::new(StorefrontClientInner {
                client: reqwest::Client::builder().build()?,
                endpoint: endpoint.into(),
                access_token: config.storefront_token.expose_secret().to_string(),
                cache,
            }),
        })
    }

    /// Execute a GraphQL operation.
    async fn execute<Q: GraphQLQuery>(
        &self,
        variables: Q::Variables,
    ) -> Result<Q::ResponseData, ShopifyError> {
        let request_body = Q::build_query(variables);

        let response = self
            .inner
            .client
            .post(&self.inner.endpoint)
            .header(ACCESS_TOKEN_HEADER, &self.inner.access_token)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::PAYMENT_REQUIRED {
            tracing::error!("Shopify store has no plan that allows Storefront checkouts");
            return Err(ShopifyError::PaymentRequired);
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ShopifyError::RateLimited(retry_after));
        }

        let response_text = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %response_text.chars().take(500).collect::<String>(),
                "Shopify API returned non-success status"
            );
            return Err(ShopifyError::GraphQL(vec![GraphQLError {
                message: format!(
                    "HTTP {status}: {}",
                    response_text.chars().take(200).collect::<String>()
                ),
                locations: vec![],
                path: vec![],
            }]));
        }

        let response: Response<Q::ResponseData> = serde_json::from_str(&response_text)
            .inspect_err(|e| tracing::error!(error = %e, "Failed to parse Shopify GraphQL response"))?;

        if let Some(errors) = response.errors
            && !errors.is_empty()
        {
            debug!(errors = ?errors, "GraphQL errors in response");
            return Err(ShopifyError::GraphQL(
                errors.into_iter().map(convert_graphql_error).collect(),
            ));
        }

        response.data.ok_or_else(|| {
            ShopifyError::GraphQL(vec![GraphQLError {
                message: "No data in response".to_string(),
                locations: vec![],
                path: vec![],
            }])
        })
    }

    /// First `first` products of the catalogue.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn products(&self, first: i64) -> Result<Vec<Product>, ShopifyError> {
        if let Some(products) = self.inner.cache.get(&first).await {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let data = self
            .execute::<GetProducts>(get_products::Variables { first })
            .await?;
        let products: Vec<Product> = data
            .products
            .edges
            .into_iter()
            .map(|edge| convert_product(edge.node))
            .collect();

        self.inner.cache.insert(first, products.clone()).await;
        Ok(products)
    }

    /// Find a product by handle within the first `first` products.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    pub async fn product_by_handle(
        &self,
        handle: &str,
        first: i64,
    ) -> Result<Option<Product>, ShopifyError> {
        Ok(self
            .products(first)
            .await?
            .into_iter()
            .find(|p| p.handle == handle))
    }

    /// Create a cart with the given lines.
    ///
    /// # Errors
    ///
    /// Returns `UserError` with the joined user error messages,
    /// `MissingCheckoutUrl` if Shopify returns no URL, or any transport or
    /// GraphQL error.
    #[instrument(skip_all, fields(lines = items.len()))]
    pub async fn create_cart(&self, items: &[CartItem]) -> Result<CreatedCart, ShopifyError> {
        let variables = create_cart::Variables {
            input: create_cart::CartInput {
                lines: items
                    .iter()
                    .map(|item| create_cart::CartLineInput {
                        merchandise_id: item.variant_id.as_str().to_string(),
                        quantity: i64::from(item.quantity),
                    })
                    .collect(),
            },
        };

        let data = self.execute::<CreateCart>(variables).await?;
        let payload = data.cart_create.ok_or(ShopifyError::MissingCheckoutUrl)?;

        if !payload.user_errors.is_empty() {
            let messages = payload
                .user_errors
                .into_iter()
                .map(|e| e.message)
                .collect::<Vec<_>>()
                .join(", ");
            return Err(ShopifyError::UserError(messages));
        }

        let cart = payload.cart.ok_or(ShopifyError::MissingCheckoutUrl)?;
        let checkout_url = cart
            .checkout_url
            .filter(|u| !u.is_empty())
            .ok_or(ShopifyError::MissingCheckoutUrl)?;

        let created = CreatedCart {
            id: cart.id,
            checkout_url: with_sales_channel(&checkout_url)?,
            total_quantity: cart.total_quantity,
        };
        tracing::info!(cart_id = %created.id, "Shopify cart created");
        Ok(created)
    }
}

#[async_trait]
impl CheckoutCreator for StorefrontClient {
    async fn create_checkout(&self, items: &[CartItem]) -> Result<String, ShopifyError> {
        Ok(self.create_cart(items).await?.checkout_url)
    }
}

/// Set `channel=online_store` on a checkout URL, replacing any existing channel.
fn with_sales_channel(checkout_url: &str) -> Result<String, ShopifyError> {
    let mut url = Url::parse(checkout_url)?;
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != "channel")
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    url.query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair("channel", CHECKOUT_CHANNEL);
    Ok(url.into())
}

fn convert_graphql_error(e: graphql_client::Error) -> GraphQLError {
    GraphQLError {
        message: e.message,
        locations: e.locations.map_or_else(Vec::new, |locs| {
            locs.into_iter()
                .map(|l| GraphQLErrorLocation {
                    line: i64::from(l.line),
                    column: i64::from(l.column),
                })
                .collect()
        }),
        path: e.path.map_or_else(Vec::new, |p| {
            p.into_iter()
                .map(|fragment| match fragment {
                    graphql_client::PathFragment::Key(s) => serde_json::Value::String(s),
                    graphql_client::PathFragment::Index(i) => serde_json::Value::Number(i.into()),
                })
                .collect()
        }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::{Json, Router, http::HeaderMap, http::StatusCode, routing::post};
    use rust_decimal::Decimal;
    use secrecy::SecretString;
    use serde_json::{Value, json};

    use skybox_core::{Money, VariantId};

    use super::*;
    use crate::cart::{CartStore, MemoryStorage};

    fn config() -> ShopifyConfig {
        ShopifyConfig {
            store: "skybox.myshopify.com".to_string(),
            api_version: "2025-07".to_string(),
            storefront_token: SecretString::from("sf-public-token"),
        }
    }

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
        format!("http://{addr}/api/2025-07/graphql.json")
    }

    fn graphql(handler: impl Fn(Value) -> (StatusCode, Value) + Clone + Send + Sync + 'static) -> Router {
        Router::new().route(
            "/api/2025-07/graphql.json",
            post(move |headers: HeaderMap, Json(body): Json<Value>| {
                let handler = handler.clone();
                async move {
                    assert_eq!(headers[ACCESS_TOKEN_HEADER], "sf-public-token");
                    let (status, value) = handler(body);
                    (status, Json(value))
                }
            }),
        )
    }

    fn item() -> CartItem {
        CartItem {
            variant_id: VariantId::new("gid://shopify/ProductVariant/11"),
            quantity: 2,
            product_title: "Michelada".to_string(),
            product_handle: "michelada".to_string(),
            variant_title: "Grande".to_string(),
            price: Money::new(Decimal::new(22000, 0), "COP"),
            image_url: None,
            selected_options: vec![],
        }
    }

    #[test]
    fn test_with_sales_channel() {
        assert_eq!(
            with_sales_channel("https://skybox.myshopify.com/cart/c/abc?key=1").unwrap(),
            "https://skybox.myshopify.com/cart/c/abc?key=1&channel=online_store"
        );
        assert_eq!(
            with_sales_channel("https://skybox.myshopify.com/cart/c/abc?channel=pos&key=1")
                .unwrap(),
            "https://skybox.myshopify.com/cart/c/abc?key=1&channel=online_store"
        );
        assert!(matches!(
            with_sales_channel("not a url"),
            Err(ShopifyError::InvalidCheckoutUrl(_))
        ));
    }

    #[tokio::test]
    async fn test_create_cart_sends_lines_and_tags_channel() {
        let router = graphql(|body| {
            assert_eq!(body["operationName"], "CreateCart");
            assert_eq!(
                body["variables"]["input"]["lines"],
                json!([{ "merchandiseId": "gid://shopify/ProductVariant/11", "quantity": 2 }])
            );
            (
                StatusCode::OK,
                json!({ "data": { "cartCreate": {
                    "cart": { "id": "gid://shopify/Cart/c1", "checkoutUrl": "https://skybox.myshopify.com/cart/c/c1", "totalQuantity": 2 },
                    "userErrors": []
                } } }),
            )
        });
        let client = StorefrontClient::with_endpoint(&config(), serve(router).await).unwrap();

        let cart = client.create_cart(&[item()]).await.unwrap();

        assert_eq!(cart.id, "gid://shopify/Cart/c1");
        assert_eq!(cart.total_quantity, 2);
        assert_eq!(
            cart.checkout_url,
            "https://skybox.myshopify.com/cart/c/c1?channel=online_store"
        );
    }

    #[tokio::test]
    async fn test_user_errors_joined() {
        let router = graphql(|_| {
            (
                StatusCode::OK,
                json!({ "data": { "cartCreate": {
                    "cart": null,
                    "userErrors": [
                        { "field": ["input", "lines", "0"], "message": "Variant unavailable" },
                        { "field": null, "message": "Quantity too high" }
                    ]
                } } }),
            )
        });
        let client = StorefrontClient::with_endpoint(&config(), serve(router).await).unwrap();

        let err = client.create_cart(&[item()]).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cart creation failed: Variant unavailable, Quantity too high"
        );
    }

    #[tokio::test]
    async fn test_missing_checkout_url() {
        let router = graphql(|_| {
            (
                StatusCode::OK,
                json!({ "data": { "cartCreate": {
                    "cart": { "id": "gid://shopify/Cart/c1", "checkoutUrl": null, "totalQuantity": 2 },
                    "userErrors": []
                } } }),
            )
        });
        let client = StorefrontClient::with_endpoint(&config(), serve(router).await).unwrap();

        let err = client.create_cart(&[item()]).await.unwrap_err();
        assert!(matches!(err, ShopifyError::MissingCheckoutUrl));
    }

    #[tokio::test]
    async fn test_payment_required() {
        let router = graphql(|_| (StatusCode::PAYMENT_REQUIRED, json!({ "errors": "Payment Required" })));
        let client = StorefrontClient::with_endpoint(&config(), serve(router).await).unwrap();

        let err = client.create_cart(&[item()]).await.unwrap_err();
        assert!(matches!(err, ShopifyError::PaymentRequired));
    }

    #[tokio::test]
    async fn test_graphql_errors_surface() {
        let router = graphql(|_| {
            (
                StatusCode::OK,
                json!({ "errors": [ { "message": "Field 'foo' doesn't exist", "locations": [ { "line": 2, "column": 3 } ] } ] }),
            )
        });
        let client = StorefrontClient::with_endpoint(&config(), serve(router).await).unwrap();

        let err = client.products(10).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "GraphQL errors: Field 'foo' doesn't exist at line 2:3"
        );
    }

    #[tokio::test]
    async fn test_products_are_cached() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let router = graphql(move |body| {
            counter.fetch_add(1, Ordering::SeqCst);
            assert_eq!(body["variables"]["first"], 5);
            (
                StatusCode::OK,
                json!({ "data": { "products": { "edges": [ { "node": {
                    "id": "gid://shopify/Product/1",
                    "title": "Alitas",
                    "description": "",
                    "handle": "alitas",
                    "priceRange": { "minVariantPrice": { "amount": "32000.0", "currencyCode": "COP" } },
                    "images": { "edges": [] },
                    "variants": { "edges": [] },
                    "options": []
                } } ] } } }),
            )
        });
        let client = StorefrontClient::with_endpoint(&config(), serve(router).await).unwrap();

        let first = client.products(5).await.unwrap();
        let second = client.product_by_handle("alitas", 5).await.unwrap();

        assert_eq!(first.len(), 1);
        assert_eq!(second.unwrap().title, "Alitas");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cart_store_checkout_through_client() {
        let router = graphql(|_| {
            (
                StatusCode::OK,
                json!({ "data": { "cartCreate": {
                    "cart": { "id": "gid://shopify/Cart/c2", "checkoutUrl": "https://skybox.myshopify.com/cart/c/c2", "totalQuantity": 2 },
                    "userErrors": []
                } } }),
            )
        });
        let client = StorefrontClient::with_endpoint(&config(), serve(router).await).unwrap();
        let mut cart = CartStore::empty(MemoryStorage::new());
        cart.add_item(item()).unwrap();

        let url = cart.create_checkout(&client).await.unwrap();

        assert_eq!(
            url.as_deref(),
            Some("https://skybox.myshopify.com/cart/c/c2?channel=online_store")
        );
        assert_eq!(cart.items().len(), 1);
    }
}
