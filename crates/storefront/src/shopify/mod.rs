//! Shopify Storefront API client.
//!
//! # Architecture
//!
//! - Operations are [`graphql_client::GraphQLQuery`] implementations; HTTP
//!   goes through `reqwest` directly
//! - Shopify is the source of truth for products; the listing is cached in
//!   memory via `moka` (5 minute TTL)
//! - Checkout is a `cartCreate` mutation; the returned URL is tagged with the
//!   `online_store` sales channel
//!
//! # Example
//!
//! ```rust,ignore
//! use skybox_storefront::shopify::StorefrontClient;
//!
//! let client = StorefrontClient::new(&shopify_config)?;
//! let products = client.products(20).await?;
//! ```

mod client;
pub mod queries;
pub mod types;

pub use client::StorefrontClient;
pub use types::*;

use thiserror::Error;

/// Errors that can occur when interacting with the Storefront API.
#[derive(Debug, Error)]
pub enum ShopifyError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// GraphQL query returned errors.
    #[error("GraphQL errors: {}", format_graphql_errors(.0))]
    GraphQL(Vec<GraphQLError>),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Rate limited by Shopify.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// The store's plan does not allow Storefront API checkouts (HTTP 402).
    #[error("Shopify requires an active billing plan to create checkouts")]
    PaymentRequired,

    /// User errors from a mutation, joined with ", ".
    #[error("Cart creation failed: {0}")]
    UserError(String),

    /// `cartCreate` succeeded without a checkout URL.
    #[error("No checkout URL returned from Shopify")]
    MissingCheckoutUrl,

    /// The checkout URL could not be parsed.
    #[error("Invalid checkout URL: {0}")]
    InvalidCheckoutUrl(#[from] url::ParseError),
}

/// A GraphQL error returned by the Shopify API.
#[derive(Debug, Clone)]
pub struct GraphQLError {
    /// Error message.
    pub message: String,
    /// Source locations in the query.
    pub locations: Vec<GraphQLErrorLocation>,
    /// Path to the error in the response.
    pub path: Vec<serde_json::Value>,
}

/// Location in a GraphQL query where an error occurred.
#[derive(Debug, Clone)]
pub struct GraphQLErrorLocation {
    /// Line number (1-indexed).
    pub line: i64,
    /// Column number (1-indexed).
    pub column: i64,
}

fn format_graphql_errors(errors: &[GraphQLError]) -> String {
    if errors.is_empty() {
        return "(no error details provided)".to_string();
    }

    errors
        .iter()
        .enumerate()
        .map(|(i, e)| {
            let mut parts = Vec::new();

            if !e.message.is_empty() {
                parts.push(e.message.clone());
            }

            if !e.path.is_empty() {
                let path_str = e
                    .path
                    .iter()
                    .map(|p| match p {
                        serde_json::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(".");
                parts.push(format!("path: {path_str}"));
            }

            if let Some(loc) = e.locations.first() {
                parts.push(format!("at line {}:{}", loc.line, loc.column));
            }

            if parts.is_empty() {
                format!("[error {}]: (no details)", i + 1)
            } else {
                parts.join(" ")
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}
