//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All optional. A missing group disables the feature that needs it instead
//! of failing at startup.
//!
//! - `SKYBOX_FUNCTIONS_URL` - Base URL of the endpoint server (e.g. `http://127.0.0.1:3000`)
//! - `SHOPIFY_STORE` - Shopify store domain (e.g., skybox.myshopify.com)
//! - `SHOPIFY_STOREFRONT_TOKEN` - Storefront API access token
//! - `SHOPIFY_API_VERSION` - API version (default: 2025-07)
//! - `SKYBOX_DATA_DIR` - Directory holding the persisted cart (default: `.skybox`)

use std::path::PathBuf;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Storefront API version used when `SHOPIFY_API_VERSION` is unset.
pub const DEFAULT_API_VERSION: &str = "2025-07";

/// Data directory used when `SKYBOX_DATA_DIR` is unset.
pub const DEFAULT_DATA_DIR: &str = ".skybox";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Client-side configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Endpoint server base URL, `None` disables the gateway
    pub functions_url: Option<Url>,
    /// Shopify Storefront API settings, `None` disables products and checkout
    pub shopify: Option<ShopifyConfig>,
    /// Where the cart is persisted
    pub data_dir: PathBuf,
}

/// Shopify Storefront API configuration.
///
/// Implements `Debug` manually to redact the access token.
#[derive(Clone)]
pub struct ShopifyConfig {
    /// Shopify store domain (e.g., skybox.myshopify.com)
    pub store: String,
    /// Shopify API version (e.g., 2025-07)
    pub api_version: String,
    /// Storefront API access token
    pub storefront_token: SecretString,
}

impl std::fmt::Debug for ShopifyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopifyConfig")
            .field("store", &self.store)
            .field("api_version", &self.api_version)
            .field("storefront_token", &"[REDACTED]")
            .finish()
    }
}

impl ShopifyConfig {
    /// GraphQL endpoint for this store and API version.
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!(
            "https://{}/api/{}/graphql.json",
            self.store, self.api_version
        )
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `SKYBOX_FUNCTIONS_URL` is set but not a URL.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let functions_url = get_optional_env("SKYBOX_FUNCTIONS_URL")
            .map(|raw| {
                Url::parse(&raw).map_err(|e| {
                    ConfigError::InvalidEnvVar("SKYBOX_FUNCTIONS_URL".to_string(), e.to_string())
                })
            })
            .transpose()?;

        let shopify = match (
            get_optional_env("SHOPIFY_STORE"),
            get_optional_env("SHOPIFY_STOREFRONT_TOKEN"),
        ) {
            (Some(store), Some(token)) => Some(ShopifyConfig {
                store,
                api_version: get_optional_env("SHOPIFY_API_VERSION")
                    .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
                storefront_token: SecretString::from(token),
            }),
            _ => None,
        };

        let data_dir = get_optional_env("SKYBOX_DATA_DIR")
            .map_or_else(|| PathBuf::from(DEFAULT_DATA_DIR), PathBuf::from);

        Ok(Self {
            functions_url,
            shopify,
            data_dir,
        })
    }
}

/// Get an optional environment variable, treating blank values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
