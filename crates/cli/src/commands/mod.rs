//! Command implementations.

pub mod cart;
pub mod endpoints;
pub mod migrate;
pub mod products;

use skybox_storefront::config::{ClientConfig, ConfigError};
use skybox_storefront::{CartError, FunctionsClient, GatewayError, ShopifyError, StorefrontClient};
use thiserror::Error;

/// Errors surfaced by any command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Cart(#[from] CartError),

    #[error(transparent)]
    Shopify(#[from] ShopifyError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// A product handle that is not in the catalogue.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// A variant that does not belong to the product.
    #[error("Variant {variant} not found on product {handle}")]
    VariantNotFound { handle: String, variant: String },
}

/// Storefront client from configuration.
fn storefront(config: &ClientConfig) -> Result<StorefrontClient, CommandError> {
    let shopify = config
        .shopify
        .as_ref()
        .ok_or(CommandError::MissingEnvVar("SHOPIFY_STOREFRONT_TOKEN"))?;
    Ok(StorefrontClient::new(shopify)?)
}

/// Endpoint gateway client from configuration.
fn functions(config: &ClientConfig) -> Result<FunctionsClient, CommandError> {
    let url = config
        .functions_url
        .as_ref()
        .ok_or(CommandError::MissingEnvVar("SKYBOX_FUNCTIONS_URL"))?;
    Ok(FunctionsClient::new(url)?)
}
