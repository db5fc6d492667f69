//! Skybox Storefront - client toolkit.
//!
//! Everything a front end needs to talk to Skybox:
//!
//! - [`cart`] - Persisted cart state with Shopify checkout
//! - [`shopify`] - Storefront API client (products, `cartCreate`)
//! - [`gateway`] - Typed helpers for the endpoint server
//! - [`hooks`] - Request state holders for the UI layer
//! - [`config`] - Environment configuration

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod config;
pub mod gateway;
pub mod hooks;
pub mod shopify;

pub use cart::{CartError, CartItem, CartStore, CheckoutCreator, JsonFileStorage};
pub use config::ClientConfig;
pub use gateway::{FunctionsClient, GatewayError};
pub use shopify::{ShopifyError, StorefrontClient};
