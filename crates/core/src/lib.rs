//! Skybox Core - Shared types library.
//!
//! This crate provides common types used across all Skybox components:
//! - `functions` - JSON endpoints backing the venue website
//! - `storefront` - Cart, Shopify Storefront client, and endpoint gateway
//! - `cli` - Command-line front end and database migrations
//!
//! # Architecture
//!
//! The core crate contains only types, validation, and the wire schema - no
//! I/O, no database access, no HTTP clients. This keeps it lightweight and
//! allows both ends of every endpoint to share one definition.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, phones, money, and statuses
//! - [`api`] - Request/response bodies for every endpoint

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod types;

pub use types::*;
