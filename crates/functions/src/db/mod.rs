//! Data access for the endpoint server.
//!
//! # Tables
//!
//! - `profiles` - Customers; loyalty balance lives in `metadata.loyalty_points`
//! - `events` - Scheduled events and their publication status
//! - `event_confirmations` - One row per (event, phone) registration
//!
//! Handlers depend on the [`Store`] trait so the same routes run against
//! [`PgStore`] in production and [`MemoryStore`] in tests.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/functions/migrations/` and run via:
//! ```bash
//! cargo run -p skybox-cli -- migrate
//! ```

mod memory;
mod postgres;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use skybox_core::api::{DeliveryReport, EventUpsert, RegistrationSummary};
use skybox_core::{BroadcastSegment, ConfirmationId, CustomerId, EventId, Phone};

use crate::models::{Audience, Event, LoyaltyBalance, NewConfirmation, UpsertOutcome};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Most recipients a single broadcast will message.
pub const MAX_BROADCAST_RECIPIENTS: usize = 500;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// A balance update would leave the `i64` range.
    #[error("balance out of range")]
    BalanceOverflow,
}

/// Customer profiles.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Add `points` (possibly negative) to a customer's balance.
    ///
    /// The read and the write happen atomically per customer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the customer does not exist.
    async fn add_loyalty_points(
        &self,
        customer: CustomerId,
        points: i64,
    ) -> Result<LoyaltyBalance, RepositoryError>;

    /// Profiles with a phone number in `segment`, at most `limit`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    async fn broadcast_recipients(
        &self,
        segment: BroadcastSegment,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Audience, RepositoryError>;
}

/// Event registrations and their delivery status.
#[async_trait]
pub trait ConfirmationRepository: Send + Sync {
    /// The registration for `phone` at `event`, if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    async fn find_registration(
        &self,
        event: EventId,
        phone: &Phone,
    ) -> Result<Option<RegistrationSummary>, RepositoryError>;

    /// Record a sent confirmation, replacing any earlier one for the same
    /// event and phone.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the write fails.
    async fn record_confirmation(
        &self,
        confirmation: NewConfirmation,
    ) -> Result<ConfirmationId, RepositoryError>;

    /// Registrants of `event` whose confirmation went out.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    async fn feedback_recipients(&self, event: EventId) -> Result<Audience, RepositoryError>;

    /// Apply a provider status callback. Returns the updated row's ID, or
    /// `None` when no confirmation carries the message SID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the write fails.
    async fn apply_delivery_report(
        &self,
        report: &DeliveryReport,
        at: DateTime<Utc>,
    ) -> Result<Option<ConfirmationId>, RepositoryError>;

    /// Registrations for `event` created in `[from, until)`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    async fn count_registrations(
        &self,
        event: EventId,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<u64, RepositoryError>;
}

/// Events.
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Look up an event.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    async fn find_event(&self, id: EventId) -> Result<Option<Event>, RepositoryError>;

    /// Move published events dated before `now` to `past`. Returns how many
    /// changed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the update fails.
    async fn mark_past_events(&self, now: DateTime<Utc>) -> Result<u64, RepositoryError>;

    /// Insert or update the event with `event.slug`, publishing it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the write fails.
    async fn upsert_event(&self, event: &EventUpsert) -> Result<UpsertOutcome, RepositoryError>;

    /// Every event, soonest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    async fn list_events(&self) -> Result<Vec<Event>, RepositoryError>;
}

/// Everything the handlers need from persistence.
#[async_trait]
pub trait Store: ProfileRepository + ConfirmationRepository + EventRepository {
    /// Check that the backing store is reachable.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if it is not.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
