//! HTTP route handlers for the Skybox endpoints.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                                  - Liveness check
//! GET  /health/ready                            - Readiness check (database)
//!
//! # Registrations
//! POST /functions/v1/event-confirmation         - Send WhatsApp confirmation
//! POST /functions/v1/event-registration-check   - Is this phone registered?
//! POST /functions/v1/event-feedback-request     - Ask attendees for a rating
//!
//! # Customers
//! POST /functions/v1/loyalty-points-update      - Award loyalty points
//! POST /functions/v1/vip-broadcast              - Message a customer segment
//! POST /functions/v1/newsletter-confirmation    - Welcome a newsletter signup
//!
//! # Provider callbacks and maintenance
//! POST /functions/v1/twilio-status-webhook      - Delivery status (form-encoded)
//! POST /functions/v1/update-event-status        - Archive past events (bearer)
//! POST /functions/v1/events-sync                - Upsert events by slug (bearer)
//! POST /functions/v1/event-analytics-daily      - Yesterday's registrations (bearer)
//! ```

pub mod analytics;
pub mod broadcast;
pub mod confirmation;
pub mod event_status;
pub mod events_sync;
pub mod extract;
pub mod feedback;
pub mod health;
pub mod loyalty;
pub mod newsletter;
pub mod registration;
pub mod webhook;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Path prefix shared by every business endpoint.
pub const FUNCTIONS_PREFIX: &str = "/functions/v1";

/// Create the business endpoint router (mounted under [`FUNCTIONS_PREFIX`]).
pub fn function_routes() -> Router<AppState> {
    Router::new()
        .route("/event-confirmation", post(confirmation::send))
        .route("/event-registration-check", post(registration::check))
        .route("/event-feedback-request", post(feedback::request_feedback))
        .route("/loyalty-points-update", post(loyalty::update))
        .route("/vip-broadcast", post(broadcast::send))
        .route("/newsletter-confirmation", post(newsletter::confirm))
        .route("/twilio-status-webhook", post(webhook::status_callback))
        .route("/update-event-status", post(event_status::update))
        .route("/events-sync", post(events_sync::sync))
        .route("/event-analytics-daily", post(analytics::daily))
}

/// Create the health check router.
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::ready))
}
