//! Integration tests for Skybox.
//!
//! # Running Tests
//!
//! ```bash
//! # In-process tests (no external services)
//! cargo test -p skybox-integration-tests
//!
//! # Include the PostgreSQL tests
//! FUNCTIONS_DATABASE_URL=postgres://... cargo test -p skybox-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `gateway` - Gateway client against the endpoint server on a real socket
//! - `postgres` - Repository behaviour against a live database
//!
//! [`TestServer`] runs the endpoint router on an ephemeral port backed by the
//! in-memory store and a recording messenger.

#![allow(clippy::missing_panics_doc, clippy::unwrap_used)]

use std::sync::Arc;

use chrono::{Duration, Utc};
use secrecy::SecretString;
use url::Url;

use skybox_core::{ConfirmationId, CustomerId, EventId, EventStatus, Phone};
use skybox_functions::db::MemoryStore;
use skybox_functions::messaging::{Messenger, RecordingMessenger};
use skybox_functions::models::{Confirmation, Event, Profile};
use skybox_functions::state::AppState;
use skybox_storefront::FunctionsClient;

/// Bearer token the test server accepts for maintenance calls.
pub const CRON_SECRET: &str = "it-cron-Vb7xQ2mL9pRt4Kz";

/// The endpoint server running in-process on an ephemeral port.
pub struct TestServer {
    pub store: Arc<MemoryStore>,
    pub messenger: Arc<RecordingMessenger>,
    pub url: Url,
}

impl TestServer {
    /// Start a server with WhatsApp delivery recorded in memory.
    pub async fn start() -> Self {
        let messenger = Arc::new(RecordingMessenger::new());
        Self::start_with(Some(messenger.clone() as Arc<dyn Messenger>), messenger).await
    }

    /// Start a server without WhatsApp credentials.
    pub async fn without_messaging() -> Self {
        Self::start_with(None, Arc::new(RecordingMessenger::new())).await
    }

    async fn start_with(
        messenger: Option<Arc<dyn Messenger>>,
        recorder: Arc<RecordingMessenger>,
    ) -> Self {
        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(
            store.clone(),
            messenger,
            Some(SecretString::from(CRON_SECRET)),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, skybox_functions::app(state))
                .await
                .unwrap();
        });

        Self {
            store,
            messenger: recorder,
            url: Url::parse(&format!("http://{addr}")).unwrap(),
        }
    }

    /// Gateway client pointed at this server.
    pub fn client(&self) -> FunctionsClient {
        FunctionsClient::new(&self.url).unwrap()
    }

    /// Insert a customer profile.
    pub async fn add_customer(&self, name: &str, phone: &str, role: &str, points: i64) -> CustomerId {
        let id = CustomerId::generate();
        self.store
            .insert_profile(Profile {
                id,
                full_name: Some(name.to_owned()),
                phone: Some(Phone::parse(phone).unwrap()),
                role: role.to_owned(),
                metadata: serde_json::json!({ "loyalty_points": points }),
                last_seen_at: Some(Utc::now() - Duration::days(1)),
                updated_at: Utc::now(),
            })
            .await;
        id
    }

    /// Insert an event dated `days_from_now` days away.
    pub async fn add_event(&self, title: &str, days_from_now: i64) -> EventId {
        let id = EventId::generate();
        self.store
            .insert_event(Event {
                id,
                slug: None,
                title: title.to_owned(),
                description: None,
                event_date: Utc::now() + Duration::days(days_from_now),
                status: EventStatus::Published,
            })
            .await;
        id
    }

    /// Insert a confirmation for `phone` with the given delivery status.
    pub async fn add_confirmation(&self, event_id: EventId, phone: &str, status: &str) {
        let now = Utc::now();
        self.store
            .insert_confirmation(Confirmation {
                id: ConfirmationId::generate(),
                event_id,
                phone: Phone::parse(phone).unwrap(),
                name: Some("Ana".to_owned()),
                status: status.to_owned(),
                message_id: None,
                delivered_at: None,
                error_message: None,
                created_at: now,
                updated_at: now,
            })
            .await;
    }
}
