//! Application state shared across handlers.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};

use crate::db::Store;
use crate::error::AppError;
use crate::messaging::Messenger;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. The store and messenger are trait objects so
/// tests can run the real router against in-memory implementations.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    store: Arc<dyn Store>,
    messenger: Option<Arc<dyn Messenger>>,
    cron_secret: Option<SecretString>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `store` - Persistence backend
    /// * `messenger` - WhatsApp sender, `None` when not configured
    /// * `cron_secret` - Bearer token for scheduled maintenance, `None` disables it
    #[must_use]
    pub fn new(
        store: Arc<dyn Store>,
        messenger: Option<Arc<dyn Messenger>>,
        cron_secret: Option<SecretString>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                store,
                messenger,
                cron_secret,
            }),
        }
    }

    /// Get a reference to the persistence backend.
    #[must_use]
    pub fn store(&self) -> &dyn Store {
        self.inner.store.as_ref()
    }

    /// Get the messenger, or the "not configured" error.
    ///
    /// # Errors
    ///
    /// Returns `AppError::MessagingNotConfigured` if no credentials were set.
    pub fn messenger(&self) -> Result<&dyn Messenger, AppError> {
        self.inner
            .messenger
            .as_deref()
            .ok_or(AppError::MessagingNotConfigured)
    }

    /// Whether `token` matches the configured cron secret.
    ///
    /// Always false when no secret is configured.
    #[must_use]
    pub fn cron_secret_matches(&self, token: &str) -> bool {
        self.inner
            .cron_secret
            .as_ref()
            .is_some_and(|secret| constant_time_eq(secret.expose_secret().as_bytes(), token.as_bytes()))
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
