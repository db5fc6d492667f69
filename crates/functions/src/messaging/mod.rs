//! Outbound WhatsApp messaging.
//!
//! Handlers talk to a [`Messenger`]; production uses [`TwilioClient`],
//! tests use [`RecordingMessenger`].

mod memory;
pub mod templates;
mod twilio;

use async_trait::async_trait;
use thiserror::Error;

use skybox_core::Phone;

pub use memory::{RecordingMessenger, SentRecord};
pub use twilio::TwilioClient;

/// Errors that can occur when sending a message.
#[derive(Debug, Error)]
pub enum MessagingError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider refused the message.
    #[error("API error: {status} - {message}")]
    Rejected { status: u16, message: String },

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Provider receipt for an accepted message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    /// Provider message ID, used to match later status callbacks.
    pub sid: String,
}

/// Sends WhatsApp messages.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Send `body` to `to`.
    ///
    /// # Errors
    ///
    /// Returns `MessagingError` if the provider is unreachable or refuses
    /// the message.
    async fn send_whatsapp(&self, to: &Phone, body: &str) -> Result<SentMessage, MessagingError>;
}
