use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;

use skybox_core::Phone;

use super::{Messenger, MessagingError, SentMessage};

/// A message captured by [`RecordingMessenger`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentRecord {
    pub to: Phone,
    pub body: String,
    pub sid: String,
}

/// Messenger that records messages instead of sending them.
///
/// Numbers registered with [`RecordingMessenger::fail_for`] are rejected
/// with a 400, the way the provider rejects unreachable numbers.
#[derive(Debug, Default)]
pub struct RecordingMessenger {
    sent: Mutex<Vec<SentRecord>>,
    failing: Mutex<HashSet<Phone>>,
}

impl RecordingMessenger {
    /// A messenger that accepts every message.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject future sends to `phone`.
    pub fn fail_for(&self, phone: Phone) {
        self.failing
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(phone);
    }

    /// Everything sent so far.
    #[must_use]
    pub fn sent(&self) -> Vec<SentRecord> {
        self.sent
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send_whatsapp(&self, to: &Phone, body: &str) -> Result<SentMessage, MessagingError> {
        if self
            .failing
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .contains(to)
        {
            return Err(MessagingError::Rejected {
                status: 400,
                message: format!("Invalid 'To' Phone Number: {to}"),
            });
        }

        let mut sent = self
            .sent
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let sid = format!("SM{:032}", sent.len() + 1);
        sent.push(SentRecord {
            to: to.clone(),
            body: body.to_string(),
            sid: sid.clone(),
        });
        Ok(SentMessage { sid })
    }
}
