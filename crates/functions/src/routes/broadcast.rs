//! Segment broadcasts.

use axum::{Json, extract::State};
use chrono::Utc;
use tracing::instrument;

use skybox_core::api::{VipBroadcastRequest, VipBroadcastResponse};

use super::extract::ApiJson;
use crate::db::MAX_BROADCAST_RECIPIENTS;
use crate::error::Result;
use crate::messaging::{Messenger, templates};
use crate::models::{Audience, Recipient};
use crate::state::AppState;

/// Outcome of messaging an audience.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Tally {
    pub sent: u32,
    pub failed: u32,
    /// Selected but never attempted (unusable phone).
    pub skipped: u32,
}

impl Tally {
    /// Everyone the selection matched.
    #[must_use]
    pub const fn total(&self) -> u32 {
        self.sent + self.failed + self.skipped
    }
}

/// Send one message per recipient, sequentially. A failed send is counted
/// and logged; it never stops the rest.
pub async fn deliver_each(
    messenger: &dyn Messenger,
    audience: &Audience,
    render: impl Fn(&Recipient) -> String + Send,
) -> Tally {
    let mut tally = Tally {
        skipped: audience.skipped,
        ..Tally::default()
    };
    for recipient in &audience.recipients {
        match messenger.send_whatsapp(&recipient.phone, &render(recipient)).await {
            Ok(_) => tally.sent += 1,
            Err(e) => {
                tracing::warn!(phone = %recipient.phone, error = %e, "Send failed");
                tally.failed += 1;
            }
        }
    }
    tally
}

/// Message every customer in a segment (at most 500).
#[instrument(skip_all)]
pub async fn send(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<VipBroadcastRequest>,
) -> Result<Json<VipBroadcastResponse>> {
    let broadcast = request.validate()?;
    let messenger = state.messenger()?;

    let audience = state
        .store()
        .broadcast_recipients(broadcast.segment, Utc::now(), MAX_BROADCAST_RECIPIENTS)
        .await?;

    if audience.is_empty() {
        return Ok(Json(VipBroadcastResponse {
            success: true,
            sent_count: 0,
            failed_count: 0,
            total_customers: 0,
            message: Some("No customers found in this segment".to_string()),
        }));
    }

    let tally = deliver_each(messenger, &audience, |r| {
        templates::broadcast(r.name.as_deref(), &broadcast.message)
    })
    .await;

    tracing::info!(
        segment = %broadcast.segment,
        sent = tally.sent,
        failed = tally.failed,
        skipped = tally.skipped,
        "Broadcast complete"
    );

    Ok(Json(VipBroadcastResponse {
        success: true,
        sent_count: tally.sent,
        failed_count: tally.failed,
        total_customers: tally.total(),
        message: None,
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use skybox_core::Phone;

    use super::*;
    use crate::messaging::RecordingMessenger;

    fn recipient(phone: &str) -> Recipient {
        Recipient {
            name: None,
            phone: Phone::parse(phone).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_deliver_each_counts_skipped_in_total() {
        let messenger = RecordingMessenger::new();
        messenger.fail_for(Phone::parse("+573002222222").unwrap());
        let audience = Audience {
            recipients: vec![recipient("+573001111111"), recipient("+573002222222")],
            skipped: 2,
        };

        let tally = deliver_each(&messenger, &audience, |_| "Hola".to_string()).await;

        assert_eq!(
            tally,
            Tally {
                sent: 1,
                failed: 1,
                skipped: 2
            }
        );
        assert_eq!(tally.total(), 4);
        assert_eq!(messenger.sent().len(), 1);
    }
}
