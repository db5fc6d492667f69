//! Event registration confirmation.

use axum::{Json, extract::State};
use tracing::instrument;

use skybox_core::api::{EventConfirmationRequest, EventConfirmationResponse};

use super::extract::ApiJson;
use crate::error::Result;
use crate::messaging::templates;
use crate::models::NewConfirmation;
use crate::state::AppState;

/// Send a WhatsApp confirmation for an event registration.
///
/// When `eventId` is given the sent message is recorded so that later
/// registration checks, feedback requests and delivery callbacks see it.
#[instrument(skip_all)]
pub async fn send(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<EventConfirmationRequest>,
) -> Result<Json<EventConfirmationResponse>> {
    let confirmation = request.validate()?;
    let messenger = state.messenger()?;

    let body = templates::event_confirmation(&confirmation);
    let sent = messenger.send_whatsapp(&confirmation.phone, &body).await?;

    if let Some(event_id) = confirmation.event_id {
        state
            .store()
            .record_confirmation(NewConfirmation {
                event_id,
                phone: confirmation.phone.clone(),
                name: confirmation.name.clone(),
                message_id: sent.sid.clone(),
            })
            .await?;
    }

    tracing::info!(
        sid = %sent.sid,
        booking_id = confirmation.booking_id.as_deref().unwrap_or_default(),
        "Event confirmation sent"
    );

    Ok(Json(EventConfirmationResponse {
        success: true,
        message: "Confirmation sent via WhatsApp".to_string(),
        message_id: sent.sid,
    }))
}
