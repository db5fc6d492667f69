//! Post-event feedback requests.

use axum::{Json, extract::State};
use tracing::instrument;

use skybox_core::api::{FeedbackRequestPayload, FeedbackRequestResponse};

use super::broadcast::deliver_each;
use super::extract::ApiJson;
use crate::error::{AppError, Result};
use crate::messaging::templates;
use crate::state::AppState;

/// Ask everyone whose confirmation went out to rate the event.
#[instrument(skip_all)]
pub async fn request_feedback(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<FeedbackRequestPayload>,
) -> Result<Json<FeedbackRequestResponse>> {
    let request = request.validate()?;
    let messenger = state.messenger()?;

    let event = state
        .store()
        .find_event(request.event_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;

    let audience = state.store().feedback_recipients(event.id).await?;

    if audience.is_empty() {
        return Ok(Json(FeedbackRequestResponse {
            success: true,
            message: "No confirmed attendees found".to_string(),
            sent: 0,
            failed: 0,
            total: 0,
        }));
    }

    let link = request.feedback_link.as_deref();
    let tally = deliver_each(messenger, &audience, |r| {
        templates::feedback_request(r.name.as_deref(), &event.title, link)
    })
    .await;

    tracing::info!(
        event_id = %event.id,
        sent = tally.sent,
        failed = tally.failed,
        "Feedback requests sent"
    );

    Ok(Json(FeedbackRequestResponse {
        success: true,
        message: format!("Feedback requests sent to {} attendees", tally.sent),
        sent: tally.sent,
        failed: tally.failed,
        total: tally.total(),
    }))
}
