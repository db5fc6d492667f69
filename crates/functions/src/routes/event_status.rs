//! Scheduled event-status maintenance.

use axum::{Json, extract::State};
use chrono::Utc;
use tracing::instrument;

use skybox_core::api::EventStatusUpdateResponse;

use super::extract::CronAuth;
use crate::error::Result;
use crate::state::AppState;

/// Mark published events whose date has passed as `past`.
#[instrument(skip_all)]
pub async fn update(
    _: CronAuth,
    State(state): State<AppState>,
) -> Result<Json<EventStatusUpdateResponse>> {
    let now = Utc::now();
    let updated_count = state.store().mark_past_events(now).await?;
    tracing::info!(updated_count, "Event statuses updated");

    Ok(Json(EventStatusUpdateResponse {
        success: true,
        updated_count,
        timestamp: now,
    }))
}
