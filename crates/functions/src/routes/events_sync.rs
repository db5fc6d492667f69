//! Bulk event import.

use axum::{Json, extract::State};
use chrono::Utc;
use tracing::instrument;

use skybox_core::api::{EventsSyncRequest, EventsSyncResponse, SyncFailure, SyncResults};

use super::extract::{ApiJson, CronAuth};
use crate::error::Result;
use crate::models::UpsertOutcome;
use crate::state::AppState;

/// Upsert each event by slug and publish it.
///
/// Events are handled one at a time. An invalid or failed event is counted
/// and reported in `errors`; it never stops the rest.
#[instrument(skip_all)]
pub async fn sync(
    _: CronAuth,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<EventsSyncRequest>,
) -> Result<Json<EventsSyncResponse>> {
    let (source, events) = request.into_events()?;
    let mut results = SyncResults::default();

    for event in events {
        let label = event.label().to_string();
        let outcome = match event.validate() {
            Ok(upsert) => state.store().upsert_event(&upsert).await.map_err(|e| {
                tracing::error!(slug = %upsert.slug, error = %e, "Event upsert failed");
                "Failed to save event".to_string()
            }),
            Err(e) => Err(e.to_string()),
        };

        match outcome {
            Ok(UpsertOutcome::Created) => results.created += 1,
            Ok(UpsertOutcome::Updated) => results.updated += 1,
            Err(error) => {
                tracing::warn!(event = %label, %error, "Event sync failed");
                results.failed += 1;
                results.errors.push(SyncFailure { event: label, error });
            }
        }
    }

    tracing::info!(
        source = source.as_deref().unwrap_or("unknown"),
        created = results.created,
        updated = results.updated,
        failed = results.failed,
        "Events synced"
    );

    Ok(Json(EventsSyncResponse {
        success: true,
        source,
        results,
        timestamp: Utc::now(),
    }))
}
