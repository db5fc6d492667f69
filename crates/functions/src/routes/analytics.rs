//! Nightly registration statistics.

use axum::{Json, extract::State};
use chrono::{NaiveTime, Utc};
use tracing::instrument;

use skybox_core::api::{DailyAnalyticsResponse, EventDailyStats};

use super::extract::CronAuth;
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Count each event's registrations for yesterday (UTC).
///
/// An event whose count fails is logged and left out of `statsGenerated`.
#[instrument(skip_all)]
pub async fn daily(_: CronAuth, State(state): State<AppState>) -> Result<Json<DailyAnalyticsResponse>> {
    let today = Utc::now().date_naive();
    let yesterday = today
        .pred_opt()
        .ok_or_else(|| AppError::Internal(format!("no day before {today}")))?;

    let events = state.store().list_events().await?;
    if events.is_empty() {
        return Ok(Json(DailyAnalyticsResponse {
            success: true,
            message: "No events to process".to_string(),
            date: None,
            stats_generated: 0,
            stats: Vec::new(),
        }));
    }

    let from = yesterday.and_time(NaiveTime::MIN).and_utc();
    let until = today.and_time(NaiveTime::MIN).and_utc();

    let mut stats = Vec::with_capacity(events.len());
    for event in events {
        match state.store().count_registrations(event.id, from, until).await {
            Ok(registrations) => {
                tracing::debug!(event_id = %event.id, registrations, "Event stats");
                stats.push(EventDailyStats {
                    event_id: event.id,
                    title: event.title,
                    registrations,
                });
            }
            Err(e) => {
                tracing::warn!(event_id = %event.id, error = %e, "Counting registrations failed");
            }
        }
    }

    let stats_generated = u32::try_from(stats.len()).unwrap_or(u32::MAX);
    tracing::info!(date = %yesterday, stats_generated, "Daily analytics generated");

    Ok(Json(DailyAnalyticsResponse {
        success: true,
        message: "Daily analytics generated successfully".to_string(),
        date: Some(yesterday),
        stats_generated,
        stats,
    }))
}
