//! Messaging provider delivery-status callback.

use axum::{Json, extract::State};
use chrono::Utc;
use tracing::instrument;

use skybox_core::api::{Acknowledgement, StatusCallbackForm};

use super::extract::ApiForm;
use crate::error::Result;
use crate::state::AppState;

/// Record a delivery status reported by the provider.
///
/// Unknown message SIDs are acknowledged with 200 so the provider does not
/// keep retrying callbacks for messages this service never recorded.
#[instrument(skip_all)]
pub async fn status_callback(
    State(state): State<AppState>,
    ApiForm(form): ApiForm<StatusCallbackForm>,
) -> Result<Json<Acknowledgement>> {
    let report = form.validate()?;

    let updated = state
        .store()
        .apply_delivery_report(&report, Utc::now())
        .await?;

    match updated {
        Some(id) => {
            tracing::info!(
                confirmation_id = %id,
                sid = %report.message_sid,
                status = %report.status,
                "Delivery status updated"
            );
            Ok(Json(Acknowledgement::ok("Status updated")))
        }
        None => {
            tracing::debug!(sid = %report.message_sid, "No confirmation for message");
            Ok(Json(Acknowledgement::ok("No matching record found")))
        }
    }
}
