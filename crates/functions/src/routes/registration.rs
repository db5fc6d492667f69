//! Duplicate-registration lookup.

use axum::{Json, extract::State};
use tracing::instrument;

use skybox_core::api::{RegistrationCheckRequest, RegistrationCheckResponse};

use super::extract::ApiJson;
use crate::error::Result;
use crate::state::AppState;

/// Report whether a phone number is already registered for an event.
#[instrument(skip_all)]
pub async fn check(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegistrationCheckRequest>,
) -> Result<Json<RegistrationCheckResponse>> {
    let check = request.validate()?;

    let registration = state
        .store()
        .find_registration(check.event_id, &check.phone)
        .await?;

    Ok(Json(registration.into()))
}
