//! Newsletter signup welcome.

use axum::{Json, extract::State};
use tracing::instrument;

use skybox_core::api::{Acknowledgement, NewsletterConfirmationRequest};

use super::extract::ApiJson;
use crate::error::Result;
use crate::messaging::templates;
use crate::state::AppState;

/// Send the newsletter welcome message over WhatsApp.
#[instrument(skip_all)]
pub async fn confirm(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<NewsletterConfirmationRequest>,
) -> Result<Json<Acknowledgement>> {
    let signup = request.validate()?;
    let messenger = state.messenger()?;

    let sent = messenger
        .send_whatsapp(&signup.phone, &templates::newsletter_welcome(&signup))
        .await?;
    tracing::info!(sid = %sent.sid, "Newsletter welcome sent");

    Ok(Json(Acknowledgement::ok("Newsletter confirmation sent")))
}
