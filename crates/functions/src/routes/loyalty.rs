//! Loyalty point awards.

use axum::{Json, extract::State};
use tracing::instrument;

use skybox_core::api::{LoyaltyPointsRequest, LoyaltyPointsResponse, ValidationError};

use super::extract::ApiJson;
use crate::db::RepositoryError;
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Add points to a customer's balance.
///
/// The amount defaults per reason (checkin 10, order 5, vip-bonus 20).
/// Nothing is written unless validation passes.
#[instrument(skip_all)]
pub async fn update(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoyaltyPointsRequest>,
) -> Result<Json<LoyaltyPointsResponse>> {
    let update = request.validate()?;

    let balance = state
        .store()
        .add_loyalty_points(update.customer_id, update.points)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound("Customer not found".to_string()),
            RepositoryError::BalanceOverflow => {
                AppError::Validation(ValidationError("Invalid amount".to_string()))
            }
            other => other.into(),
        })?;

    tracing::info!(
        customer_id = %update.customer_id,
        reason = %update.reason,
        points = update.points,
        new_total = balance.new_total,
        "Loyalty points updated"
    );

    let who = balance.customer_name.as_deref().unwrap_or("customer");
    Ok(Json(LoyaltyPointsResponse {
        success: true,
        message: format!("Added {} points to {who}", update.points),
        previous_points: balance.previous,
        points_added: update.points,
        new_total: balance.new_total,
        reason: update.reason,
    }))
}
