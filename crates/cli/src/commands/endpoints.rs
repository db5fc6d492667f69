//! Commands that call the endpoint server through the gateway.
//!
//! Each command runs its gateway helper inside a [`Remote`] and prints the
//! settled state.

use std::fmt::Display;
use std::future::Future;

use skybox_core::api::{
    EventConfirmationRequest, FeedbackRequestPayload, LoyaltyPointsRequest,
    NewsletterConfirmationRequest, RegistrationCheckRequest, VipBroadcastRequest,
};
use skybox_storefront::hooks::{Remote, RemoteState};
use skybox_storefront::{ClientConfig, GatewayError};

use super::{CommandError, functions};

/// Arguments of `skybox confirm`.
#[derive(Debug, Clone, Default)]
pub struct ConfirmArgs {
    pub name: String,
    pub phone: String,
    pub event_name: String,
    pub event_date: String,
    pub event_time: Option<String>,
    pub event_location: Option<String>,
    pub event_id: Option<String>,
    pub booking_id: Option<String>,
}

async fn settle<T, F>(request: F, describe: impl FnOnce(&T) -> String) -> Result<(), CommandError>
where
    F: Future<Output = Result<T, GatewayError>>,
{
    let mut remote = Remote::new();
    remote.run(request).await;

    match remote.into_state() {
        RemoteState::Ready(data) => {
            print(describe(&data));
            Ok(())
        }
        RemoteState::Failed(error) => Err(error.into()),
        RemoteState::Idle | RemoteState::Loading => Ok(()),
    }
}

/// Send a registration confirmation.
///
/// # Errors
///
/// Returns an error if the gateway is not configured or the call fails.
pub async fn confirm(config: &ClientConfig, args: ConfirmArgs) -> Result<(), CommandError> {
    let client = functions(config)?;
    let request = EventConfirmationRequest {
        name: Some(args.name),
        phone: Some(args.phone),
        event_name: Some(args.event_name),
        event_date: Some(args.event_date),
        event_time: args.event_time,
        event_location: args.event_location,
        event_id: args.event_id,
        booking_id: args.booking_id,
    };
    settle(client.send_event_confirmation(&request), |r| {
        format!("{} (message {})", r.message, r.message_id)
    })
    .await
}

/// Check whether a phone is registered for an event.
///
/// # Errors
///
/// Returns an error if the gateway is not configured or the call fails.
pub async fn check_registration(
    config: &ClientConfig,
    event_id: String,
    phone: String,
) -> Result<(), CommandError> {
    let client = functions(config)?;
    let request = RegistrationCheckRequest {
        event_id: Some(event_id),
        phone: Some(phone),
    };
    settle(client.check_event_registration(&request), |r| {
        r.registration.as_ref().map_or_else(
            || "Not registered".to_owned(),
            |reg| format!("Registered ({}, status {})", reg.id, reg.status),
        )
    })
    .await
}

/// Award loyalty points.
///
/// # Errors
///
/// Returns an error if the gateway is not configured or the call fails.
pub async fn loyalty(
    config: &ClientConfig,
    customer_id: String,
    reason: String,
    amount: Option<i64>,
) -> Result<(), CommandError> {
    let client = functions(config)?;
    let request = LoyaltyPointsRequest {
        customer_id: Some(customer_id),
        reason: Some(reason),
        amount,
    };
    settle(client.update_loyalty_points(&request), |r| {
        format!("{} ({} -> {})", r.message, r.previous_points, r.new_total)
    })
    .await
}

/// Broadcast a message to a segment.
///
/// # Errors
///
/// Returns an error if the gateway is not configured or the call fails.
pub async fn broadcast(
    config: &ClientConfig,
    segment: String,
    message: String,
) -> Result<(), CommandError> {
    let client = functions(config)?;
    let request = VipBroadcastRequest {
        segment: Some(segment),
        message: Some(message),
    };
    settle(client.send_vip_broadcast(&request), |r| {
        let summary = format!(
            "Sent {} of {} ({} failed)",
            r.sent_count, r.total_customers, r.failed_count
        );
        match &r.message {
            Some(note) => format!("{summary}: {note}"),
            None => summary,
        }
    })
    .await
}

/// Ask an event's attendees for feedback.
///
/// # Errors
///
/// Returns an error if the gateway is not configured or the call fails.
pub async fn feedback(
    config: &ClientConfig,
    event_id: String,
    feedback_link: Option<String>,
) -> Result<(), CommandError> {
    let client = functions(config)?;
    let request = FeedbackRequestPayload {
        event_id: Some(event_id),
        feedback_link,
    };
    settle(client.send_event_feedback_request(&request), |r| {
        format!("{} ({} failed of {})", r.message, r.failed, r.total)
    })
    .await
}

/// Welcome a newsletter signup.
///
/// # Errors
///
/// Returns an error if the gateway is not configured or the call fails.
pub async fn newsletter(
    config: &ClientConfig,
    name: String,
    phone: String,
) -> Result<(), CommandError> {
    let client = functions(config)?;
    let request = NewsletterConfirmationRequest {
        name: Some(name),
        phone: Some(phone),
    };
    settle(client.send_newsletter_confirmation(&request), |r| {
        r.message.clone()
    })
    .await
}

#[allow(clippy::print_stdout)]
fn print(text: impl Display) {
    println!("{text}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_gateway_not_configured() {
        let config = ClientConfig {
            functions_url: None,
            shopify: None,
            data_dir: ".skybox".into(),
        };

        let err = broadcast(&config, "vip".to_owned(), "Hola".to_owned())
            .await
            .unwrap_err();

        assert!(matches!(err, CommandError::MissingEnvVar("SKYBOX_FUNCTIONS_URL")));
    }
}
