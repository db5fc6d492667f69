//! Typed helpers for the Skybox endpoint server.
//!
//! Each helper posts one JSON payload and decodes the typed response. A
//! non-2xx answer becomes [`GatewayError::Api`] carrying the server's
//! `error` field, or a per-endpoint fallback message when the body has none.
//! Nothing is retried or cached.

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::instrument;
use url::Url;

use skybox_core::api::{
    Acknowledgement, ErrorBody, EventConfirmationRequest, EventConfirmationResponse,
    FeedbackRequestPayload, FeedbackRequestResponse, LoyaltyPointsRequest, LoyaltyPointsResponse,
    NewsletterConfirmationRequest, RegistrationCheckRequest, RegistrationCheckResponse,
    VipBroadcastRequest, VipBroadcastResponse,
};

/// Path prefix of the business endpoints.
const FUNCTIONS_PATH: &str = "functions/v1/";

/// Errors returned by the gateway helpers.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The request never got a response.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// A success response that did not match the expected shape.
    #[error("Unexpected response: {0}")]
    Parse(String),
}

/// Client for the endpoint server.
#[derive(Debug, Clone)]
pub struct FunctionsClient {
    client: reqwest::Client,
    base: Url,
}

impl FunctionsClient {
    /// Create a client for the server at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(base_url: &Url) -> Result<Self, GatewayError> {
        let mut base = base_url.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        Ok(Self {
            client: reqwest::Client::builder().build()?,
            base,
        })
    }

    fn endpoint(&self, name: &str) -> Result<Url, GatewayError> {
        self.base
            .join(FUNCTIONS_PATH)
            .and_then(|u| u.join(name))
            .map_err(|e| GatewayError::Parse(e.to_string()))
    }

    async fn call<B, R>(&self, name: &str, body: &B, fallback: &str) -> Result<R, GatewayError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let response = self
            .client
            .post(self.endpoint(name)?)
            .json(body)
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&text)
                .ok()
                .map(|b| b.error)
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| fallback.to_string());
            tracing::warn!(endpoint = name, status = status.as_u16(), %message, "Endpoint call failed");
            return Err(GatewayError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| GatewayError::Parse(e.to_string()))
    }

    /// Send a WhatsApp registration confirmation.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` on transport failure or a non-2xx answer.
    #[instrument(skip_all)]
    pub async fn send_event_confirmation(
        &self,
        request: &EventConfirmationRequest,
    ) -> Result<EventConfirmationResponse, GatewayError> {
        self.call("event-confirmation", request, "Failed to send event confirmation")
            .await
    }

    /// Ask whether a phone is already registered for an event.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` on transport failure or a non-2xx answer.
    #[instrument(skip_all)]
    pub async fn check_event_registration(
        &self,
        request: &RegistrationCheckRequest,
    ) -> Result<RegistrationCheckResponse, GatewayError> {
        self.call("event-registration-check", request, "Failed to check registration")
            .await
    }

    /// Award loyalty points.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` on transport failure or a non-2xx answer.
    #[instrument(skip_all)]
    pub async fn update_loyalty_points(
        &self,
        request: &LoyaltyPointsRequest,
    ) -> Result<LoyaltyPointsResponse, GatewayError> {
        self.call("loyalty-points-update", request, "Failed to update loyalty points")
            .await
    }

    /// Broadcast a message to a customer segment.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` on transport failure or a non-2xx answer.
    #[instrument(skip_all)]
    pub async fn send_vip_broadcast(
        &self,
        request: &VipBroadcastRequest,
    ) -> Result<VipBroadcastResponse, GatewayError> {
        self.call("vip-broadcast", request, "Failed to send VIP broadcast")
            .await
    }

    /// Ask an event's attendees for feedback.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` on transport failure or a non-2xx answer.
    #[instrument(skip_all)]
    pub async fn send_event_feedback_request(
        &self,
        request: &FeedbackRequestPayload,
    ) -> Result<FeedbackRequestResponse, GatewayError> {
        self.call("event-feedback-request", request, "Failed to send feedback requests")
            .await
    }

    /// Welcome a newsletter signup.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` on transport failure or a non-2xx answer.
    #[instrument(skip_all)]
    pub async fn send_newsletter_confirmation(
        &self,
        request: &NewsletterConfirmationRequest,
    ) -> Result<Acknowledgement, GatewayError> {
        self.call(
            "newsletter-confirmation",
            request,
            "Failed to send newsletter confirmation",
        )
        .await
    }
}
