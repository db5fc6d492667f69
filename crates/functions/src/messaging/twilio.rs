//! Twilio Messages API client for WhatsApp delivery.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use skybox_core::Phone;

use super::{Messenger, MessagingError, SentMessage};
use crate::config::TwilioConfig;

/// Twilio API base URL.
const BASE_URL: &str = "https://api.twilio.com/2010-04-01";

/// Twilio REST client.
#[derive(Clone)]
pub struct TwilioClient {
    client: reqwest::Client,
    base_url: String,
    account_sid: String,
    auth_token: SecretString,
    from: String,
}

impl std::fmt::Debug for TwilioClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwilioClient")
            .field("base_url", &self.base_url)
            .field("account_sid", &self.account_sid)
            .field("from", &self.from)
            .finish_non_exhaustive()
    }
}

#[derive(Deserialize)]
struct MessageResource {
    sid: String,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
}

impl TwilioClient {
    /// Create a new Twilio client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &TwilioConfig) -> Result<Self, MessagingError> {
        Self::with_base_url(config, BASE_URL)
    }

    /// Create a client that talks to `base_url` instead of the public API.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn with_base_url(
        config: &TwilioConfig,
        base_url: impl Into<String>,
    ) -> Result<Self, MessagingError> {
        let client = reqwest::Client::builder().build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            account_sid: config.account_sid.clone(),
            auth_token: config.auth_token.clone(),
            from: config.whatsapp_from.clone(),
        })
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/Accounts/{}/Messages.json",
            self.base_url, self.account_sid
        )
    }
}

#[async_trait]
impl Messenger for TwilioClient {
    #[tracing::instrument(skip(self, body), fields(to = %to))]
    async fn send_whatsapp(&self, to: &Phone, body: &str) -> Result<SentMessage, MessagingError> {
        let from = format!("whatsapp:{}", self.from);
        let to_address = to.whatsapp_address();
        let form = [
            ("From", from.as_str()),
            ("To", to_address.as_str()),
            ("Body", body),
        ];

        let response = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.account_sid, Some(self.auth_token.expose_secret()))
            .form(&form)
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            // Twilio errors are JSON with a `message` field; fall back to the raw body
            let message = serde_json::from_str::<ApiErrorBody>(&text)
                .ok()
                .and_then(|b| b.message)
                .unwrap_or(text);
            tracing::warn!(status = status.as_u16(), %message, "Twilio rejected message");
            return Err(MessagingError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let resource: MessageResource = response
            .json()
            .await
            .map_err(|e| MessagingError::Parse(e.to_string()))?;

        tracing::info!(sid = %resource.sid, "WhatsApp message sent");
        Ok(SentMessage { sid: resource.sid })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{Form, Router, http::HeaderMap, routing::post};
    use std::collections::HashMap;

    use super::*;

    fn config() -> TwilioConfig {
        TwilioConfig {
            account_sid: "AC123".to_string(),
            auth_token: SecretString::from("tw-auth-9f8e7d"),
            whatsapp_from: "+14155238886".to_string(),
        }
    }

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
        format!("http://{addr}")
    }

    #[test]
    fn test_messages_url() {
        let client = TwilioClient::with_base_url(&config(), "http://localhost:9/").unwrap();
        assert_eq!(
            client.messages_url(),
            "http://localhost:9/Accounts/AC123/Messages.json"
        );
    }

    #[test]
    fn test_debug_hides_token() {
        let client = TwilioClient::new(&config()).unwrap();
        assert!(!format!("{client:?}").contains("tw-auth-9f8e7d"));
    }

    #[tokio::test]
    async fn test_send_posts_whatsapp_form() {
        let router = Router::new().route(
            "/Accounts/AC123/Messages.json",
            post(
                |headers: HeaderMap, Form(form): Form<HashMap<String, String>>| async move {
                    assert!(headers.contains_key("authorization"));
                    assert_eq!(form["From"], "whatsapp:+14155238886");
                    assert_eq!(form["To"], "whatsapp:+573001234567");
                    assert_eq!(form["Body"], "Hola");
                    axum::Json(serde_json::json!({"sid": "SM42", "status": "queued"}))
                },
            ),
        );
        let base = serve(router).await;
        let client = TwilioClient::with_base_url(&config(), base).unwrap();

        let sent = client
            .send_whatsapp(&Phone::parse("+573001234567").unwrap(), "Hola")
            .await
            .unwrap();
        assert_eq!(sent.sid, "SM42");
    }

    #[tokio::test]
    async fn test_send_surfaces_api_error() {
        let router = Router::new().route(
            "/Accounts/AC123/Messages.json",
            post(|| async {
                (
                    axum::http::StatusCode::BAD_REQUEST,
                    axum::Json(serde_json::json!({"code": 21211, "message": "Invalid 'To' Phone Number"})),
                )
            }),
        );
        let base = serve(router).await;
        let client = TwilioClient::with_base_url(&config(), base).unwrap();

        let err = client
            .send_whatsapp(&Phone::parse("+573001234567").unwrap(), "Hola")
            .await
            .unwrap_err();
        match err {
            MessagingError::Rejected { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Invalid 'To' Phone Number");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
