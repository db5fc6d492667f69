//! Request and response bodies for the Skybox endpoints.
//!
//! Requests arrive as loosely-typed JSON: every field is optional on the
//! wire so that a missing field produces a descriptive 400 instead of a
//! generic deserialization failure. Each request type has a `validate`
//! method that turns it into a fully-typed command or a [`ValidationError`]
//! carrying the message returned to the caller.
//!
//! Field names are camelCase on the wire (`eventId`, `newTotal`, ...), except
//! where an existing caller reads snake case: the event sync payload and the
//! event-status count.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{
    BroadcastSegment, ConfirmationId, CustomerId, EventId, LoyaltyReason, Phone,
};

/// Body of every non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable failure description.
    pub error: String,
}

impl ErrorBody {
    /// Create an error body.
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// A request failed validation; the message is safe to show to the caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Returns the field's value if it is present and not blank.
fn present(field: Option<&String>) -> Option<&str> {
    field.map(|s| s.trim()).filter(|s| !s.is_empty())
}

fn optional(field: Option<String>) -> Option<String> {
    field
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty())
}

fn parse_phone(raw: &str) -> Result<Phone, ValidationError> {
    Phone::parse(raw).map_err(|e| ValidationError::new(format!("Invalid phone: {e}")))
}

fn parse_event_id(raw: &str) -> Result<EventId, ValidationError> {
    raw.parse()
        .map_err(|_| ValidationError::new("Invalid eventId: must be a UUID"))
}

// =============================================================================
// Event confirmation
// =============================================================================

/// `POST /functions/v1/event-confirmation` request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventConfirmationRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub booking_id: Option<String>,
}

/// A validated event confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventConfirmation {
    pub name: String,
    pub phone: Phone,
    pub event_name: String,
    pub event_date: String,
    pub event_time: Option<String>,
    pub event_location: Option<String>,
    /// When present the sent message is recorded against this event.
    pub event_id: Option<EventId>,
    pub booking_id: Option<String>,
}

impl EventConfirmationRequest {
    /// Validate required fields and parse typed values.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if `name`, `phone`, `eventName` or
    /// `eventDate` is missing, or if the phone or event ID is malformed.
    pub fn validate(self) -> Result<EventConfirmation, ValidationError> {
        let (Some(name), Some(phone), Some(event_name), Some(event_date)) = (
            present(self.name.as_ref()),
            present(self.phone.as_ref()),
            present(self.event_name.as_ref()),
            present(self.event_date.as_ref()),
        ) else {
            return Err(ValidationError::new(
                "Missing required fields: name, phone, eventName, eventDate",
            ));
        };

        let event_id = present(self.event_id.as_ref())
            .map(parse_event_id)
            .transpose()?;

        Ok(EventConfirmation {
            name: name.to_owned(),
            phone: parse_phone(phone)?,
            event_name: event_name.to_owned(),
            event_date: event_date.to_owned(),
            event_time: optional(self.event_time),
            event_location: optional(self.event_location),
            event_id,
            booking_id: optional(self.booking_id),
        })
    }
}

/// `POST /functions/v1/event-confirmation` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventConfirmationResponse {
    pub success: bool,
    pub message: String,
    /// Provider message ID (Twilio SID).
    pub message_id: String,
}

// =============================================================================
// Registration check
// =============================================================================

/// `POST /functions/v1/event-registration-check` request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationCheckRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// A validated registration lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationCheck {
    pub event_id: EventId,
    pub phone: Phone,
}

impl RegistrationCheckRequest {
    /// Validate required fields and parse typed values.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if `eventId` or `phone` is missing or malformed.
    pub fn validate(self) -> Result<RegistrationCheck, ValidationError> {
        let (Some(event_id), Some(phone)) = (
            present(self.event_id.as_ref()),
            present(self.phone.as_ref()),
        ) else {
            return Err(ValidationError::new(
                "Missing required fields: eventId, phone",
            ));
        };

        Ok(RegistrationCheck {
            event_id: parse_event_id(event_id)?,
            phone: parse_phone(phone)?,
        })
    }
}

/// The matching registration, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationSummary {
    pub id: ConfirmationId,
    pub status: String,
}

/// `POST /functions/v1/event-registration-check` response.
///
/// `registration` serializes as `null` when nothing matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationCheckResponse {
    pub exists: bool,
    pub registration: Option<RegistrationSummary>,
}

impl From<Option<RegistrationSummary>> for RegistrationCheckResponse {
    fn from(registration: Option<RegistrationSummary>) -> Self {
        Self {
            exists: registration.is_some(),
            registration,
        }
    }
}

// =============================================================================
// Loyalty points
// =============================================================================

/// `POST /functions/v1/loyalty-points-update` request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoyaltyPointsRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Overrides the reason's default amount when non-zero.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<i64>,
}

/// Largest points change, in either direction, a single update may apply.
pub const MAX_LOYALTY_AMOUNT: i64 = 1_000_000;

/// A validated loyalty update with the amount already resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoyaltyPointsUpdate {
    pub customer_id: CustomerId,
    pub reason: LoyaltyReason,
    pub points: i64,
}

impl LoyaltyPointsRequest {
    /// Validate required fields, the reason code, and resolve the amount.
    ///
    /// An absent or zero `amount` falls back to the reason's default.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if `customerId` or `reason` is missing, the
    /// reason is not one of `checkin`, `order`, `vip-bonus`, the customer
    /// ID is not a UUID, or `amount` exceeds [`MAX_LOYALTY_AMOUNT`].
    pub fn validate(self) -> Result<LoyaltyPointsUpdate, ValidationError> {
        let (Some(customer_id), Some(reason)) = (
            present(self.customer_id.as_ref()),
            present(self.reason.as_ref()),
        ) else {
            return Err(ValidationError::new(
                "Missing required fields: customerId, reason",
            ));
        };

        let reason: LoyaltyReason = reason.parse().map_err(|_| {
            ValidationError::new("Invalid reason. Must be: checkin, order, or vip-bonus")
        })?;

        let customer_id = customer_id
            .parse()
            .map_err(|_| ValidationError::new("Invalid customerId: must be a UUID"))?;

        let points = match self.amount {
            Some(amount) if amount.unsigned_abs() > MAX_LOYALTY_AMOUNT.unsigned_abs() => {
                return Err(ValidationError::new("Invalid amount"));
            }
            Some(amount) if amount != 0 => amount,
            _ => reason.default_points(),
        };

        Ok(LoyaltyPointsUpdate {
            customer_id,
            reason,
            points,
        })
    }
}

/// `POST /functions/v1/loyalty-points-update` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoyaltyPointsResponse {
    pub success: bool,
    pub message: String,
    pub previous_points: i64,
    pub points_added: i64,
    pub new_total: i64,
    pub reason: LoyaltyReason,
}

// =============================================================================
// VIP broadcast
// =============================================================================

/// `POST /functions/v1/vip-broadcast` request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VipBroadcastRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// A validated broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VipBroadcast {
    pub segment: BroadcastSegment,
    pub message: String,
}

impl VipBroadcastRequest {
    /// Validate required fields and the segment.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if `segment` or `message` is missing or the
    /// segment is not one of `vip`, `recent`, `all`.
    pub fn validate(self) -> Result<VipBroadcast, ValidationError> {
        let (Some(segment), Some(message)) = (
            present(self.segment.as_ref()),
            present(self.message.as_ref()),
        ) else {
            return Err(ValidationError::new(
                "Missing required fields: segment, message",
            ));
        };

        let segment = segment.parse().map_err(|_| {
            ValidationError::new("Invalid segment. Must be: vip, recent, or all")
        })?;

        Ok(VipBroadcast {
            segment,
            message: message.to_owned(),
        })
    }
}

/// `POST /functions/v1/vip-broadcast` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VipBroadcastResponse {
    pub success: bool,
    pub sent_count: u32,
    pub failed_count: u32,
    pub total_customers: u32,
    /// Set when the segment had no recipients.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

// =============================================================================
// Event feedback request
// =============================================================================

/// `POST /functions/v1/event-feedback-request` request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRequestPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback_link: Option<String>,
}

/// A validated feedback request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackRequest {
    pub event_id: EventId,
    pub feedback_link: Option<String>,
}

impl FeedbackRequestPayload {
    /// Validate the event ID.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if `eventId` is missing or not a UUID.
    pub fn validate(self) -> Result<FeedbackRequest, ValidationError> {
        let Some(event_id) = present(self.event_id.as_ref()) else {
            return Err(ValidationError::new("Missing required field: eventId"));
        };

        Ok(FeedbackRequest {
            event_id: parse_event_id(event_id)?,
            feedback_link: optional(self.feedback_link),
        })
    }
}

/// `POST /functions/v1/event-feedback-request` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackRequestResponse {
    pub success: bool,
    pub message: String,
    pub sent: u32,
    pub failed: u32,
    pub total: u32,
}

// =============================================================================
// Newsletter confirmation
// =============================================================================

/// `POST /functions/v1/newsletter-confirmation` request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsletterConfirmationRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// A validated newsletter signup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsletterConfirmation {
    pub name: String,
    pub phone: Phone,
}

impl NewsletterConfirmationRequest {
    /// Validate required fields.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if `name` or `phone` is missing or the phone
    /// is malformed.
    pub fn validate(self) -> Result<NewsletterConfirmation, ValidationError> {
        let (Some(name), Some(phone)) =
            (present(self.name.as_ref()), present(self.phone.as_ref()))
        else {
            return Err(ValidationError::new("Missing required fields: name, phone"));
        };

        Ok(NewsletterConfirmation {
            name: name.to_owned(),
            phone: parse_phone(phone)?,
        })
    }
}

/// Generic `{ success, message }` acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acknowledgement {
    pub success: bool,
    pub message: String,
}

impl Acknowledgement {
    /// A successful acknowledgement with the given message.
    #[must_use]
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

// =============================================================================
// Delivery status webhook
// =============================================================================

/// Form fields posted by the messaging provider on status changes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StatusCallbackForm {
    #[serde(default)]
    pub message_sid: Option<String>,
    #[serde(default)]
    pub message_status: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}

/// A validated delivery report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    pub message_sid: String,
    /// Lower-cased provider status.
    pub status: String,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
}

impl DeliveryReport {
    /// Error text to store for a failed delivery, if the provider gave any.
    #[must_use]
    pub fn failure_description(&self) -> Option<String> {
        if self.status != crate::delivery_status::FAILED {
            return None;
        }
        self.error_message.clone().or_else(|| {
            self.error_code
                .as_ref()
                .map(|code| format!("Twilio error code: {code}"))
        })
    }
}

impl StatusCallbackForm {
    /// Validate required fields.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if `MessageSid` or `MessageStatus` is missing.
    pub fn validate(self) -> Result<DeliveryReport, ValidationError> {
        let (Some(message_sid), Some(status)) = (
            present(self.message_sid.as_ref()),
            present(self.message_status.as_ref()),
        ) else {
            return Err(ValidationError::new("Missing required fields"));
        };

        Ok(DeliveryReport {
            message_sid: message_sid.to_owned(),
            status: status.to_lowercase(),
            error_code: optional(self.error_code),
            error_message: optional(self.error_message),
        })
    }
}

// =============================================================================
// Event status maintenance
// =============================================================================

/// `POST /functions/v1/update-event-status` response.
///
/// Unlike the other responses the count is snake case; the scheduler
/// reads `updated_count`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventStatusUpdateResponse {
    pub success: bool,
    pub updated_count: u64,
    pub timestamp: DateTime<Utc>,
}

// =============================================================================
// Event sync
// =============================================================================

/// `POST /functions/v1/events-sync` request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventsSyncRequest {
    /// Where the events came from (`shopify`, `google_calendar`, `manual`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events: Option<Vec<SyncedEvent>>,
}

impl EventsSyncRequest {
    /// Take the event list out of the request.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if `events` is absent.
    pub fn into_events(self) -> Result<(Option<String>, Vec<SyncedEvent>), ValidationError> {
        let events = self
            .events
            .ok_or_else(|| ValidationError::new("Invalid payload: events array required"))?;
        Ok((optional(self.source), events))
    }
}

/// One event in a sync payload. Unknown fields (`category_slug`,
/// `venue_slug`) are accepted and ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncedEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_datetime: Option<String>,
}

/// A validated event ready to be written, keyed by slug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventUpsert {
    pub slug: String,
    pub title: String,
    pub description: Option<String>,
    pub event_date: DateTime<Utc>,
}

impl SyncedEvent {
    /// Label used in the per-event error list.
    #[must_use]
    pub fn label(&self) -> &str {
        present(self.title.as_ref())
            .or_else(|| present(self.slug.as_ref()))
            .unwrap_or("(untitled)")
    }

    /// Validate required fields and parse the date.
    ///
    /// `event_datetime` is RFC 3339; a timestamp without an offset is taken
    /// as UTC.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if `title`, `slug` or `event_datetime` is
    /// missing, or the date cannot be parsed.
    pub fn validate(self) -> Result<EventUpsert, ValidationError> {
        let (Some(title), Some(slug), Some(when)) = (
            present(self.title.as_ref()),
            present(self.slug.as_ref()),
            present(self.event_datetime.as_ref()),
        ) else {
            return Err(ValidationError::new(
                "Missing required fields: title, slug, event_datetime",
            ));
        };

        let event_date = DateTime::parse_from_rfc3339(when)
            .map(|d| d.with_timezone(&Utc))
            .or_else(|_| {
                NaiveDateTime::parse_from_str(when, "%Y-%m-%dT%H:%M:%S").map(|d| d.and_utc())
            })
            .map_err(|e| ValidationError::new(format!("Invalid event_datetime: {e}")))?;

        Ok(EventUpsert {
            slug: slug.to_string(),
            title: title.to_string(),
            description: optional(self.description),
            event_date,
        })
    }
}

/// Per-event failure in a sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncFailure {
    pub event: String,
    pub error: String,
}

/// Counts for one sync run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncResults {
    pub created: u32,
    pub updated: u32,
    pub failed: u32,
    pub errors: Vec<SyncFailure>,
}

/// `POST /functions/v1/events-sync` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventsSyncResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub results: SyncResults,
    pub timestamp: DateTime<Utc>,
}

// =============================================================================
// Daily analytics
// =============================================================================

/// Registrations an event received on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDailyStats {
    pub event_id: EventId,
    pub title: String,
    pub registrations: u64,
}

/// `POST /functions/v1/event-analytics-daily` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyAnalyticsResponse {
    pub success: bool,
    pub message: String,
    /// The day counted; absent when there were no events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    pub stats_generated: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stats: Vec<EventDailyStats>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const EVENT: &str = "6f1c1f4e-2a53-4c52-9a55-0b9e0ed3f6a1";
    const CUSTOMER: &str = "0b5d2a5e-4d8f-4bb1-8c3e-7e6d1c2f9a10";

    fn loyalty(reason: &str, amount: Option<i64>) -> LoyaltyPointsRequest {
        LoyaltyPointsRequest {
            customer_id: Some(CUSTOMER.to_string()),
            reason: Some(reason.to_string()),
            amount,
        }
    }

    #[test]
    fn test_loyalty_checkin_defaults_to_ten() {
        let update = loyalty("checkin", None).validate().unwrap();
        assert_eq!(update.points, 10);
        assert_eq!(update.reason, LoyaltyReason::Checkin);
    }

    #[test]
    fn test_loyalty_zero_amount_uses_default() {
        assert_eq!(loyalty("vip-bonus", Some(0)).validate().unwrap().points, 20);
    }

    #[test]
    fn test_loyalty_explicit_amount_overrides() {
        assert_eq!(loyalty("order", Some(42)).validate().unwrap().points, 42);
    }

    #[test]
    fn test_loyalty_amount_is_bounded() {
        assert_eq!(
            loyalty("order", Some(-MAX_LOYALTY_AMOUNT)).validate().unwrap().points,
            -MAX_LOYALTY_AMOUNT
        );
        for amount in [MAX_LOYALTY_AMOUNT + 1, i64::MAX, i64::MIN] {
            let err = loyalty("order", Some(amount)).validate().unwrap_err();
            assert_eq!(err.to_string(), "Invalid amount");
        }
    }

    #[test]
    fn test_loyalty_rejects_unknown_reason() {
        let err = loyalty("birthday", None).validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid reason. Must be: checkin, order, or vip-bonus"
        );
    }

    #[test]
    fn test_loyalty_missing_fields() {
        let err = LoyaltyPointsRequest {
            customer_id: Some(String::new()),
            reason: Some("checkin".into()),
            amount: None,
        }
        .validate()
        .unwrap_err();
        assert_eq!(err.to_string(), "Missing required fields: customerId, reason");
    }

    #[test]
    fn test_loyalty_request_wire_names() {
        let req: LoyaltyPointsRequest = serde_json::from_str(
            r#"{"customerId":"abc","reason":"order","amount":3}"#,
        )
        .unwrap();
        assert_eq!(req.customer_id.as_deref(), Some("abc"));
        assert_eq!(req.amount, Some(3));
    }

    #[test]
    fn test_loyalty_response_wire_names() {
        let json = serde_json::to_value(LoyaltyPointsResponse {
            success: true,
            message: "ok".into(),
            previous_points: 5,
            points_added: 10,
            new_total: 15,
            reason: LoyaltyReason::Checkin,
        })
        .unwrap();
        assert_eq!(json["previousPoints"], 5);
        assert_eq!(json["pointsAdded"], 10);
        assert_eq!(json["newTotal"], 15);
        assert_eq!(json["reason"], "checkin");
    }

    #[test]
    fn test_registration_check_missing_phone() {
        let err = RegistrationCheckRequest {
            event_id: Some(EVENT.into()),
            phone: None,
        }
        .validate()
        .unwrap_err();
        assert_eq!(err.to_string(), "Missing required fields: eventId, phone");
    }

    #[test]
    fn test_registration_response_serializes_null() {
        let json = serde_json::to_value(RegistrationCheckResponse::from(None)).unwrap();
        assert_eq!(json, serde_json::json!({"exists": false, "registration": null}));
    }

    #[test]
    fn test_confirmation_requires_event_fields() {
        let err = EventConfirmationRequest {
            name: Some("Ana".into()),
            phone: Some("+573001234567".into()),
            ..Default::default()
        }
        .validate()
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing required fields: name, phone, eventName, eventDate"
        );
    }

    #[test]
    fn test_confirmation_optional_fields_trimmed() {
        let confirmation = EventConfirmationRequest {
            name: Some("Ana".into()),
            phone: Some("+57 300 123 4567".into()),
            event_name: Some("Final".into()),
            event_date: Some("2025-12-14".into()),
            event_time: Some("  ".into()),
            event_location: Some(" Skybox ".into()),
            event_id: Some(EVENT.into()),
            booking_id: None,
        }
        .validate()
        .unwrap();
        assert_eq!(confirmation.phone.as_str(), "+573001234567");
        assert_eq!(confirmation.event_time, None);
        assert_eq!(confirmation.event_location.as_deref(), Some("Skybox"));
        assert_eq!(confirmation.event_id.unwrap().to_string(), EVENT);
    }

    #[test]
    fn test_broadcast_invalid_segment() {
        let err = VipBroadcastRequest {
            segment: Some("everyone".into()),
            message: Some("Hi".into()),
        }
        .validate()
        .unwrap_err();
        assert_eq!(err.to_string(), "Invalid segment. Must be: vip, recent, or all");
    }

    #[test]
    fn test_feedback_missing_event() {
        let err = FeedbackRequestPayload::default().validate().unwrap_err();
        assert_eq!(err.to_string(), "Missing required field: eventId");
    }

    #[test]
    fn test_status_callback_lowercases_status() {
        let report = StatusCallbackForm {
            message_sid: Some("SM123".into()),
            message_status: Some("Delivered".into()),
            ..Default::default()
        }
        .validate()
        .unwrap();
        assert_eq!(report.status, "delivered");
        assert_eq!(report.failure_description(), None);
    }

    #[test]
    fn test_failure_description_falls_back_to_code() {
        let report = StatusCallbackForm {
            message_sid: Some("SM123".into()),
            message_status: Some("failed".into()),
            error_code: Some("63016".into()),
            ..Default::default()
        }
        .validate()
        .unwrap();
        assert_eq!(
            report.failure_description().as_deref(),
            Some("Twilio error code: 63016")
        );
    }

    #[test]
    fn test_event_status_response_wire_names() {
        let json = serde_json::to_value(EventStatusUpdateResponse {
            success: true,
            updated_count: 3,
            timestamp: Utc::now(),
        })
        .unwrap();
        assert_eq!(json["updated_count"], 3);
        assert!(json.get("updatedCount").is_none());
    }

    fn synced(title: &str, slug: &str, when: &str) -> SyncedEvent {
        SyncedEvent {
            title: Some(title.into()),
            slug: Some(slug.into()),
            description: Some("  ".into()),
            event_datetime: Some(when.into()),
        }
    }

    #[test]
    fn test_synced_event_parses_offset_and_naive_dates() {
        let event = synced("Final", "final-2025", "2025-06-01T20:00:00-05:00")
            .validate()
            .unwrap();
        assert_eq!(event.event_date.to_rfc3339(), "2025-06-02T01:00:00+00:00");
        assert_eq!(event.description, None);

        let event = synced("Final", "final-2025", "2025-06-01T20:00:00").validate().unwrap();
        assert_eq!(event.event_date.to_rfc3339(), "2025-06-01T20:00:00+00:00");
    }

    #[test]
    fn test_synced_event_rejects_missing_and_bad_dates() {
        let err = synced("Final", "", "2025-06-01T20:00:00Z").validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing required fields: title, slug, event_datetime"
        );

        let err = synced("Final", "final", "next friday").validate().unwrap_err();
        assert!(err.to_string().starts_with("Invalid event_datetime"));
    }

    #[test]
    fn test_events_sync_requires_events() {
        let req: EventsSyncRequest = serde_json::from_str(r#"{"source":"manual"}"#).unwrap();
        assert_eq!(
            req.into_events().unwrap_err().to_string(),
            "Invalid payload: events array required"
        );

        let req: EventsSyncRequest = serde_json::from_str(
            r#"{"source":"manual","events":[{"title":"A","slug":"a","event_datetime":"2025-06-01T20:00:00Z","venue_slug":"x"}]}"#,
        )
        .unwrap();
        let (source, events) = req.into_events().unwrap();
        assert_eq!(source.as_deref(), Some("manual"));
        assert_eq!(events[0].slug.as_deref(), Some("a"));
    }
}
