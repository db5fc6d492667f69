//! Rows the endpoints read and write.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use skybox_core::{ConfirmationId, CustomerId, EventId, EventStatus, Phone};

/// Metadata key holding a profile's loyalty balance.
pub const LOYALTY_POINTS_KEY: &str = "loyalty_points";

/// A customer profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: CustomerId,
    pub full_name: Option<String>,
    pub phone: Option<Phone>,
    pub role: String,
    /// Free-form JSON; only `loyalty_points` is interpreted here.
    pub metadata: serde_json::Value,
    pub last_seen_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// Current loyalty balance, zero when unset.
    #[must_use]
    pub fn loyalty_points(&self) -> i64 {
        loyalty_points(&self.metadata)
    }
}

/// Read the loyalty balance out of profile metadata.
#[must_use]
pub fn loyalty_points(metadata: &serde_json::Value) -> i64 {
    metadata
        .get(LOYALTY_POINTS_KEY)
        .and_then(serde_json::Value::as_i64)
        .unwrap_or(0)
}

/// Return `metadata` with the loyalty balance replaced, keeping other keys.
#[must_use]
pub fn with_loyalty_points(metadata: serde_json::Value, points: i64) -> serde_json::Value {
    let mut map = match metadata {
        serde_json::Value::Object(map) => map,
        _ => serde_json::Map::new(),
    };
    map.insert(LOYALTY_POINTS_KEY.to_string(), points.into());
    serde_json::Value::Object(map)
}

/// A scheduled event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    /// Stable key for events imported by sync.
    pub slug: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub event_date: DateTime<Utc>,
    pub status: EventStatus,
}

/// Whether an upsert inserted a new row or changed an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

/// A sent (or attempted) confirmation message for an event registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Confirmation {
    pub id: ConfirmationId,
    pub event_id: EventId,
    pub phone: Phone,
    pub name: Option<String>,
    pub status: String,
    pub message_id: Option<String>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data needed to record a confirmation.
#[derive(Debug, Clone)]
pub struct NewConfirmation {
    pub event_id: EventId,
    pub phone: Phone,
    pub name: String,
    pub message_id: String,
}

/// Someone to message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub name: Option<String>,
    pub phone: Phone,
}

/// Recipients selected for a send.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Audience {
    pub recipients: Vec<Recipient>,
    /// Selected rows dropped because their phone number is unusable.
    pub skipped: u32,
}

impl Audience {
    /// Whether the selection matched nobody at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.recipients.is_empty() && self.skipped == 0
    }
}

impl FromIterator<Recipient> for Audience {
    fn from_iter<I: IntoIterator<Item = Recipient>>(iter: I) -> Self {
        Self {
            recipients: iter.into_iter().collect(),
            skipped: 0,
        }
    }
}

/// Balance before and after a loyalty update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoyaltyBalance {
    pub customer_name: Option<String>,
    pub previous: i64,
    pub new_total: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_loyalty_points_defaults_to_zero() {
        assert_eq!(loyalty_points(&json!({})), 0);
        assert_eq!(loyalty_points(&json!(null)), 0);
        assert_eq!(loyalty_points(&json!({"loyalty_points": "ten"})), 0);
    }

    #[test]
    fn test_with_loyalty_points_preserves_keys() {
        let updated = with_loyalty_points(json!({"tier": "gold", "loyalty_points": 5}), 15);
        assert_eq!(updated, json!({"tier": "gold", "loyalty_points": 15}));
    }

    #[test]
    fn test_with_loyalty_points_replaces_non_object() {
        assert_eq!(
            with_loyalty_points(json!(null), 10),
            json!({"loyalty_points": 10})
        );
    }
}
