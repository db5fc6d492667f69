//! Status and reason-code enums.

use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when a string is not one of an enum's wire values.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind}: {value}")]
pub struct UnknownVariant {
    /// Which enum was being parsed.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

/// Why loyalty points are being awarded.
///
/// Each reason carries a default amount used when the caller does not
/// supply one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoyaltyReason {
    /// Customer checked in at the venue.
    #[serde(rename = "checkin")]
    Checkin,
    /// Customer placed an order.
    #[serde(rename = "order")]
    Order,
    /// Manual bonus for VIP customers.
    #[serde(rename = "vip-bonus")]
    VipBonus,
}

impl LoyaltyReason {
    /// Every accepted reason, in display order.
    pub const ALL: [Self; 3] = [Self::Checkin, Self::Order, Self::VipBonus];

    /// Points awarded when no explicit amount is given.
    #[must_use]
    pub const fn default_points(self) -> i64 {
        match self {
            Self::Checkin => 10,
            Self::Order => 5,
            Self::VipBonus => 20,
        }
    }

    /// Wire value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Checkin => "checkin",
            Self::Order => "order",
            Self::VipBonus => "vip-bonus",
        }
    }
}

impl fmt::Display for LoyaltyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoyaltyReason {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|reason| reason.as_str() == s)
            .ok_or_else(|| UnknownVariant {
                kind: "loyalty reason",
                value: s.to_owned(),
            })
    }
}

/// Which customers receive a broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BroadcastSegment {
    /// Profiles with the `vip` role.
    Vip,
    /// Profiles seen in the last [`BroadcastSegment::RECENT_DAYS`] days.
    Recent,
    /// Every profile with a phone number.
    All,
}

impl BroadcastSegment {
    /// Every accepted segment, in display order.
    pub const ALL: [Self; 3] = [Self::Vip, Self::Recent, Self::All];

    /// Activity window for the `recent` segment.
    pub const RECENT_DAYS: i64 = 30;

    /// Wire value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Vip => "vip",
            Self::Recent => "recent",
            Self::All => "all",
        }
    }
}

impl fmt::Display for BroadcastSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BroadcastSegment {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|segment| segment.as_str() == s)
            .ok_or_else(|| UnknownVariant {
                kind: "broadcast segment",
                value: s.to_owned(),
            })
    }
}

/// Publication status of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    #[default]
    Draft,
    Published,
    Past,
    Cancelled,
}

impl EventStatus {
    /// Database value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Past => "past",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Delivery statuses of a confirmation message that the venue acts on.
///
/// Stored as free text: the messaging provider may report statuses not
/// listed here and they are kept verbatim (lower-cased).
pub mod delivery_status {
    /// Message accepted by the provider.
    pub const SENT: &str = "sent";
    /// Message reached the handset.
    pub const DELIVERED: &str = "delivered";
    /// Recipient opened the message.
    pub const READ: &str = "read";
    /// Provider gave up on the message.
    pub const FAILED: &str = "failed";

    /// Statuses meaning the registrant actually received their confirmation
    /// and may be asked for feedback.
    pub const FEEDBACK_ELIGIBLE: [&str; 3] = [SENT, DELIVERED, READ];
}
