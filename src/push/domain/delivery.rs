//! Delivery log records and outcome classification.

use super::ParseDeliveryOutcomeError;
use crate::identity::domain::UserId;
use crate::notification::domain::NotificationId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Delivery log identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeliveryLogId(i64);

impl DeliveryLogId {
    /// Wraps a storage identifier.
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the raw identifier.
    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }
}

impl fmt::Display for DeliveryLogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Result of one attempt to deliver to one subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryOutcome {
    /// The push service accepted the message.
    Delivered,
    /// The subscription no longer exists and has been deactivated.
    Gone,
    /// The push service refused the message; retrying will not help.
    Rejected,
    /// Rate limiting, server or network trouble; worth retrying.
    Transient,
}

impl DeliveryOutcome {
    /// Classifies a push service HTTP status.
    #[must_use]
    pub const fn from_status(status: u16) -> Self {
        match status {
            200..=299 => Self::Delivered,
            404 | 410 => Self::Gone,
            429 | 500..=599 => Self::Transient,
            _ => Self::Rejected,
        }
    }

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Delivered => "delivered",
            Self::Gone => "gone",
            Self::Rejected => "rejected",
            Self::Transient => "transient",
        }
    }

    /// Returns `true` for a successful delivery.
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Delivered)
    }
}

impl fmt::Display for DeliveryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for DeliveryOutcome {
    type Error = ParseDeliveryOutcomeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "delivered" => Ok(Self::Delivered),
            "gone" => Ok(Self::Gone),
            "rejected" => Ok(Self::Rejected),
            "transient" => Ok(Self::Transient),
            other => Err(ParseDeliveryOutcomeError(other.to_owned())),
        }
    }
}

/// Record of one delivery attempt, before it is stored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDeliveryLogEntry {
    /// Notification being delivered, if any.
    pub notification_id: Option<NotificationId>,
    /// Recipient of the notification.
    pub recipient: UserId,
    /// Subscription endpoint the attempt targeted.
    pub endpoint: String,
    /// Push title.
    pub title: String,
    /// Push body.
    pub body: String,
    /// Full JSON payload that was sent, kept for retries.
    pub payload: serde_json::Value,
    /// Classified outcome.
    pub outcome: DeliveryOutcome,
    /// HTTP status returned by the push service, if one was received.
    pub status_code: Option<u16>,
    /// Raw response body or error text.
    pub detail: String,
    /// Attempt timestamp.
    pub sent_at: DateTime<Utc>,
}

/// Stored delivery attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryLogEntry {
    /// Log entry identifier.
    pub id: DeliveryLogId,
    /// Notification being delivered, if any.
    pub notification_id: Option<NotificationId>,
    /// Recipient of the notification.
    pub recipient: UserId,
    /// Subscription endpoint the attempt targeted.
    pub endpoint: String,
    /// Push title.
    pub title: String,
    /// Push body.
    pub body: String,
    /// Full JSON payload that was sent.
    pub payload: serde_json::Value,
    /// Classified outcome.
    pub outcome: DeliveryOutcome,
    /// HTTP status returned by the push service.
    pub status_code: Option<u16>,
    /// Raw response body or error text.
    pub detail: String,
    /// Attempt timestamp.
    pub sent_at: DateTime<Utc>,
}

impl DeliveryLogEntry {
    /// Attaches a storage identifier to a new entry.
    #[must_use]
    pub fn from_new(id: DeliveryLogId, entry: NewDeliveryLogEntry) -> Self {
        Self {
            id,
            notification_id: entry.notification_id,
            recipient: entry.recipient,
            endpoint: entry.endpoint,
            title: entry.title,
            body: entry.body,
            payload: entry.payload,
            outcome: entry.outcome,
            status_code: entry.status_code,
            detail: entry.detail,
            sent_at: entry.sent_at,
        }
    }

    /// Returns `true` when the attempt was delivered.
    #[must_use]
    pub const fn success(&self) -> bool {
        self.outcome.is_success()
    }
}
