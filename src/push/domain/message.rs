//! Push payload sent to browsers.

use super::ParseUrgencyError;
use crate::notification::domain::{Notification, NotificationKind};
use serde::{Deserialize, Serialize};
use std::fmt;

/// JSON document delivered to the service worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushMessage {
    /// Notification title.
    pub title: String,
    /// Notification body.
    pub body: String,
    /// Click-through and correlation data.
    pub data: PushData,
}

/// Data block of a [`PushMessage`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushData {
    /// Related entity type, e.g. `task`.
    pub related_type: Option<String>,
    /// Related entity identifier.
    pub related_id: Option<i64>,
    /// Page opened when the notification is clicked.
    pub url: String,
    /// In-app notification identifier.
    pub notification_id: i64,
    /// Notification kind.
    #[serde(rename = "type")]
    pub kind: NotificationKind,
}

impl PushMessage {
    /// Builds the push payload for a committed notification.
    ///
    /// Task notifications open `<base>/tasks/<id>`; anything else opens the
    /// base URL.
    #[must_use]
    pub fn from_notification(notification: &Notification, click_base_url: &str) -> Self {
        let base = click_base_url.trim_end_matches('/');
        let related = notification.related();
        let url = match related {
            Some(entity) if entity.is_task() => format!("{base}/tasks/{}", entity.entity_id),
            _ if base.is_empty() => "/".to_owned(),
            _ => base.to_owned(),
        };
        Self {
            title: notification.title().to_owned(),
            body: notification.message().to_owned(),
            data: PushData {
                related_type: related.map(|entity| entity.entity_type.clone()),
                related_id: related.map(|entity| entity.entity_id),
                url,
                notification_id: notification.id().value(),
                kind: notification.kind(),
            },
        }
    }
}

/// Delivery urgency hint sent in the `Urgency` header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Urgency {
    /// `very-low`.
    VeryLow,
    /// `low`.
    Low,
    /// `normal`.
    #[default]
    Normal,
    /// `high`.
    High,
}

impl Urgency {
    /// Returns the header value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::VeryLow => "very-low",
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Urgency {
    type Error = ParseUrgencyError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "very-low" => Ok(Self::VeryLow),
            "low" => Ok(Self::Low),
            "normal" => Ok(Self::Normal),
            "high" => Ok(Self::High),
            _ => Err(ParseUrgencyError(value.to_owned())),
        }
    }
}
