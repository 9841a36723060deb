//! Error types for notification validation.

use super::NotificationId;
use crate::identity::domain::UserId;
use thiserror::Error;

/// Errors returned by notification domain rules.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NotificationDomainError {
    /// The notification title is empty after trimming.
    #[error("notification title must not be empty")]
    EmptyTitle,

    /// Only the recipient may change a notification.
    #[error("user {user_id} is not the recipient of notification {notification_id}")]
    NotRecipient {
        /// Notification being modified.
        notification_id: NotificationId,
        /// Caller that attempted the change.
        user_id: UserId,
    },
}

/// Error returned while parsing notification kinds from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown notification kind: {0}")]
pub struct ParseNotificationKindError(pub String);
