//! Domain model for in-app notifications.

mod error;
mod notification;

pub use error::{NotificationDomainError, ParseNotificationKindError};
pub use notification::{
    NewNotification, Notification, NotificationId, NotificationKind, PersistedNotificationData,
    RelatedEntity,
};
