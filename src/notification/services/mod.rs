//! Application services for the notification inbox.

mod registry;

pub use registry::{
    CreateNotificationRequest, NotificationRegistry, NotificationServiceError,
    NotificationServiceResult,
};
