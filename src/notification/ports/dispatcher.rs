//! Hand-off of committed notifications to push delivery.

use crate::notification::domain::Notification;

/// Receives notifications after the unit of work that created them commits.
///
/// Implementations must not block and must not fail the caller: delivery is
/// best-effort and happens outside the business transaction.
pub trait NotificationDispatcher: Send + Sync {
    /// Schedules delivery of the given notifications.
    fn dispatch(&self, notifications: &[Notification]);
}
