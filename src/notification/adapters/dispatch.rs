//! Dispatcher used when push delivery is disabled.

use crate::notification::{domain::Notification, ports::NotificationDispatcher};

/// Dispatcher that leaves notifications in the in-app inbox only.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopDispatcher;

impl NotificationDispatcher for NoopDispatcher {
    fn dispatch(&self, notifications: &[Notification]) {
        tracing::debug!(
            count = notifications.len(),
            "push delivery disabled, notifications stay in-app"
        );
    }
}
