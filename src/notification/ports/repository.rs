//! Repository port for the notification inbox.

use crate::identity::domain::UserId;
use crate::notification::domain::{NewNotification, Notification, NotificationId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for notification repository operations.
pub type NotificationRepositoryResult<T> = Result<T, NotificationRepositoryError>;

/// Notification persistence contract.
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Stores a new notification and returns it with its allocated id.
    async fn insert(
        &self,
        notification: &NewNotification,
        created_at: DateTime<Utc>,
    ) -> NotificationRepositoryResult<Notification>;

    /// Finds a notification by identifier.
    async fn find_by_id(&self, id: NotificationId)
    -> NotificationRepositoryResult<Option<Notification>>;

    /// Persists the read and archive flags of an existing notification.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationRepositoryError::NotFound`] when the
    /// notification does not exist.
    async fn update_flags(&self, notification: &Notification) -> NotificationRepositoryResult<()>;

    /// Marks every unread notification of `recipient` as read and returns
    /// how many changed.
    async fn mark_all_read(&self, recipient: UserId) -> NotificationRepositoryResult<u64>;

    /// Returns unread, unarchived notifications of `recipient`, newest first.
    async fn list_unread(&self, recipient: UserId)
    -> NotificationRepositoryResult<Vec<Notification>>;

    /// Returns up to `limit` unarchived notifications of `recipient`, newest
    /// first.
    async fn list_recent(
        &self,
        recipient: UserId,
        limit: usize,
    ) -> NotificationRepositoryResult<Vec<Notification>>;
}

/// Errors returned by notification repository implementations.
#[derive(Debug, Clone, Error)]
pub enum NotificationRepositoryError {
    /// The notification was not found.
    #[error("notification not found: {0}")]
    NotFound(NotificationId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl NotificationRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
