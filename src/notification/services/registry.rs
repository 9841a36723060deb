//! Notification registry service.

use crate::error::ErrorKind;
use crate::identity::{
    domain::UserId,
    ports::{UserDirectory, UserDirectoryError},
};
use crate::notification::{
    domain::{
        NewNotification, Notification, NotificationDomainError, NotificationId, NotificationKind,
        RelatedEntity,
    },
    ports::{NotificationDispatcher, NotificationRepository, NotificationRepositoryError},
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;

/// Request payload for creating a notification directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateNotificationRequest {
    recipient: UserId,
    title: String,
    message: String,
    kind: NotificationKind,
    related: Option<RelatedEntity>,
}

impl CreateNotificationRequest {
    /// Creates a request with required fields.
    #[must_use]
    pub fn new(
        recipient: UserId,
        title: impl Into<String>,
        message: impl Into<String>,
        kind: NotificationKind,
    ) -> Self {
        Self {
            recipient,
            title: title.into(),
            message: message.into(),
            kind,
            related: None,
        }
    }

    /// Links the notification to a related entity.
    #[must_use]
    pub fn with_related(mut self, entity_type: impl Into<String>, entity_id: i64) -> Self {
        self.related = Some(RelatedEntity::new(entity_type, entity_id));
        self
    }
}

/// Service-level errors for notification operations.
#[derive(Debug, Error)]
pub enum NotificationServiceError {
    /// Domain validation or ownership check failed.
    #[error(transparent)]
    Domain(#[from] NotificationDomainError),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] NotificationRepositoryError),
    /// User lookup failed.
    #[error(transparent)]
    Directory(#[from] UserDirectoryError),
    /// The recipient does not exist.
    #[error("recipient {0} not found")]
    RecipientNotFound(UserId),
    /// The notification does not exist.
    #[error("notification {0} not found")]
    NotFound(NotificationId),
}

impl NotificationServiceError {
    /// Classifies the error for callers.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Domain(NotificationDomainError::EmptyTitle) => ErrorKind::Validation,
            Self::Domain(NotificationDomainError::NotRecipient { .. }) => ErrorKind::Forbidden,
            Self::RecipientNotFound(_)
            | Self::NotFound(_)
            | Self::Repository(NotificationRepositoryError::NotFound(_)) => ErrorKind::NotFound,
            Self::Repository(NotificationRepositoryError::Persistence(_)) | Self::Directory(_) => {
                ErrorKind::Internal
            }
        }
    }
}

/// Result type for notification service operations.
pub type NotificationServiceResult<T> = Result<T, NotificationServiceError>;

/// Durable per-user inbox.
#[derive(Clone)]
pub struct NotificationRegistry<R, U, D, C>
where
    R: NotificationRepository,
    U: UserDirectory,
    D: NotificationDispatcher,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    users: Arc<U>,
    dispatcher: Arc<D>,
    clock: Arc<C>,
}

impl<R, U, D, C> NotificationRegistry<R, U, D, C>
where
    R: NotificationRepository,
    U: UserDirectory,
    D: NotificationDispatcher,
    C: Clock + Send + Sync,
{
    /// Creates a notification registry.
    #[must_use]
    pub const fn new(repository: Arc<R>, users: Arc<U>, dispatcher: Arc<D>, clock: Arc<C>) -> Self {
        Self {
            repository,
            users,
            dispatcher,
            clock,
        }
    }

    async fn find_or_error(&self, id: NotificationId) -> NotificationServiceResult<Notification> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(NotificationServiceError::NotFound(id))
    }

    /// Creates a notification and schedules push delivery.
    ///
    /// Delivery problems never surface here; the notification is committed
    /// before it is handed to the dispatcher.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationServiceError::RecipientNotFound`] when the
    /// recipient does not exist, or validation and persistence errors.
    pub async fn create(
        &self,
        request: CreateNotificationRequest,
    ) -> NotificationServiceResult<Notification> {
        let CreateNotificationRequest {
            recipient,
            title,
            message,
            kind,
            related,
        } = request;

        let mut draft = NewNotification::new(recipient, title, message, kind)?;
        if let Some(entity) = related {
            draft = draft.with_related(entity);
        }
        if self.users.find_by_id(recipient).await?.is_none() {
            return Err(NotificationServiceError::RecipientNotFound(recipient));
        }

        let stored = self.repository.insert(&draft, self.clock.utc()).await?;
        self.dispatcher.dispatch(std::slice::from_ref(&stored));
        Ok(stored)
    }

    /// Marks a notification as read.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationServiceError::NotFound`] for unknown ids and a
    /// forbidden domain error when `caller` is not the recipient.
    pub async fn mark_read(
        &self,
        id: NotificationId,
        caller: UserId,
    ) -> NotificationServiceResult<Notification> {
        let mut notification = self.find_or_error(id).await?;
        notification.mark_read(caller)?;
        self.repository.update_flags(&notification).await?;
        Ok(notification)
    }

    /// Marks every unread notification of `user` as read.
    ///
    /// # Errors
    ///
    /// Returns persistence errors from the repository.
    pub async fn mark_all_read(&self, user: UserId) -> NotificationServiceResult<u64> {
        Ok(self.repository.mark_all_read(user).await?)
    }

    /// Archives a notification so it no longer appears in listings.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationServiceError::NotFound`] for unknown ids and a
    /// forbidden domain error when `caller` is not the recipient.
    pub async fn archive(
        &self,
        id: NotificationId,
        caller: UserId,
    ) -> NotificationServiceResult<Notification> {
        let mut notification = self.find_or_error(id).await?;
        notification.archive(caller)?;
        self.repository.update_flags(&notification).await?;
        Ok(notification)
    }

    /// Lists unread notifications, newest first.
    ///
    /// Each call runs a fresh query.
    ///
    /// # Errors
    ///
    /// Returns persistence errors from the repository.
    pub async fn list_unread(&self, user: UserId) -> NotificationServiceResult<Vec<Notification>> {
        Ok(self.repository.list_unread(user).await?)
    }

    /// Lists up to `limit` recent notifications, newest first.
    ///
    /// # Errors
    ///
    /// Returns persistence errors from the repository.
    pub async fn list_recent(
        &self,
        user: UserId,
        limit: usize,
    ) -> NotificationServiceResult<Vec<Notification>> {
        Ok(self.repository.list_recent(user, limit).await?)
    }

    /// Counts unread notifications.
    ///
    /// # Errors
    ///
    /// Returns persistence errors from the repository.
    pub async fn unread_count(&self, user: UserId) -> NotificationServiceResult<usize> {
        Ok(self.repository.list_unread(user).await?.len())
    }
}
