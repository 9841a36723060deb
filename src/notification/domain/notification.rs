//! Notification entity and its creation payload.

use super::{NotificationDomainError, ParseNotificationKindError};
use crate::identity::domain::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a persisted notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationId(i64);

impl NotificationId {
    /// Wraps a persisted identifier.
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

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Visual category of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Neutral information.
    Info,
    /// Something needs attention.
    Warning,
    /// A positive outcome.
    Success,
}

impl NotificationKind {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Success => "success",
        }
    }
}

impl TryFrom<&str> for NotificationKind {
    type Error = ParseNotificationKindError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "info" => Ok(Self::Info),
            "warning" => Ok(Self::Warning),
            "success" => Ok(Self::Success),
            _ => Err(ParseNotificationKindError(value.to_owned())),
        }
    }
}

/// Entity a notification refers to, such as `("task", 42)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelatedEntity {
    /// Entity type name.
    pub entity_type: String,
    /// Entity identifier.
    pub entity_id: i64,
}

impl RelatedEntity {
    /// Entity type used for task references.
    pub const TASK: &'static str = "task";

    /// Creates a related-entity reference.
    #[must_use]
    pub fn new(entity_type: impl Into<String>, entity_id: i64) -> Self {
        Self {
            entity_type: entity_type.into(),
            entity_id,
        }
    }

    /// Creates a reference to a task.
    #[must_use]
    pub fn task(task_id: i64) -> Self {
        Self::new(Self::TASK, task_id)
    }

    /// Returns `true` when the reference points at a task.
    #[must_use]
    pub fn is_task(&self) -> bool {
        self.entity_type == Self::TASK
    }
}

/// Validated payload for a notification that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    recipient: UserId,
    title: String,
    message: String,
    kind: NotificationKind,
    related: Option<RelatedEntity>,
}

impl NewNotification {
    /// Creates a notification payload.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationDomainError::EmptyTitle`] when the title is blank.
    pub fn new(
        recipient: UserId,
        title: impl Into<String>,
        message: impl Into<String>,
        kind: NotificationKind,
    ) -> Result<Self, NotificationDomainError> {
        let raw_title = title.into();
        let trimmed = raw_title.trim();
        if trimmed.is_empty() {
            return Err(NotificationDomainError::EmptyTitle);
        }
        Ok(Self {
            recipient,
            title: trimmed.to_owned(),
            message: message.into(),
            kind,
            related: None,
        })
    }

    /// Links the notification to a related entity.
    #[must_use]
    pub fn with_related(mut self, related: RelatedEntity) -> Self {
        self.related = Some(related);
        self
    }

    /// Returns the recipient.
    #[must_use]
    pub const fn recipient(&self) -> UserId {
        self.recipient
    }

    /// Returns the title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the message body.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the kind.
    #[must_use]
    pub const fn kind(&self) -> NotificationKind {
        self.kind
    }

    /// Returns the related entity, if any.
    #[must_use]
    pub const fn related(&self) -> Option<&RelatedEntity> {
        self.related.as_ref()
    }
}

/// A stored notification. Immutable apart from its read and archive flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    id: NotificationId,
    recipient: UserId,
    title: String,
    message: String,
    kind: NotificationKind,
    related: Option<RelatedEntity>,
    is_read: bool,
    archived: bool,
    created_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedNotificationData {
    /// Notification identifier.
    pub id: NotificationId,
    /// Recipient user.
    pub recipient: UserId,
    /// Title.
    pub title: String,
    /// Message body.
    pub message: String,
    /// Kind.
    pub kind: NotificationKind,
    /// Related entity.
    pub related: Option<RelatedEntity>,
    /// Read flag.
    pub is_read: bool,
    /// Archive flag.
    pub archived: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Materializes a new notification once storage has allocated its id.
    #[must_use]
    pub fn from_new(id: NotificationId, new: NewNotification, created_at: DateTime<Utc>) -> Self {
        let NewNotification {
            recipient,
            title,
            message,
            kind,
            related,
        } = new;
        Self {
            id,
            recipient,
            title,
            message,
            kind,
            related,
            is_read: false,
            archived: false,
            created_at,
        }
    }

    /// Reconstructs a notification from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedNotificationData) -> Self {
        Self {
            id: data.id,
            recipient: data.recipient,
            title: data.title,
            message: data.message,
            kind: data.kind,
            related: data.related,
            is_read: data.is_read,
            archived: data.archived,
            created_at: data.created_at,
        }
    }

    /// Returns the identifier.
    #[must_use]
    pub const fn id(&self) -> NotificationId {
        self.id
    }

    /// Returns the recipient.
    #[must_use]
    pub const fn recipient(&self) -> UserId {
        self.recipient
    }

    /// Returns the title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the message body.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the kind.
    #[must_use]
    pub const fn kind(&self) -> NotificationKind {
        self.kind
    }

    /// Returns the related entity, if any.
    #[must_use]
    pub const fn related(&self) -> Option<&RelatedEntity> {
        self.related.as_ref()
    }

    /// Returns `true` once the recipient has read the notification.
    #[must_use]
    pub const fn is_read(&self) -> bool {
        self.is_read
    }

    /// Returns `true` when the notification has been archived.
    #[must_use]
    pub const fn is_archived(&self) -> bool {
        self.archived
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Checks that `caller` owns this notification.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationDomainError::NotRecipient`] for anyone else.
    pub const fn ensure_recipient(&self, caller: UserId) -> Result<(), NotificationDomainError> {
        if self.recipient.value() != caller.value() {
            return Err(NotificationDomainError::NotRecipient {
                notification_id: self.id,
                user_id: caller,
            });
        }
        Ok(())
    }

    /// Marks the notification as read on behalf of `caller`.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationDomainError::NotRecipient`] when `caller` is not
    /// the recipient.
    pub fn mark_read(&mut self, caller: UserId) -> Result<(), NotificationDomainError> {
        self.ensure_recipient(caller)?;
        self.is_read = true;
        Ok(())
    }

    /// Archives the notification on behalf of `caller`.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationDomainError::NotRecipient`] when `caller` is not
    /// the recipient.
    pub fn archive(&mut self, caller: UserId) -> Result<(), NotificationDomainError> {
        self.ensure_recipient(caller)?;
        self.archived = true;
        Ok(())
    }
}
