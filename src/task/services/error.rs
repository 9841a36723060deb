//! Service-level errors for task operations.

use crate::error::ErrorKind;
use crate::identity::{domain::UserId, ports::UserDirectoryError};
use crate::notification::domain::NotificationDomainError;
use crate::task::{
    domain::{ReassignmentId, TaskDomainError, TaskId},
    ports::TaskStoreError,
};
use thiserror::Error;

/// Service-level errors for task lifecycle and reassignment operations.
#[derive(Debug, Error)]
pub enum TaskServiceError {
    /// Domain validation, authority, or state machine check failed.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),
    /// Store operation failed.
    #[error(transparent)]
    Store(#[from] TaskStoreError),
    /// User lookup failed.
    #[error(transparent)]
    Directory(#[from] UserDirectoryError),
    /// A generated notification was invalid.
    #[error(transparent)]
    Notification(#[from] NotificationDomainError),
    /// A notification template failed to render.
    #[error("notification template error: {0}")]
    Template(#[from] minijinja::Error),
    /// The task does not exist.
    #[error("task {0} not found")]
    TaskNotFound(TaskId),
    /// The reassignment request does not exist.
    #[error("reassignment request {0} not found")]
    RequestNotFound(ReassignmentId),
    /// A referenced user does not exist.
    #[error("user {0} not found")]
    UserNotFound(UserId),
}

impl TaskServiceError {
    /// Classifies the error so callers can tell "not allowed" from "not
    /// legal now" from "does not exist".
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Domain(err) => match err {
                TaskDomainError::EmptyTitle
                | TaskDomainError::TitleTooLong { .. }
                | TaskDomainError::InvalidHours { .. }
                | TaskDomainError::EmptyReason => ErrorKind::Validation,
                TaskDomainError::InvalidTransition { .. } => ErrorKind::InvalidTransition,
                TaskDomainError::Forbidden { .. } => ErrorKind::Forbidden,
                TaskDomainError::InactiveAssignee(_)
                | TaskDomainError::AlreadyAssigned { .. }
                | TaskDomainError::RequestNotPending { .. } => ErrorKind::InvalidState,
            },
            Self::Store(err) => match err {
                TaskStoreError::TaskNotFound(_) | TaskStoreError::RequestNotFound(_) => {
                    ErrorKind::NotFound
                }
                TaskStoreError::StatusConflict { .. } => ErrorKind::InvalidTransition,
                TaskStoreError::ConcurrentModification(_)
                | TaskStoreError::PendingRequestExists(_) => ErrorKind::Conflict,
                TaskStoreError::RequestAlreadyResolved(_) => ErrorKind::InvalidState,
                TaskStoreError::Persistence(_) => ErrorKind::Internal,
            },
            Self::TaskNotFound(_) | Self::RequestNotFound(_) | Self::UserNotFound(_) => {
                ErrorKind::NotFound
            }
            Self::Directory(_) | Self::Notification(_) | Self::Template(_) => ErrorKind::Internal,
        }
    }
}

/// Result type for task service operations.
pub type TaskServiceResult<T> = Result<T, TaskServiceError>;
