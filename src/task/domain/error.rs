//! Error types for task domain rules, validation, and parsing.

use super::{ReassignmentId, ReassignmentStatus, TaskId, TaskStatus};
use crate::identity::domain::UserId;
use thiserror::Error;

/// Errors returned by task domain rules.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// The task title is empty after trimming.
    #[error("task title must not be empty")]
    EmptyTitle,

    /// The task title exceeds the stored column width.
    #[error("task title is {actual} characters long; the limit is {max}")]
    TitleTooLong {
        /// Largest accepted length in characters.
        max: usize,
        /// Length of the trimmed title.
        actual: usize,
    },

    /// An hours value is negative or not finite.
    #[error("{field} must be a finite, non-negative number of hours")]
    InvalidHours {
        /// Name of the offending field.
        field: &'static str,
    },

    /// The target status is not a legal successor of the current status.
    #[error("invalid transition for task {task_id}: {from} -> {to}")]
    InvalidTransition {
        /// Task being transitioned.
        task_id: TaskId,
        /// Status the task is in.
        from: TaskStatus,
        /// Requested target status.
        to: TaskStatus,
    },

    /// The actor lacks authority for the requested mutation.
    #[error("user {actor} is not allowed to {action}")]
    Forbidden {
        /// Acting user.
        actor: UserId,
        /// Description of the refused action.
        action: &'static str,
    },

    /// The assignee is deactivated and cannot take on tasks.
    #[error("user {0} is inactive and cannot be assigned tasks")]
    InactiveAssignee(UserId),

    /// A reassignment would leave the assignee unchanged.
    #[error("task {task_id} is already assigned to user {user_id}")]
    AlreadyAssigned {
        /// Task in question.
        task_id: TaskId,
        /// Current and proposed assignee.
        user_id: UserId,
    },

    /// The reassignment reason is empty after trimming.
    #[error("reassignment reason must not be empty")]
    EmptyReason,

    /// The reassignment request has already been resolved.
    #[error("reassignment request {request_id} is {status}, not pending")]
    RequestNotPending {
        /// Request identifier.
        request_id: ReassignmentId,
        /// Current request status.
        status: ReassignmentStatus,
    },
}

/// Error returned while parsing task statuses.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task status: {0}")]
pub struct ParseTaskStatusError(pub String);

/// Error returned while parsing task priorities.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task priority: {0}")]
pub struct ParsePriorityError(pub String);

/// Error returned while parsing reassignment request statuses.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown reassignment status: {0}")]
pub struct ParseReassignmentStatusError(pub String);
