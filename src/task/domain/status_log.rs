//! Append-only audit trail of status and assignment changes.

use super::{StatusLogId, TaskId, TaskStatus};
use crate::identity::domain::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Assignee change documented by a reassignment log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentChange {
    /// Previous assignee.
    pub from: UserId,
    /// New assignee.
    pub to: UserId,
}

/// Log entry that has not been stored yet. The store supplies the task id
/// and the entry id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStatusLogEntry {
    /// Status after the change.
    pub status: TaskStatus,
    /// Status before the change; `None` for task creation.
    pub previous_status: Option<TaskStatus>,
    /// Acting user.
    pub changed_by: UserId,
    /// Optional comment.
    pub comment: Option<String>,
    /// Assignment change, for reassignment entries only.
    pub assignment: Option<AssignmentChange>,
    /// Timestamp of the change.
    pub created_at: DateTime<Utc>,
}

impl NewStatusLogEntry {
    /// Entry for the implicit creation transition into `Pending`.
    #[must_use]
    pub const fn creation(created_by: UserId, created_at: DateTime<Utc>) -> Self {
        Self {
            status: TaskStatus::Pending,
            previous_status: None,
            changed_by: created_by,
            comment: None,
            assignment: None,
            created_at,
        }
    }

    /// Entry for a status transition.
    #[must_use]
    pub const fn transition(
        from: TaskStatus,
        to: TaskStatus,
        changed_by: UserId,
        comment: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            status: to,
            previous_status: Some(from),
            changed_by,
            comment,
            assignment: None,
            created_at,
        }
    }

    /// Entry for an approved reassignment. The status is unchanged.
    #[must_use]
    pub const fn reassignment(
        current: TaskStatus,
        assignment: AssignmentChange,
        changed_by: UserId,
        comment: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            status: current,
            previous_status: Some(current),
            changed_by,
            comment,
            assignment: Some(assignment),
            created_at,
        }
    }
}

/// Stored audit trail entry. Never updated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusLogEntry {
    /// Entry identifier.
    pub id: StatusLogId,
    /// Task the entry documents.
    pub task_id: TaskId,
    /// Status after the change.
    pub status: TaskStatus,
    /// Status before the change; `None` for task creation.
    pub previous_status: Option<TaskStatus>,
    /// Acting user.
    pub changed_by: UserId,
    /// Optional comment.
    pub comment: Option<String>,
    /// Assignment change, for reassignment entries only.
    pub assignment: Option<AssignmentChange>,
    /// Timestamp of the change.
    pub created_at: DateTime<Utc>,
}

impl StatusLogEntry {
    /// Materializes a stored entry.
    #[must_use]
    pub fn from_new(id: StatusLogId, task_id: TaskId, entry: NewStatusLogEntry) -> Self {
        Self {
            id,
            task_id,
            status: entry.status,
            previous_status: entry.previous_status,
            changed_by: entry.changed_by,
            comment: entry.comment,
            assignment: entry.assignment,
            created_at: entry.created_at,
        }
    }

    /// Returns `true` for entries documenting a reassignment rather than a
    /// status transition.
    #[must_use]
    pub const fn is_assignment_change(&self) -> bool {
        self.assignment.is_some()
    }
}
