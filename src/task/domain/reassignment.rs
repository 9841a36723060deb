//! Reassignment approval workflow.

use super::{ParseReassignmentStatusError, ReassignmentId, TaskDomainError, TaskId};
use crate::identity::domain::{Actor, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a reassignment request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReassignmentStatus {
    /// Awaiting an admin decision.
    Pending,
    /// Approved; the task moved to the proposed assignee.
    Approved,
    /// Rejected; the assignment is unchanged.
    Rejected,
}

impl ReassignmentStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ReassignmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ReassignmentStatus {
    type Error = ParseReassignmentStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            _ => Err(ParseReassignmentStatusError(value.to_owned())),
        }
    }
}

/// Admin decision on a pending request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReassignmentDecision {
    /// Move the task to the proposed assignee.
    Approve,
    /// Keep the current assignment.
    Reject,
}

/// Validated request that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReassignmentRequest {
    /// Task to reassign.
    pub task_id: TaskId,
    /// Current assignee asking to hand the task over.
    pub requested_by: UserId,
    /// Proposed new assignee.
    pub proposed_assignee: UserId,
    /// Why the task should move.
    pub reason: String,
    /// Request timestamp.
    pub requested_at: DateTime<Utc>,
}

impl NewReassignmentRequest {
    /// Creates a request payload.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyReason`] for a blank reason.
    pub fn new(
        task_id: TaskId,
        requested_by: UserId,
        proposed_assignee: UserId,
        reason: impl Into<String>,
        requested_at: DateTime<Utc>,
    ) -> Result<Self, TaskDomainError> {
        let raw_reason = reason.into();
        let trimmed = raw_reason.trim();
        if trimmed.is_empty() {
            return Err(TaskDomainError::EmptyReason);
        }
        Ok(Self {
            task_id,
            requested_by,
            proposed_assignee,
            reason: trimmed.to_owned(),
            requested_at,
        })
    }
}

/// Stored reassignment request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReassignmentRequest {
    id: ReassignmentId,
    task_id: TaskId,
    requested_by: UserId,
    proposed_assignee: UserId,
    reason: String,
    status: ReassignmentStatus,
    handled_by: Option<UserId>,
    admin_comment: Option<String>,
    requested_at: DateTime<Utc>,
    handled_at: Option<DateTime<Utc>>,
}

/// Parameter object for reconstructing a persisted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedReassignmentData {
    /// Request identifier.
    pub id: ReassignmentId,
    /// Task to reassign.
    pub task_id: TaskId,
    /// Requesting user.
    pub requested_by: UserId,
    /// Proposed assignee.
    pub proposed_assignee: UserId,
    /// Reason text.
    pub reason: String,
    /// Request status.
    pub status: ReassignmentStatus,
    /// Handling admin.
    pub handled_by: Option<UserId>,
    /// Admin comment.
    pub admin_comment: Option<String>,
    /// Request timestamp.
    pub requested_at: DateTime<Utc>,
    /// Decision timestamp.
    pub handled_at: Option<DateTime<Utc>>,
}

impl ReassignmentRequest {
    /// Materializes a new pending request once storage allocated its id.
    #[must_use]
    pub fn from_new(id: ReassignmentId, new: NewReassignmentRequest) -> Self {
        Self {
            id,
            task_id: new.task_id,
            requested_by: new.requested_by,
            proposed_assignee: new.proposed_assignee,
            reason: new.reason,
            status: ReassignmentStatus::Pending,
            handled_by: None,
            admin_comment: None,
            requested_at: new.requested_at,
            handled_at: None,
        }
    }

    /// Reconstructs a request from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedReassignmentData) -> Self {
        Self {
            id: data.id,
            task_id: data.task_id,
            requested_by: data.requested_by,
            proposed_assignee: data.proposed_assignee,
            reason: data.reason,
            status: data.status,
            handled_by: data.handled_by,
            admin_comment: data.admin_comment,
            requested_at: data.requested_at,
            handled_at: data.handled_at,
        }
    }

    /// Returns the request identifier.
    #[must_use]
    pub const fn id(&self) -> ReassignmentId {
        self.id
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the requesting user.
    #[must_use]
    pub const fn requested_by(&self) -> UserId {
        self.requested_by
    }

    /// Returns the proposed assignee.
    #[must_use]
    pub const fn proposed_assignee(&self) -> UserId {
        self.proposed_assignee
    }

    /// Returns the reason text.
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Returns the request status.
    #[must_use]
    pub const fn status(&self) -> ReassignmentStatus {
        self.status
    }

    /// Returns the handling admin.
    #[must_use]
    pub const fn handled_by(&self) -> Option<UserId> {
        self.handled_by
    }

    /// Returns the admin comment.
    #[must_use]
    pub fn admin_comment(&self) -> Option<&str> {
        self.admin_comment.as_deref()
    }

    /// Returns the request timestamp.
    #[must_use]
    pub const fn requested_at(&self) -> DateTime<Utc> {
        self.requested_at
    }

    /// Returns the decision timestamp.
    #[must_use]
    pub const fn handled_at(&self) -> Option<DateTime<Utc>> {
        self.handled_at
    }

    /// Records an admin decision. A request is resolved exactly once.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::Forbidden`] for non-admins and
    /// [`TaskDomainError::RequestNotPending`] when already resolved.
    pub fn resolve(
        &mut self,
        admin: Actor,
        decision: ReassignmentDecision,
        comment: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<(), TaskDomainError> {
        if !admin.is_admin() {
            return Err(TaskDomainError::Forbidden {
                actor: admin.user_id,
                action: "resolve reassignment requests",
            });
        }
        if self.status != ReassignmentStatus::Pending {
            return Err(TaskDomainError::RequestNotPending {
                request_id: self.id,
                status: self.status,
            });
        }
        self.status = match decision {
            ReassignmentDecision::Approve => ReassignmentStatus::Approved,
            ReassignmentDecision::Reject => ReassignmentStatus::Rejected,
        };
        self.handled_by = Some(admin.user_id);
        self.admin_comment = comment;
        self.handled_at = Some(at);
        Ok(())
    }
}
