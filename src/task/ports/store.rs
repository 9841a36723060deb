//! Unit-of-work port for tasks, their audit trail, reassignment requests,
//! and the notifications those mutations create.

use crate::identity::domain::UserId;
use crate::notification::domain::{NewNotification, Notification};
use crate::task::domain::{
    NewReassignmentRequest, NewStatusLogEntry, ReassignmentId, ReassignmentRequest,
    StatusLogEntry, Task, TaskDraft, TaskId, TaskStatus,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for task store operations.
pub type TaskStoreResult<T> = Result<T, TaskStoreError>;

/// Input for [`TaskStore::create`].
///
/// Notifications are linked to the newly allocated task id by the store.
#[derive(Debug, Clone)]
pub struct TaskCreation {
    /// Validated task draft.
    pub draft: TaskDraft,
    /// Creation timestamp shared by the task, its log entry, and its
    /// notifications.
    pub created_at: DateTime<Utc>,
    /// Notifications to insert alongside the task.
    pub notifications: Vec<NewNotification>,
}

/// Input for [`TaskStore::apply_status_change`].
#[derive(Debug, Clone)]
pub struct StatusChange {
    /// Task with the new status already applied.
    pub task: Task,
    /// Status the transition was validated against.
    pub expected_status: TaskStatus,
    /// Assignee the authority check was made against.
    pub expected_assignee: UserId,
    /// Audit trail entry documenting the change.
    pub log_entry: NewStatusLogEntry,
    /// Notifications created by the change.
    pub notifications: Vec<NewNotification>,
}

/// Assignment change applied when a reassignment is approved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentDraft {
    /// Assignee the request was validated against.
    pub from: UserId,
    /// New assignee.
    pub to: UserId,
    /// Approving admin.
    pub changed_by: UserId,
    /// Admin comment copied into the audit trail.
    pub comment: Option<String>,
}

/// Input for [`TaskStore::resolve_reassignment`].
#[derive(Debug, Clone)]
pub struct ReassignmentResolution {
    /// Request with the decision already recorded.
    pub request: ReassignmentRequest,
    /// Decision timestamp shared by the log entry and notifications.
    pub resolved_at: DateTime<Utc>,
    /// Assignment change for approvals; `None` for rejections.
    pub assignment: Option<AssignmentDraft>,
    /// Notifications created by the decision.
    pub notifications: Vec<NewNotification>,
}

/// Committed result of a task mutation.
#[derive(Debug, Clone)]
pub struct TaskCommit {
    /// Task as stored.
    pub task: Task,
    /// Appended audit trail entry.
    pub log_entry: StatusLogEntry,
    /// Notifications inserted in the same unit of work.
    pub notifications: Vec<Notification>,
}

/// Committed result of a reassignment decision.
#[derive(Debug, Clone)]
pub struct ResolutionCommit {
    /// Request as stored.
    pub request: ReassignmentRequest,
    /// Reassigned task, for approvals.
    pub task: Option<Task>,
    /// Assignment log entry, for approvals.
    pub log_entry: Option<StatusLogEntry>,
    /// Notifications inserted in the same unit of work.
    pub notifications: Vec<Notification>,
}

/// Task persistence contract.
///
/// Every mutating method is atomic: on error nothing is written.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Inserts a task with its creation log entry and notifications.
    async fn create(&self, creation: TaskCreation) -> TaskStoreResult<TaskCommit>;

    /// Applies a validated status change.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::StatusConflict`] when the stored status no
    /// longer matches `expected_status`, and
    /// [`TaskStoreError::ConcurrentModification`] when the assignee changed.
    async fn apply_status_change(&self, change: StatusChange) -> TaskStoreResult<TaskCommit>;

    /// Opens a pending reassignment request.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::PendingRequestExists`] when the task
    /// already has a pending request.
    async fn open_reassignment(
        &self,
        request: NewReassignmentRequest,
    ) -> TaskStoreResult<ReassignmentRequest>;

    /// Records a decision on a pending request.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::RequestAlreadyResolved`] when the request
    /// is no longer pending, and
    /// [`TaskStoreError::ConcurrentModification`] when an approval finds a
    /// different assignee than the one it was validated against.
    async fn resolve_reassignment(
        &self,
        resolution: ReassignmentResolution,
    ) -> TaskStoreResult<ResolutionCommit>;

    /// Finds a task by identifier.
    async fn find_task(&self, id: TaskId) -> TaskStoreResult<Option<Task>>;

    /// Finds a reassignment request by identifier.
    async fn find_reassignment(
        &self,
        id: ReassignmentId,
    ) -> TaskStoreResult<Option<ReassignmentRequest>>;

    /// Returns the audit trail of a task, oldest first.
    async fn status_log(&self, task_id: TaskId) -> TaskStoreResult<Vec<StatusLogEntry>>;

    /// Returns the pending request for a task, if any.
    async fn pending_reassignment(
        &self,
        task_id: TaskId,
    ) -> TaskStoreResult<Option<ReassignmentRequest>>;

    /// Returns all pending requests, newest first.
    async fn list_pending_reassignments(&self) -> TaskStoreResult<Vec<ReassignmentRequest>>;

    /// Returns the tasks assigned to a user, by scheduled date.
    async fn tasks_assigned_to(&self, user: UserId) -> TaskStoreResult<Vec<Task>>;
}

/// Errors returned by task store implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskStoreError {
    /// The task was not found.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    /// The reassignment request was not found.
    #[error("reassignment request not found: {0}")]
    RequestNotFound(ReassignmentId),

    /// The task status changed after the transition was validated.
    #[error("task {task_id} is {actual}, expected {expected}")]
    StatusConflict {
        /// Task being transitioned.
        task_id: TaskId,
        /// Status the transition was validated against.
        expected: TaskStatus,
        /// Status found in storage.
        actual: TaskStatus,
    },

    /// The task assignment changed after the operation was validated.
    #[error("task {0} was modified concurrently")]
    ConcurrentModification(TaskId),

    /// The task already has a pending reassignment request.
    #[error("task {0} already has a pending reassignment request")]
    PendingRequestExists(TaskId),

    /// The request was resolved by someone else first.
    #[error("reassignment request {0} is already resolved")]
    RequestAlreadyResolved(ReassignmentId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskStoreError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
