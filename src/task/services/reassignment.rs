//! Reassignment approval workflow.

use super::{TaskServiceError, TaskServiceResult, notices};
use crate::identity::{
    domain::{Actor, UserId},
    ports::UserDirectory,
};
use crate::notification::ports::NotificationDispatcher;
use crate::task::{
    domain::{
        NewReassignmentRequest, ReassignmentDecision, ReassignmentId, ReassignmentRequest, Task,
        TaskDomainError, TaskId,
    },
    ports::{AssignmentDraft, ReassignmentResolution, ResolutionCommit, TaskStore},
};
use mockable::Clock;
use std::sync::Arc;

/// Lets an assignee propose handing a task over, subject to an admin
/// decision.
#[derive(Clone)]
pub struct ReassignmentWorkflow<S, U, D, C>
where
    S: TaskStore,
    U: UserDirectory,
    D: NotificationDispatcher,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    users: Arc<U>,
    dispatcher: Arc<D>,
    clock: Arc<C>,
}

impl<S, U, D, C> ReassignmentWorkflow<S, U, D, C>
where
    S: TaskStore,
    U: UserDirectory,
    D: NotificationDispatcher,
    C: Clock + Send + Sync,
{
    /// Creates a reassignment workflow.
    #[must_use]
    pub const fn new(store: Arc<S>, users: Arc<U>, dispatcher: Arc<D>, clock: Arc<C>) -> Self {
        Self {
            store,
            users,
            dispatcher,
            clock,
        }
    }

    async fn find_task(&self, task_id: TaskId) -> TaskServiceResult<Task> {
        self.store
            .find_task(task_id)
            .await?
            .ok_or(TaskServiceError::TaskNotFound(task_id))
    }

    /// Fails unless `user` exists and is active.
    async fn ensure_assignable(&self, user: UserId) -> TaskServiceResult<()> {
        let found = self
            .users
            .find_by_id(user)
            .await?
            .ok_or(TaskServiceError::UserNotFound(user))?;
        if !found.active {
            return Err(TaskDomainError::InactiveAssignee(user).into());
        }
        Ok(())
    }

    /// Opens a pending request to move `task_id` to `proposed_assignee`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::TaskNotFound`], a forbidden domain error
    /// when `actor` is not the current assignee, validation errors for an
    /// empty reason, [`TaskServiceError::UserNotFound`] or an
    /// invalid-state domain error for an unusable proposed assignee, and a
    /// store conflict when a pending request already exists.
    pub async fn request(
        &self,
        task_id: TaskId,
        actor: Actor,
        proposed_assignee: UserId,
        reason: impl Into<String>,
    ) -> TaskServiceResult<ReassignmentRequest> {
        let task = self.find_task(task_id).await?;
        if actor.user_id != task.assigned_to() {
            return Err(TaskDomainError::Forbidden {
                actor: actor.user_id,
                action: "request reassignment of a task assigned to someone else",
            }
            .into());
        }
        let new_request = NewReassignmentRequest::new(
            task_id,
            actor.user_id,
            proposed_assignee,
            reason,
            self.clock.utc(),
        )?;
        if proposed_assignee == task.assigned_to() {
            return Err(TaskDomainError::AlreadyAssigned {
                task_id,
                user_id: proposed_assignee,
            }
            .into());
        }
        self.ensure_assignable(proposed_assignee).await?;

        let stored = self.store.open_reassignment(new_request).await?;
        tracing::info!(
            request_id = %stored.id(),
            task_id = %task_id,
            requested_by = %actor.user_id,
            proposed_assignee = %proposed_assignee,
            "reassignment requested"
        );
        Ok(stored)
    }

    /// Records an admin decision on a pending request.
    ///
    /// Approval moves the task to the proposed assignee, appends one audit
    /// trail entry and notifies both the previous and the new assignee.
    /// Rejection notifies the requester with the admin comment.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::RequestNotFound`] or
    /// [`TaskServiceError::TaskNotFound`], a forbidden domain error for
    /// non-admins, and an invalid-state error when the request is no longer
    /// pending or the proposed assignee can no longer take the task.
    pub async fn resolve(
        &self,
        request_id: ReassignmentId,
        admin: Actor,
        decision: ReassignmentDecision,
        comment: Option<String>,
    ) -> TaskServiceResult<ResolutionCommit> {
        let mut request = self.find(request_id).await?;
        let resolved_at = self.clock.utc();
        request.resolve(admin, decision, comment.clone(), resolved_at)?;
        let task = self.find_task(request.task_id()).await?;

        let (assignment, notifications) = match decision {
            ReassignmentDecision::Approve => {
                let previous = task.assigned_to();
                let proposed = request.proposed_assignee();
                if proposed == previous {
                    return Err(TaskDomainError::AlreadyAssigned {
                        task_id: task.id(),
                        user_id: proposed,
                    }
                    .into());
                }
                self.ensure_assignable(proposed).await?;
                let new_name = notices::display_name(&*self.users, proposed).await?;
                let previous_name = notices::display_name(&*self.users, previous).await?;
                let notifications = vec![
                    notices::reassignment_approved(
                        &task,
                        previous,
                        &new_name,
                        comment.as_deref(),
                    )?,
                    notices::task_reassigned(&task, proposed, &previous_name)?,
                ];
                let assignment = AssignmentDraft {
                    from: previous,
                    to: proposed,
                    changed_by: admin.user_id,
                    comment,
                };
                (Some(assignment), notifications)
            }
            ReassignmentDecision::Reject => (
                None,
                vec![notices::reassignment_rejected(
                    &task,
                    request.requested_by(),
                    comment.as_deref(),
                )?],
            ),
        };

        let commit = self
            .store
            .resolve_reassignment(ReassignmentResolution {
                request,
                resolved_at,
                assignment,
                notifications,
            })
            .await?;
        tracing::info!(
            request_id = %request_id,
            task_id = %task.id(),
            admin = %admin.user_id,
            decision = ?decision,
            "reassignment resolved"
        );
        self.dispatcher.dispatch(&commit.notifications);
        Ok(commit)
    }

    /// Returns all pending requests, newest first.
    ///
    /// # Errors
    ///
    /// Returns store errors.
    pub async fn list_pending(&self) -> TaskServiceResult<Vec<ReassignmentRequest>> {
        Ok(self.store.list_pending_reassignments().await?)
    }

    /// Returns a request.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::RequestNotFound`] for unknown requests.
    pub async fn find(&self, request_id: ReassignmentId) -> TaskServiceResult<ReassignmentRequest> {
        self.store
            .find_reassignment(request_id)
            .await?
            .ok_or(TaskServiceError::RequestNotFound(request_id))
    }
}
