//! Status transition engine: task creation and every status change.

use super::{TaskServiceError, TaskServiceResult, notices};
use crate::identity::{
    domain::{Actor, UserId},
    ports::UserDirectory,
};
use crate::notification::ports::NotificationDispatcher;
use crate::task::{
    domain::{
        NewStatusLogEntry, Priority, StatusLogEntry, Task, TaskDomainError, TaskDraft, TaskId,
        TaskStatus, TransitionDetails,
    },
    ports::{StatusChange, TaskCommit, TaskCreation, TaskStore, TaskStoreError},
};
use chrono::{NaiveDate, NaiveTime};
use mockable::Clock;
use std::sync::Arc;

/// Request payload for creating a task.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateTaskRequest {
    title: String,
    details: String,
    scheduled_on: NaiveDate,
    assigned_to: UserId,
    priority: Priority,
    estimated_hours: Option<f64>,
    due_time: Option<NaiveTime>,
}

impl CreateTaskRequest {
    /// Creates a request with required fields and medium priority.
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        details: impl Into<String>,
        scheduled_on: NaiveDate,
        assigned_to: UserId,
    ) -> Self {
        Self {
            title: title.into(),
            details: details.into(),
            scheduled_on,
            assigned_to,
            priority: Priority::default(),
            estimated_hours: None,
            due_time: None,
        }
    }

    /// Sets the priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the estimated effort in hours.
    #[must_use]
    pub const fn with_estimated_hours(mut self, hours: f64) -> Self {
        self.estimated_hours = Some(hours);
        self
    }

    /// Sets the due time.
    #[must_use]
    pub const fn with_due_time(mut self, due_time: NaiveTime) -> Self {
        self.due_time = Some(due_time);
        self
    }
}

/// Sole authority for creating tasks and changing their status.
///
/// Each mutation is committed as one unit of work together with its audit
/// trail entry and notifications; notifications are handed to the
/// dispatcher only after the commit.
#[derive(Clone)]
pub struct StatusTransitionEngine<S, U, D, C>
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

impl<S, U, D, C> StatusTransitionEngine<S, U, D, C>
where
    S: TaskStore,
    U: UserDirectory,
    D: NotificationDispatcher,
    C: Clock + Send + Sync,
{
    /// Creates a transition engine.
    #[must_use]
    pub const fn new(store: Arc<S>, users: Arc<U>, dispatcher: Arc<D>, clock: Arc<C>) -> Self {
        Self {
            store,
            users,
            dispatcher,
            clock,
        }
    }

    /// Creates a task in `Pending`, recording the creation in the audit
    /// trail and notifying the assignee unless they created it themselves.
    ///
    /// # Errors
    ///
    /// Returns a forbidden domain error for non-admins,
    /// [`TaskServiceError::UserNotFound`] for an unknown assignee, an
    /// inactive-assignee domain error, or validation and store errors.
    pub async fn create_task(
        &self,
        actor: Actor,
        request: CreateTaskRequest,
    ) -> TaskServiceResult<TaskCommit> {
        if !actor.is_admin() {
            return Err(TaskDomainError::Forbidden {
                actor: actor.user_id,
                action: "create tasks",
            }
            .into());
        }
        let CreateTaskRequest {
            title,
            details,
            scheduled_on,
            assigned_to,
            priority,
            estimated_hours,
            due_time,
        } = request;

        let mut draft = TaskDraft::new(title, details, scheduled_on, assigned_to, actor.user_id)?
            .with_priority(priority);
        if let Some(hours) = estimated_hours {
            draft = draft.with_estimated_hours(hours)?;
        }
        if let Some(time) = due_time {
            draft = draft.with_due_time(time);
        }

        let assignee = self
            .users
            .find_by_id(assigned_to)
            .await?
            .ok_or(TaskServiceError::UserNotFound(assigned_to))?;
        if !assignee.active {
            return Err(TaskDomainError::InactiveAssignee(assigned_to).into());
        }

        let mut notifications = Vec::new();
        if assigned_to != actor.user_id {
            let creator = notices::display_name(&*self.users, actor.user_id).await?;
            notifications.push(notices::task_assigned(&draft, &creator)?);
        }

        let commit = self
            .store
            .create(TaskCreation {
                draft,
                created_at: self.clock.utc(),
                notifications,
            })
            .await?;
        tracing::info!(
            task_id = %commit.task.id(),
            assignee = %assigned_to,
            created_by = %actor.user_id,
            "task created"
        );
        self.dispatcher.dispatch(&commit.notifications);
        Ok(commit)
    }

    /// Moves a task to `target`.
    ///
    /// Appends exactly one audit trail entry and, when the actor is not the
    /// assignee, notifies the assignee. Nothing is written on failure.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::TaskNotFound`] for unknown tasks, and an
    /// invalid-transition or forbidden domain error when the state machine
    /// or authority rules reject the move. Losing a race against a
    /// concurrent transition is reported as an invalid transition from the
    /// status the winner left behind.
    pub async fn transition(
        &self,
        task_id: TaskId,
        actor: Actor,
        target: TaskStatus,
        details: TransitionDetails,
    ) -> TaskServiceResult<TaskCommit> {
        let mut task = self.find_task(task_id).await?;
        let expected_assignee = task.assigned_to();
        let previous = task.transition_to(actor, target, &details, &*self.clock)?;

        let mut notifications = Vec::new();
        if actor.user_id != expected_assignee {
            let actor_name = notices::display_name(&*self.users, actor.user_id).await?;
            notifications.push(notices::status_updated(
                &task,
                previous,
                &actor_name,
                details.comment.as_deref(),
            )?);
        }

        let log_entry = NewStatusLogEntry::transition(
            previous,
            target,
            actor.user_id,
            details.comment,
            task.updated_at(),
        );
        let commit = self
            .store
            .apply_status_change(StatusChange {
                task,
                expected_status: previous,
                expected_assignee,
                log_entry,
                notifications,
            })
            .await
            .map_err(|err| match err {
                TaskStoreError::StatusConflict {
                    task_id: conflicted,
                    actual,
                    ..
                } => TaskServiceError::Domain(TaskDomainError::InvalidTransition {
                    task_id: conflicted,
                    from: actual,
                    to: target,
                }),
                other => TaskServiceError::Store(other),
            })?;

        tracing::info!(
            task_id = %task_id,
            from = %previous,
            to = %target,
            actor = %actor.user_id,
            "task status changed"
        );
        self.dispatcher.dispatch(&commit.notifications);
        Ok(commit)
    }

    /// Returns a task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::TaskNotFound`] for unknown tasks.
    pub async fn find_task(&self, task_id: TaskId) -> TaskServiceResult<Task> {
        self.store
            .find_task(task_id)
            .await?
            .ok_or(TaskServiceError::TaskNotFound(task_id))
    }

    /// Returns the audit trail of a task, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::TaskNotFound`] for unknown tasks.
    pub async fn history(&self, task_id: TaskId) -> TaskServiceResult<Vec<StatusLogEntry>> {
        self.find_task(task_id).await?;
        Ok(self.store.status_log(task_id).await?)
    }

    /// Returns the tasks assigned to `user`, by scheduled date.
    ///
    /// # Errors
    ///
    /// Returns store errors.
    pub async fn tasks_assigned_to(&self, user: UserId) -> TaskServiceResult<Vec<Task>> {
        Ok(self.store.tasks_assigned_to(user).await?)
    }
}
