//! Task aggregate root.

use super::{ParsePriorityError, TaskDomainError, TaskId, TaskStatus, TransitionAuthority};
use crate::identity::domain::{Actor, UserId};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Task priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Low priority.
    Low,
    /// Medium priority.
    #[default]
    Medium,
    /// High priority.
    High,
}

impl Priority {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl TryFrom<&str> for Priority {
    type Error = ParsePriorityError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(ParsePriorityError(value.to_owned())),
        }
    }
}

fn validate_hours(value: Option<f64>, field: &'static str) -> Result<Option<f64>, TaskDomainError> {
    match value {
        Some(hours) if !hours.is_finite() || hours.is_sign_negative() => {
            Err(TaskDomainError::InvalidHours { field })
        }
        other => Ok(other),
    }
}

/// Longest task title accepted, in characters.
pub const MAX_TITLE_LEN: usize = 255;

/// Validated attributes of a task that has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskDraft {
    title: String,
    details: String,
    scheduled_on: NaiveDate,
    priority: Priority,
    estimated_hours: Option<f64>,
    due_time: Option<NaiveTime>,
    assigned_to: UserId,
    created_by: UserId,
}

impl TaskDraft {
    /// Creates a task draft.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyTitle`] for blank titles and
    /// [`TaskDomainError::TitleTooLong`] for titles over [`MAX_TITLE_LEN`]
    /// characters.
    pub fn new(
        title: impl Into<String>,
        details: impl Into<String>,
        scheduled_on: NaiveDate,
        assigned_to: UserId,
        created_by: UserId,
    ) -> Result<Self, TaskDomainError> {
        let raw_title = title.into();
        let trimmed = raw_title.trim();
        if trimmed.is_empty() {
            return Err(TaskDomainError::EmptyTitle);
        }
        let length = trimmed.chars().count();
        if length > MAX_TITLE_LEN {
            return Err(TaskDomainError::TitleTooLong {
                max: MAX_TITLE_LEN,
                actual: length,
            });
        }
        Ok(Self {
            title: trimmed.to_owned(),
            details: details.into(),
            scheduled_on,
            priority: Priority::default(),
            estimated_hours: None,
            due_time: None,
            assigned_to,
            created_by,
        })
    }

    /// Sets the priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the estimated effort.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidHours`] for negative or non-finite
    /// values.
    pub fn with_estimated_hours(mut self, hours: f64) -> Result<Self, TaskDomainError> {
        self.estimated_hours = validate_hours(Some(hours), "estimated hours")?;
        Ok(self)
    }

    /// Sets the due time on the scheduled date.
    #[must_use]
    pub const fn with_due_time(mut self, due_time: NaiveTime) -> Self {
        self.due_time = Some(due_time);
        self
    }

    /// Returns the title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the assignee.
    #[must_use]
    pub const fn assigned_to(&self) -> UserId {
        self.assigned_to
    }

    /// Returns the creator.
    #[must_use]
    pub const fn created_by(&self) -> UserId {
        self.created_by
    }

    /// Returns the scheduled date.
    #[must_use]
    pub const fn scheduled_on(&self) -> NaiveDate {
        self.scheduled_on
    }

    /// Returns the details text.
    #[must_use]
    pub fn details(&self) -> &str {
        &self.details
    }

    /// Returns the priority.
    #[must_use]
    pub const fn priority(&self) -> Priority {
        self.priority
    }

    /// Returns the estimated effort.
    #[must_use]
    pub const fn estimated_hours(&self) -> Option<f64> {
        self.estimated_hours
    }

    /// Returns the due time.
    #[must_use]
    pub const fn due_time(&self) -> Option<NaiveTime> {
        self.due_time
    }
}

/// Extra data recorded with a transition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransitionDetails {
    /// Free-text comment stored in the audit trail.
    pub comment: Option<String>,
    /// Hours actually spent, accepted when moving to `Done`.
    pub actual_hours: Option<f64>,
}

/// Task aggregate root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    title: String,
    details: String,
    scheduled_on: NaiveDate,
    priority: Priority,
    estimated_hours: Option<f64>,
    actual_hours: Option<f64>,
    due_time: Option<NaiveTime>,
    status: TaskStatus,
    completion_notes: Option<String>,
    assigned_to: UserId,
    created_by: UserId,
    approved_by: Option<UserId>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted task aggregate.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedTaskData {
    /// Task identifier.
    pub id: TaskId,
    /// Title.
    pub title: String,
    /// Free-text details.
    pub details: String,
    /// Calendar date the task is scheduled for.
    pub scheduled_on: NaiveDate,
    /// Priority.
    pub priority: Priority,
    /// Estimated effort in hours.
    pub estimated_hours: Option<f64>,
    /// Actual effort in hours.
    pub actual_hours: Option<f64>,
    /// Due time on the scheduled date.
    pub due_time: Option<NaiveTime>,
    /// Current status.
    pub status: TaskStatus,
    /// Notes recorded on completion.
    pub completion_notes: Option<String>,
    /// Assignee.
    pub assigned_to: UserId,
    /// Creator.
    pub created_by: UserId,
    /// Approving admin.
    pub approved_by: Option<UserId>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Latest mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Materializes a newly created task once storage allocated its id.
    #[must_use]
    pub fn from_draft(id: TaskId, draft: TaskDraft, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            title: draft.title,
            details: draft.details,
            scheduled_on: draft.scheduled_on,
            priority: draft.priority,
            estimated_hours: draft.estimated_hours,
            actual_hours: None,
            due_time: draft.due_time,
            status: TaskStatus::Pending,
            completion_notes: None,
            assigned_to: draft.assigned_to,
            created_by: draft.created_by,
            approved_by: None,
            created_at,
            updated_at: created_at,
        }
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            title: data.title,
            details: data.details,
            scheduled_on: data.scheduled_on,
            priority: data.priority,
            estimated_hours: data.estimated_hours,
            actual_hours: data.actual_hours,
            due_time: data.due_time,
            status: data.status,
            completion_notes: data.completion_notes,
            assigned_to: data.assigned_to,
            created_by: data.created_by,
            approved_by: data.approved_by,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the free-text details.
    #[must_use]
    pub fn details(&self) -> &str {
        &self.details
    }

    /// Returns the scheduled date.
    #[must_use]
    pub const fn scheduled_on(&self) -> NaiveDate {
        self.scheduled_on
    }

    /// Returns the priority.
    #[must_use]
    pub const fn priority(&self) -> Priority {
        self.priority
    }

    /// Returns the estimated effort.
    #[must_use]
    pub const fn estimated_hours(&self) -> Option<f64> {
        self.estimated_hours
    }

    /// Returns the recorded effort.
    #[must_use]
    pub const fn actual_hours(&self) -> Option<f64> {
        self.actual_hours
    }

    /// Returns the due time.
    #[must_use]
    pub const fn due_time(&self) -> Option<NaiveTime> {
        self.due_time
    }

    /// Returns the current status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the completion notes.
    #[must_use]
    pub fn completion_notes(&self) -> Option<&str> {
        self.completion_notes.as_deref()
    }

    /// Returns the assignee.
    #[must_use]
    pub const fn assigned_to(&self) -> UserId {
        self.assigned_to
    }

    /// Returns the creator.
    #[must_use]
    pub const fn created_by(&self) -> UserId {
        self.created_by
    }

    /// Returns the admin who approved the task.
    #[must_use]
    pub const fn approved_by(&self) -> Option<UserId> {
        self.approved_by
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest mutation timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Checks that `actor` may move this task to `target`.
    ///
    /// Legality is checked first, so an illegal move is reported as
    /// [`TaskDomainError::InvalidTransition`] whoever asks.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidTransition`] or
    /// [`TaskDomainError::Forbidden`].
    pub fn ensure_can_transition(
        &self,
        actor: Actor,
        target: TaskStatus,
    ) -> Result<(), TaskDomainError> {
        let authority =
            self.status
                .authority_for(target)
                .ok_or(TaskDomainError::InvalidTransition {
                    task_id: self.id,
                    from: self.status,
                    to: target,
                })?;
        let permitted = match authority {
            TransitionAuthority::Assignee => actor.is_admin() || actor.user_id == self.assigned_to,
            TransitionAuthority::Admin => actor.is_admin(),
        };
        if !permitted {
            return Err(TaskDomainError::Forbidden {
                actor: actor.user_id,
                action: match authority {
                    TransitionAuthority::Assignee => {
                        "change the status of a task assigned to someone else"
                    }
                    TransitionAuthority::Admin => "perform an admin-only status transition",
                },
            });
        }
        Ok(())
    }

    /// Moves the task to `target` and returns the previous status.
    ///
    /// Moving to `Done` records the comment as completion notes and accepts
    /// the actual hours; moving to `Approved` records the approving admin.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidTransition`],
    /// [`TaskDomainError::Forbidden`], or [`TaskDomainError::InvalidHours`].
    pub fn transition_to(
        &mut self,
        actor: Actor,
        target: TaskStatus,
        details: &TransitionDetails,
        clock: &impl Clock,
    ) -> Result<TaskStatus, TaskDomainError> {
        self.ensure_can_transition(actor, target)?;
        let actual_hours = validate_hours(details.actual_hours, "actual hours")?;

        match target {
            TaskStatus::Done => {
                self.completion_notes.clone_from(&details.comment);
                if actual_hours.is_some() {
                    self.actual_hours = actual_hours;
                }
            }
            TaskStatus::Approved => self.approved_by = Some(actor.user_id),
            TaskStatus::Pending | TaskStatus::OnProgress | TaskStatus::OnHold => {}
        }

        let previous = self.status;
        self.status = target;
        self.touch(clock);
        Ok(previous)
    }

    /// Hands the task to a new assignee.
    pub(crate) const fn reassign(&mut self, new_assignee: UserId, at: DateTime<Utc>) {
        self.assigned_to = new_assignee;
        self.updated_at = at;
    }

    /// Updates the `updated_at` timestamp to the current clock time.
    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}
