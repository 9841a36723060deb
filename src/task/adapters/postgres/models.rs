//! Diesel row models for task persistence.

use super::schema::{reassignment_requests, status_logs, tasks};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use diesel::prelude::*;

/// Query result row for task records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskRow {
    /// Task identifier.
    pub id: i64,
    /// Title.
    pub title: String,
    /// Free-text details.
    pub details: String,
    /// Scheduled calendar date.
    pub scheduled_on: NaiveDate,
    /// Priority.
    pub priority: String,
    /// Estimated effort.
    pub estimated_hours: Option<f64>,
    /// Actual effort.
    pub actual_hours: Option<f64>,
    /// Due time.
    pub due_time: Option<NaiveTime>,
    /// Lifecycle status.
    pub status: String,
    /// Completion notes.
    pub completion_notes: Option<String>,
    /// Assignee.
    pub assigned_to: i64,
    /// Creator.
    pub created_by: i64,
    /// Approving admin.
    pub approved_by: Option<i64>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert model for task records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = tasks)]
pub struct NewTaskRow<'a> {
    /// Title.
    pub title: &'a str,
    /// Free-text details.
    pub details: &'a str,
    /// Scheduled calendar date.
    pub scheduled_on: NaiveDate,
    /// Priority.
    pub priority: &'a str,
    /// Estimated effort.
    pub estimated_hours: Option<f64>,
    /// Due time.
    pub due_time: Option<NaiveTime>,
    /// Lifecycle status.
    pub status: &'a str,
    /// Assignee.
    pub assigned_to: i64,
    /// Creator.
    pub created_by: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Query result row for audit trail entries.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = status_logs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct StatusLogRow {
    /// Entry identifier.
    pub id: i64,
    /// Task reference.
    pub task_id: i64,
    /// Status after the change.
    pub status: String,
    /// Status before the change.
    pub previous_status: Option<String>,
    /// Acting user.
    pub changed_by: i64,
    /// Comment.
    pub comment: Option<String>,
    /// Previous assignee.
    pub assigned_from: Option<i64>,
    /// New assignee.
    pub assigned_to: Option<i64>,
    /// Change timestamp.
    pub created_at: DateTime<Utc>,
}

/// Insert model for audit trail entries.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = status_logs)]
pub struct NewStatusLogRow<'a> {
    /// Task reference.
    pub task_id: i64,
    /// Status after the change.
    pub status: &'a str,
    /// Status before the change.
    pub previous_status: Option<&'a str>,
    /// Acting user.
    pub changed_by: i64,
    /// Comment.
    pub comment: Option<&'a str>,
    /// Previous assignee.
    pub assigned_from: Option<i64>,
    /// New assignee.
    pub assigned_to: Option<i64>,
    /// Change timestamp.
    pub created_at: DateTime<Utc>,
}

/// Query result row for reassignment requests.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = reassignment_requests)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ReassignmentRow {
    /// Request identifier.
    pub id: i64,
    /// Task reference.
    pub task_id: i64,
    /// Requesting assignee.
    pub requested_by: i64,
    /// Proposed assignee.
    pub proposed_assignee: i64,
    /// Reason.
    pub reason: String,
    /// Request status.
    pub status: String,
    /// Handling admin.
    pub handled_by: Option<i64>,
    /// Admin comment.
    pub admin_comment: Option<String>,
    /// Request timestamp.
    pub requested_at: DateTime<Utc>,
    /// Decision timestamp.
    pub handled_at: Option<DateTime<Utc>>,
}

/// Insert model for reassignment requests.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = reassignment_requests)]
pub struct NewReassignmentRow<'a> {
    /// Task reference.
    pub task_id: i64,
    /// Requesting assignee.
    pub requested_by: i64,
    /// Proposed assignee.
    pub proposed_assignee: i64,
    /// Reason.
    pub reason: &'a str,
    /// Request status.
    pub status: &'a str,
    /// Request timestamp.
    pub requested_at: DateTime<Utc>,
}
