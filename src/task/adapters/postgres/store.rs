//! `PostgreSQL` task store.
//!
//! Every mutating method runs in one transaction. Status changes and
//! reassignment decisions use conditional updates so that the loser of a
//! concurrent race updates zero rows and reports a conflict instead of
//! overwriting the winner.

use super::{
    models::{
        NewReassignmentRow, NewStatusLogRow, NewTaskRow, ReassignmentRow, StatusLogRow, TaskRow,
    },
    schema::{reassignment_requests, status_logs, tasks},
};
use crate::db::{PgPool, run_blocking};
use crate::identity::domain::UserId;
use crate::notification::{adapters::postgres::insert_notifications, domain::RelatedEntity};
use crate::task::{
    domain::{
        AssignmentChange, NewReassignmentRequest, NewStatusLogEntry, PersistedReassignmentData,
        PersistedTaskData, Priority, ReassignmentId, ReassignmentRequest, ReassignmentStatus,
        StatusLogEntry, StatusLogId, Task, TaskId, TaskStatus,
    },
    ports::{
        ReassignmentResolution, ResolutionCommit, StatusChange, TaskCommit, TaskCreation,
        TaskStore, TaskStoreError, TaskStoreResult,
    },
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind, Error as DieselError};

const ONE_PENDING_PER_TASK_INDEX: &str = "reassignment_requests_one_pending_per_task";

impl From<DieselError> for TaskStoreError {
    fn from(err: DieselError) -> Self {
        Self::persistence(err)
    }
}

/// `PostgreSQL`-backed task store.
#[derive(Debug, Clone)]
pub struct PostgresTaskStore {
    pool: PgPool,
}

impl PostgresTaskStore {
    /// Creates a store from a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskStore for PostgresTaskStore {
    async fn create(&self, creation: TaskCreation) -> TaskStoreResult<TaskCommit> {
        run_blocking(&self.pool, TaskStoreError::persistence, move |connection| {
            connection.transaction::<_, TaskStoreError, _>(|conn| {
                let TaskCreation {
                    draft,
                    created_at,
                    notifications,
                } = creation;
                let row = NewTaskRow {
                    title: draft.title(),
                    details: draft.details(),
                    scheduled_on: draft.scheduled_on(),
                    priority: draft.priority().as_str(),
                    estimated_hours: draft.estimated_hours(),
                    due_time: draft.due_time(),
                    status: TaskStatus::Pending.as_str(),
                    assigned_to: draft.assigned_to().value(),
                    created_by: draft.created_by().value(),
                    created_at,
                    updated_at: created_at,
                };
                let id = diesel::insert_into(tasks::table)
                    .values(&row)
                    .returning(tasks::id)
                    .get_result::<i64>(conn)?;

                let task = Task::from_draft(TaskId::new(id), draft, created_at);
                let log_entry = insert_log_entry(
                    conn,
                    task.id(),
                    NewStatusLogEntry::creation(task.created_by(), created_at),
                )?;
                let linked = notifications
                    .into_iter()
                    .map(|item| item.with_related(RelatedEntity::task(id)))
                    .collect();
                let stored_notifications = insert_notifications(conn, linked, created_at)?;
                Ok(TaskCommit {
                    task,
                    log_entry,
                    notifications: stored_notifications,
                })
            })
        })
        .await
    }

    async fn apply_status_change(&self, change: StatusChange) -> TaskStoreResult<TaskCommit> {
        run_blocking(&self.pool, TaskStoreError::persistence, move |connection| {
            connection.transaction::<_, TaskStoreError, _>(|conn| {
                let StatusChange {
                    task,
                    expected_status,
                    expected_assignee,
                    log_entry,
                    notifications,
                } = change;
                let task_id = task.id();
                let updated = diesel::update(
                    tasks::table
                        .filter(tasks::id.eq(task_id.value()))
                        .filter(tasks::status.eq(expected_status.as_str()))
                        .filter(tasks::assigned_to.eq(expected_assignee.value())),
                )
                .set((
                    tasks::status.eq(task.status().as_str()),
                    tasks::completion_notes.eq(task.completion_notes()),
                    tasks::actual_hours.eq(task.actual_hours()),
                    tasks::approved_by.eq(task.approved_by().map(UserId::value)),
                    tasks::updated_at.eq(task.updated_at()),
                ))
                .execute(conn)?;
                if updated == 0 {
                    return Err(explain_missed_update(conn, task_id, expected_status));
                }

                let created_at = log_entry.created_at;
                let entry = insert_log_entry(conn, task_id, log_entry)?;
                let stored_notifications = insert_notifications(conn, notifications, created_at)?;
                Ok(TaskCommit {
                    task,
                    log_entry: entry,
                    notifications: stored_notifications,
                })
            })
        })
        .await
    }

    async fn open_reassignment(
        &self,
        request: NewReassignmentRequest,
    ) -> TaskStoreResult<ReassignmentRequest> {
        run_blocking(&self.pool, TaskStoreError::persistence, move |connection| {
            connection.transaction::<_, TaskStoreError, _>(|conn| {
                let task_id = request.task_id;
                let known = tasks::table
                    .find(task_id.value())
                    .select(tasks::id)
                    .first::<i64>(conn)
                    .optional()?;
                if known.is_none() {
                    return Err(TaskStoreError::TaskNotFound(task_id));
                }

                let row = NewReassignmentRow {
                    task_id: task_id.value(),
                    requested_by: request.requested_by.value(),
                    proposed_assignee: request.proposed_assignee.value(),
                    reason: &request.reason,
                    status: ReassignmentStatus::Pending.as_str(),
                    requested_at: request.requested_at,
                };
                let id = diesel::insert_into(reassignment_requests::table)
                    .values(&row)
                    .returning(reassignment_requests::id)
                    .get_result::<i64>(conn)
                    .map_err(|err| match err {
                        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info)
                            if is_one_pending_violation(info.as_ref()) =>
                        {
                            TaskStoreError::PendingRequestExists(task_id)
                        }
                        _ => TaskStoreError::persistence(err),
                    })?;
                Ok(ReassignmentRequest::from_new(
                    ReassignmentId::new(id),
                    request,
                ))
            })
        })
        .await
    }

    async fn resolve_reassignment(
        &self,
        resolution: ReassignmentResolution,
    ) -> TaskStoreResult<ResolutionCommit> {
        run_blocking(&self.pool, TaskStoreError::persistence, move |connection| {
            connection.transaction::<_, TaskStoreError, _>(|conn| {
                let ReassignmentResolution {
                    request,
                    resolved_at,
                    assignment,
                    notifications,
                } = resolution;
                let request_id = request.id();
                let updated = diesel::update(
                    reassignment_requests::table
                        .filter(reassignment_requests::id.eq(request_id.value()))
                        .filter(
                            reassignment_requests::status
                                .eq(ReassignmentStatus::Pending.as_str()),
                        ),
                )
                .set((
                    reassignment_requests::status.eq(request.status().as_str()),
                    reassignment_requests::handled_by.eq(request.handled_by().map(UserId::value)),
                    reassignment_requests::admin_comment.eq(request.admin_comment()),
                    reassignment_requests::handled_at.eq(Some(resolved_at)),
                ))
                .execute(conn)?;
                if updated == 0 {
                    let known = reassignment_requests::table
                        .find(request_id.value())
                        .select(reassignment_requests::id)
                        .first::<i64>(conn)
                        .optional()?;
                    return Err(match known {
                        Some(_) => TaskStoreError::RequestAlreadyResolved(request_id),
                        None => TaskStoreError::RequestNotFound(request_id),
                    });
                }

                let (task, log_entry) = match assignment {
                    Some(draft) => {
                        let task_id = request.task_id();
                        let row = diesel::update(
                            tasks::table
                                .filter(tasks::id.eq(task_id.value()))
                                .filter(tasks::assigned_to.eq(draft.from.value())),
                        )
                        .set((
                            tasks::assigned_to.eq(draft.to.value()),
                            tasks::updated_at.eq(resolved_at),
                        ))
                        .returning(TaskRow::as_returning())
                        .get_result::<TaskRow>(conn)
                        .optional()?
                        .ok_or_else(|| explain_missed_reassign(conn, task_id))?;
                        let reassigned = row_to_task(row)?;
                        let entry = insert_log_entry(
                            conn,
                            task_id,
                            NewStatusLogEntry::reassignment(
                                reassigned.status(),
                                AssignmentChange {
                                    from: draft.from,
                                    to: draft.to,
                                },
                                draft.changed_by,
                                draft.comment,
                                resolved_at,
                            ),
                        )?;
                        (Some(reassigned), Some(entry))
                    }
                    None => (None, None),
                };

                let stored_notifications = insert_notifications(conn, notifications, resolved_at)?;
                Ok(ResolutionCommit {
                    request,
                    task,
                    log_entry,
                    notifications: stored_notifications,
                })
            })
        })
        .await
    }

    async fn find_task(&self, id: TaskId) -> TaskStoreResult<Option<Task>> {
        run_blocking(&self.pool, TaskStoreError::persistence, move |connection| {
            tasks::table
                .find(id.value())
                .select(TaskRow::as_select())
                .first::<TaskRow>(connection)
                .optional()?
                .map(row_to_task)
                .transpose()
        })
        .await
    }

    async fn find_reassignment(
        &self,
        id: ReassignmentId,
    ) -> TaskStoreResult<Option<ReassignmentRequest>> {
        run_blocking(&self.pool, TaskStoreError::persistence, move |connection| {
            reassignment_requests::table
                .find(id.value())
                .select(ReassignmentRow::as_select())
                .first::<ReassignmentRow>(connection)
                .optional()?
                .map(row_to_request)
                .transpose()
        })
        .await
    }

    async fn status_log(&self, task_id: TaskId) -> TaskStoreResult<Vec<StatusLogEntry>> {
        run_blocking(&self.pool, TaskStoreError::persistence, move |connection| {
            let rows = status_logs::table
                .filter(status_logs::task_id.eq(task_id.value()))
                .order((status_logs::created_at.asc(), status_logs::id.asc()))
                .select(StatusLogRow::as_select())
                .load::<StatusLogRow>(connection)?;
            rows.into_iter().map(row_to_log_entry).collect()
        })
        .await
    }

    async fn pending_reassignment(
        &self,
        task_id: TaskId,
    ) -> TaskStoreResult<Option<ReassignmentRequest>> {
        run_blocking(&self.pool, TaskStoreError::persistence, move |connection| {
            reassignment_requests::table
                .filter(reassignment_requests::task_id.eq(task_id.value()))
                .filter(reassignment_requests::status.eq(ReassignmentStatus::Pending.as_str()))
                .select(ReassignmentRow::as_select())
                .first::<ReassignmentRow>(connection)
                .optional()?
                .map(row_to_request)
                .transpose()
        })
        .await
    }

    async fn list_pending_reassignments(&self) -> TaskStoreResult<Vec<ReassignmentRequest>> {
        run_blocking(&self.pool, TaskStoreError::persistence, move |connection| {
            let rows = reassignment_requests::table
                .filter(reassignment_requests::status.eq(ReassignmentStatus::Pending.as_str()))
                .order((
                    reassignment_requests::requested_at.desc(),
                    reassignment_requests::id.desc(),
                ))
                .select(ReassignmentRow::as_select())
                .load::<ReassignmentRow>(connection)?;
            rows.into_iter().map(row_to_request).collect()
        })
        .await
    }

    async fn tasks_assigned_to(&self, user: UserId) -> TaskStoreResult<Vec<Task>> {
        run_blocking(&self.pool, TaskStoreError::persistence, move |connection| {
            let rows = tasks::table
                .filter(tasks::assigned_to.eq(user.value()))
                .order((tasks::scheduled_on.asc(), tasks::id.asc()))
                .select(TaskRow::as_select())
                .load::<TaskRow>(connection)?;
            rows.into_iter().map(row_to_task).collect()
        })
        .await
    }
}

fn insert_log_entry(
    connection: &mut PgConnection,
    task_id: TaskId,
    entry: NewStatusLogEntry,
) -> TaskStoreResult<StatusLogEntry> {
    let row = NewStatusLogRow {
        task_id: task_id.value(),
        status: entry.status.as_str(),
        previous_status: entry.previous_status.map(TaskStatus::as_str),
        changed_by: entry.changed_by.value(),
        comment: entry.comment.as_deref(),
        assigned_from: entry.assignment.map(|change| change.from.value()),
        assigned_to: entry.assignment.map(|change| change.to.value()),
        created_at: entry.created_at,
    };
    let id = diesel::insert_into(status_logs::table)
        .values(&row)
        .returning(status_logs::id)
        .get_result::<i64>(connection)?;
    Ok(StatusLogEntry::from_new(StatusLogId::new(id), task_id, entry))
}

/// Works out why a conditional status update matched no row.
fn explain_missed_update(
    connection: &mut PgConnection,
    task_id: TaskId,
    expected: TaskStatus,
) -> TaskStoreError {
    let current = tasks::table
        .find(task_id.value())
        .select(tasks::status)
        .first::<String>(connection)
        .optional();
    match current {
        Err(err) => TaskStoreError::persistence(err),
        Ok(None) => TaskStoreError::TaskNotFound(task_id),
        Ok(Some(raw)) => match TaskStatus::try_from(raw.as_str()) {
            Err(err) => TaskStoreError::persistence(err),
            Ok(actual) if actual != expected => TaskStoreError::StatusConflict {
                task_id,
                expected,
                actual,
            },
            Ok(_) => TaskStoreError::ConcurrentModification(task_id),
        },
    }
}

/// Works out why a conditional reassignment matched no row.
fn explain_missed_reassign(connection: &mut PgConnection, task_id: TaskId) -> TaskStoreError {
    let known = tasks::table
        .find(task_id.value())
        .select(tasks::id)
        .first::<i64>(connection)
        .optional();
    match known {
        Err(err) => TaskStoreError::persistence(err),
        Ok(None) => TaskStoreError::TaskNotFound(task_id),
        Ok(Some(_)) => TaskStoreError::ConcurrentModification(task_id),
    }
}

fn is_one_pending_violation(info: &dyn DatabaseErrorInformation) -> bool {
    info.constraint_name()
        .is_some_and(|name| name == ONE_PENDING_PER_TASK_INDEX)
}

fn row_to_task(row: TaskRow) -> TaskStoreResult<Task> {
    let priority = Priority::try_from(row.priority.as_str()).map_err(TaskStoreError::persistence)?;
    let status = TaskStatus::try_from(row.status.as_str()).map_err(TaskStoreError::persistence)?;
    Ok(Task::from_persisted(PersistedTaskData {
        id: TaskId::new(row.id),
        title: row.title,
        details: row.details,
        scheduled_on: row.scheduled_on,
        priority,
        estimated_hours: row.estimated_hours,
        actual_hours: row.actual_hours,
        due_time: row.due_time,
        status,
        completion_notes: row.completion_notes,
        assigned_to: UserId::new(row.assigned_to),
        created_by: UserId::new(row.created_by),
        approved_by: row.approved_by.map(UserId::new),
        created_at: row.created_at,
        updated_at: row.updated_at,
    }))
}

fn row_to_log_entry(row: StatusLogRow) -> TaskStoreResult<StatusLogEntry> {
    let status = TaskStatus::try_from(row.status.as_str()).map_err(TaskStoreError::persistence)?;
    let previous_status = row
        .previous_status
        .as_deref()
        .map(TaskStatus::try_from)
        .transpose()
        .map_err(TaskStoreError::persistence)?;
    let assignment = match (row.assigned_from, row.assigned_to) {
        (Some(from), Some(to)) => Some(AssignmentChange {
            from: UserId::new(from),
            to: UserId::new(to),
        }),
        _ => None,
    };
    Ok(StatusLogEntry {
        id: StatusLogId::new(row.id),
        task_id: TaskId::new(row.task_id),
        status,
        previous_status,
        changed_by: UserId::new(row.changed_by),
        comment: row.comment,
        assignment,
        created_at: row.created_at,
    })
}

fn row_to_request(row: ReassignmentRow) -> TaskStoreResult<ReassignmentRequest> {
    let status =
        ReassignmentStatus::try_from(row.status.as_str()).map_err(TaskStoreError::persistence)?;
    Ok(ReassignmentRequest::from_persisted(PersistedReassignmentData {
        id: ReassignmentId::new(row.id),
        task_id: TaskId::new(row.task_id),
        requested_by: UserId::new(row.requested_by),
        proposed_assignee: UserId::new(row.proposed_assignee),
        reason: row.reason,
        status,
        handled_by: row.handled_by.map(UserId::new),
        admin_comment: row.admin_comment,
        requested_at: row.requested_at,
        handled_at: row.handled_at,
    }))
}
