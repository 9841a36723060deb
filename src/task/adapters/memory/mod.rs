//! In-memory task store for tests and embedded use.
//!
//! One write lock over the task state serializes every unit of work, which
//! gives the same compare-and-set semantics the `PostgreSQL` store gets from
//! conditional updates and unique indexes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::identity::domain::UserId;
use crate::notification::{
    adapters::memory::InMemoryNotificationRepository,
    domain::{NewNotification, Notification, RelatedEntity},
};
use crate::task::{
    domain::{
        AssignmentChange, NewReassignmentRequest, NewStatusLogEntry, ReassignmentId,
        ReassignmentRequest, ReassignmentStatus, StatusLogEntry, StatusLogId, Task, TaskId,
    },
    ports::{
        ReassignmentResolution, ResolutionCommit, StatusChange, TaskCommit, TaskCreation,
        TaskStore, TaskStoreError, TaskStoreResult,
    },
};

/// Thread-safe in-memory task store.
///
/// Notifications are written to the shared notification repository while
/// the task lock is held, so readers never observe a mutation without its
/// notifications.
#[derive(Debug, Clone)]
pub struct InMemoryTaskStore {
    state: Arc<RwLock<InMemoryTaskState>>,
    notifications: InMemoryNotificationRepository,
}

#[derive(Debug, Default)]
struct InMemoryTaskState {
    last_task_id: i64,
    last_log_id: i64,
    last_request_id: i64,
    tasks: BTreeMap<TaskId, Task>,
    logs: Vec<StatusLogEntry>,
    requests: BTreeMap<ReassignmentId, ReassignmentRequest>,
}

impl InMemoryTaskState {
    fn next_log_entry(&mut self, task_id: TaskId, entry: NewStatusLogEntry) -> StatusLogEntry {
        self.last_log_id += 1;
        StatusLogEntry::from_new(StatusLogId::new(self.last_log_id), task_id, entry)
    }

    fn task(&self, id: TaskId) -> TaskStoreResult<&Task> {
        self.tasks.get(&id).ok_or(TaskStoreError::TaskNotFound(id))
    }
}

impl InMemoryTaskStore {
    /// Creates an empty store writing notifications to `notifications`.
    #[must_use]
    pub fn new(notifications: InMemoryNotificationRepository) -> Self {
        Self {
            state: Arc::new(RwLock::new(InMemoryTaskState::default())),
            notifications,
        }
    }

    fn read(&self) -> TaskStoreResult<RwLockReadGuard<'_, InMemoryTaskState>> {
        self.state
            .read()
            .map_err(|err| TaskStoreError::persistence(std::io::Error::other(err.to_string())))
    }

    fn write(&self) -> TaskStoreResult<RwLockWriteGuard<'_, InMemoryTaskState>> {
        self.state
            .write()
            .map_err(|err| TaskStoreError::persistence(std::io::Error::other(err.to_string())))
    }

    fn append_notifications(
        &self,
        drafts: Vec<NewNotification>,
        created_at: DateTime<Utc>,
    ) -> TaskStoreResult<Vec<Notification>> {
        self.notifications
            .append_all(drafts, created_at)
            .map_err(TaskStoreError::persistence)
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn create(&self, creation: TaskCreation) -> TaskStoreResult<TaskCommit> {
        let TaskCreation {
            draft,
            created_at,
            notifications,
        } = creation;
        let mut state = self.write()?;
        let task_id = TaskId::new(state.last_task_id + 1);
        let linked = notifications
            .into_iter()
            .map(|item| item.with_related(RelatedEntity::task(task_id.value())))
            .collect();
        let stored_notifications = self.append_notifications(linked, created_at)?;

        state.last_task_id = task_id.value();
        let task = Task::from_draft(task_id, draft, created_at);
        let log_entry = state.next_log_entry(
            task_id,
            NewStatusLogEntry::creation(task.created_by(), created_at),
        );
        state.tasks.insert(task_id, task.clone());
        state.logs.push(log_entry.clone());
        Ok(TaskCommit {
            task,
            log_entry,
            notifications: stored_notifications,
        })
    }

    async fn apply_status_change(&self, change: StatusChange) -> TaskStoreResult<TaskCommit> {
        let StatusChange {
            task,
            expected_status,
            expected_assignee,
            log_entry,
            notifications,
        } = change;
        let mut state = self.write()?;
        let stored = state.task(task.id())?;
        if stored.status() != expected_status {
            return Err(TaskStoreError::StatusConflict {
                task_id: task.id(),
                expected: expected_status,
                actual: stored.status(),
            });
        }
        if stored.assigned_to() != expected_assignee {
            return Err(TaskStoreError::ConcurrentModification(task.id()));
        }

        let stored_notifications = self.append_notifications(notifications, log_entry.created_at)?;
        let entry = state.next_log_entry(task.id(), log_entry);
        state.tasks.insert(task.id(), task.clone());
        state.logs.push(entry.clone());
        Ok(TaskCommit {
            task,
            log_entry: entry,
            notifications: stored_notifications,
        })
    }

    async fn open_reassignment(
        &self,
        request: NewReassignmentRequest,
    ) -> TaskStoreResult<ReassignmentRequest> {
        let mut state = self.write()?;
        state.task(request.task_id)?;
        let has_pending = state.requests.values().any(|existing| {
            existing.task_id() == request.task_id
                && existing.status() == ReassignmentStatus::Pending
        });
        if has_pending {
            return Err(TaskStoreError::PendingRequestExists(request.task_id));
        }

        state.last_request_id += 1;
        let id = ReassignmentId::new(state.last_request_id);
        let stored = ReassignmentRequest::from_new(id, request);
        state.requests.insert(id, stored.clone());
        Ok(stored)
    }

    async fn resolve_reassignment(
        &self,
        resolution: ReassignmentResolution,
    ) -> TaskStoreResult<ResolutionCommit> {
        let ReassignmentResolution {
            request,
            resolved_at,
            assignment,
            notifications,
        } = resolution;
        let mut state = self.write()?;
        let current = state
            .requests
            .get(&request.id())
            .ok_or(TaskStoreError::RequestNotFound(request.id()))?;
        if current.status() != ReassignmentStatus::Pending {
            return Err(TaskStoreError::RequestAlreadyResolved(request.id()));
        }

        let reassigned = match assignment {
            Some(draft) => {
                let stored_task = state.task(request.task_id())?;
                if stored_task.assigned_to() != draft.from {
                    return Err(TaskStoreError::ConcurrentModification(request.task_id()));
                }
                let mut task = stored_task.clone();
                task.reassign(draft.to, resolved_at);
                let entry = NewStatusLogEntry::reassignment(
                    task.status(),
                    AssignmentChange {
                        from: draft.from,
                        to: draft.to,
                    },
                    draft.changed_by,
                    draft.comment,
                    resolved_at,
                );
                Some((task, entry))
            }
            None => None,
        };

        let stored_notifications = self.append_notifications(notifications, resolved_at)?;
        state.requests.insert(request.id(), request.clone());
        let (task, log_entry) = match reassigned {
            Some((task, entry)) => {
                let stored_entry = state.next_log_entry(task.id(), entry);
                state.tasks.insert(task.id(), task.clone());
                state.logs.push(stored_entry.clone());
                (Some(task), Some(stored_entry))
            }
            None => (None, None),
        };
        Ok(ResolutionCommit {
            request,
            task,
            log_entry,
            notifications: stored_notifications,
        })
    }

    async fn find_task(&self, id: TaskId) -> TaskStoreResult<Option<Task>> {
        Ok(self.read()?.tasks.get(&id).cloned())
    }

    async fn find_reassignment(
        &self,
        id: ReassignmentId,
    ) -> TaskStoreResult<Option<ReassignmentRequest>> {
        Ok(self.read()?.requests.get(&id).cloned())
    }

    async fn status_log(&self, task_id: TaskId) -> TaskStoreResult<Vec<StatusLogEntry>> {
        let state = self.read()?;
        let mut entries: Vec<StatusLogEntry> = state
            .logs
            .iter()
            .filter(|entry| entry.task_id == task_id)
            .cloned()
            .collect();
        entries.sort_by_key(|entry| (entry.created_at, entry.id));
        Ok(entries)
    }

    async fn pending_reassignment(
        &self,
        task_id: TaskId,
    ) -> TaskStoreResult<Option<ReassignmentRequest>> {
        Ok(self
            .read()?
            .requests
            .values()
            .find(|request| {
                request.task_id() == task_id && request.status() == ReassignmentStatus::Pending
            })
            .cloned())
    }

    async fn list_pending_reassignments(&self) -> TaskStoreResult<Vec<ReassignmentRequest>> {
        let state = self.read()?;
        let mut pending: Vec<ReassignmentRequest> = state
            .requests
            .values()
            .filter(|request| request.status() == ReassignmentStatus::Pending)
            .cloned()
            .collect();
        pending.sort_by_key(|request| Reverse((request.requested_at(), request.id())));
        Ok(pending)
    }

    async fn tasks_assigned_to(&self, user: UserId) -> TaskStoreResult<Vec<Task>> {
        let state = self.read()?;
        let mut tasks: Vec<Task> = state
            .tasks
            .values()
            .filter(|task| task.assigned_to() == user)
            .cloned()
            .collect();
        tasks.sort_by_key(|task| (task.scheduled_on(), task.id()));
        Ok(tasks)
    }
}
