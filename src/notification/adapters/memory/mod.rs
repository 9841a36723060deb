//! In-memory notification repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockWriteGuard};

use crate::identity::domain::UserId;
use crate::notification::{
    domain::{NewNotification, Notification, NotificationId},
    ports::{NotificationRepository, NotificationRepositoryError, NotificationRepositoryResult},
};

/// Thread-safe in-memory notification repository.
///
/// The in-memory task store shares an instance of this repository so that
/// lifecycle notifications land in the same inbox the registry reads.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNotificationRepository {
    state: Arc<RwLock<InMemoryNotificationState>>,
}

#[derive(Debug, Default)]
struct InMemoryNotificationState {
    last_id: i64,
    notifications: BTreeMap<NotificationId, Notification>,
}

impl InMemoryNotificationState {
    fn append(&mut self, new: NewNotification, created_at: DateTime<Utc>) -> Notification {
        self.last_id += 1;
        let id = NotificationId::new(self.last_id);
        let notification = Notification::from_new(id, new, created_at);
        self.notifications.insert(id, notification.clone());
        notification
    }

    fn newest_first(
        &self,
        recipient: UserId,
        include: impl Fn(&Notification) -> bool,
    ) -> Vec<Notification> {
        let mut found: Vec<Notification> = self
            .notifications
            .values()
            .filter(|item| item.recipient() == recipient && !item.is_archived() && include(item))
            .cloned()
            .collect();
        found.sort_by_key(|item| Reverse((item.created_at(), item.id())));
        found
    }
}

impl InMemoryNotificationRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn write(
        &self,
    ) -> NotificationRepositoryResult<RwLockWriteGuard<'_, InMemoryNotificationState>> {
        self.state.write().map_err(|err| {
            NotificationRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    /// Appends several notifications in one critical section.
    ///
    /// Used by the in-memory task store as part of its unit of work.
    pub(crate) fn append_all(
        &self,
        drafts: Vec<NewNotification>,
        created_at: DateTime<Utc>,
    ) -> NotificationRepositoryResult<Vec<Notification>> {
        let mut state = self.write()?;
        Ok(drafts
            .into_iter()
            .map(|draft| state.append(draft, created_at))
            .collect())
    }

    /// Returns every stored notification for `recipient`, including read
    /// and archived ones, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationRepositoryError::Persistence`] when the lock is
    /// poisoned.
    pub fn all_for(&self, recipient: UserId) -> NotificationRepositoryResult<Vec<Notification>> {
        let state = self.state.read().map_err(|err| {
            NotificationRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })?;
        Ok(state
            .notifications
            .values()
            .filter(|item| item.recipient() == recipient)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl NotificationRepository for InMemoryNotificationRepository {
    async fn insert(
        &self,
        notification: &NewNotification,
        created_at: DateTime<Utc>,
    ) -> NotificationRepositoryResult<Notification> {
        let mut state = self.write()?;
        Ok(state.append(notification.clone(), created_at))
    }

    async fn find_by_id(
        &self,
        id: NotificationId,
    ) -> NotificationRepositoryResult<Option<Notification>> {
        let state = self.state.read().map_err(|err| {
            NotificationRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })?;
        Ok(state.notifications.get(&id).cloned())
    }

    async fn update_flags(&self, notification: &Notification) -> NotificationRepositoryResult<()> {
        let mut state = self.write()?;
        let stored = state
            .notifications
            .get_mut(&notification.id())
            .ok_or(NotificationRepositoryError::NotFound(notification.id()))?;
        *stored = notification.clone();
        Ok(())
    }

    async fn mark_all_read(&self, recipient: UserId) -> NotificationRepositoryResult<u64> {
        let mut state = self.write()?;
        let mut changed = 0_u64;
        for item in state.notifications.values_mut() {
            if item.recipient() == recipient && !item.is_read() && item.mark_read(recipient).is_ok()
            {
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn list_unread(
        &self,
        recipient: UserId,
    ) -> NotificationRepositoryResult<Vec<Notification>> {
        let state = self.state.read().map_err(|err| {
            NotificationRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })?;
        Ok(state.newest_first(recipient, |item| !item.is_read()))
    }

    async fn list_recent(
        &self,
        recipient: UserId,
        limit: usize,
    ) -> NotificationRepositoryResult<Vec<Notification>> {
        let state = self.state.read().map_err(|err| {
            NotificationRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })?;
        let mut found = state.newest_first(recipient, |_| true);
        found.truncate(limit);
        Ok(found)
    }
}
