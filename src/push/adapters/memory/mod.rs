//! In-memory subscription store and delivery log.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::identity::domain::UserId;
use crate::push::{
    domain::{
        DeliveryLogEntry, DeliveryLogId, NewDeliveryLogEntry, NewPushSubscription,
        PushSubscription, SubscriptionId,
    },
    ports::{
        DeliveryLogError, DeliveryLogRepository, DeliveryLogResult, SubscriptionRepository,
        SubscriptionRepositoryError, SubscriptionRepositoryResult,
    },
};

fn poisoned(err: impl ToString) -> std::io::Error {
    std::io::Error::other(err.to_string())
}

/// Thread-safe in-memory subscription repository keyed by endpoint.
#[derive(Debug, Clone, Default)]
pub struct InMemorySubscriptionRepository {
    state: Arc<RwLock<SubscriptionState>>,
}

#[derive(Debug, Default)]
struct SubscriptionState {
    last_id: i64,
    by_endpoint: BTreeMap<String, PushSubscription>,
}

impl InMemorySubscriptionRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> SubscriptionRepositoryResult<RwLockReadGuard<'_, SubscriptionState>> {
        self.state
            .read()
            .map_err(|err| SubscriptionRepositoryError::persistence(poisoned(err)))
    }

    fn write(&self) -> SubscriptionRepositoryResult<RwLockWriteGuard<'_, SubscriptionState>> {
        self.state
            .write()
            .map_err(|err| SubscriptionRepositoryError::persistence(poisoned(err)))
    }
}

#[async_trait]
impl SubscriptionRepository for InMemorySubscriptionRepository {
    async fn upsert(
        &self,
        subscription: &NewPushSubscription,
        at: DateTime<Utc>,
    ) -> SubscriptionRepositoryResult<PushSubscription> {
        let mut state = self.write()?;
        if let Some(existing) = state.by_endpoint.get_mut(subscription.endpoint()) {
            existing.reactivate(subscription.clone());
            return Ok(existing.clone());
        }
        state.last_id += 1;
        let stored = PushSubscription::from_new(
            SubscriptionId::new(state.last_id),
            subscription.clone(),
            at,
        );
        state
            .by_endpoint
            .insert(stored.endpoint().to_owned(), stored.clone());
        Ok(stored)
    }

    async fn deactivate(&self, endpoint: &str) -> SubscriptionRepositoryResult<bool> {
        let mut state = self.write()?;
        Ok(state
            .by_endpoint
            .get_mut(endpoint)
            .is_some_and(PushSubscription::deactivate))
    }

    async fn list_active(
        &self,
        user: UserId,
    ) -> SubscriptionRepositoryResult<Vec<PushSubscription>> {
        let state = self.read()?;
        let mut active: Vec<PushSubscription> = state
            .by_endpoint
            .values()
            .filter(|item| item.is_active() && item.user_id() == Some(user))
            .cloned()
            .collect();
        active.sort_by_key(PushSubscription::id);
        Ok(active)
    }

    async fn find_by_endpoint(
        &self,
        endpoint: &str,
    ) -> SubscriptionRepositoryResult<Option<PushSubscription>> {
        Ok(self.read()?.by_endpoint.get(endpoint).cloned())
    }

    async fn touch(&self, endpoint: &str, at: DateTime<Utc>) -> SubscriptionRepositoryResult<()> {
        if let Some(existing) = self.write()?.by_endpoint.get_mut(endpoint) {
            existing.touch(at);
        }
        Ok(())
    }
}

/// Thread-safe in-memory delivery log.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDeliveryLog {
    entries: Arc<RwLock<Vec<DeliveryLogEntry>>>,
}

impl InMemoryDeliveryLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every recorded attempt in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryLogError::Persistence`] when the lock is poisoned.
    pub fn entries(&self) -> DeliveryLogResult<Vec<DeliveryLogEntry>> {
        self.entries
            .read()
            .map(|entries| entries.clone())
            .map_err(|err| DeliveryLogError::persistence(poisoned(err)))
    }
}

#[async_trait]
impl DeliveryLogRepository for InMemoryDeliveryLog {
    async fn append(&self, entry: &NewDeliveryLogEntry) -> DeliveryLogResult<DeliveryLogEntry> {
        let mut entries = self
            .entries
            .write()
            .map_err(|err| DeliveryLogError::persistence(poisoned(err)))?;
        let next_id = i64::try_from(entries.len())
            .map_err(DeliveryLogError::persistence)?
            .saturating_add(1);
        let stored = DeliveryLogEntry::from_new(DeliveryLogId::new(next_id), entry.clone());
        entries.push(stored.clone());
        Ok(stored)
    }

    async fn since(&self, since: DateTime<Utc>) -> DeliveryLogResult<Vec<DeliveryLogEntry>> {
        let mut found: Vec<DeliveryLogEntry> = self
            .entries()?
            .into_iter()
            .filter(|entry| entry.sent_at >= since)
            .collect();
        found.sort_by_key(|entry| (entry.sent_at, entry.id));
        Ok(found)
    }
}
