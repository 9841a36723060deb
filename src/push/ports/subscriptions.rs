//! Repository port for push subscriptions.

use crate::identity::domain::UserId;
use crate::push::domain::{NewPushSubscription, PushSubscription};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for subscription repository operations.
pub type SubscriptionRepositoryResult<T> = Result<T, SubscriptionRepositoryError>;

/// Push subscription persistence contract.
///
/// Endpoints are unique: registering a known endpoint updates the existing
/// row instead of creating a second one.
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Inserts a subscription, or updates and reactivates the one that
    /// already owns the endpoint.
    async fn upsert(
        &self,
        subscription: &NewPushSubscription,
        at: DateTime<Utc>,
    ) -> SubscriptionRepositoryResult<PushSubscription>;

    /// Deactivates the subscription for `endpoint`.
    ///
    /// Returns `true` when an active subscription was deactivated.
    async fn deactivate(&self, endpoint: &str) -> SubscriptionRepositoryResult<bool>;

    /// Returns the active subscriptions of `user`, oldest first.
    async fn list_active(
        &self,
        user: UserId,
    ) -> SubscriptionRepositoryResult<Vec<PushSubscription>>;

    /// Finds the subscription for `endpoint`, active or not.
    async fn find_by_endpoint(
        &self,
        endpoint: &str,
    ) -> SubscriptionRepositoryResult<Option<PushSubscription>>;

    /// Records a successful delivery to `endpoint`.
    async fn touch(&self, endpoint: &str, at: DateTime<Utc>) -> SubscriptionRepositoryResult<()>;
}

/// Errors returned by subscription repository implementations.
#[derive(Debug, Clone, Error)]
pub enum SubscriptionRepositoryError {
    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl SubscriptionRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
