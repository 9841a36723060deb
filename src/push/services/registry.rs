//! Push subscription registry service.

use crate::error::ErrorKind;
use crate::identity::domain::UserId;
use crate::push::{
    domain::{NewPushSubscription, PushDomainError, PushSubscription, SubscriptionKeys},
    ports::{SubscriptionRepository, SubscriptionRepositoryError},
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;

/// Subscription details reported by a browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionRegistration {
    endpoint: String,
    p256dh: String,
    auth: String,
    user_agent: Option<String>,
}

impl SubscriptionRegistration {
    /// Creates a registration from the browser's `PushSubscription` JSON.
    #[must_use]
    pub fn new(
        endpoint: impl Into<String>,
        p256dh: impl Into<String>,
        auth: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            p256dh: p256dh.into(),
            auth: auth.into(),
            user_agent: None,
        }
    }

    /// Records the registering browser.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    fn validate(self, user: UserId) -> Result<NewPushSubscription, PushDomainError> {
        let keys = SubscriptionKeys::new(self.p256dh, self.auth)?;
        NewPushSubscription::new(user, self.endpoint, keys, self.user_agent)
    }
}

/// Service-level errors for subscription operations.
#[derive(Debug, Error)]
pub enum SubscriptionServiceError {
    /// Endpoint or key validation failed.
    #[error(transparent)]
    Domain(#[from] PushDomainError),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] SubscriptionRepositoryError),
}

impl SubscriptionServiceError {
    /// Classifies the error for callers.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Domain(_) => ErrorKind::Validation,
            Self::Repository(_) => ErrorKind::Internal,
        }
    }
}

/// Result type for subscription service operations.
pub type SubscriptionServiceResult<T> = Result<T, SubscriptionServiceError>;

/// Durable registry of device push endpoints.
///
/// Registration and deactivation are idempotent, so concurrent identical
/// calls need no coordination.
#[derive(Clone)]
pub struct PushSubscriptionRegistry<R, C>
where
    R: SubscriptionRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
}

impl<R, C> PushSubscriptionRegistry<R, C>
where
    R: SubscriptionRepository,
    C: Clock + Send + Sync,
{
    /// Creates a registry.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self { repository, clock }
    }

    /// Registers a device for `user`.
    ///
    /// A known endpoint is reassigned to `user`, takes the new keys, and is
    /// reactivated; otherwise a new subscription is created.
    ///
    /// # Errors
    ///
    /// Returns [`SubscriptionServiceError::Domain`] for a non-`https`
    /// endpoint or malformed keys, and repository errors.
    pub async fn register(
        &self,
        user: UserId,
        registration: SubscriptionRegistration,
    ) -> SubscriptionServiceResult<PushSubscription> {
        let validated = registration.validate(user)?;
        let stored = self.repository.upsert(&validated, self.clock.utc()).await?;
        tracing::info!(
            subscription_id = %stored.id(),
            user_id = %user,
            "push subscription registered"
        );
        Ok(stored)
    }

    /// Deactivates the subscription for `endpoint`. Unknown or already
    /// inactive endpoints are left alone.
    ///
    /// Returns `true` when something changed.
    ///
    /// # Errors
    ///
    /// Returns repository errors.
    pub async fn deactivate(&self, endpoint: &str) -> SubscriptionServiceResult<bool> {
        let changed = self.repository.deactivate(endpoint).await?;
        if changed {
            tracing::info!(endpoint, "push subscription deactivated");
        }
        Ok(changed)
    }

    /// Handles `pushsubscriptionchange`: registers the replacement
    /// endpoint, then retires the old one.
    ///
    /// # Errors
    ///
    /// Returns validation errors for the replacement, in which case the old
    /// subscription is kept, and repository errors.
    pub async fn rotate(
        &self,
        old_endpoint: &str,
        user: UserId,
        replacement: SubscriptionRegistration,
    ) -> SubscriptionServiceResult<PushSubscription> {
        let stored = self.register(user, replacement).await?;
        if stored.endpoint() != old_endpoint {
            self.deactivate(old_endpoint).await?;
        }
        Ok(stored)
    }

    /// Returns the active subscriptions of `user`.
    ///
    /// # Errors
    ///
    /// Returns repository errors.
    pub async fn list_active(
        &self,
        user: UserId,
    ) -> SubscriptionServiceResult<Vec<PushSubscription>> {
        Ok(self.repository.list_active(user).await?)
    }

    /// Looks up a subscription by endpoint.
    ///
    /// # Errors
    ///
    /// Returns repository errors.
    pub async fn find_by_endpoint(
        &self,
        endpoint: &str,
    ) -> SubscriptionServiceResult<Option<PushSubscription>> {
        Ok(self.repository.find_by_endpoint(endpoint).await?)
    }

    /// Records a successful delivery to `endpoint` at `at`.
    ///
    /// # Errors
    ///
    /// Returns repository errors.
    pub async fn touch(&self, endpoint: &str, at: DateTime<Utc>) -> SubscriptionServiceResult<()> {
        Ok(self.repository.touch(endpoint, at).await?)
    }
}
