//! Fan-out of notifications to push subscriptions.

use crate::error::ErrorKind;
use crate::identity::domain::UserId;
use crate::notification::domain::{Notification, NotificationId};
use crate::push::{
    domain::{DeliveryLogEntry, DeliveryOutcome, NewDeliveryLogEntry, PushMessage, PushSubscription},
    ports::{
        DeliveryLogError, DeliveryLogRepository, PushTransport, SubscriptionRepository,
        SubscriptionRepositoryError,
    },
};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use mockable::Clock;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Tunables for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryOptions {
    /// Upper bound for one attempt, including encryption and the HTTP
    /// exchange.
    pub request_timeout: Duration,
    /// Base of click-through URLs, e.g. `https://desk.example.com`.
    pub click_base_url: String,
}

impl Default for DeliveryOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(8),
            click_base_url: "/".to_owned(),
        }
    }
}

/// Counts produced by one dispatch or retry run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Attempts made, one per targeted subscription.
    pub attempted: usize,
    /// Attempts the push service accepted.
    pub delivered: usize,
    /// Attempts that did not deliver, for any reason.
    pub failed: usize,
    /// Subscriptions deactivated because their endpoint is gone.
    pub deactivated: usize,
}

impl DispatchReport {
    const fn record(&mut self, outcome: DeliveryOutcome, deactivated: bool) {
        self.attempted += 1;
        if outcome.is_success() {
            self.delivered += 1;
        } else {
            self.failed += 1;
        }
        if deactivated {
            self.deactivated += 1;
        }
    }
}

/// Infrastructure failures during delivery.
///
/// These reach whoever drives delivery (the queue or the retry job), never
/// the business operation that created the notification.
#[derive(Debug, Error)]
pub enum PushDeliveryError {
    /// Subscription lookup or bookkeeping failed.
    #[error(transparent)]
    Subscriptions(#[from] SubscriptionRepositoryError),
    /// Writing or reading the delivery log failed.
    #[error(transparent)]
    DeliveryLog(#[from] DeliveryLogError),
    /// The payload could not be serialised.
    #[error("payload serialisation failed: {0}")]
    Payload(#[from] serde_json::Error),
}

impl PushDeliveryError {
    /// Classifies the error for callers.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Subscriptions(_) | Self::DeliveryLog(_) | Self::Payload(_) => ErrorKind::Internal,
        }
    }
}

/// What is sent in one attempt, borrowed from a notification or a log entry.
#[derive(Debug, Clone, Copy)]
struct Attempt<'a> {
    notification_id: Option<NotificationId>,
    recipient: UserId,
    title: &'a str,
    body: &'a str,
    payload: &'a serde_json::Value,
    bytes: &'a [u8],
}

/// Delivers notifications to every active device of their recipient.
#[derive(Clone)]
pub struct PushDeliveryService<S, L, T, C>
where
    S: SubscriptionRepository,
    L: DeliveryLogRepository,
    T: PushTransport,
    C: Clock + Send + Sync,
{
    subscriptions: Arc<S>,
    log: Arc<L>,
    transport: Arc<T>,
    clock: Arc<C>,
    options: DeliveryOptions,
}

impl<S, L, T, C> PushDeliveryService<S, L, T, C>
where
    S: SubscriptionRepository,
    L: DeliveryLogRepository,
    T: PushTransport,
    C: Clock + Send + Sync,
{
    /// Creates a delivery service.
    #[must_use]
    pub const fn new(
        subscriptions: Arc<S>,
        log: Arc<L>,
        transport: Arc<T>,
        clock: Arc<C>,
        options: DeliveryOptions,
    ) -> Self {
        Self {
            subscriptions,
            log,
            transport,
            clock,
            options,
        }
    }

    /// Pushes `notification` to every active subscription of its
    /// recipient, concurrently.
    ///
    /// Exactly one delivery log entry is written per subscription. Gone
    /// endpoints are deactivated; transient failures are only logged and
    /// left for [`Self::retry_failed`].
    ///
    /// # Errors
    ///
    /// Returns [`PushDeliveryError`] when subscriptions cannot be listed or
    /// delivery bookkeeping cannot be written. Failed deliveries are not
    /// errors; they are counted in the report.
    pub async fn dispatch(
        &self,
        notification: &Notification,
    ) -> Result<DispatchReport, PushDeliveryError> {
        let recipient = notification.recipient();
        let subscriptions = self.subscriptions.list_active(recipient).await?;
        if subscriptions.is_empty() {
            tracing::debug!(
                notification_id = %notification.id(),
                recipient = %recipient,
                "no active push subscriptions"
            );
            return Ok(DispatchReport::default());
        }

        let message = PushMessage::from_notification(notification, &self.options.click_base_url);
        let payload = serde_json::to_value(&message)?;
        let bytes = serde_json::to_vec(&payload)?;
        let attempt = Attempt {
            notification_id: Some(notification.id()),
            recipient,
            title: &message.title,
            body: &message.body,
            payload: &payload,
            bytes: &bytes,
        };
        let targets: Vec<_> = subscriptions
            .iter()
            .map(|subscription| (subscription, attempt))
            .collect();
        let report = self.fan_out(&targets).await?;
        tracing::info!(
            notification_id = %notification.id(),
            attempted = report.attempted,
            delivered = report.delivered,
            failed = report.failed,
            deactivated = report.deactivated,
            "push dispatch finished"
        );
        Ok(report)
    }

    /// Re-attempts transient failures logged at or after `since`.
    ///
    /// Attempts are grouped by notification and endpoint; a group is
    /// retried once, with its stored payload, when its latest attempt was
    /// transient and the subscription is still active and still owned by
    /// the same recipient.
    ///
    /// # Errors
    ///
    /// Returns [`PushDeliveryError`] when the log or subscriptions cannot be
    /// read or written.
    pub async fn retry_failed(
        &self,
        since: DateTime<Utc>,
    ) -> Result<DispatchReport, PushDeliveryError> {
        let mut latest: BTreeMap<(Option<i64>, String), DeliveryLogEntry> = BTreeMap::new();
        for entry in self.log.since(since).await? {
            let key = (entry.notification_id.map(NotificationId::value), entry.endpoint.clone());
            latest.insert(key, entry);
        }

        let mut candidates = Vec::new();
        for entry in latest
            .into_values()
            .filter(|entry| entry.outcome == DeliveryOutcome::Transient)
        {
            let found = self.subscriptions.find_by_endpoint(&entry.endpoint).await?;
            match found {
                Some(subscription)
                    if subscription.is_active()
                        && subscription.user_id() == Some(entry.recipient) =>
                {
                    let bytes = serde_json::to_vec(&entry.payload)?;
                    candidates.push((subscription, entry, bytes));
                }
                _ => tracing::debug!(
                    log_id = %entry.id,
                    "skipping retry for inactive or reassigned subscription"
                ),
            }
        }

        let targets: Vec<_> = candidates
            .iter()
            .map(|(subscription, entry, bytes)| {
                (
                    subscription,
                    Attempt {
                        notification_id: entry.notification_id,
                        recipient: entry.recipient,
                        title: &entry.title,
                        body: &entry.body,
                        payload: &entry.payload,
                        bytes,
                    },
                )
            })
            .collect();
        let report = self.fan_out(&targets).await?;
        tracing::info!(
            since = %since,
            attempted = report.attempted,
            delivered = report.delivered,
            failed = report.failed,
            deactivated = report.deactivated,
            "push retry finished"
        );
        Ok(report)
    }

    /// Runs all attempts concurrently and tallies them. Bookkeeping errors
    /// are reported after every attempt has finished.
    async fn fan_out(
        &self,
        targets: &[(&PushSubscription, Attempt<'_>)],
    ) -> Result<DispatchReport, PushDeliveryError> {
        let results = join_all(
            targets
                .iter()
                .map(|(subscription, attempt)| self.attempt(subscription, attempt)),
        )
        .await;

        let mut report = DispatchReport::default();
        let mut first_error = None;
        for result in results {
            match result {
                Ok((outcome, deactivated)) => report.record(outcome, deactivated),
                Err(err) => {
                    tracing::error!(error = %err, "push delivery bookkeeping failed");
                    first_error.get_or_insert(err);
                }
            }
        }
        first_error.map_or(Ok(report), Err)
    }

    /// Sends one attempt, logs it, and updates the subscription.
    async fn attempt(
        &self,
        subscription: &PushSubscription,
        attempt: &Attempt<'_>,
    ) -> Result<(DeliveryOutcome, bool), PushDeliveryError> {
        let timeout = self.options.request_timeout;
        let sent =
            tokio::time::timeout(timeout, self.transport.send(subscription, attempt.bytes)).await;
        let (outcome, status_code, detail) = match sent {
            Ok(Ok(response)) => (
                DeliveryOutcome::from_status(response.status),
                Some(response.status),
                response.body,
            ),
            Ok(Err(err)) if err.is_transient() => {
                (DeliveryOutcome::Transient, None, err.to_string())
            }
            Ok(Err(err)) => (DeliveryOutcome::Rejected, None, err.to_string()),
            Err(elapsed) => (
                DeliveryOutcome::Transient,
                None,
                format!("no response within {}ms: {elapsed}", timeout.as_millis()),
            ),
        };

        let sent_at = self.clock.utc();
        let endpoint = subscription.endpoint();
        self.log
            .append(&NewDeliveryLogEntry {
                notification_id: attempt.notification_id,
                recipient: attempt.recipient,
                endpoint: endpoint.to_owned(),
                title: attempt.title.to_owned(),
                body: attempt.body.to_owned(),
                payload: attempt.payload.clone(),
                outcome,
                status_code,
                detail: detail.clone(),
                sent_at,
            })
            .await?;

        let mut deactivated = false;
        match outcome {
            DeliveryOutcome::Delivered => {
                tracing::debug!(subscription_id = %subscription.id(), "push delivered");
                self.subscriptions.touch(endpoint, sent_at).await?;
            }
            DeliveryOutcome::Gone => {
                deactivated = self.subscriptions.deactivate(endpoint).await?;
                tracing::warn!(
                    subscription_id = %subscription.id(),
                    status = ?status_code,
                    "push endpoint gone; subscription deactivated"
                );
            }
            DeliveryOutcome::Rejected | DeliveryOutcome::Transient => tracing::warn!(
                subscription_id = %subscription.id(),
                outcome = %outcome,
                status = ?status_code,
                detail = %detail,
                "push delivery failed"
            ),
        }
        Ok((outcome, deactivated))
    }
}
