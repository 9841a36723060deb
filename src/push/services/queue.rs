//! Background push delivery decoupled from business transactions.

use super::PushDeliveryService;
use crate::notification::{domain::Notification, ports::NotificationDispatcher};
use crate::push::ports::{DeliveryLogRepository, PushTransport, SubscriptionRepository};
use mockable::Clock;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::{UnboundedSender, unbounded_channel};
use tokio::task::{JoinHandle, JoinSet};

/// [`NotificationDispatcher`] that queues committed notifications for
/// background push delivery.
///
/// A drain task receives from an unbounded channel and runs one dispatch
/// per notification on its own task, so one slow fan-out never delays the
/// next. Dropping the dispatcher closes the channel; [`Self::shutdown`]
/// additionally waits for in-flight deliveries.
#[derive(Debug)]
pub struct QueuedDispatcher {
    sender: Mutex<Option<UnboundedSender<Notification>>>,
    drain: Mutex<Option<JoinHandle<()>>>,
}

impl QueuedDispatcher {
    /// Starts the drain task on the current Tokio runtime.
    #[must_use]
    pub fn spawn<S, L, T, C>(service: Arc<PushDeliveryService<S, L, T, C>>) -> Self
    where
        S: SubscriptionRepository + 'static,
        L: DeliveryLogRepository + 'static,
        T: PushTransport + 'static,
        C: Clock + Send + Sync + 'static,
    {
        let (sender, mut receiver) = unbounded_channel::<Notification>();
        let drain = tokio::spawn(async move {
            let mut in_flight = JoinSet::new();
            while let Some(notification) = receiver.recv().await {
                let delivery = Arc::clone(&service);
                in_flight.spawn(async move {
                    if let Err(err) = delivery.dispatch(&notification).await {
                        tracing::error!(
                            notification_id = %notification.id(),
                            error = %err,
                            "push dispatch failed"
                        );
                    }
                });
                while let Some(finished) = in_flight.try_join_next() {
                    log_join_failure(&finished);
                }
            }
            while let Some(finished) = in_flight.join_next().await {
                log_join_failure(&finished);
            }
            tracing::debug!("push queue drained");
        });
        Self {
            sender: Mutex::new(Some(sender)),
            drain: Mutex::new(Some(drain)),
        }
    }

    /// Closes the queue and waits until every queued notification has been
    /// dispatched. Later calls to [`NotificationDispatcher::dispatch`] are
    /// dropped with an error log.
    pub async fn shutdown(&self) {
        if let Ok(mut sender) = self.sender.lock() {
            *sender = None;
        }
        let handle = self.drain.lock().ok().and_then(|mut drain| drain.take());
        let Some(drain) = handle else {
            return;
        };
        if let Err(err) = drain.await {
            tracing::error!(error = %err, "push queue drain task failed");
        }
    }
}

fn log_join_failure(finished: &Result<(), tokio::task::JoinError>) {
    if let Err(err) = finished {
        tracing::error!(error = %err, "push dispatch task panicked");
    }
}

impl NotificationDispatcher for QueuedDispatcher {
    fn dispatch(&self, notifications: &[Notification]) {
        let Ok(guard) = self.sender.lock() else {
            tracing::error!("push queue lock poisoned; notifications stay in-app only");
            return;
        };
        let Some(sender) = guard.as_ref() else {
            tracing::error!(
                count = notifications.len(),
                "push queue closed; notifications stay in-app only"
            );
            return;
        };
        for notification in notifications {
            if sender.send(notification.clone()).is_err() {
                tracing::error!(
                    notification_id = %notification.id(),
                    "push queue closed; notification stays in-app only"
                );
            }
        }
    }
}
