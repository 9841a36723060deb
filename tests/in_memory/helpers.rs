//! Shared wiring for in-memory integration tests.

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::NaiveDate;
use mockable::DefaultClock;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use taskdesk::identity::{
    adapters::memory::InMemoryUserDirectory,
    domain::{Actor, Role, User, UserId},
};
use taskdesk::notification::{
    adapters::{dispatch::NoopDispatcher, memory::InMemoryNotificationRepository},
    services::NotificationRegistry,
};
use taskdesk::push::{
    adapters::memory::{InMemoryDeliveryLog, InMemorySubscriptionRepository},
    domain::{PushMessage, PushSubscription},
    ports::{PushResponse, PushTransport, TransportError},
    services::{
        DeliveryOptions, PushDeliveryService, PushSubscriptionRegistry, QueuedDispatcher,
        SubscriptionRegistration,
    },
};
use taskdesk::task::{
    adapters::memory::InMemoryTaskStore,
    domain::TaskId,
    services::{CreateTaskRequest, ReassignmentWorkflow, StatusTransitionEngine},
};

/// Admin who creates tasks and resolves requests.
pub const ADMIN: UserId = UserId::new(1);
/// Regular user tasks are assigned to.
pub const ASSIGNEE: UserId = UserId::new(2);
/// Regular user proposed as a new assignee.
pub const COLLEAGUE: UserId = UserId::new(3);

/// Base URL used to build click-through links.
pub const CLICK_BASE_URL: &str = "https://desk.example.com";

/// Transport answering with a fixed status per endpoint and recording
/// every message it receives.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    statuses: Mutex<HashMap<String, u16>>,
    sent: Mutex<Vec<(String, PushMessage)>>,
}

impl ScriptedTransport {
    /// Answers `status` for each listed endpoint; others get 201.
    #[must_use]
    pub fn answering(statuses: &[(&str, u16)]) -> Self {
        let transport = Self::default();
        for (endpoint, status) in statuses {
            transport.answer(endpoint, *status);
        }
        transport
    }

    /// Makes later sends to `endpoint` answer `status`.
    pub fn answer(&self, endpoint: &str, status: u16) {
        self.statuses
            .lock()
            .expect("transport lock")
            .insert(endpoint.to_owned(), status);
    }

    /// Returns `(endpoint, message)` for every send.
    #[must_use]
    pub fn sent(&self) -> Vec<(String, PushMessage)> {
        self.sent.lock().expect("transport lock").clone()
    }
}

#[async_trait]
impl PushTransport for ScriptedTransport {
    async fn send(
        &self,
        subscription: &PushSubscription,
        payload: &[u8],
    ) -> Result<PushResponse, TransportError> {
        let message: PushMessage = serde_json::from_slice(payload)
            .map_err(|err| TransportError::Encryption(err.to_string()))?;
        self.sent
            .lock()
            .expect("transport lock")
            .push((subscription.endpoint().to_owned(), message));
        let status = self
            .statuses
            .lock()
            .expect("transport lock")
            .get(subscription.endpoint())
            .copied()
            .unwrap_or(201);
        Ok(PushResponse {
            status,
            body: String::new(),
        })
    }
}

/// Engine type wired to in-memory adapters.
pub type Engine = StatusTransitionEngine<
    InMemoryTaskStore,
    InMemoryUserDirectory,
    QueuedDispatcher,
    DefaultClock,
>;
/// Workflow type wired to in-memory adapters.
pub type Workflow =
    ReassignmentWorkflow<InMemoryTaskStore, InMemoryUserDirectory, QueuedDispatcher, DefaultClock>;
/// Inbox type wired to in-memory adapters.
pub type Inbox = NotificationRegistry<
    InMemoryNotificationRepository,
    InMemoryUserDirectory,
    NoopDispatcher,
    DefaultClock,
>;
/// Subscription registry wired to in-memory adapters.
pub type Subscriptions = PushSubscriptionRegistry<InMemorySubscriptionRepository, DefaultClock>;

/// Fully wired in-memory deployment.
pub struct Desk {
    /// Task creation and status changes.
    pub engine: Engine,
    /// Reassignment requests and decisions.
    pub workflow: Workflow,
    /// Notification inbox.
    pub inbox: Inbox,
    /// Push subscription registry.
    pub subscriptions: Subscriptions,
    /// Recorded delivery attempts.
    pub delivery_log: Arc<InMemoryDeliveryLog>,
    /// Push transport double.
    pub transport: Arc<ScriptedTransport>,
    dispatcher: Arc<QueuedDispatcher>,
}

impl Desk {
    /// Waits until every queued push has been attempted.
    pub async fn drain_push_queue(&self) {
        self.dispatcher.shutdown().await;
    }
}

/// Builds a deployment with an admin and two regular users.
///
/// Must be called from within a Tokio runtime.
#[must_use]
pub fn desk(transport: ScriptedTransport) -> Desk {
    let users = InMemoryUserDirectory::new();
    for user in [
        User::new(ADMIN, "Ada Admin", Role::Admin),
        User::new(ASSIGNEE, "Sam Field", Role::User),
        User::new(COLLEAGUE, "Kim Crew", Role::User),
    ] {
        users.upsert(user).expect("seed user");
    }
    let users = Arc::new(users);
    let clock = Arc::new(DefaultClock);
    let notifications = InMemoryNotificationRepository::new();
    let store = Arc::new(InMemoryTaskStore::new(notifications.clone()));
    let subscription_store = Arc::new(InMemorySubscriptionRepository::new());
    let delivery_log = Arc::new(InMemoryDeliveryLog::new());
    let transport = Arc::new(transport);

    let delivery = PushDeliveryService::new(
        Arc::clone(&subscription_store),
        Arc::clone(&delivery_log),
        Arc::clone(&transport),
        Arc::clone(&clock),
        DeliveryOptions {
            click_base_url: CLICK_BASE_URL.to_owned(),
            ..DeliveryOptions::default()
        },
    );
    let dispatcher = Arc::new(QueuedDispatcher::spawn(Arc::new(delivery)));

    Desk {
        engine: StatusTransitionEngine::new(
            Arc::clone(&store),
            Arc::clone(&users),
            Arc::clone(&dispatcher),
            Arc::clone(&clock),
        ),
        workflow: ReassignmentWorkflow::new(
            store,
            Arc::clone(&users),
            Arc::clone(&dispatcher),
            Arc::clone(&clock),
        ),
        inbox: NotificationRegistry::new(
            Arc::new(notifications),
            users,
            Arc::new(NoopDispatcher),
            Arc::clone(&clock),
        ),
        subscriptions: PushSubscriptionRegistry::new(subscription_store, clock),
        delivery_log,
        transport,
        dispatcher,
    }
}

/// Browser registration carrying well-formed keys.
#[must_use]
pub fn registration(endpoint: &str) -> SubscriptionRegistration {
    let mut point = vec![0x04_u8];
    point.extend([5_u8; 64]);
    SubscriptionRegistration::new(
        endpoint,
        URL_SAFE_NO_PAD.encode(&point),
        URL_SAFE_NO_PAD.encode([6_u8; 16]),
    )
}

/// Task request for `assignee` scheduled on a fixed date.
#[must_use]
pub fn task_for(assignee: UserId, title: &str) -> CreateTaskRequest {
    let scheduled_on = NaiveDate::from_ymd_opt(2026, 3, 2).expect("valid date");
    CreateTaskRequest::new(title, "Level 2 plant room", scheduled_on, assignee)
}

/// Creates a task for [`ASSIGNEE`] as the admin and returns its id.
pub async fn create_task(desk: &Desk, title: &str) -> TaskId {
    desk.engine
        .create_task(Actor::admin(ADMIN), task_for(ASSIGNEE, title))
        .await
        .expect("task creation should succeed")
        .task
        .id()
}
