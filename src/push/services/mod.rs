//! Application services for push subscriptions and delivery.

mod delivery;
mod queue;
mod registry;

pub use delivery::{DeliveryOptions, DispatchReport, PushDeliveryError, PushDeliveryService};
pub use queue::QueuedDispatcher;
pub use registry::{
    PushSubscriptionRegistry, SubscriptionRegistration, SubscriptionServiceError,
    SubscriptionServiceResult,
};
