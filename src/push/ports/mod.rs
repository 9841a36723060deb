//! Port contracts for subscription storage, the delivery log and the push
//! transport.

pub mod delivery_log;
pub mod subscriptions;
pub mod transport;

pub use delivery_log::{DeliveryLogError, DeliveryLogRepository, DeliveryLogResult};
pub use subscriptions::{
    SubscriptionRepository, SubscriptionRepositoryError, SubscriptionRepositoryResult,
};
#[cfg(test)]
pub use transport::MockPushTransport;
pub use transport::{PushResponse, PushTransport, TransportError};
