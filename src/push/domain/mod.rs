//! Domain model for push subscriptions and delivery records.

mod delivery;
mod error;
mod message;
mod subscription;

pub use delivery::{DeliveryLogEntry, DeliveryLogId, DeliveryOutcome, NewDeliveryLogEntry};
pub use error::{ParseDeliveryOutcomeError, ParseUrgencyError, PushDomainError};
pub use message::{PushData, PushMessage, Urgency};
pub use subscription::{
    NewPushSubscription, PersistedSubscriptionData, PushSubscription, SubscriptionId,
    SubscriptionKeys,
};
