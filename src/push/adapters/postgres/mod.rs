//! `PostgreSQL` adapters for push subscriptions and the delivery log.

mod delivery_log;
mod models;
pub(crate) mod schema;
mod subscriptions;

pub use delivery_log::PostgresDeliveryLog;
pub use subscriptions::PostgresSubscriptionRepository;
