//! Web Push delivery of committed notifications.
//!
//! Devices register push endpoints with [`services::PushSubscriptionRegistry`].
//! [`services::PushDeliveryService`] fans a notification out to every active
//! subscription of its recipient, records one delivery log entry per attempt,
//! and deactivates endpoints the push service reports as gone. Delivery is
//! decoupled from the business transaction that created the notification:
//! [`services::QueuedDispatcher`] runs it on background tasks after commit.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
