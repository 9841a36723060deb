//! Per-user in-app notification inbox.
//!
//! Notifications are written as a side effect of task lifecycle mutations
//! (inside the same unit of work) or directly through
//! [`services::NotificationRegistry`]. Once committed they are handed to a
//! [`ports::NotificationDispatcher`] for best-effort push delivery; the inbox
//! entry stays visible regardless of delivery outcome.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
