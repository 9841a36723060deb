//! `PostgreSQL` adapter for the notification inbox.

mod models;
mod repository;
pub(crate) mod schema;

pub(crate) use repository::insert_notifications;
pub use repository::PostgresNotificationRepository;
