//! Port contracts for notification storage and post-commit dispatch.

pub mod dispatcher;
pub mod repository;

pub use dispatcher::NotificationDispatcher;
pub use repository::{
    NotificationRepository, NotificationRepositoryError, NotificationRepositoryResult,
};
