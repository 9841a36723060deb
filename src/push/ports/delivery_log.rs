//! Append-only record of push delivery attempts.

use crate::push::domain::{DeliveryLogEntry, NewDeliveryLogEntry};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for delivery log operations.
pub type DeliveryLogResult<T> = Result<T, DeliveryLogError>;

/// Delivery log persistence contract.
#[async_trait]
pub trait DeliveryLogRepository: Send + Sync {
    /// Appends one attempt.
    async fn append(&self, entry: &NewDeliveryLogEntry) -> DeliveryLogResult<DeliveryLogEntry>;

    /// Returns attempts sent at or after `since`, oldest first.
    async fn since(&self, since: DateTime<Utc>) -> DeliveryLogResult<Vec<DeliveryLogEntry>>;
}

/// Errors returned by delivery log implementations.
#[derive(Debug, Clone, Error)]
pub enum DeliveryLogError {
    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl DeliveryLogError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
