//! Outbound transport that hands an encrypted message to a push service.

use crate::push::domain::PushSubscription;
use async_trait::async_trait;
use thiserror::Error;

/// Response received from a push service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body, often empty.
    pub body: String,
}

/// Failures that happen before a push service answers.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The payload exceeds what fits in one encrypted record.
    #[error("payload of {size} bytes exceeds the {max}-byte limit")]
    PayloadTooLarge {
        /// Payload size.
        size: usize,
        /// Maximum accepted size.
        max: usize,
    },

    /// The subscription endpoint or keys cannot be used.
    #[error("unusable subscription: {0}")]
    InvalidSubscription(String),

    /// Payload encryption failed.
    #[error("encryption failed: {0}")]
    Encryption(String),

    /// Signing the VAPID token failed.
    #[error("VAPID signing failed: {0}")]
    Vapid(String),

    /// The request could not be sent or the connection dropped.
    #[error("network error: {0}")]
    Network(String),

    /// No response arrived in time.
    #[error("timed out: {0}")]
    Timeout(String),
}

impl TransportError {
    /// Returns `true` when the same attempt might succeed later.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Timeout(_))
    }
}

/// Sends one payload to one subscription.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PushTransport: Send + Sync {
    /// Encrypts `payload` for `subscription` and posts it to the endpoint.
    ///
    /// Any HTTP answer, including error statuses, is returned as a
    /// [`PushResponse`]; only failures without an answer are errors.
    async fn send(
        &self,
        subscription: &PushSubscription,
        payload: &[u8],
    ) -> Result<PushResponse, TransportError>;
}
