//! Error types for push subscription validation and parsing.

use thiserror::Error;

/// Errors returned by push domain rules.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PushDomainError {
    /// The endpoint is not an absolute `https` URL.
    #[error("invalid push endpoint {endpoint}: {reason}")]
    InvalidEndpoint {
        /// Rejected endpoint.
        endpoint: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A subscription key is not valid base64url or has the wrong shape.
    #[error("invalid {field} key: {reason}")]
    InvalidKey {
        /// `p256dh` or `auth`.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },
}

/// Error returned while parsing delivery outcomes from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown delivery outcome: {0}")]
pub struct ParseDeliveryOutcomeError(pub String);

/// Error returned while parsing push urgency values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown push urgency: {0}")]
pub struct ParseUrgencyError(pub String);
