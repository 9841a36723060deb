//! Caller-facing error classification shared by all services.
//!
//! Each service error exposes `kind()` so an API layer can choose the right
//! corrective response without matching nested variants.

use serde::{Deserialize, Serialize};

/// Coarse error category reported to callers of mutating operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A referenced task, request, notification, or user does not exist.
    NotFound,
    /// The actor lacks authority for the requested mutation.
    Forbidden,
    /// The requested status is not a legal successor of the current one.
    InvalidTransition,
    /// The entity is not in a state that allows the operation.
    InvalidState,
    /// A uniqueness rule would be violated.
    Conflict,
    /// Input failed validation.
    Validation,
    /// Infrastructure failure.
    Internal,
}
