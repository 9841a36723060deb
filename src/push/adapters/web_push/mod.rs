//! Web Push protocol adapter.
//!
//! Payloads are encrypted with the `aes128gcm` content coding (RFC 8291)
//! and requests are authorised with a VAPID token (RFC 8292) before being
//! posted to the subscription endpoint.

mod encryption;
mod transport;
mod vapid;

pub use encryption::MAX_PAYLOAD_LEN;
pub use transport::{WebPushOptions, WebPushTransport};
pub use vapid::{VapidError, VapidSigner};
