//! HTTP transport posting encrypted messages to push services.

use super::encryption::encrypt;
use super::vapid::VapidSigner;
use crate::push::{
    domain::{PushSubscription, Urgency},
    ports::{PushResponse, PushTransport, TransportError},
};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, Url};
use std::time::Duration;

/// Per-request options sent with every push.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WebPushOptions {
    /// Seconds the push service may hold an undelivered message.
    pub ttl: u32,
    /// Delivery urgency hint.
    pub urgency: Urgency,
    /// Upper bound for one HTTP exchange.
    pub request_timeout: Duration,
}

/// [`PushTransport`] speaking the Web Push protocol over HTTPS.
#[derive(Debug, Clone)]
pub struct WebPushTransport {
    client: Client,
    signer: VapidSigner,
    options: WebPushOptions,
}

impl WebPushTransport {
    /// Creates a transport with its own HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Network`] when the HTTP client cannot be
    /// built.
    pub fn new(signer: VapidSigner, options: WebPushOptions) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(options.request_timeout)
            .build()
            .map_err(|err| TransportError::Network(err.to_string()))?;
        Ok(Self {
            client,
            signer,
            options,
        })
    }

    /// Returns the VAPID public key browsers must subscribe with.
    #[must_use]
    pub fn public_key(&self) -> &str {
        self.signer.public_key()
    }
}

fn classify_send_error(err: &reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(err.to_string())
    } else {
        TransportError::Network(err.to_string())
    }
}

#[async_trait]
impl PushTransport for WebPushTransport {
    async fn send(
        &self,
        subscription: &PushSubscription,
        payload: &[u8],
    ) -> Result<PushResponse, TransportError> {
        let endpoint = Url::parse(subscription.endpoint())
            .map_err(|err| TransportError::InvalidSubscription(err.to_string()))?;
        let keys = subscription.keys();
        let client_public = keys
            .p256dh_bytes()
            .map_err(|err| TransportError::InvalidSubscription(err.to_string()))?;
        let auth_secret = keys
            .auth_bytes()
            .map_err(|err| TransportError::InvalidSubscription(err.to_string()))?;

        let body = encrypt(payload, &client_public, &auth_secret)?;
        let authorization = self
            .signer
            .authorization(&endpoint, Utc::now())
            .map_err(|err| TransportError::Vapid(err.to_string()))?;

        let response = self
            .client
            .post(endpoint)
            .header("TTL", self.options.ttl.to_string())
            .header("Urgency", self.options.urgency.as_str())
            .header("Content-Encoding", "aes128gcm")
            .header("Content-Type", "application/octet-stream")
            .header("Authorization", authorization)
            .body(body)
            .send()
            .await
            .map_err(|err| classify_send_error(&err))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .unwrap_or_else(|err| format!("<unreadable body: {err}>"));
        tracing::debug!(
            subscription_id = %subscription.id(),
            status,
            "push service answered"
        );
        Ok(PushResponse { status, body: text })
    }
}
