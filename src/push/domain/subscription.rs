//! Device push subscriptions.

use super::PushDomainError;
use crate::identity::domain::UserId;
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Length of an uncompressed P-256 public key.
const P256DH_LEN: usize = 65;
/// Length of the Web Push authentication secret.
const AUTH_LEN: usize = 16;

/// Push subscription identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubscriptionId(i64);

impl SubscriptionId {
    /// Wraps a storage identifier.
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the raw identifier.
    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Client public keys used to encrypt payloads for one subscription.
///
/// Keys are kept in the base64url form browsers report them in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionKeys {
    p256dh: String,
    auth: String,
}

fn decode_key(field: &'static str, value: &str) -> Result<Vec<u8>, PushDomainError> {
    URL_SAFE_NO_PAD
        .decode(value.trim().trim_end_matches('='))
        .map_err(|err| PushDomainError::InvalidKey {
            field,
            reason: err.to_string(),
        })
}

impl SubscriptionKeys {
    /// Validates and wraps subscription keys.
    ///
    /// # Errors
    ///
    /// Returns [`PushDomainError::InvalidKey`] unless `p256dh` decodes to a
    /// 65-byte uncompressed point and `auth` to 16 bytes.
    pub fn new(
        p256dh: impl Into<String>,
        auth: impl Into<String>,
    ) -> Result<Self, PushDomainError> {
        let keys = Self {
            p256dh: p256dh.into().trim().to_owned(),
            auth: auth.into().trim().to_owned(),
        };
        let point = keys.p256dh_bytes()?;
        if point.len() != P256DH_LEN || point.first() != Some(&0x04) {
            return Err(PushDomainError::InvalidKey {
                field: "p256dh",
                reason: format!("expected a {P256DH_LEN}-byte uncompressed point"),
            });
        }
        if keys.auth_bytes()?.len() != AUTH_LEN {
            return Err(PushDomainError::InvalidKey {
                field: "auth",
                reason: format!("expected {AUTH_LEN} bytes"),
            });
        }
        Ok(keys)
    }

    /// Returns the base64url `p256dh` key.
    #[must_use]
    pub fn p256dh(&self) -> &str {
        &self.p256dh
    }

    /// Returns the base64url `auth` secret.
    #[must_use]
    pub fn auth(&self) -> &str {
        &self.auth
    }

    /// Decodes the `p256dh` key.
    ///
    /// # Errors
    ///
    /// Returns [`PushDomainError::InvalidKey`] when the key is not base64url.
    pub fn p256dh_bytes(&self) -> Result<Vec<u8>, PushDomainError> {
        decode_key("p256dh", &self.p256dh)
    }

    /// Decodes the `auth` secret.
    ///
    /// # Errors
    ///
    /// Returns [`PushDomainError::InvalidKey`] when the secret is not
    /// base64url.
    pub fn auth_bytes(&self) -> Result<Vec<u8>, PushDomainError> {
        decode_key("auth", &self.auth)
    }
}

/// Validated registration that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPushSubscription {
    user_id: UserId,
    endpoint: String,
    keys: SubscriptionKeys,
    user_agent: Option<String>,
}

impl NewPushSubscription {
    /// Creates a registration payload.
    ///
    /// # Errors
    ///
    /// Returns [`PushDomainError::InvalidEndpoint`] unless `endpoint` is an
    /// absolute `https` URL.
    pub fn new(
        user_id: UserId,
        endpoint: impl Into<String>,
        keys: SubscriptionKeys,
        user_agent: Option<String>,
    ) -> Result<Self, PushDomainError> {
        let raw_endpoint = endpoint.into();
        let trimmed = raw_endpoint.trim();
        let url = Url::parse(trimmed).map_err(|err| PushDomainError::InvalidEndpoint {
            endpoint: trimmed.to_owned(),
            reason: err.to_string(),
        })?;
        if url.scheme() != "https" {
            return Err(PushDomainError::InvalidEndpoint {
                endpoint: trimmed.to_owned(),
                reason: "push endpoints must use https".to_owned(),
            });
        }
        Ok(Self {
            user_id,
            endpoint: trimmed.to_owned(),
            keys,
            user_agent: user_agent.filter(|agent| !agent.trim().is_empty()),
        })
    }

    /// Returns the owning user.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the endpoint URL.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Returns the client keys.
    #[must_use]
    pub const fn keys(&self) -> &SubscriptionKeys {
        &self.keys
    }

    /// Returns the user agent.
    #[must_use]
    pub fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref()
    }
}

/// Stored push subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushSubscription {
    id: SubscriptionId,
    user_id: Option<UserId>,
    endpoint: String,
    keys: SubscriptionKeys,
    user_agent: Option<String>,
    active: bool,
    created_at: DateTime<Utc>,
    last_used_at: Option<DateTime<Utc>>,
}

/// Parameter object for reconstructing a persisted subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedSubscriptionData {
    /// Subscription identifier.
    pub id: SubscriptionId,
    /// Owning user, unknown for devices that subscribed anonymously.
    pub user_id: Option<UserId>,
    /// Endpoint URL.
    pub endpoint: String,
    /// Client keys.
    pub keys: SubscriptionKeys,
    /// User agent.
    pub user_agent: Option<String>,
    /// Active flag.
    pub active: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Latest successful delivery.
    pub last_used_at: Option<DateTime<Utc>>,
}

impl PushSubscription {
    /// Materializes a new active subscription.
    #[must_use]
    pub fn from_new(
        id: SubscriptionId,
        new: NewPushSubscription,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id: Some(new.user_id),
            endpoint: new.endpoint,
            keys: new.keys,
            user_agent: new.user_agent,
            active: true,
            created_at,
            last_used_at: None,
        }
    }

    /// Reconstructs a subscription from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedSubscriptionData) -> Self {
        Self {
            id: data.id,
            user_id: data.user_id,
            endpoint: data.endpoint,
            keys: data.keys,
            user_agent: data.user_agent,
            active: data.active,
            created_at: data.created_at,
            last_used_at: data.last_used_at,
        }
    }

    /// Re-registers an existing endpoint: new owner and keys, active again.
    pub fn reactivate(&mut self, registration: NewPushSubscription) {
        self.user_id = Some(registration.user_id);
        self.keys = registration.keys;
        self.user_agent = registration.user_agent;
        self.active = true;
    }

    /// Marks the subscription inactive. Returns `false` if it already was.
    pub const fn deactivate(&mut self) -> bool {
        let was_active = self.active;
        self.active = false;
        was_active
    }

    /// Records a successful delivery.
    pub const fn touch(&mut self, at: DateTime<Utc>) {
        self.last_used_at = Some(at);
    }

    /// Returns the subscription identifier.
    #[must_use]
    pub const fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Returns the owning user.
    #[must_use]
    pub const fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    /// Returns the endpoint URL.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Returns the client keys.
    #[must_use]
    pub const fn keys(&self) -> &SubscriptionKeys {
        &self.keys
    }

    /// Returns the user agent.
    #[must_use]
    pub fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref()
    }

    /// Returns `true` while the subscription receives pushes.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest successful delivery time.
    #[must_use]
    pub const fn last_used_at(&self) -> Option<DateTime<Utc>> {
        self.last_used_at
    }
}
