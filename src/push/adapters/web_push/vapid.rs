//! VAPID (RFC 8292) request signing.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use p256::SecretKey;
use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::pkcs8::EncodePrivateKey;
use reqwest::Url;
use serde::Serialize;
use thiserror::Error;

/// Lifetime of a signed token. Push services reject anything over 24 hours.
const TOKEN_LIFETIME_HOURS: i64 = 12;

/// Errors raised while loading keys or signing tokens.
#[derive(Debug, Error)]
pub enum VapidError {
    /// The private key is not a base64url-encoded P-256 scalar.
    #[error("invalid VAPID private key: {0}")]
    InvalidKey(String),

    /// The endpoint has no origin to use as the audience.
    #[error("endpoint {0} has no usable origin")]
    OpaqueOrigin(String),

    /// JWT signing failed.
    #[error("failed to sign VAPID token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

#[derive(Debug, Serialize)]
struct Claims<'a> {
    aud: String,
    exp: i64,
    sub: &'a str,
}

/// Signs ES256 VAPID tokens for push requests.
#[derive(Clone)]
pub struct VapidSigner {
    key: EncodingKey,
    public_key: String,
    subject: String,
}

impl std::fmt::Debug for VapidSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VapidSigner")
            .field("public_key", &self.public_key)
            .field("subject", &self.subject)
            .finish_non_exhaustive()
    }
}

impl VapidSigner {
    /// Loads a signer from the raw private scalar in base64url form, the
    /// format VAPID key generators print.
    ///
    /// `subject` is the operator contact, e.g. `mailto:ops@example.com`.
    ///
    /// # Errors
    ///
    /// Returns [`VapidError::InvalidKey`] when the key cannot be decoded.
    pub fn from_base64(private_key: &str, subject: impl Into<String>) -> Result<Self, VapidError> {
        let raw = URL_SAFE_NO_PAD
            .decode(private_key.trim().trim_end_matches('='))
            .map_err(|err| VapidError::InvalidKey(err.to_string()))?;
        let secret =
            SecretKey::from_slice(&raw).map_err(|err| VapidError::InvalidKey(err.to_string()))?;
        let der = secret
            .to_pkcs8_der()
            .map_err(|err| VapidError::InvalidKey(err.to_string()))?;
        let public_point = secret.public_key().to_encoded_point(false);
        Ok(Self {
            key: EncodingKey::from_ec_der(der.as_bytes()),
            public_key: URL_SAFE_NO_PAD.encode(public_point.as_bytes()),
            subject: subject.into(),
        })
    }

    /// Returns the application server public key browsers subscribe with.
    #[must_use]
    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    /// Builds the `Authorization` header value for a request to `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`VapidError`] when the endpoint has no origin or signing
    /// fails.
    pub fn authorization(&self, endpoint: &Url, now: DateTime<Utc>) -> Result<String, VapidError> {
        let origin = endpoint.origin();
        if !origin.is_tuple() {
            return Err(VapidError::OpaqueOrigin(endpoint.to_string()));
        }
        let claims = Claims {
            aud: origin.ascii_serialization(),
            exp: (now + TimeDelta::hours(TOKEN_LIFETIME_HOURS)).timestamp(),
            sub: &self.subject,
        };
        let token = jsonwebtoken::encode(&Header::new(Algorithm::ES256), &claims, &self.key)?;
        Ok(format!("vapid t={token}, k={}", self.public_key))
    }
}
