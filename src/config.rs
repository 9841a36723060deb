//! Environment-driven configuration.
//!
//! [`AppConfig::from_env`] reads process variables; binaries call
//! `dotenvy::dotenv()` first so a local `.env` file can supply them.
//! [`AppConfig::from_lookup`] takes any lookup function, which keeps tests
//! independent of the process environment.

use crate::push::{domain::Urgency, services::DeliveryOptions};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_POOL_SIZE: u32 = 8;
const DEFAULT_TIMEOUT_SECS: u64 = 8;
const TIMEOUT_RANGE_SECS: std::ops::RangeInclusive<u64> = 1..=60;
const DEFAULT_TTL_SECS: u32 = 86_400;
const DEFAULT_CLICK_BASE_URL: &str = "/";

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is unset or blank.
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    /// A variable is set but unusable.
    #[error("invalid value for {name}: {reason}")]
    Invalid {
        /// Variable name.
        name: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

/// Database connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum pooled connections.
    pub pool_size: u32,
}

/// Web Push settings.
#[derive(Clone, PartialEq, Eq)]
pub struct PushConfig {
    /// VAPID private key: the raw P-256 scalar, base64url.
    pub vapid_private_key: String,
    /// VAPID contact, `mailto:` or `https:`.
    pub vapid_subject: String,
    /// Upper bound for one delivery attempt.
    pub request_timeout: Duration,
    /// Seconds a push service may hold an undelivered message.
    pub ttl: u32,
    /// Delivery urgency hint.
    pub urgency: Urgency,
    /// Base of click-through URLs in push payloads.
    pub click_base_url: String,
}

impl fmt::Debug for PushConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PushConfig")
            .field("vapid_private_key", &"<redacted>")
            .field("vapid_subject", &self.vapid_subject)
            .field("request_timeout", &self.request_timeout)
            .field("ttl", &self.ttl)
            .field("urgency", &self.urgency)
            .field("click_base_url", &self.click_base_url)
            .finish()
    }
}

impl PushConfig {
    /// Returns the delivery service options derived from this config.
    #[must_use]
    pub fn delivery_options(&self) -> DeliveryOptions {
        DeliveryOptions {
            request_timeout: self.request_timeout,
            click_base_url: self.click_base_url.clone(),
        }
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Database settings.
    pub database: DatabaseConfig,
    /// Push delivery settings.
    pub push: PushConfig,
}

struct Lookup<F>(F);

impl<F> Lookup<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn optional(&self, name: &'static str) -> Option<String> {
        (self.0)(name)
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
    }

    fn required(&self, name: &'static str) -> Result<String, ConfigError> {
        self.optional(name).ok_or(ConfigError::Missing(name))
    }

    fn parsed<T>(&self, name: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: fmt::Display,
    {
        self.optional(name).map_or(Ok(default), |raw| {
            raw.parse().map_err(|err: T::Err| ConfigError::Invalid {
                name,
                reason: err.to_string(),
            })
        })
    }
}

impl AppConfig {
    /// Loads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a required variable is missing or a
    /// value is out of range.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads configuration through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a required variable is missing or a
    /// value is out of range.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Lookup(lookup);

        let pool_size = vars.parsed("DATABASE_POOL_SIZE", DEFAULT_POOL_SIZE)?;
        if pool_size == 0 {
            return Err(ConfigError::Invalid {
                name: "DATABASE_POOL_SIZE",
                reason: "must be at least 1".to_owned(),
            });
        }
        let database = DatabaseConfig {
            url: vars.required("DATABASE_URL")?,
            pool_size,
        };

        let vapid_subject = vars.required("VAPID_SUBJECT")?;
        if !(vapid_subject.starts_with("mailto:") || vapid_subject.starts_with("https:")) {
            return Err(ConfigError::Invalid {
                name: "VAPID_SUBJECT",
                reason: "must start with mailto: or https:".to_owned(),
            });
        }
        let timeout_secs = vars.parsed("PUSH_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;
        if !TIMEOUT_RANGE_SECS.contains(&timeout_secs) {
            return Err(ConfigError::Invalid {
                name: "PUSH_TIMEOUT_SECS",
                reason: format!(
                    "must be between {} and {}",
                    TIMEOUT_RANGE_SECS.start(),
                    TIMEOUT_RANGE_SECS.end()
                ),
            });
        }
        let urgency = vars
            .optional("PUSH_URGENCY")
            .map_or(Ok(Urgency::default()), |raw| Urgency::try_from(raw.as_str()))
            .map_err(|err| ConfigError::Invalid {
                name: "PUSH_URGENCY",
                reason: err.to_string(),
            })?;
        let push = PushConfig {
            vapid_private_key: vars.required("VAPID_PRIVATE_KEY")?,
            vapid_subject,
            request_timeout: Duration::from_secs(timeout_secs),
            ttl: vars.parsed("PUSH_TTL_SECS", DEFAULT_TTL_SECS)?,
            urgency,
            click_base_url: vars
                .optional("PUSH_CLICK_BASE_URL")
                .unwrap_or_else(|| DEFAULT_CLICK_BASE_URL.to_owned()),
        };

        Ok(Self { database, push })
    }
}
