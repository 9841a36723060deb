//! Re-attempts push deliveries that failed transiently.
//!
//! Usage:
//!
//! ```text
//! push_retry [window-minutes]
//! ```
//!
//! Reads the delivery log of the last `window-minutes` (default 60) and
//! resends every notification whose latest attempt to a still-active
//! subscription failed with a transient outcome. Configuration comes from
//! the environment, optionally seeded from a `.env` file; see
//! [`taskdesk::config::AppConfig`]. Exits with status 1 when configuration,
//! the database, or the delivery log is unusable.

use chrono::{TimeDelta, Utc};
use diesel::r2d2::PoolError;
use mockable::DefaultClock;
use std::process::ExitCode;
use std::sync::Arc;
use taskdesk::config::{AppConfig, ConfigError};
use taskdesk::db::build_pool;
use taskdesk::push::{
    adapters::{
        postgres::{PostgresDeliveryLog, PostgresSubscriptionRepository},
        web_push::{VapidError, VapidSigner, WebPushOptions, WebPushTransport},
    },
    ports::TransportError,
    services::{DispatchReport, PushDeliveryError, PushDeliveryService},
};
use taskdesk::telemetry;
use thiserror::Error;
use tokio::runtime::Builder;

const DEFAULT_WINDOW_MINUTES: i64 = 60;

/// Errors that abort a retry run.
#[derive(Debug, Error)]
enum RetryError {
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database pool: {0}")]
    Pool(#[from] PoolError),
    #[error(transparent)]
    Vapid(#[from] VapidError),
    #[error("push transport: {0}")]
    Transport(#[from] TransportError),
    #[error("runtime init failed: {0}")]
    RuntimeInit(#[source] std::io::Error),
    #[error("retry failed: {0}")]
    Delivery(#[from] PushDeliveryError),
}

fn parse_window(arg: Option<&str>) -> Result<TimeDelta, RetryError> {
    let Some(raw) = arg else {
        return Ok(TimeDelta::minutes(DEFAULT_WINDOW_MINUTES));
    };
    let minutes: i64 = raw.trim().parse().map_err(|_| {
        RetryError::InvalidArgs(format!("window must be a whole number of minutes, got '{raw}'"))
    })?;
    if minutes <= 0 {
        return Err(RetryError::InvalidArgs(format!(
            "window must be positive, got {minutes}"
        )));
    }
    TimeDelta::try_minutes(minutes)
        .ok_or_else(|| RetryError::InvalidArgs(format!("window of {minutes} minutes is too large")))
}

fn run(window: TimeDelta) -> Result<DispatchReport, RetryError> {
    let config = AppConfig::from_env()?;
    let pool = build_pool(&config.database.url, config.database.pool_size)?;
    let signer = VapidSigner::from_base64(
        &config.push.vapid_private_key,
        config.push.vapid_subject.clone(),
    )?;
    let transport = WebPushTransport::new(
        signer,
        WebPushOptions {
            ttl: config.push.ttl,
            urgency: config.push.urgency,
            request_timeout: config.push.request_timeout,
        },
    )?;
    let service = PushDeliveryService::new(
        Arc::new(PostgresSubscriptionRepository::new(pool.clone())),
        Arc::new(PostgresDeliveryLog::new(pool)),
        Arc::new(transport),
        Arc::new(DefaultClock),
        config.push.delivery_options(),
    );

    let runtime = Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(RetryError::RuntimeInit)?;
    let since = Utc::now().checked_sub_signed(window).ok_or_else(|| {
        RetryError::InvalidArgs("window reaches past the supported date range".to_owned())
    })?;
    tracing::info!(%since, "retrying transient push failures");
    Ok(runtime.block_on(service.retry_failed(since))?)
}

fn main() -> ExitCode {
    let dotenv = dotenvy::dotenv();
    telemetry::init(telemetry::DEFAULT_FILTER);
    if let Err(err) = dotenv {
        tracing::debug!(error = %err, "no .env file loaded");
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    let outcome = parse_window(args.first().map(String::as_str)).and_then(run);
    match outcome {
        Ok(report) => {
            tracing::info!(
                attempted = report.attempted,
                delivered = report.delivered,
                failed = report.failed,
                deactivated = report.deactivated,
                "push retry complete"
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(error = %err, "push retry aborted");
            ExitCode::FAILURE
        }
    }
}
