//! `PostgreSQL` integration tests for push bookkeeping.

use super::helpers::{ASSIGNEE, COLLEAGUE, TestDatabase, test_database};
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{TimeDelta, Utc};
use mockable::DefaultClock;
use rstest::rstest;
use std::sync::Arc;
use taskdesk::push::{
    adapters::postgres::{PostgresDeliveryLog, PostgresSubscriptionRepository},
    domain::{DeliveryOutcome, NewDeliveryLogEntry},
    ports::DeliveryLogRepository,
    services::{PushSubscriptionRegistry, SubscriptionRegistration},
};

const ENDPOINT: &str = "https://push.example.net/send/tablet";

fn registration(endpoint: &str, user_agent: &str) -> SubscriptionRegistration {
    let mut point = vec![0x04_u8];
    point.extend([9_u8; 64]);
    SubscriptionRegistration::new(
        endpoint,
        URL_SAFE_NO_PAD.encode(&point),
        URL_SAFE_NO_PAD.encode([3_u8; 16]),
    )
    .with_user_agent(user_agent)
}

fn log_entry(outcome: DeliveryOutcome, minutes_ago: i64) -> NewDeliveryLogEntry {
    NewDeliveryLogEntry {
        notification_id: None,
        recipient: ASSIGNEE,
        endpoint: ENDPOINT.to_owned(),
        title: "New task assigned".to_owned(),
        body: "Ada Admin assigned you a task.".to_owned(),
        payload: serde_json::json!({ "title": "New task assigned" }),
        outcome,
        status_code: outcome.is_success().then_some(201),
        detail: String::new(),
        sent_at: Utc::now() - TimeDelta::minutes(minutes_ago),
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn registering_an_endpoint_again_updates_the_same_row(
    #[future(awt)] test_database: eyre::Result<TestDatabase>,
) -> eyre::Result<()> {
    let database = test_database?;
    let registry = PushSubscriptionRegistry::new(
        Arc::new(PostgresSubscriptionRepository::new(database.pool.clone())),
        Arc::new(DefaultClock),
    );

    let first = registry
        .register(ASSIGNEE, registration(ENDPOINT, "Firefox"))
        .await?;
    eyre::ensure!(registry.deactivate(ENDPOINT).await?, "first deactivation");
    eyre::ensure!(
        !registry.deactivate(ENDPOINT).await?,
        "second deactivation changes nothing"
    );

    let second = registry
        .register(COLLEAGUE, registration(ENDPOINT, "Chrome"))
        .await?;
    eyre::ensure!(second.id() == first.id(), "endpoint is the identity");
    eyre::ensure!(second.is_active(), "re-registration reactivates");
    eyre::ensure!(second.user_id() == Some(COLLEAGUE), "owner follows login");
    eyre::ensure!(second.user_agent() == Some("Chrome"), "user agent updates");

    eyre::ensure!(
        registry.list_active(ASSIGNEE).await?.is_empty(),
        "previous owner keeps nothing"
    );
    eyre::ensure!(
        registry.list_active(COLLEAGUE).await?.len() == 1,
        "new owner has the subscription"
    );

    let used_at = Utc::now();
    registry.touch(ENDPOINT, used_at).await?;
    let touched = registry
        .find_by_endpoint(ENDPOINT)
        .await?
        .ok_or_else(|| eyre::eyre!("subscription should exist"))?;
    eyre::ensure!(touched.last_used_at().is_some(), "touch should persist");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn delivery_log_lists_recent_attempts_oldest_first(
    #[future(awt)] test_database: eyre::Result<TestDatabase>,
) -> eyre::Result<()> {
    let database = test_database?;
    let log = PostgresDeliveryLog::new(database.pool.clone());

    log.append(&log_entry(DeliveryOutcome::Transient, 180)).await?;
    let older = log.append(&log_entry(DeliveryOutcome::Transient, 30)).await?;
    let newer = log.append(&log_entry(DeliveryOutcome::Delivered, 5)).await?;

    let recent = log.since(Utc::now() - TimeDelta::hours(1)).await?;
    let ids: Vec<_> = recent.iter().map(|entry| entry.id).collect();
    eyre::ensure!(ids == vec![older.id, newer.id], "got {ids:?}");
    let outcomes: Vec<_> = recent.iter().map(|entry| entry.outcome).collect();
    eyre::ensure!(
        outcomes == vec![DeliveryOutcome::Transient, DeliveryOutcome::Delivered],
        "outcomes should round-trip"
    );
    eyre::ensure!(
        newer.status_code == Some(201),
        "status code should round-trip"
    );
    Ok(())
}
