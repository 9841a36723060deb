//! `PostgreSQL` delivery log.

use super::{
    models::{DeliveryLogRow, NewDeliveryLogRow},
    schema::push_delivery_log,
};
use crate::db::{PgPool, run_blocking};
use crate::identity::domain::UserId;
use crate::notification::domain::NotificationId;
use crate::push::{
    domain::{DeliveryLogEntry, DeliveryLogId, DeliveryOutcome, NewDeliveryLogEntry},
    ports::{DeliveryLogError, DeliveryLogRepository, DeliveryLogResult},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// `PostgreSQL`-backed delivery log.
#[derive(Debug, Clone)]
pub struct PostgresDeliveryLog {
    pool: PgPool,
}

impl PostgresDeliveryLog {
    /// Creates a log from a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Row whose `success` flag disagrees with its outcome.
#[derive(Debug, thiserror::Error)]
#[error("delivery log row {id} stores success={success} for outcome {outcome}")]
struct InconsistentSuccessFlag {
    id: i64,
    success: bool,
    outcome: DeliveryOutcome,
}

fn row_to_entry(row: DeliveryLogRow) -> DeliveryLogResult<DeliveryLogEntry> {
    let outcome =
        DeliveryOutcome::try_from(row.outcome.as_str()).map_err(DeliveryLogError::persistence)?;
    if row.success != outcome.is_success() {
        return Err(DeliveryLogError::persistence(InconsistentSuccessFlag {
            id: row.id,
            success: row.success,
            outcome,
        }));
    }
    Ok(DeliveryLogEntry {
        id: DeliveryLogId::new(row.id),
        notification_id: row.notification_id.map(NotificationId::new),
        recipient: UserId::new(row.recipient_id),
        endpoint: row.endpoint,
        title: row.title,
        body: row.body,
        payload: row.payload,
        outcome,
        status_code: row.status_code.and_then(|code| u16::try_from(code).ok()),
        detail: row.detail,
        sent_at: row.sent_at,
    })
}

#[async_trait]
impl DeliveryLogRepository for PostgresDeliveryLog {
    async fn append(&self, entry: &NewDeliveryLogEntry) -> DeliveryLogResult<DeliveryLogEntry> {
        let attempt = entry.clone();
        run_blocking(&self.pool, DeliveryLogError::persistence, move |connection| {
            let row = NewDeliveryLogRow {
                notification_id: attempt.notification_id.map(NotificationId::value),
                recipient_id: attempt.recipient.value(),
                endpoint: &attempt.endpoint,
                title: &attempt.title,
                body: &attempt.body,
                payload: &attempt.payload,
                outcome: attempt.outcome.as_str(),
                success: attempt.outcome.is_success(),
                status_code: attempt.status_code.map(i32::from),
                detail: &attempt.detail,
                sent_at: attempt.sent_at,
            };
            let id = diesel::insert_into(push_delivery_log::table)
                .values(&row)
                .returning(push_delivery_log::id)
                .get_result::<i64>(connection)
                .map_err(DeliveryLogError::persistence)?;
            Ok(DeliveryLogEntry::from_new(DeliveryLogId::new(id), attempt))
        })
        .await
    }

    async fn since(&self, since: DateTime<Utc>) -> DeliveryLogResult<Vec<DeliveryLogEntry>> {
        run_blocking(&self.pool, DeliveryLogError::persistence, move |connection| {
            push_delivery_log::table
                .filter(push_delivery_log::sent_at.ge(since))
                .order((push_delivery_log::sent_at.asc(), push_delivery_log::id.asc()))
                .select(DeliveryLogRow::as_select())
                .load::<DeliveryLogRow>(connection)
                .map_err(DeliveryLogError::persistence)?
                .into_iter()
                .map(row_to_entry)
                .collect()
        })
        .await
    }
}
