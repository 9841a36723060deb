//! Diesel row models for push persistence.

use super::schema::{push_delivery_log, push_subscriptions};
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Query result row for subscriptions.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = push_subscriptions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SubscriptionRow {
    pub id: i64,
    pub user_id: Option<i64>,
    pub endpoint: String,
    pub p256dh: String,
    pub auth: String,
    pub user_agent: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
}

/// Insert model for subscriptions.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = push_subscriptions)]
pub struct NewSubscriptionRow<'a> {
    pub user_id: Option<i64>,
    pub endpoint: &'a str,
    pub p256dh: &'a str,
    pub auth: &'a str,
    pub user_agent: Option<&'a str>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Query result row for delivery attempts.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = push_delivery_log)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DeliveryLogRow {
    pub id: i64,
    pub notification_id: Option<i64>,
    pub recipient_id: i64,
    pub endpoint: String,
    pub title: String,
    pub body: String,
    pub payload: serde_json::Value,
    pub outcome: String,
    pub success: bool,
    pub status_code: Option<i32>,
    pub detail: String,
    pub sent_at: DateTime<Utc>,
}

/// Insert model for delivery attempts.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = push_delivery_log)]
pub struct NewDeliveryLogRow<'a> {
    pub notification_id: Option<i64>,
    pub recipient_id: i64,
    pub endpoint: &'a str,
    pub title: &'a str,
    pub body: &'a str,
    pub payload: &'a serde_json::Value,
    pub outcome: &'a str,
    pub success: bool,
    pub status_code: Option<i32>,
    pub detail: &'a str,
    pub sent_at: DateTime<Utc>,
}
