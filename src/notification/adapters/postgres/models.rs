//! Diesel row models for notification persistence.

use super::schema::notifications;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Query result row for notifications.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = notifications)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NotificationRow {
    /// Notification identifier.
    pub id: i64,
    /// Recipient user.
    pub recipient_id: i64,
    /// Title.
    pub title: String,
    /// Message body.
    pub message: String,
    /// Kind.
    pub kind: String,
    /// Related entity type.
    pub related_type: Option<String>,
    /// Related entity identifier.
    pub related_id: Option<i64>,
    /// Read flag.
    pub is_read: bool,
    /// Archive flag.
    pub is_archived: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Insert model for notifications.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = notifications)]
pub struct NewNotificationRow<'a> {
    /// Recipient user.
    pub recipient_id: i64,
    /// Title.
    pub title: &'a str,
    /// Message body.
    pub message: &'a str,
    /// Kind.
    pub kind: &'a str,
    /// Related entity type.
    pub related_type: Option<&'a str>,
    /// Related entity identifier.
    pub related_id: Option<i64>,
    /// Read flag.
    pub is_read: bool,
    /// Archive flag.
    pub is_archived: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}
