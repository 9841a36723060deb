//! `PostgreSQL` repository implementation for notifications.

use super::{
    models::{NewNotificationRow, NotificationRow},
    schema::notifications,
};
use crate::db::{PgPool, run_blocking};
use crate::identity::domain::UserId;
use crate::notification::{
    domain::{
        NewNotification, Notification, NotificationId, NotificationKind,
        PersistedNotificationData, RelatedEntity,
    },
    ports::{NotificationRepository, NotificationRepositoryError, NotificationRepositoryResult},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;

/// `PostgreSQL`-backed notification repository.
#[derive(Debug, Clone)]
pub struct PostgresNotificationRepository {
    pool: PgPool,
}

impl PostgresNotificationRepository {
    /// Creates a repository from a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Inserts notifications on an existing connection.
///
/// Callers that need atomicity run this inside their own transaction.
pub(crate) fn insert_notifications(
    connection: &mut PgConnection,
    drafts: Vec<NewNotification>,
    created_at: DateTime<Utc>,
) -> QueryResult<Vec<Notification>> {
    let mut stored = Vec::with_capacity(drafts.len());
    for draft in drafts {
        let row = to_new_row(&draft, created_at);
        let id = diesel::insert_into(notifications::table)
            .values(&row)
            .returning(notifications::id)
            .get_result::<i64>(connection)?;
        stored.push(Notification::from_new(
            NotificationId::new(id),
            draft,
            created_at,
        ));
    }
    Ok(stored)
}

fn to_new_row(draft: &NewNotification, created_at: DateTime<Utc>) -> NewNotificationRow<'_> {
    NewNotificationRow {
        recipient_id: draft.recipient().value(),
        title: draft.title(),
        message: draft.message(),
        kind: draft.kind().as_str(),
        related_type: draft.related().map(|related| related.entity_type.as_str()),
        related_id: draft.related().map(|related| related.entity_id),
        is_read: false,
        is_archived: false,
        created_at,
    }
}

fn row_to_notification(row: NotificationRow) -> NotificationRepositoryResult<Notification> {
    let kind = NotificationKind::try_from(row.kind.as_str())
        .map_err(NotificationRepositoryError::persistence)?;
    let related = match (row.related_type, row.related_id) {
        (Some(entity_type), Some(entity_id)) => Some(RelatedEntity::new(entity_type, entity_id)),
        _ => None,
    };
    Ok(Notification::from_persisted(PersistedNotificationData {
        id: NotificationId::new(row.id),
        recipient: UserId::new(row.recipient_id),
        title: row.title,
        message: row.message,
        kind,
        related,
        is_read: row.is_read,
        archived: row.is_archived,
        created_at: row.created_at,
    }))
}

#[async_trait]
impl NotificationRepository for PostgresNotificationRepository {
    async fn insert(
        &self,
        notification: &NewNotification,
        created_at: DateTime<Utc>,
    ) -> NotificationRepositoryResult<Notification> {
        let draft = notification.clone();
        run_blocking(
            &self.pool,
            NotificationRepositoryError::persistence,
            move |connection| {
                let mut stored = insert_notifications(connection, vec![draft], created_at)
                    .map_err(NotificationRepositoryError::persistence)?;
                stored.pop().ok_or_else(|| {
                    NotificationRepositoryError::persistence(std::io::Error::other(
                        "insert returned no notification",
                    ))
                })
            },
        )
        .await
    }

    async fn find_by_id(
        &self,
        id: NotificationId,
    ) -> NotificationRepositoryResult<Option<Notification>> {
        run_blocking(
            &self.pool,
            NotificationRepositoryError::persistence,
            move |connection| {
                notifications::table
                    .filter(notifications::id.eq(id.value()))
                    .select(NotificationRow::as_select())
                    .first::<NotificationRow>(connection)
                    .optional()
                    .map_err(NotificationRepositoryError::persistence)?
                    .map(row_to_notification)
                    .transpose()
            },
        )
        .await
    }

    async fn update_flags(&self, notification: &Notification) -> NotificationRepositoryResult<()> {
        let id = notification.id();
        let is_read = notification.is_read();
        let is_archived = notification.is_archived();
        run_blocking(
            &self.pool,
            NotificationRepositoryError::persistence,
            move |connection| {
                let updated = diesel::update(notifications::table.find(id.value()))
                    .set((
                        notifications::is_read.eq(is_read),
                        notifications::is_archived.eq(is_archived),
                    ))
                    .execute(connection)
                    .map_err(NotificationRepositoryError::persistence)?;
                if updated == 0 {
                    return Err(NotificationRepositoryError::NotFound(id));
                }
                Ok(())
            },
        )
        .await
    }

    async fn mark_all_read(&self, recipient: UserId) -> NotificationRepositoryResult<u64> {
        run_blocking(
            &self.pool,
            NotificationRepositoryError::persistence,
            move |connection| {
                let updated = diesel::update(
                    notifications::table
                        .filter(notifications::recipient_id.eq(recipient.value()))
                        .filter(notifications::is_read.eq(false)),
                )
                .set(notifications::is_read.eq(true))
                .execute(connection)
                .map_err(NotificationRepositoryError::persistence)?;
                u64::try_from(updated).map_err(NotificationRepositoryError::persistence)
            },
        )
        .await
    }

    async fn list_unread(
        &self,
        recipient: UserId,
    ) -> NotificationRepositoryResult<Vec<Notification>> {
        run_blocking(
            &self.pool,
            NotificationRepositoryError::persistence,
            move |connection| {
                let rows = notifications::table
                    .filter(notifications::recipient_id.eq(recipient.value()))
                    .filter(notifications::is_read.eq(false))
                    .filter(notifications::is_archived.eq(false))
                    .order((notifications::created_at.desc(), notifications::id.desc()))
                    .select(NotificationRow::as_select())
                    .load::<NotificationRow>(connection)
                    .map_err(NotificationRepositoryError::persistence)?;
                rows.into_iter().map(row_to_notification).collect()
            },
        )
        .await
    }

    async fn list_recent(
        &self,
        recipient: UserId,
        limit: usize,
    ) -> NotificationRepositoryResult<Vec<Notification>> {
        let row_limit = i64::try_from(limit).map_err(NotificationRepositoryError::persistence)?;
        run_blocking(
            &self.pool,
            NotificationRepositoryError::persistence,
            move |connection| {
                let rows = notifications::table
                    .filter(notifications::recipient_id.eq(recipient.value()))
                    .filter(notifications::is_archived.eq(false))
                    .order((notifications::created_at.desc(), notifications::id.desc()))
                    .limit(row_limit)
                    .select(NotificationRow::as_select())
                    .load::<NotificationRow>(connection)
                    .map_err(NotificationRepositoryError::persistence)?;
                rows.into_iter().map(row_to_notification).collect()
            },
        )
        .await
    }
}
