//! `PostgreSQL` subscription repository.

use super::{
    models::{NewSubscriptionRow, SubscriptionRow},
    schema::push_subscriptions,
};
use crate::db::{PgPool, run_blocking};
use crate::identity::domain::UserId;
use crate::push::{
    domain::{
        NewPushSubscription, PersistedSubscriptionData, PushSubscription, SubscriptionId,
        SubscriptionKeys,
    },
    ports::{SubscriptionRepository, SubscriptionRepositoryError, SubscriptionRepositoryResult},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::upsert::excluded;

/// `PostgreSQL`-backed subscription repository.
#[derive(Debug, Clone)]
pub struct PostgresSubscriptionRepository {
    pool: PgPool,
}

impl PostgresSubscriptionRepository {
    /// Creates a repository from a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_subscription(row: SubscriptionRow) -> SubscriptionRepositoryResult<PushSubscription> {
    let keys = SubscriptionKeys::new(row.p256dh, row.auth)
        .map_err(SubscriptionRepositoryError::persistence)?;
    Ok(PushSubscription::from_persisted(PersistedSubscriptionData {
        id: SubscriptionId::new(row.id),
        user_id: row.user_id.map(UserId::new),
        endpoint: row.endpoint,
        keys,
        user_agent: row.user_agent,
        active: row.is_active,
        created_at: row.created_at,
        last_used_at: row.last_used_at,
    }))
}

#[async_trait]
impl SubscriptionRepository for PostgresSubscriptionRepository {
    async fn upsert(
        &self,
        subscription: &NewPushSubscription,
        at: DateTime<Utc>,
    ) -> SubscriptionRepositoryResult<PushSubscription> {
        let registration = subscription.clone();
        run_blocking(
            &self.pool,
            SubscriptionRepositoryError::persistence,
            move |connection| {
                let row = NewSubscriptionRow {
                    user_id: Some(registration.user_id().value()),
                    endpoint: registration.endpoint(),
                    p256dh: registration.keys().p256dh(),
                    auth: registration.keys().auth(),
                    user_agent: registration.user_agent(),
                    is_active: true,
                    created_at: at,
                };
                let stored = diesel::insert_into(push_subscriptions::table)
                    .values(&row)
                    .on_conflict(push_subscriptions::endpoint)
                    .do_update()
                    .set((
                        push_subscriptions::user_id.eq(excluded(push_subscriptions::user_id)),
                        push_subscriptions::p256dh.eq(excluded(push_subscriptions::p256dh)),
                        push_subscriptions::auth.eq(excluded(push_subscriptions::auth)),
                        push_subscriptions::user_agent
                            .eq(excluded(push_subscriptions::user_agent)),
                        push_subscriptions::is_active.eq(true),
                    ))
                    .returning(SubscriptionRow::as_returning())
                    .get_result::<SubscriptionRow>(connection)
                    .map_err(SubscriptionRepositoryError::persistence)?;
                row_to_subscription(stored)
            },
        )
        .await
    }

    async fn deactivate(&self, endpoint: &str) -> SubscriptionRepositoryResult<bool> {
        let target = endpoint.to_owned();
        run_blocking(
            &self.pool,
            SubscriptionRepositoryError::persistence,
            move |connection| {
                let updated = diesel::update(
                    push_subscriptions::table
                        .filter(push_subscriptions::endpoint.eq(&target))
                        .filter(push_subscriptions::is_active.eq(true)),
                )
                .set(push_subscriptions::is_active.eq(false))
                .execute(connection)
                .map_err(SubscriptionRepositoryError::persistence)?;
                Ok(updated > 0)
            },
        )
        .await
    }

    async fn list_active(
        &self,
        user: UserId,
    ) -> SubscriptionRepositoryResult<Vec<PushSubscription>> {
        run_blocking(
            &self.pool,
            SubscriptionRepositoryError::persistence,
            move |connection| {
                push_subscriptions::table
                    .filter(push_subscriptions::user_id.eq(user.value()))
                    .filter(push_subscriptions::is_active.eq(true))
                    .order(push_subscriptions::id.asc())
                    .select(SubscriptionRow::as_select())
                    .load::<SubscriptionRow>(connection)
                    .map_err(SubscriptionRepositoryError::persistence)?
                    .into_iter()
                    .map(row_to_subscription)
                    .collect()
            },
        )
        .await
    }

    async fn find_by_endpoint(
        &self,
        endpoint: &str,
    ) -> SubscriptionRepositoryResult<Option<PushSubscription>> {
        let target = endpoint.to_owned();
        run_blocking(
            &self.pool,
            SubscriptionRepositoryError::persistence,
            move |connection| {
                push_subscriptions::table
                    .filter(push_subscriptions::endpoint.eq(&target))
                    .select(SubscriptionRow::as_select())
                    .first::<SubscriptionRow>(connection)
                    .optional()
                    .map_err(SubscriptionRepositoryError::persistence)?
                    .map(row_to_subscription)
                    .transpose()
            },
        )
        .await
    }

    async fn touch(&self, endpoint: &str, at: DateTime<Utc>) -> SubscriptionRepositoryResult<()> {
        let target = endpoint.to_owned();
        run_blocking(
            &self.pool,
            SubscriptionRepositoryError::persistence,
            move |connection| {
                diesel::update(
                    push_subscriptions::table.filter(push_subscriptions::endpoint.eq(&target)),
                )
                .set(push_subscriptions::last_used_at.eq(Some(at)))
                .execute(connection)
                .map_err(SubscriptionRepositoryError::persistence)?;
                Ok(())
            },
        )
        .await
    }
}
