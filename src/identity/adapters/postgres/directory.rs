//! `PostgreSQL` user directory implementation.

use super::{models::UserRow, schema::users};
use crate::db::{PgPool, run_blocking};
use crate::identity::{
    domain::{Role, User, UserId},
    ports::{UserDirectory, UserDirectoryError, UserDirectoryResult},
};
use async_trait::async_trait;
use diesel::prelude::*;

/// `PostgreSQL`-backed user directory.
#[derive(Debug, Clone)]
pub struct PostgresUserDirectory {
    pool: PgPool,
}

impl PostgresUserDirectory {
    /// Creates a directory from a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PostgresUserDirectory {
    async fn find_by_id(&self, id: UserId) -> UserDirectoryResult<Option<User>> {
        run_blocking(
            &self.pool,
            UserDirectoryError::persistence,
            move |connection| {
                let row = users::table
                    .filter(users::id.eq(id.value()))
                    .select(UserRow::as_select())
                    .first::<UserRow>(connection)
                    .optional()
                    .map_err(UserDirectoryError::persistence)?;
                row.map(row_to_user).transpose()
            },
        )
        .await
    }
}

fn row_to_user(row: UserRow) -> UserDirectoryResult<User> {
    let role = Role::try_from(row.role.as_str()).map_err(UserDirectoryError::persistence)?;
    Ok(User {
        id: UserId::new(row.id),
        display_name: row.display_name,
        role,
        active: row.is_active,
    })
}
