//! Shared test helpers for `PostgreSQL` integration tests.

pub use super::cluster::{BoxError, PostgresCluster, postgres_cluster};
use super::cluster::{ManagedCluster, TemporaryDatabase};
use diesel::connection::SimpleConnection;
use diesel::{Connection, PgConnection};
use eyre::WrapErr;
use rstest::fixture;
use taskdesk::db::{PgPool, build_pool};
use taskdesk::identity::domain::UserId;

/// Admin seeded into the template.
pub const ADMIN: UserId = UserId::new(1);
/// Regular user tasks are assigned to.
pub const ASSIGNEE: UserId = UserId::new(2);
/// Regular user proposed as a new assignee.
pub const COLLEAGUE: UserId = UserId::new(3);

/// Template database holding the migrated schema and seeded users.
pub const TEMPLATE_DB: &str = "taskdesk_test_template";

const MIGRATION_UP: &str =
    include_str!("../../migrations/2026-01-01-000000_create_task_notification_tables/up.sql");

const SEED_USERS: &str = "
    INSERT INTO users (id, display_name, role, is_active) VALUES
        (1, 'Ada Admin', 'admin', TRUE),
        (2, 'Sam Field', 'user', TRUE),
        (3, 'Kim Crew', 'user', TRUE);
";

/// Ensures the template database exists with the schema applied.
///
/// # Errors
///
/// Returns an error if template creation or migration fails.
pub async fn ensure_template(cluster: PostgresCluster) -> Result<(), BoxError> {
    tokio::task::spawn_blocking(move || {
        cluster.ensure_template_exists(TEMPLATE_DB, apply_migrations)
    })
    .await
    .map_err(|err| Box::new(err) as BoxError)?
}

/// Applies the schema and seed rows to the database at `url`.
fn apply_migrations(url: &str) -> Result<(), BoxError> {
    let mut conn = PgConnection::establish(url).map_err(|err| Box::new(err) as BoxError)?;
    conn.batch_execute(MIGRATION_UP)
        .map_err(|err| Box::new(err) as BoxError)?;
    conn.batch_execute(SEED_USERS)
        .map_err(|err| Box::new(err) as BoxError)?;
    Ok(())
}

/// Private database cloned from the template with a pool bound to it.
pub struct TestDatabase {
    /// Pool connected to the private database.
    pub pool: PgPool,
    _database: TemporaryDatabase,
}

impl TestDatabase {
    async fn create(cluster: &'static ManagedCluster) -> Result<Self, BoxError> {
        let database = cluster
            .temporary_database_from_template("taskdesk_test", TEMPLATE_DB)
            .await?;
        let pool = build_pool(database.url(), 4).map_err(|err| Box::new(err) as BoxError)?;
        Ok(Self {
            pool,
            _database: database,
        })
    }

    /// Deactivates `user` directly in storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub fn deactivate_user(&self, user: UserId) -> eyre::Result<()> {
        let mut conn = self.pool.get().wrap_err("check out connection")?;
        conn.batch_execute(&format!(
            "UPDATE users SET is_active = FALSE WHERE id = {}",
            user.value()
        ))
        .wrap_err("deactivate user")?;
        Ok(())
    }
}

/// Provides a migrated private database, failing the test when no cluster
/// is available.
///
/// # Errors
///
/// Returns an error if the cluster, template or database cannot be set up.
#[fixture]
pub async fn test_database(
    postgres_cluster: Result<PostgresCluster, BoxError>,
) -> eyre::Result<TestDatabase> {
    let cluster = postgres_cluster.map_err(|err| eyre::eyre!(err))?;
    ensure_template(cluster)
        .await
        .map_err(|err| eyre::eyre!(err))
        .wrap_err("prepare template database")?;
    TestDatabase::create(cluster)
        .await
        .map_err(|err| eyre::eyre!(err))
        .wrap_err("create test database")
}
