//! Shared `PostgreSQL` connection plumbing.
//!
//! Diesel is synchronous, so adapters offload every database call to the
//! blocking thread pool through [`run_blocking`] to keep async executor
//! threads free.

use diesel::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool, PoolError};
use thiserror::Error;

/// `PostgreSQL` connection pool type shared by all adapters.
pub type PgPool = Pool<ConnectionManager<PgConnection>>;

/// Failure to reach the database before a query could run.
#[derive(Debug, Error)]
pub enum DbAccessError {
    /// No connection could be checked out of the pool.
    #[error("connection pool error: {0}")]
    Pool(#[from] PoolError),
    /// The blocking task panicked or was cancelled.
    #[error("blocking task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Builds a connection pool for the given database URL.
///
/// # Errors
///
/// Returns [`PoolError`] when the pool cannot establish its initial
/// connections.
pub fn build_pool(database_url: &str, max_size: u32) -> Result<PgPool, PoolError> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    Pool::builder().max_size(max_size).build(manager)
}

/// Runs a blocking database operation on a pooled connection.
///
/// `map_err` converts pool checkout and join failures into the caller's
/// error type.
pub(crate) async fn run_blocking<F, T, E, M>(pool: &PgPool, map_err: M, f: F) -> Result<T, E>
where
    F: FnOnce(&mut PgConnection) -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
    M: Fn(DbAccessError) -> E + Copy + Send + 'static,
{
    let owned_pool = pool.clone();
    tokio::task::spawn_blocking(move || {
        let mut connection = owned_pool
            .get()
            .map_err(|err| map_err(DbAccessError::Pool(err)))?;
        f(&mut connection)
    })
    .await
    .map_err(|err| map_err(DbAccessError::Join(err)))?
}
