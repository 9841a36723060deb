//! `PostgreSQL` adapter for task lifecycle persistence.

mod models;
pub(crate) mod schema;
mod store;

pub use store::PostgresTaskStore;
