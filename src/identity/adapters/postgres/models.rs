//! Diesel row models for user lookup.

use super::schema::users;
use diesel::prelude::*;

/// Query result row for user accounts.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserRow {
    /// User identifier.
    pub id: i64,
    /// Display name.
    pub display_name: String,
    /// Role string.
    pub role: String,
    /// Active flag.
    pub is_active: bool,
}
