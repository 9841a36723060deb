//! Identity domain types.

mod user;

pub use user::{Actor, ParseRoleError, Role, User, UserId};
