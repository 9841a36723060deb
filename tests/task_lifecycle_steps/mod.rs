//! Step definitions for task lifecycle behaviour tests.

#[path = "../in_memory/helpers.rs"]
pub mod helpers;

mod given;
mod when;
