//! Users as seen by the task lifecycle core.
//!
//! Authentication happens outside this crate. Every mutating operation
//! receives an explicit [`domain::Actor`] describing who is acting and with
//! which role, and looks up referenced users through the
//! [`ports::UserDirectory`] port.

pub mod adapters;
pub mod domain;
pub mod ports;
