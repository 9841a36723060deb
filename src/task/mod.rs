//! Task lifecycle management.
//!
//! Tasks move through a fixed status state machine; every committed change
//! appends one audit trail entry and, where someone other than the actor is
//! affected, creates in-app notifications in the same unit of work. An
//! assignee may ask to hand a task over through the reassignment workflow,
//! which takes effect only after an admin approves it. The module follows
//! hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
