//! Taskdesk: task lifecycle, reassignment approval and notification
//! delivery for a small operations team.
//!
//! Admins create dated tasks for assignees; tasks move through a fixed
//! status machine whose every step is recorded in an audit trail.
//! Assignees may ask for a task to be handed to a colleague, which an admin
//! approves or rejects. Lifecycle events produce in-app notifications that
//! are also pushed to subscribed browsers over Web Push.
//!
//! # Architecture
//!
//! Each bounded context follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business rules with no infrastructure dependencies
//! - **Ports**: Trait interfaces for storage and outbound delivery
//! - **Adapters**: In-memory and `PostgreSQL` implementations, plus the Web
//!   Push HTTP transport
//! - **Services**: Orchestration of domain rules over ports
//!
//! # Modules
//!
//! - [`task`]: Status transitions, audit trail and reassignment workflow
//! - [`notification`]: Per-user notification inbox
//! - [`push`]: Push subscriptions and delivery
//! - [`identity`]: Users and roles as seen by the other contexts
//! - [`config`], [`telemetry`], [`db`]: Ambient plumbing

pub mod config;
pub mod db;
pub mod error;
pub mod identity;
pub mod notification;
pub mod push;
pub mod task;
pub mod telemetry;
