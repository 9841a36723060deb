//! Adapter implementations for notification ports.

pub mod dispatch;
pub mod memory;
pub mod postgres;
