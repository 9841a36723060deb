//! Adapter implementations of the push ports.

pub mod memory;
pub mod postgres;
pub mod web_push;
