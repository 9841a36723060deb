//! Unit tests for the notification context.
