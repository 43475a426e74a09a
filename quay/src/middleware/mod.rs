//! Tower middleware for message services.

pub mod tracing;
