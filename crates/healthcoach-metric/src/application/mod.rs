//! Application layer for the Metric context.

pub mod command_handlers;
pub mod context;
pub mod query_handlers;
