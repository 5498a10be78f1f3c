//! Application layer for the Profile context.

pub mod command_handlers;
pub mod context;
pub mod query_handlers;
