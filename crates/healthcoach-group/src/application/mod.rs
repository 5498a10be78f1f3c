//! Application layer for the Group context.

pub mod command_handlers;
pub mod context;
pub mod query_handlers;
