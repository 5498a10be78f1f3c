//! Application layer for the Auth context.

pub mod authorizer;
pub mod command_handlers;
pub mod context;
pub mod query_handlers;
pub mod tokens;
