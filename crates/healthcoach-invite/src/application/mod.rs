//! Application layer for the Invite context.

pub mod command_handlers;
pub mod context;
