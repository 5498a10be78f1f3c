//! Domain layer for the Invite context.

pub mod aggregates;
pub mod commands;
pub mod errors;
pub mod events;
pub mod repository;
