//! Domain layer for the Auth context.

pub mod aggregates;
pub mod commands;
pub mod errors;
pub mod events;
pub mod repository;
