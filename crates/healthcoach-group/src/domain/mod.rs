//! Domain layer for the Group context.

pub mod aggregates;
pub mod commands;
pub mod errors;
pub mod events;
pub mod repository;
