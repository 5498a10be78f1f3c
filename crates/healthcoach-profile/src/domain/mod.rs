//! Domain layer for the Profile context.

pub mod aggregates;
pub mod commands;
pub mod errors;
pub mod events;
pub mod repository;
