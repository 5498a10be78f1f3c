//! Health Coach: Metric bounded context.

pub mod application;
pub mod domain;
