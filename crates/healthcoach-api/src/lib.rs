//! Health Coach: HTTP API library.
//!
//! Exposes the router, state and configuration so the binary and the
//! integration tests assemble the server the same way.

pub mod config;
pub mod error;
pub mod extractors;
pub mod routes;
pub mod state;
pub mod telemetry;
