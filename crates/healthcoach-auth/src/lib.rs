//! Health Coach: Auth bounded context.
//!
//! Responsible for user accounts, multi-device sessions (authorizations),
//! password verification and signed access tokens.

pub mod application;
pub mod domain;
