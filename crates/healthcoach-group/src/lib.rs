//! Health Coach: Group bounded context.
//!
//! Coaches own groups; trainees join them by accepting invites.

pub mod application;
pub mod domain;
