//! Health Coach: Profile bounded context.
//!
//! Every user has at most one profile, either a trainee or a coach.

pub mod application;
pub mod domain;
