//! Health Coach: Invite bounded context.
//!
//! A coach shares a short secret; trainees who present it before it expires
//! join the group.

pub mod application;
pub mod domain;
