//! User directory - accounts, roles and their protection rules
//!
//! One admin is bootstrapped; the admin creates moderators and may move
//! non-admin accounts between user and moderator or delete them.

pub mod actions;
pub mod models;

pub use actions::*;
pub use models::{NewUser, RoleChange, User};
