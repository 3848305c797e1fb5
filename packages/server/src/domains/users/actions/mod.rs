//! User directory actions

mod manage;
mod register;
mod token;

pub use manage::{change_role, delete_user, list_users};
pub use register::{bootstrap_admin, create_moderator, register_user};
pub use token::issue_token;
