pub mod user;

pub use user::{NewUser, RoleChange, User};
