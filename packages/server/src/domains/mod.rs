pub mod activity;
pub mod auth;
pub mod help_requests;
pub mod logistics;
pub mod support_requests;
pub mod users;
