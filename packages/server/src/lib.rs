// Relief coordination core
//
// Matches disaster-relief help requests against donor support requests and
// tracks accepted offers through the logistics pipeline.
//
// Actions live per domain in domains/*/actions and take `&ReliefDeps`.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;

pub use config::*;
