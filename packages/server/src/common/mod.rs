// Types shared by every relief domain

pub mod auth;
pub mod entity_ids;
pub mod errors;
pub mod id;
pub mod reference;
pub mod time;

pub use auth::{AccessPolicy, Actor, Decision, Identity, Operation, Role};
pub use entity_ids::*;
pub use errors::{ReliefError, ReliefResult};
pub use reference::ReferenceId;
