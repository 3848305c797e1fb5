//! Activity domain - audit trail of every relief action
//!
//! Actions report through the injected `BaseActivityLogger`; admins read the
//! persisted trail back with `list_activity`.

pub mod actions;
pub mod audit;
pub mod models;

pub use actions::list_activity;
pub use audit::audited;
pub use models::{ActivityFilter, ActivityLogEntry, ActivityOutcome};
