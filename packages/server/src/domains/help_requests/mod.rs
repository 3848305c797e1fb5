//! Help request domain - needs posted by affected people
//!
//! A help request owns an ordered list of items. Its `status` turns completed
//! only through an accepted support request that covers the last outstanding
//! need; nothing else writes it.

pub mod actions;
pub mod ledger;
pub mod models;

pub use actions::*;
pub use ledger::ItemNeedLedger;
pub use models::{HelpRequest, HelpRequestStatus, HelpRequestWithItems, Priority, RequestItem};
