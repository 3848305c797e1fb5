//! Logistics domain - the physical hand-off after an offer is accepted
//!
//! accepted -> received -> delivered -> completed, one audited step at a
//! time, each appended to the tracking history.

pub mod actions;
pub mod models;
pub mod transitions;

pub use actions::*;
pub use models::{
    LogisticStatus, LogisticsHistoryEntry, LogisticsHistoryFilter, LogisticsTrackingEntry,
};
