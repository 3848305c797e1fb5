pub mod tracking_entry;

pub use tracking_entry::{
    LogisticStatus, LogisticsHistoryEntry, LogisticsHistoryFilter, LogisticsTrackingEntry,
};
