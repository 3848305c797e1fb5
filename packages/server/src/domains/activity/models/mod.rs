pub mod activity_entry;

pub use activity_entry::{ActivityFilter, ActivityLogEntry, ActivityOutcome, ACTIVITY_PAGE_LIMIT};
