//! Timestamps for persisted rows.
//!
//! Postgres `timestamptz` keeps microseconds. Rows are stamped at that
//! precision up front so a value handed back to the caller equals the one the
//! store reads later, and range filters on it include the row itself.

use chrono::{DateTime, SubsecRound, Utc};

pub const STORED_SUBSEC_DIGITS: u16 = 6;

/// Current time truncated to what the store keeps.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(STORED_SUBSEC_DIGITS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn now_has_no_sub_microsecond_part() {
        for _ in 0..100 {
            let stamp = now();
            assert_eq!(stamp.nanosecond() % 1_000, 0);
            assert_eq!(stamp.trunc_subsecs(STORED_SUBSEC_DIGITS), stamp);
        }
    }
}
