//! The logistics pipeline as an explicit table.
//!
//! `pending -> accepted` is written by the review workflow; everything after
//! that goes through `advance`, one step at a time.

use crate::common::{ReliefError, ReliefResult};

use super::models::LogisticStatus;

pub const TRANSITIONS: &[(LogisticStatus, LogisticStatus)] = &[
    (LogisticStatus::Accepted, LogisticStatus::Received),
    (LogisticStatus::Received, LogisticStatus::Delivered),
    (LogisticStatus::Delivered, LogisticStatus::Completed),
];

pub fn is_allowed(from: LogisticStatus, to: LogisticStatus) -> bool {
    TRANSITIONS.contains(&(from, to))
}

pub fn next_statuses(from: LogisticStatus) -> impl Iterator<Item = LogisticStatus> {
    TRANSITIONS
        .iter()
        .filter(move |(source, _)| *source == from)
        .map(|(_, target)| *target)
}

pub fn ensure_transition(from: LogisticStatus, to: LogisticStatus) -> ReliefResult<()> {
    if is_allowed(from, to) {
        Ok(())
    } else {
        Err(ReliefError::InvalidTransition { from, to })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use LogisticStatus::*;

    const ALL: [LogisticStatus; 5] = [Pending, Accepted, Received, Delivered, Completed];

    #[test]
    fn only_the_three_forward_steps_are_allowed() {
        let mut allowed = Vec::new();
        for from in ALL {
            for to in ALL {
                if ensure_transition(from, to).is_ok() {
                    allowed.push((from, to));
                }
            }
        }
        assert_eq!(
            allowed,
            vec![(Accepted, Received), (Received, Delivered), (Delivered, Completed)]
        );
    }

    #[test]
    fn skipping_a_step_reports_both_ends() {
        let err = ensure_transition(Accepted, Delivered).unwrap_err();
        assert!(matches!(
            err,
            ReliefError::InvalidTransition { from: Accepted, to: Delivered }
        ));
    }

    #[test]
    fn terminal_and_initial_states_have_no_advance() {
        assert_eq!(next_statuses(Completed).count(), 0);
        assert_eq!(next_statuses(Pending).count(), 0);
        assert_eq!(next_statuses(Received).collect::<Vec<_>>(), vec![Delivered]);
    }
}
