use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::common::time;
use crate::common::{ReferenceId, ReliefError, Role, SupportRequestId, TrackingEntryId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "logistic_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LogisticStatus {
    Pending,
    Accepted,
    Received,
    Delivered,
    Completed,
}

impl fmt::Display for LogisticStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogisticStatus::Pending => write!(f, "pending"),
            LogisticStatus::Accepted => write!(f, "accepted"),
            LogisticStatus::Received => write!(f, "received"),
            LogisticStatus::Delivered => write!(f, "delivered"),
            LogisticStatus::Completed => write!(f, "completed"),
        }
    }
}

impl FromStr for LogisticStatus {
    type Err = ReliefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(LogisticStatus::Pending),
            "accepted" => Ok(LogisticStatus::Accepted),
            "received" => Ok(LogisticStatus::Received),
            "delivered" => Ok(LogisticStatus::Delivered),
            "completed" => Ok(LogisticStatus::Completed),
            other => Err(ReliefError::Validation(format!(
                "unknown logistic status: {}",
                other
            ))),
        }
    }
}

/// Append-only record of one logistics hand-off.
#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticsTrackingEntry {
    pub id: TrackingEntryId,
    pub support_request_id: SupportRequestId,
    pub previous_status: LogisticStatus,
    pub new_status: LogisticStatus,
    pub handler_ref_id: ReferenceId,
    pub notes: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

impl LogisticsTrackingEntry {
    pub fn new(
        support_request_id: SupportRequestId,
        previous_status: LogisticStatus,
        new_status: LogisticStatus,
        handler_ref_id: ReferenceId,
        notes: Option<String>,
    ) -> Self {
        Self {
            id: TrackingEntryId::new(),
            support_request_id,
            previous_status,
            new_status,
            handler_ref_id,
            notes,
            recorded_at: time::now(),
        }
    }
}

/// A tracking entry joined with the names people read in the history view.
///
/// Handler and requester columns are optional because accounts can be
/// deleted while their history stays.
#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticsHistoryEntry {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub entry: LogisticsTrackingEntry,
    pub help_request_title: String,
    pub handler_name: Option<String>,
    pub handler_role: Option<Role>,
    pub requester_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogisticsHistoryFilter {
    pub support_request_id: Option<SupportRequestId>,
    pub status: Option<LogisticStatus>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl LogisticsHistoryFilter {
    pub fn for_support_request(id: SupportRequestId) -> Self {
        Self {
            support_request_id: Some(id),
            ..Self::default()
        }
    }

    pub fn matches(&self, entry: &LogisticsTrackingEntry) -> bool {
        self.support_request_id
            .map_or(true, |id| entry.support_request_id == id)
            && self.status.map_or(true, |s| entry.new_status == s)
            && self.from.map_or(true, |from| entry.recorded_at >= from)
            && self.to.map_or(true, |to| entry.recorded_at <= to)
    }
}
