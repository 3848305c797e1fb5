use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::common::{HelpRequestId, ReferenceId, ReliefError};
use crate::domains::logistics::models::LogisticStatus;

use super::request_item::RequestItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "help_request_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum HelpRequestStatus {
    Active,
    Completed,
}

impl fmt::Display for HelpRequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HelpRequestStatus::Active => write!(f, "active"),
            HelpRequestStatus::Completed => write!(f, "completed"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "help_request_priority", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::High => write!(f, "high"),
            Priority::Medium => write!(f, "medium"),
            Priority::Low => write!(f, "low"),
        }
    }
}

impl FromStr for Priority {
    type Err = ReliefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            other => Err(ReliefError::Validation(format!("unknown priority: {}", other))),
        }
    }
}

/// A need posted by an affected person.
///
/// `status` flips to completed only when an accepted offer leaves no item with
/// outstanding need; `logistic_status` mirrors the latest logistics hand-off.
#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HelpRequest {
    pub id: HelpRequestId,
    pub title: String,
    pub description: String,
    pub address: String,
    pub status: HelpRequestStatus,
    pub priority: Priority,
    pub logistic_status: LogisticStatus,
    pub user_ref_id: ReferenceId,
    pub created_at: DateTime<Utc>,
}

impl HelpRequest {
    pub fn is_active(&self) -> bool {
        self.status == HelpRequestStatus::Active
    }
}

/// A help request together with its items, as every listing returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HelpRequestWithItems {
    #[serde(flatten)]
    pub help_request: HelpRequest,
    pub items: Vec<RequestItem>,
}
