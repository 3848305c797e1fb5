use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::common::{
    HelpRequestId, ReferenceId, ReliefError, RequestItemId, SupportRequestId, SupportRequestItemId,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "support_request_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SupportRequestStatus {
    Pending,
    Accepted,
    Rejected,
    Completed,
}

impl fmt::Display for SupportRequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SupportRequestStatus::Pending => write!(f, "pending"),
            SupportRequestStatus::Accepted => write!(f, "accepted"),
            SupportRequestStatus::Rejected => write!(f, "rejected"),
            SupportRequestStatus::Completed => write!(f, "completed"),
        }
    }
}

impl FromStr for SupportRequestStatus {
    type Err = ReliefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SupportRequestStatus::Pending),
            "accepted" => Ok(SupportRequestStatus::Accepted),
            "rejected" => Ok(SupportRequestStatus::Rejected),
            "completed" => Ok(SupportRequestStatus::Completed),
            other => Err(ReliefError::Validation(format!(
                "unknown support request status: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewAction {
    Accept,
    Reject,
}

impl FromStr for ReviewAction {
    type Err = ReliefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "accept" | "accepted" => Ok(ReviewAction::Accept),
            "reject" | "rejected" => Ok(ReviewAction::Reject),
            other => Err(ReliefError::Validation(format!(
                "review action must be accept or reject, got {}",
                other
            ))),
        }
    }
}

/// A donor's offer against one help request.
#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportRequest {
    pub id: SupportRequestId,
    pub help_request_id: HelpRequestId,
    pub user_ref_id: ReferenceId,
    pub status: SupportRequestStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One offered line. Immutable once written.
#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportRequestItem {
    pub id: SupportRequestItemId,
    pub support_request_id: SupportRequestId,
    pub request_item_id: RequestItemId,
    pub quantity_offered: i32,
    pub notes: Option<String>,
}

#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportRequestItemDetails {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub item: SupportRequestItem,
    pub item_name: String,
}

/// Listing shape: the support request plus what moderators need to judge it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportRequestDetails {
    #[serde(flatten)]
    pub support_request: SupportRequest,
    pub help_request_title: String,
    pub requester_name: Option<String>,
    pub items: Vec<SupportRequestItemDetails>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportRequestWithItems {
    #[serde(flatten)]
    pub support_request: SupportRequest,
    pub items: Vec<SupportRequestItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SupportRequestFilter {
    pub status: Option<SupportRequestStatus>,
    pub help_request_id: Option<HelpRequestId>,
    pub requester: Option<ReferenceId>,
}
