use thiserror::Error;

use crate::common::entity_ids::{HelpRequestId, RequestItemId, SupportRequestId};
use crate::domains::logistics::models::LogisticStatus;
use crate::domains::support_requests::models::SupportRequestStatus;

pub type ReliefResult<T> = Result<T, ReliefError>;

/// Every failure the relief core can report.
#[derive(Error, Debug)]
pub enum ReliefError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Request item {item_id} does not belong to help request {help_request_id}")]
    ItemNotFound {
        item_id: RequestItemId,
        help_request_id: HelpRequestId,
    },

    #[error("Invalid quantity {offered} for item {item_id} (still needed: {needed})")]
    InvalidQuantity {
        item_id: RequestItemId,
        offered: i32,
        needed: i32,
    },

    #[error("Logistics cannot move from {from} to {to}")]
    InvalidTransition {
        from: LogisticStatus,
        to: LogisticStatus,
    },

    #[error("Support request {id} was already reviewed (status: {status})")]
    AlreadyReviewed {
        id: SupportRequestId,
        status: SupportRequestStatus,
    },

    #[error("Help request {id} is no longer active")]
    HelpRequestNotActive { id: HelpRequestId },

    #[error("Support request {id} is not accepted (status: {status})")]
    NotAccepted {
        id: SupportRequestId,
        status: SupportRequestStatus,
    },

    #[error("Authentication required: {0}")]
    Unauthenticated(String),

    #[error("Permission denied: {reason}")]
    Unauthorized { reason: String },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("{entity} already exists")]
    AlreadyExists { entity: &'static str },

    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ReliefError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn unauthorized(reason: impl Into<String>) -> Self {
        Self::Unauthorized {
            reason: reason.into(),
        }
    }

    /// Stable snake_case code for outer layers and activity metadata.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::NotFound { .. } => "not_found",
            Self::ItemNotFound { .. } => "item_not_found",
            Self::InvalidQuantity { .. } => "invalid_quantity",
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::AlreadyReviewed { .. } => "already_reviewed",
            Self::HelpRequestNotActive { .. } => "help_request_not_active",
            Self::NotAccepted { .. } => "not_accepted",
            Self::Unauthenticated(_) => "unauthenticated",
            Self::Unauthorized { .. } => "unauthorized",
            Self::Conflict(_) => "conflict",
            Self::AlreadyExists { .. } => "already_exists",
            Self::Database(_) => "database",
            Self::Internal(_) => "internal",
        }
    }

    /// Whether the caller was turned away before anything ran.
    pub fn is_denial(&self) -> bool {
        matches!(self, Self::Unauthenticated(_) | Self::Unauthorized { .. })
    }
}

// Postgres reports lost serialization races and deadlocks with these codes;
// both mean "someone else got there first".
const SERIALIZATION_FAILURE: &str = "40001";
const DEADLOCK_DETECTED: &str = "40P01";

impl From<sqlx::Error> for ReliefError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if let Some(code) = db.code() {
                if code == SERIALIZATION_FAILURE || code == DEADLOCK_DETECTED {
                    return Self::Conflict(db.message().to_owned());
                }
            }
        }
        Self::Database(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_stable_codes() {
        assert_eq!(ReliefError::Validation("x".into()).kind(), "validation");
        assert_eq!(
            ReliefError::not_found("help_request", HelpRequestId::new()).kind(),
            "not_found"
        );
        assert_eq!(
            ReliefError::InvalidTransition {
                from: LogisticStatus::Accepted,
                to: LogisticStatus::Delivered,
            }
            .kind(),
            "invalid_transition"
        );
        assert_eq!(
            ReliefError::Internal(anyhow::anyhow!("boom")).kind(),
            "internal"
        );
    }

    #[test]
    fn denials_are_auth_failures_only() {
        assert!(ReliefError::unauthorized("nope").is_denial());
        assert!(ReliefError::Unauthenticated("no token".into()).is_denial());
        assert!(!ReliefError::Conflict("race".into()).is_denial());
    }

    #[test]
    fn messages_name_the_states_involved() {
        let err = ReliefError::InvalidTransition {
            from: LogisticStatus::Accepted,
            to: LogisticStatus::Delivered,
        };
        assert_eq!(err.to_string(), "Logistics cannot move from accepted to delivered");
    }

    #[test]
    fn non_database_sqlx_errors_stay_database_errors() {
        let err: ReliefError = sqlx::Error::RowNotFound.into();
        assert_eq!(err.kind(), "database");
    }
}
