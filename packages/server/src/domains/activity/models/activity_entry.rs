use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::common::time;
use crate::common::{ActivityEntryId, Identity, ReferenceId, ReliefError, Role};

/// Default and maximum page size for activity listings.
pub const ACTIVITY_PAGE_LIMIT: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "activity_outcome", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ActivityOutcome {
    Success,
    Failure,
    Denied,
}

impl fmt::Display for ActivityOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActivityOutcome::Success => write!(f, "success"),
            ActivityOutcome::Failure => write!(f, "failure"),
            ActivityOutcome::Denied => write!(f, "denied"),
        }
    }
}

/// One audited action.
#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityLogEntry {
    pub id: ActivityEntryId,
    pub actor_ref_id: Option<ReferenceId>,
    pub actor_role: Option<Role>,
    pub action: String,
    pub outcome: ActivityOutcome,
    pub metadata: serde_json::Value,
    pub recorded_at: DateTime<Utc>,
}

impl ActivityLogEntry {
    pub fn new(action: impl Into<String>, outcome: ActivityOutcome) -> Self {
        Self {
            id: ActivityEntryId::new(),
            actor_ref_id: None,
            actor_role: None,
            action: action.into(),
            outcome,
            metadata: serde_json::Value::Object(Default::default()),
            recorded_at: time::now(),
        }
    }

    pub fn actor(mut self, identity: Option<&Identity>) -> Self {
        self.actor_ref_id = identity.map(|i| i.reference.clone());
        self.actor_role = identity.map(|i| i.role);
        self
    }

    pub fn metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }

    /// Entry for an action that ended in `err`.
    pub fn from_error(action: impl Into<String>, err: &ReliefError) -> Self {
        let outcome = if err.is_denial() {
            ActivityOutcome::Denied
        } else {
            ActivityOutcome::Failure
        };
        Self::new(action, outcome)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityFilter {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub actor_ref_id: Option<ReferenceId>,
    pub action: Option<String>,
    pub limit: i64,
}

impl Default for ActivityFilter {
    fn default() -> Self {
        Self {
            from: None,
            to: None,
            actor_ref_id: None,
            action: None,
            limit: ACTIVITY_PAGE_LIMIT,
        }
    }
}

impl ActivityFilter {
    pub fn matches(&self, entry: &ActivityLogEntry) -> bool {
        self.from.map_or(true, |from| entry.recorded_at >= from)
            && self.to.map_or(true, |to| entry.recorded_at <= to)
            && self
                .actor_ref_id
                .as_ref()
                .map_or(true, |r| entry.actor_ref_id.as_ref() == Some(r))
            && self.action.as_deref().map_or(true, |a| entry.action == a)
    }

    /// Clamp to `1..=ACTIVITY_PAGE_LIMIT`.
    pub fn effective_limit(&self) -> i64 {
        self.limit.clamp(1, ACTIVITY_PAGE_LIMIT)
    }
}
