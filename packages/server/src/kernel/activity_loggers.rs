//! Activity logger implementations.

use std::sync::Arc;
use tracing::{info, warn};

use crate::domains::activity::models::ActivityLogEntry;
use crate::kernel::{BaseActivityLogger, BaseStore};

/// Writes entries to the store on a background task.
///
/// Must be used from inside a tokio runtime. A failed write is logged and
/// dropped; the audited action has already happened.
pub struct StoreActivityLogger {
    store: Arc<dyn BaseStore>,
}

impl StoreActivityLogger {
    pub fn new(store: Arc<dyn BaseStore>) -> Self {
        Self { store }
    }
}

impl BaseActivityLogger for StoreActivityLogger {
    fn record(&self, entry: ActivityLogEntry) {
        let store = self.store.clone();
        tokio::spawn(async move {
            if let Err(e) = store.insert_activity(&entry).await {
                warn!(
                    action = %entry.action,
                    outcome = %entry.outcome,
                    error = %e,
                    "Failed to persist activity entry"
                );
            }
        });
    }
}

/// Emits entries as structured log events only.
pub struct TracingActivityLogger;

impl BaseActivityLogger for TracingActivityLogger {
    fn record(&self, entry: ActivityLogEntry) {
        info!(
            target: "relief_core::activity",
            action = %entry.action,
            outcome = %entry.outcome,
            actor = ?entry.actor_ref_id.as_ref().map(|r| r.as_str()),
            role = ?entry.actor_role,
            metadata = %entry.metadata,
            "activity"
        );
    }
}
