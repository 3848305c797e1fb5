use serde_json::json;
use tracing::debug;

use crate::common::{Actor, Identity, Operation, ReliefResult};
use crate::domains::activity::audit::audited;
use crate::domains::activity::models::{ActivityFilter, ActivityLogEntry};
use crate::kernel::ReliefDeps;

/// Admin view of the audit trail, newest first.
pub async fn list_activity(
    filter: ActivityFilter,
    actor: &Identity,
    deps: &ReliefDeps,
) -> ReliefResult<Vec<ActivityLogEntry>> {
    let metadata = json!({
        "action_filter": filter.action,
        "actor_filter": filter.actor_ref_id,
    });
    let result = load(&filter, actor, deps).await;
    audited(deps, Some(actor), "activity.list", metadata, result)
}

async fn load(
    filter: &ActivityFilter,
    actor: &Identity,
    deps: &ReliefDeps,
) -> ReliefResult<Vec<ActivityLogEntry>> {
    Actor::new(actor).can(Operation::ViewActivityLogs).check()?;

    let entries = deps.store.list_activity(filter).await?;
    debug!(count = entries.len(), "loaded activity entries");
    Ok(entries)
}
