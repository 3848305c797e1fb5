//! Logistics history queries

use futures::stream::BoxStream;
use futures::TryStreamExt;
use serde_json::json;

use crate::common::{Actor, Identity, Operation, ReliefResult};
use crate::domains::activity::audited;
use crate::domains::logistics::models::{LogisticsHistoryEntry, LogisticsHistoryFilter};
use crate::kernel::ReliefDeps;

/// Lazily stream tracking history, most recent first.
///
/// The access check happens up front; rows are only read as the stream is
/// polled, and calling again starts a fresh query.
pub fn logistics_history<'a>(
    filter: LogisticsHistoryFilter,
    actor: &Identity,
    deps: &'a ReliefDeps,
) -> ReliefResult<BoxStream<'a, ReliefResult<LogisticsHistoryEntry>>> {
    let metadata = json!({
        "support_request_id": filter.support_request_id,
        "status": filter.status,
    });
    let checked = Actor::new(actor).can(Operation::ViewLogisticsHistory).check();
    audited(deps, Some(actor), "logistics.history", metadata, checked)?;

    Ok(deps.store.logistics_history(filter))
}

/// [`logistics_history`] collected into a `Vec`.
pub async fn collect_logistics_history(
    filter: LogisticsHistoryFilter,
    actor: &Identity,
    deps: &ReliefDeps,
) -> ReliefResult<Vec<LogisticsHistoryEntry>> {
    logistics_history(filter, actor, deps)?.try_collect().await
}
