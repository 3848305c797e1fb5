//! Support request read operations

use serde_json::json;
use tracing::debug;

use crate::common::{Actor, Identity, Operation, ReliefResult};
use crate::domains::activity::audited;
use crate::domains::support_requests::models::{SupportRequestDetails, SupportRequestFilter};
use crate::kernel::ReliefDeps;

/// Moderator listing, newest first. The `requester` field of the filter is
/// honoured too.
pub async fn list_support_requests(
    filter: SupportRequestFilter,
    actor: &Identity,
    deps: &ReliefDeps,
) -> ReliefResult<Vec<SupportRequestDetails>> {
    let metadata = json!({
        "status": filter.status,
        "help_request_id": filter.help_request_id,
    });
    let result = load(&filter, Operation::ListSupportRequests, actor, deps).await;
    audited(deps, Some(actor), "support_request.list", metadata, result)
}

/// The caller's own offers.
pub async fn list_own_support_requests(
    actor: &Identity,
    deps: &ReliefDeps,
) -> ReliefResult<Vec<SupportRequestDetails>> {
    let filter = SupportRequestFilter {
        requester: Some(actor.reference.clone()),
        ..SupportRequestFilter::default()
    };
    let result = load(&filter, Operation::ViewOwnRequests, actor, deps).await;
    audited(deps, Some(actor), "support_request.list_own", json!({}), result)
}

async fn load(
    filter: &SupportRequestFilter,
    operation: Operation,
    actor: &Identity,
    deps: &ReliefDeps,
) -> ReliefResult<Vec<SupportRequestDetails>> {
    Actor::new(actor).can(operation).check()?;

    let requests = deps.store.list_support_requests(filter).await?;
    debug!(count = requests.len(), "loaded support requests");
    Ok(requests)
}
