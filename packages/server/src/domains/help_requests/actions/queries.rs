//! Help request read operations

use serde_json::json;
use tracing::debug;

use crate::common::{Actor, HelpRequestId, Identity, Operation, ReliefError, ReliefResult};
use crate::domains::activity::audited;
use crate::domains::help_requests::models::HelpRequestWithItems;
use crate::kernel::ReliefDeps;

/// Public board: every help request with its item quantities, newest first.
pub async fn list_public_help_requests(
    deps: &ReliefDeps,
) -> ReliefResult<Vec<HelpRequestWithItems>> {
    let requests = deps.store.list_help_requests(None).await?;
    debug!(count = requests.len(), "listed public help requests");
    Ok(requests)
}

/// The caller's own help requests.
pub async fn list_own_help_requests(
    actor: &Identity,
    deps: &ReliefDeps,
) -> ReliefResult<Vec<HelpRequestWithItems>> {
    let result = load_own(actor, deps).await;
    audited(deps, Some(actor), "help_request.list_own", json!({}), result)
}

async fn load_own(actor: &Identity, deps: &ReliefDeps) -> ReliefResult<Vec<HelpRequestWithItems>> {
    Actor::new(actor).can(Operation::ViewOwnRequests).check()?;
    deps.store.list_help_requests(Some(&actor.reference)).await
}

pub async fn get_help_request(
    id: HelpRequestId,
    deps: &ReliefDeps,
) -> ReliefResult<HelpRequestWithItems> {
    deps.store
        .help_request(id)
        .await?
        .ok_or_else(|| ReliefError::not_found("help_request", id))
}
