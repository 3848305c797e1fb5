//! Advance logistics action

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, instrument};

use crate::common::time;
use crate::common::{Actor, Identity, Operation, ReliefError, ReliefResult, SupportRequestId};
use crate::domains::activity::audited;
use crate::domains::logistics::models::{LogisticStatus, LogisticsTrackingEntry};
use crate::domains::logistics::transitions::ensure_transition;
use crate::domains::support_requests::models::{SupportRequest, SupportRequestStatus};
use crate::kernel::{ReliefDeps, StoreTransaction};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvanceOutcome {
    pub support_request: SupportRequest,
    pub entry: LogisticsTrackingEntry,
}

/// Move an accepted support request one step along the pipeline.
#[instrument(skip_all, fields(actor = %actor.reference, support_request_id = %id, to = %new_status))]
pub async fn advance_logistics(
    id: SupportRequestId,
    new_status: LogisticStatus,
    notes: Option<String>,
    actor: &Identity,
    deps: &ReliefDeps,
) -> ReliefResult<AdvanceOutcome> {
    let metadata = json!({ "support_request_id": id, "new_status": new_status });
    let result = advance(id, new_status, notes, actor, deps).await;
    audited(deps, Some(actor), "logistics.advance", metadata, result)
}

async fn advance(
    id: SupportRequestId,
    new_status: LogisticStatus,
    notes: Option<String>,
    actor: &Identity,
    deps: &ReliefDeps,
) -> ReliefResult<AdvanceOutcome> {
    Actor::new(actor).can(Operation::AdvanceLogistics).check()?;

    let mut tx = deps.store.begin().await?;
    let outcome = apply(tx.as_mut(), id, new_status, notes, actor).await?;
    tx.commit().await?;

    info!(
        support_request_id = %id,
        from = %outcome.entry.previous_status,
        to = %outcome.entry.new_status,
        "logistics advanced"
    );
    Ok(outcome)
}

async fn apply(
    tx: &mut dyn StoreTransaction,
    id: SupportRequestId,
    new_status: LogisticStatus,
    notes: Option<String>,
    actor: &Identity,
) -> ReliefResult<AdvanceOutcome> {
    let mut support_request = tx
        .support_request_for_update(id)
        .await?
        .ok_or_else(|| ReliefError::not_found("support_request", id))?;
    if support_request.status != SupportRequestStatus::Accepted {
        return Err(ReliefError::NotAccepted {
            id,
            status: support_request.status,
        });
    }

    let help_request = tx
        .help_request_for_update(support_request.help_request_id)
        .await?
        .ok_or_else(|| ReliefError::not_found("help_request", support_request.help_request_id))?;
    ensure_transition(help_request.logistic_status, new_status)?;

    let entry = LogisticsTrackingEntry::new(
        id,
        help_request.logistic_status,
        new_status,
        actor.reference.clone(),
        notes,
    );
    tx.append_tracking_entry(&entry).await?;
    tx.set_logistic_status(help_request.id, new_status).await?;

    if new_status == LogisticStatus::Completed {
        let now = time::now();
        tx.set_support_request_status(id, SupportRequestStatus::Completed, now)
            .await?;
        support_request.status = SupportRequestStatus::Completed;
        support_request.updated_at = now;
    }

    Ok(AdvanceOutcome {
        support_request,
        entry,
    })
}
