//! Review support request action

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, instrument};

use crate::common::time;
use crate::common::{Actor, Identity, Operation, ReliefError, ReliefResult, SupportRequestId};
use crate::domains::activity::audited;
use crate::domains::help_requests::models::{HelpRequestStatus, RequestItem};
use crate::domains::help_requests::ItemNeedLedger;
use crate::domains::logistics::models::{LogisticStatus, LogisticsTrackingEntry};
use crate::domains::support_requests::models::{
    ReviewAction, SupportRequest, SupportRequestStatus,
};
use crate::kernel::{ReliefDeps, StoreTransaction};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewOutcome {
    pub support_request: SupportRequest,
    pub help_request_status: HelpRequestStatus,
    pub logistic_status: LogisticStatus,
    /// Items after the accepted quantities were applied; empty on reject.
    pub updated_items: Vec<RequestItem>,
    /// The `pending -> accepted` hand-off; `None` on reject.
    pub tracking_entry: Option<LogisticsTrackingEntry>,
}

/// Accept or reject a pending support request.
///
/// Accepting applies every offered quantity to the ledger, completes the help
/// request when no need remains, and opens the logistics pipeline. All of it
/// commits together or not at all.
#[instrument(skip_all, fields(actor = %actor.reference, support_request_id = %id, action = ?action))]
pub async fn review_support_request(
    id: SupportRequestId,
    action: ReviewAction,
    notes: Option<String>,
    actor: &Identity,
    deps: &ReliefDeps,
) -> ReliefResult<ReviewOutcome> {
    let metadata = json!({ "support_request_id": id, "action": action });
    let result = review(id, action, notes, actor, deps).await;
    audited(deps, Some(actor), "support_request.review", metadata, result)
}

async fn review(
    id: SupportRequestId,
    action: ReviewAction,
    notes: Option<String>,
    actor: &Identity,
    deps: &ReliefDeps,
) -> ReliefResult<ReviewOutcome> {
    Actor::new(actor).can(Operation::ReviewSupportRequest).check()?;

    let mut tx = deps.store.begin().await?;
    let outcome = apply(tx.as_mut(), id, action, notes, actor).await?;
    tx.commit().await?;

    info!(
        support_request_id = %id,
        status = %outcome.support_request.status,
        help_request_status = %outcome.help_request_status,
        "support request reviewed"
    );
    Ok(outcome)
}

async fn apply(
    tx: &mut dyn StoreTransaction,
    id: SupportRequestId,
    action: ReviewAction,
    notes: Option<String>,
    actor: &Identity,
) -> ReliefResult<ReviewOutcome> {
    let mut support_request = tx
        .support_request_for_update(id)
        .await?
        .ok_or_else(|| ReliefError::not_found("support_request", id))?;
    if support_request.status != SupportRequestStatus::Pending {
        return Err(ReliefError::AlreadyReviewed {
            id,
            status: support_request.status,
        });
    }

    let help_request = tx
        .help_request_for_update(support_request.help_request_id)
        .await?
        .ok_or_else(|| ReliefError::not_found("help_request", support_request.help_request_id))?;
    if !help_request.is_active() {
        return Err(ReliefError::HelpRequestNotActive {
            id: help_request.id,
        });
    }

    let now = time::now();

    if action == ReviewAction::Reject {
        tx.set_support_request_status(id, SupportRequestStatus::Rejected, now)
            .await?;
        support_request.status = SupportRequestStatus::Rejected;
        support_request.updated_at = now;
        return Ok(ReviewOutcome {
            support_request,
            help_request_status: help_request.status,
            logistic_status: help_request.logistic_status,
            updated_items: Vec::new(),
            tracking_entry: None,
        });
    }

    tx.set_support_request_status(id, SupportRequestStatus::Accepted, now)
        .await?;
    support_request.status = SupportRequestStatus::Accepted;
    support_request.updated_at = now;

    let mut offers = tx.support_request_items(id).await?;
    // Lock item rows in a stable order.
    offers.sort_by_key(|o| o.request_item_id);

    let (updated_items, remaining) = {
        let mut ledger = ItemNeedLedger::new(&mut *tx);
        let mut updated = Vec::with_capacity(offers.len());
        for offer in &offers {
            updated.push(
                ledger
                    .apply_accepted_offer(offer.request_item_id, offer.quantity_offered)
                    .await?,
            );
        }
        (updated, ledger.remaining_need_count(help_request.id).await?)
    };

    let help_request_status = if remaining == 0 {
        tx.set_help_request_status(help_request.id, HelpRequestStatus::Completed)
            .await?;
        HelpRequestStatus::Completed
    } else {
        help_request.status
    };

    let entry = LogisticsTrackingEntry::new(
        id,
        LogisticStatus::Pending,
        LogisticStatus::Accepted,
        actor.reference.clone(),
        notes,
    );
    tx.append_tracking_entry(&entry).await?;
    tx.set_logistic_status(help_request.id, LogisticStatus::Accepted)
        .await?;

    Ok(ReviewOutcome {
        support_request,
        help_request_status,
        logistic_status: LogisticStatus::Accepted,
        updated_items,
        tracking_entry: Some(entry),
    })
}
