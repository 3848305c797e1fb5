//! Create support request action

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashSet;
use tracing::{info, instrument};

use crate::common::time;
use crate::common::{
    Actor, HelpRequestId, Identity, Operation, ReliefError, ReliefResult, RequestItemId,
    SupportRequestId, SupportRequestItemId,
};
use crate::domains::activity::audited;
use crate::domains::help_requests::ItemNeedLedger;
use crate::domains::support_requests::models::{
    SupportRequest, SupportRequestItem, SupportRequestStatus, SupportRequestWithItems,
};
use crate::kernel::{ReliefDeps, StoreTransaction};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferedItem {
    pub request_item_id: RequestItemId,
    pub quantity: i32,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSupportRequest {
    pub help_request_id: HelpRequestId,
    pub items: Vec<OfferedItem>,
    pub notes: Option<String>,
}

impl NewSupportRequest {
    fn validate_shape(&self) -> ReliefResult<()> {
        if self.items.is_empty() {
            return Err(ReliefError::Validation(
                "a support request must offer at least one item".into(),
            ));
        }
        let mut seen = HashSet::new();
        for item in &self.items {
            if !seen.insert(item.request_item_id) {
                return Err(ReliefError::Validation(format!(
                    "item {} is offered more than once",
                    item.request_item_id
                )));
            }
        }
        Ok(())
    }
}

/// Offer items against an active help request.
///
/// Every line is checked against the item's current need before anything is
/// written; one bad line rejects the whole offer.
#[instrument(skip_all, fields(actor = %actor.reference, help_request_id = %input.help_request_id))]
pub async fn create_support_request(
    input: NewSupportRequest,
    actor: &Identity,
    deps: &ReliefDeps,
) -> ReliefResult<SupportRequestWithItems> {
    let metadata = json!({
        "help_request_id": input.help_request_id,
        "items": input.items.len(),
    });
    let result = create(input, actor, deps).await;
    audited(deps, Some(actor), "support_request.create", metadata, result)
}

async fn create(
    input: NewSupportRequest,
    actor: &Identity,
    deps: &ReliefDeps,
) -> ReliefResult<SupportRequestWithItems> {
    Actor::new(actor).can(Operation::CreateSupportRequest).check()?;
    input.validate_shape()?;

    let mut tx = deps.store.begin().await?;
    let created = persist(tx.as_mut(), input, actor).await?;
    tx.commit().await?;

    info!(
        support_request_id = %created.support_request.id,
        items = created.items.len(),
        "support request created"
    );
    Ok(created)
}

async fn persist(
    tx: &mut dyn StoreTransaction,
    input: NewSupportRequest,
    actor: &Identity,
) -> ReliefResult<SupportRequestWithItems> {
    let help_request = tx
        .help_request_for_update(input.help_request_id)
        .await?
        .ok_or_else(|| ReliefError::not_found("help_request", input.help_request_id))?;
    if !help_request.is_active() {
        return Err(ReliefError::HelpRequestNotActive {
            id: help_request.id,
        });
    }

    {
        let mut ledger = ItemNeedLedger::new(&mut *tx);
        for offered in &input.items {
            ledger
                .check_offer(offered.request_item_id, help_request.id, offered.quantity)
                .await?;
        }
    }

    let now = time::now();
    let support_request = SupportRequest {
        id: SupportRequestId::new(),
        help_request_id: help_request.id,
        user_ref_id: actor.reference.clone(),
        status: SupportRequestStatus::Pending,
        notes: input.notes,
        created_at: now,
        updated_at: now,
    };
    tx.insert_support_request(&support_request).await?;

    let mut items = Vec::with_capacity(input.items.len());
    for offered in input.items {
        let item = SupportRequestItem {
            id: SupportRequestItemId::new(),
            support_request_id: support_request.id,
            request_item_id: offered.request_item_id,
            quantity_offered: offered.quantity,
            notes: offered.notes,
        };
        tx.insert_support_request_item(&item).await?;
        items.push(item);
    }

    Ok(SupportRequestWithItems {
        support_request,
        items,
    })
}
