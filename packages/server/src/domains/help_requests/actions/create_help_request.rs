//! Create help request action

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, instrument};

use crate::common::time;
use crate::common::{
    Actor, HelpRequestId, Identity, Operation, ReliefError, ReliefResult, RequestItemId,
};
use crate::domains::activity::audited;
use crate::domains::help_requests::models::{
    HelpRequest, HelpRequestStatus, HelpRequestWithItems, Priority, RequestItem,
};
use crate::domains::logistics::models::LogisticStatus;
use crate::kernel::{ReliefDeps, StoreTransaction};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRequestItem {
    pub name: String,
    pub qty: i32,
    /// Defaults to `qty` when the whole amount is still missing.
    pub need_qty: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewHelpRequest {
    pub title: String,
    pub description: String,
    pub address: String,
    pub priority: Option<Priority>,
    pub items: Vec<NewRequestItem>,
}

impl NewHelpRequest {
    pub fn validate(&self) -> ReliefResult<()> {
        for (field, value) in [
            ("title", &self.title),
            ("description", &self.description),
            ("address", &self.address),
        ] {
            if value.trim().is_empty() {
                return Err(ReliefError::Validation(format!("{} is required", field)));
            }
        }

        if self.items.is_empty() {
            return Err(ReliefError::Validation(
                "a help request needs at least one item".into(),
            ));
        }

        for (index, item) in self.items.iter().enumerate() {
            if item.name.trim().is_empty() {
                return Err(ReliefError::Validation(format!(
                    "item {} has no name",
                    index + 1
                )));
            }
            if item.qty <= 0 {
                return Err(ReliefError::Validation(format!(
                    "item {:?} must have a positive quantity",
                    item.name
                )));
            }
            let need_qty = item.need_qty.unwrap_or(item.qty);
            if need_qty <= 0 || need_qty > item.qty {
                return Err(ReliefError::Validation(format!(
                    "item {:?} needs between 1 and {} units, got {}",
                    item.name, item.qty, need_qty
                )));
            }
        }

        Ok(())
    }
}

/// Post a help request with its items in one transaction.
#[instrument(skip_all, fields(actor = %actor.reference))]
pub async fn create_help_request(
    input: NewHelpRequest,
    actor: &Identity,
    deps: &ReliefDeps,
) -> ReliefResult<HelpRequestWithItems> {
    let metadata = json!({ "title": input.title, "items": input.items.len() });
    let result = create(input, actor, deps).await;
    audited(deps, Some(actor), "help_request.create", metadata, result)
}

async fn create(
    input: NewHelpRequest,
    actor: &Identity,
    deps: &ReliefDeps,
) -> ReliefResult<HelpRequestWithItems> {
    Actor::new(actor).can(Operation::CreateHelpRequest).check()?;
    input.validate()?;

    let help_request = HelpRequest {
        id: HelpRequestId::new(),
        title: input.title.trim().to_owned(),
        description: input.description.trim().to_owned(),
        address: input.address.trim().to_owned(),
        status: HelpRequestStatus::Active,
        priority: input.priority.unwrap_or_default(),
        logistic_status: LogisticStatus::Pending,
        user_ref_id: actor.reference.clone(),
        created_at: time::now(),
    };
    let items: Vec<RequestItem> = input
        .items
        .into_iter()
        .enumerate()
        .map(|(position, item)| RequestItem {
            id: RequestItemId::new(),
            help_request_id: help_request.id,
            position: position as i32,
            name: item.name.trim().to_owned(),
            qty: item.qty,
            need_qty: item.need_qty.unwrap_or(item.qty),
            received_qty: 0,
        })
        .collect();

    let mut tx = deps.store.begin().await?;
    persist(tx.as_mut(), &help_request, &items).await?;
    tx.commit().await?;

    info!(
        help_request_id = %help_request.id,
        items = items.len(),
        priority = %help_request.priority,
        "help request created"
    );

    Ok(HelpRequestWithItems {
        help_request,
        items,
    })
}

async fn persist(
    tx: &mut dyn StoreTransaction,
    help_request: &HelpRequest,
    items: &[RequestItem],
) -> ReliefResult<()> {
    tx.insert_help_request(help_request).await?;
    for item in items {
        tx.insert_request_item(item).await?;
    }
    Ok(())
}
