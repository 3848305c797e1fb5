//! Item need ledger.
//!
//! All reads and writes of `need_qty`/`received_qty` go through here, bound to
//! the caller's transaction. Offers are validated against the current
//! `need_qty` when they are made and applied again under a row lock when they
//! are accepted, because sibling offers may have been accepted in between.

use tracing::debug;

use crate::common::{HelpRequestId, ReliefError, ReliefResult, RequestItemId};
use crate::domains::help_requests::models::RequestItem;
use crate::kernel::StoreTransaction;

pub struct ItemNeedLedger<'t> {
    tx: &'t mut dyn StoreTransaction,
}

impl<'t> ItemNeedLedger<'t> {
    pub fn new(tx: &'t mut dyn StoreTransaction) -> Self {
        Self { tx }
    }

    /// Validate an offer of `quantity` units of `item_id` against `help_request_id`.
    pub async fn check_offer(
        &mut self,
        item_id: RequestItemId,
        help_request_id: HelpRequestId,
        quantity: i32,
    ) -> ReliefResult<RequestItem> {
        let item = match self.tx.request_item(item_id).await? {
            Some(item) if item.help_request_id == help_request_id => item,
            _ => {
                return Err(ReliefError::ItemNotFound {
                    item_id,
                    help_request_id,
                })
            }
        };
        item.check_offer(quantity)?;
        Ok(item)
    }

    /// Move `quantity` from need to received on a locked row.
    pub async fn apply_accepted_offer(
        &mut self,
        item_id: RequestItemId,
        quantity: i32,
    ) -> ReliefResult<RequestItem> {
        let mut item = self
            .tx
            .request_item_for_update(item_id)
            .await?
            .ok_or_else(|| ReliefError::not_found("request_item", item_id))?;

        item.apply_offer(quantity)?;
        self.tx.update_item_quantities(&item).await?;

        debug!(
            item_id = %item.id,
            quantity,
            need_qty = item.need_qty,
            received_qty = item.received_qty,
            "applied accepted offer"
        );
        Ok(item)
    }

    pub async fn remaining_need_count(&mut self, help_request_id: HelpRequestId) -> ReliefResult<i64> {
        self.tx.count_remaining_needs(help_request_id).await
    }
}
