use serde::{Deserialize, Serialize};

use crate::common::{HelpRequestId, ReliefError, ReliefResult, RequestItemId};

/// One line of a help request.
///
/// `qty` is what was originally asked for, `need_qty` what is still missing
/// and `received_qty` what accepted offers have covered so far. Accepting an
/// offer of `q` moves exactly `q` from `need_qty` to `received_qty`.
#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestItem {
    pub id: RequestItemId,
    pub help_request_id: HelpRequestId,
    pub position: i32,
    pub name: String,
    pub qty: i32,
    pub need_qty: i32,
    pub received_qty: i32,
}

impl RequestItem {
    /// The most a single offer may cover right now.
    pub fn max_offerable(&self) -> i32 {
        self.need_qty
    }

    pub fn has_outstanding_need(&self) -> bool {
        self.need_qty > 0
    }

    pub fn check_offer(&self, quantity: i32) -> ReliefResult<()> {
        if quantity <= 0 || quantity > self.max_offerable() {
            return Err(ReliefError::InvalidQuantity {
                item_id: self.id,
                offered: quantity,
                needed: self.need_qty,
            });
        }
        Ok(())
    }

    /// Move `quantity` from outstanding need to received.
    ///
    /// Fails with `Conflict` when a sibling offer accepted since this one was
    /// made already consumed the need it was validated against.
    pub fn apply_offer(&mut self, quantity: i32) -> ReliefResult<()> {
        if quantity <= 0 {
            return Err(ReliefError::InvalidQuantity {
                item_id: self.id,
                offered: quantity,
                needed: self.need_qty,
            });
        }
        if quantity > self.need_qty {
            return Err(ReliefError::Conflict(format!(
                "item {} now needs {} but the offer covers {}",
                self.id, self.need_qty, quantity
            )));
        }
        self.need_qty -= quantity;
        self.received_qty += quantity;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn water(qty: i32, need_qty: i32) -> RequestItem {
        RequestItem {
            id: RequestItemId::new(),
            help_request_id: HelpRequestId::new(),
            position: 0,
            name: "Water".into(),
            qty,
            need_qty,
            received_qty: qty - need_qty,
        }
    }

    #[test]
    fn offers_up_to_outstanding_need_are_valid() {
        let item = water(10, 4);
        assert!(item.check_offer(1).is_ok());
        assert!(item.check_offer(4).is_ok());
    }

    #[test]
    fn zero_negative_and_excess_offers_are_invalid() {
        let item = water(10, 4);
        for quantity in [0, -3, 5, 10] {
            let err = item.check_offer(quantity).unwrap_err();
            assert!(
                matches!(err, ReliefError::InvalidQuantity { offered, needed: 4, .. } if offered == quantity),
                "quantity {quantity}"
            );
        }
    }

    #[test]
    fn applying_moves_need_to_received() {
        let mut item = water(10, 10);
        item.apply_offer(3).unwrap();
        assert_eq!((item.need_qty, item.received_qty), (7, 3));
        item.apply_offer(7).unwrap();
        assert_eq!((item.need_qty, item.received_qty), (0, 10));
        assert!(!item.has_outstanding_need());
    }

    #[test]
    fn over_allocation_is_a_conflict_and_leaves_item_untouched() {
        let mut item = water(10, 2);
        let err = item.apply_offer(3).unwrap_err();
        assert_eq!(err.kind(), "conflict");
        assert_eq!((item.need_qty, item.received_qty), (2, 8));
    }
}
