//! Diff of a target quote schedule against the orders already out.

use super::level::PriceLevel;
use crate::orders::{Order, OrderSide};

/// Place/cancel instructions that move the live order set onto the model.
///
/// Orders to cancel are borrowed from the tracker the diff was taken against.
#[derive(Debug, Default)]
pub struct Steps<'a> {
    pub bids_to_place: Vec<PriceLevel>,
    pub asks_to_place: Vec<PriceLevel>,
    pub orders_to_cancel: Vec<&'a Order>,
}

impl<'a> Steps<'a> {
    pub fn is_empty(&self) -> bool {
        self.bids_to_place.is_empty()
            && self.asks_to_place.is_empty()
            && self.orders_to_cancel.is_empty()
    }

    /// Every placement paired with the side it goes on.
    pub fn placements(&self) -> impl Iterator<Item = (OrderSide, &PriceLevel)> {
        self.bids_to_place
            .iter()
            .map(|l| (OrderSide::Buy, l))
            .chain(self.asks_to_place.iter().map(|l| (OrderSide::Sell, l)))
    }

    pub fn cancel_ids(&self) -> Vec<String> {
        self.orders_to_cancel.iter().map(|o| o.id.clone()).collect()
    }
}

/// Diff one side of the model against the open orders on that side.
///
/// An order survives only if a level sits at exactly its price with at least
/// its remaining amount, and that level has not already been taken by another
/// order. Levels with any order at their price are not placed this round.
pub(super) fn diff_side<'a>(
    levels: &[PriceLevel],
    orders: impl Iterator<Item = &'a Order>,
    to_cancel: &mut Vec<&'a Order>,
) -> Vec<PriceLevel> {
    let mut claimed = vec![false; levels.len()];
    let mut satisfied = vec![false; levels.len()];

    for order in orders {
        if let Some(idx) = levels.iter().position(|l| l.price == order.price()) {
            claimed[idx] = true;
            if !satisfied[idx] && levels[idx].amount >= order.amount_remaining {
                satisfied[idx] = true;
                continue;
            }
        }
        to_cancel.push(order);
    }

    levels
        .iter()
        .zip(claimed)
        .filter(|(_, claimed)| !claimed)
        .map(|(level, _)| level.clone())
        .collect()
}
