//! Bookkeeping of the strategy's own outstanding orders on one exchange.

use super::order::{Order, OrderSide, OrderState};
use crate::error::{MirrorError, Result};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Base-asset amounts committed by tracked orders, per side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Exposure {
    /// Total base amount resting on sell orders
    pub sells: Decimal,
    /// Total base amount resting on buy orders
    pub buys: Decimal,
}

impl Exposure {
    /// Buys minus sells, in base units.
    pub fn net(&self) -> Decimal {
        self.buys - self.sells
    }
}

/// Tracks orders by id and keeps the exposure totals in sync with them.
#[derive(Debug, Clone, Default)]
pub struct OrderTracker {
    orders: BTreeMap<String, Order>,
    exposure: Exposure,
}

impl OrderTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking an order.
    pub fn add_order(&mut self, order: Order) -> Result<()> {
        if self.orders.contains_key(&order.id) {
            return Err(MirrorError::DuplicateOrder(order.id));
        }

        debug!(
            id = %order.id,
            side = %order.side(),
            price = %order.price(),
            amount = %order.amount_remaining,
            "Tracking order"
        );

        self.orders.insert(order.id.clone(), order);
        self.recompute_exposure();
        Ok(())
    }

    /// Stop tracking an order and hand it back.
    pub fn remove_order(&mut self, id: &str) -> Result<Order> {
        let order = self
            .orders
            .remove(id)
            .ok_or_else(|| MirrorError::UnknownOrder(id.to_string()))?;

        debug!(id = %id, state = ?order.state, "Removed order");
        self.recompute_exposure();
        Ok(order)
    }

    /// Apply a fill of `amount` base units; returns the amount still unfilled.
    ///
    /// A fully filled order is dropped from the tracker.
    pub fn register_fill(&mut self, id: &str, amount: Decimal) -> Result<Decimal> {
        let Some(order) = self.orders.get_mut(id) else {
            warn!(id = %id, %amount, "Fill reported for untracked order");
            return Err(MirrorError::UnknownOrder(id.to_string()));
        };

        if amount <= Decimal::ZERO {
            return Err(MirrorError::InconsistentFill {
                id: id.to_string(),
                reason: format!("non-positive fill amount {amount}"),
            });
        }
        if amount > order.amount_remaining {
            return Err(MirrorError::InconsistentFill {
                id: id.to_string(),
                reason: format!(
                    "fill of {amount} exceeds remaining {}",
                    order.amount_remaining
                ),
            });
        }

        order.amount_remaining -= amount;
        let remaining = order.amount_remaining;
        debug!(id = %id, filled = %amount, %remaining, "Applied fill");

        if remaining.is_zero() {
            self.orders.remove(id);
            debug!(id = %id, "Order fully filled, no longer tracked");
        }

        self.recompute_exposure();
        Ok(remaining)
    }

    /// Move an order to a new lifecycle state.
    ///
    /// Backward moves (e.g. `Cancelled -> Active`) are rejected and leave the
    /// order untouched.
    pub fn set_state(&mut self, id: &str, state: OrderState) -> Result<()> {
        let order = self
            .orders
            .get_mut(id)
            .ok_or_else(|| MirrorError::UnknownOrder(id.to_string()))?;

        if !order.state.can_transition_to(state) {
            warn!(id = %id, from = ?order.state, to = ?state, "Rejected state transition");
            return Err(MirrorError::InvalidTransition {
                id: id.to_string(),
                from: order.state,
                to: state,
            });
        }

        order.state = state;
        self.recompute_exposure();
        Ok(())
    }

    /// Request cancellation of a tracked order.
    pub fn mark_canceled(&mut self, id: &str) -> Result<()> {
        let order = self
            .orders
            .get_mut(id)
            .ok_or_else(|| MirrorError::UnknownOrder(id.to_string()))?;
        order.mark_canceled();
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Order> {
        self.orders.get(id)
    }

    /// All tracked orders, ordered by id.
    pub fn orders(&self) -> impl Iterator<Item = &Order> {
        self.orders.values()
    }

    /// Orders still expected to rest on the book on the given side.
    pub fn open_orders(&self, side: OrderSide) -> impl Iterator<Item = &Order> {
        self.orders
            .values()
            .filter(move |o| o.side() == side && o.is_open())
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn get_active_exposures(&self) -> Exposure {
        self.exposure
    }

    fn recompute_exposure(&mut self) {
        let mut exposure = Exposure::default();
        for order in self.orders.values() {
            if order.state == OrderState::Cancelled {
                continue;
            }
            match order.side() {
                OrderSide::Buy => exposure.buys += order.amount_remaining,
                OrderSide::Sell => exposure.sells += order.amount_remaining,
            }
        }
        self.exposure = exposure;
    }
}
