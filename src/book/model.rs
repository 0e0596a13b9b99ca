//! Model book: the mirrored book reshaped into the schedule we want to quote.
//!
//! A model is rebuilt from every fresh snapshot and then pushed through a
//! sequence of in-place transformations:
//! - `crop` / `aggregate` to shape depth and price granularity
//! - `apply_limits` to keep away from the mirrored top of book
//! - `cut_claimed_amounts` to avoid double counting our own resting orders
//! - `scale_amounts`, `limit_by_ratios` and `markup` for sizing and pricing
//!
//! `steps_from` then diffs the result against the orders already out.

use super::level::{BookSnapshot, PriceLevel};
use super::steps::{diff_side, Steps};
use crate::error::{MirrorError, Result};
use crate::orders::{OrderSide, OrderTracker};
use crate::utils::{ceil_to_tick, floor_to_tick, non_negative};
use rust_decimal::Decimal;
use tracing::debug;

/// Target quote schedule. Bids descend, asks ascend.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelBook {
    bids: Vec<PriceLevel>,
    asks: Vec<PriceLevel>,
}

impl ModelBook {
    /// Build a model from raw sides, dropping levels smaller than `min_amount`.
    pub fn new(bids: Vec<PriceLevel>, asks: Vec<PriceLevel>, min_amount: Decimal) -> Self {
        let floor = min_amount.max(Decimal::ZERO);
        let keep = |level: &PriceLevel| level.amount >= floor;

        let mut bids: Vec<PriceLevel> = bids.into_iter().filter(keep).collect();
        let mut asks: Vec<PriceLevel> = asks.into_iter().filter(keep).collect();
        bids.sort_by(|a, b| b.price.cmp(&a.price));
        asks.sort_by(|a, b| a.price.cmp(&b.price));

        debug!(
            bids = bids.len(),
            asks = asks.len(),
            %min_amount,
            "Built model book"
        );

        Self { bids, asks }
    }

    pub fn from_snapshot(snapshot: &BookSnapshot, min_amount: Decimal) -> Self {
        Self::new(snapshot.bids.clone(), snapshot.asks.clone(), min_amount)
    }

    pub fn bids(&self) -> &[PriceLevel] {
        &self.bids
    }

    pub fn asks(&self) -> &[PriceLevel] {
        &self.asks
    }

    pub fn best_bid(&self) -> Option<&PriceLevel> {
        self.bids.first()
    }

    pub fn best_ask(&self) -> Option<&PriceLevel> {
        self.asks.first()
    }

    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    /// Keep only the `max_bids` best bids and `max_asks` best asks.
    pub fn crop(&mut self, max_bids: usize, max_asks: usize) {
        self.bids.truncate(max_bids);
        self.asks.truncate(max_asks);
    }

    /// Bucket prices onto a `tick_size` grid, summing amounts per bucket.
    ///
    /// Bids round down and asks round up, so every bucket is at a price no
    /// better than the levels it absorbed.
    pub fn aggregate(&mut self, tick_size: Decimal) -> Result<()> {
        if tick_size <= Decimal::ZERO {
            return Err(MirrorError::InvalidConfig(format!(
                "tick size must be positive, got {tick_size}"
            )));
        }

        let too_fine = || {
            MirrorError::InvalidConfig(format!(
                "tick size {tick_size} is too fine for the book's prices"
            ))
        };
        let bids = aggregate_side(&self.bids, |p| floor_to_tick(p, tick_size)).ok_or_else(too_fine)?;
        let asks = aggregate_side(&self.asks, |p| ceil_to_tick(p, tick_size)).ok_or_else(too_fine)?;
        self.bids = bids;
        self.asks = asks;

        debug!(
            %tick_size,
            bids = self.bids.len(),
            asks = self.asks.len(),
            "Aggregated model book"
        );
        Ok(())
    }

    /// Drop the best level on each side; the mirrored top is never quoted.
    ///
    /// Bids left at or above the remaining best ask are dropped as well.
    pub fn apply_limits(&mut self) {
        if !self.bids.is_empty() {
            self.bids.remove(0);
        }
        if !self.asks.is_empty() {
            self.asks.remove(0);
        }

        if let Some(best_ask) = self.asks.first().map(|l| l.price) {
            self.bids.retain(|l| l.price < best_ask);
        }
    }

    /// Subtract the remaining amount of our live orders from the level they rest at.
    pub fn cut_claimed_amounts(&mut self, order_tracker: &OrderTracker) {
        for order in order_tracker.orders().filter(|o| o.is_live_uncancelled()) {
            let levels = match order.side() {
                OrderSide::Buy => &mut self.bids,
                OrderSide::Sell => &mut self.asks,
            };

            if let Some(level) = levels.iter_mut().find(|l| l.price == order.price()) {
                level.amount = non_negative(level.amount - order.amount_remaining);
                debug!(
                    id = %order.id,
                    price = %level.price,
                    remaining = %level.amount,
                    "Cut claimed amount"
                );
            }
        }
    }

    /// Truncate each side to its ceiling count and cap level `i` at `ceiling[i]`.
    pub fn limit_by_ratios(
        &mut self,
        bid_ceilings: &[Decimal],
        ask_ceilings: &[Decimal],
    ) -> Result<()> {
        validate_ceilings("bid", bid_ceilings)?;
        validate_ceilings("ask", ask_ceilings)?;

        limit_side(&mut self.bids, bid_ceilings);
        limit_side(&mut self.asks, ask_ceilings);
        Ok(())
    }

    /// Push bids down by `bid + symmetric` and asks up by `ask + symmetric`.
    ///
    /// Markups are fractions of price (0.001 = 10 bps).
    pub fn markup(&mut self, bid: Decimal, ask: Decimal, symmetric: Decimal) -> Result<()> {
        let bid_factor = Decimal::ONE - (bid + symmetric);
        let ask_factor = Decimal::ONE + (ask + symmetric);

        if bid_factor <= Decimal::ZERO || ask_factor <= Decimal::ZERO {
            return Err(MirrorError::InvalidConfig(format!(
                "markup yields non-positive price factor (bid {bid_factor}, ask {ask_factor})"
            )));
        }

        for level in &mut self.bids {
            level.price *= bid_factor;
        }
        for level in &mut self.asks {
            level.price *= ask_factor;
        }
        Ok(())
    }

    /// Multiply amounts per side (inventory skew).
    ///
    /// Either side may be zeroed, but not both.
    pub fn scale_amounts(&mut self, bid_scale: Decimal, ask_scale: Decimal) -> Result<()> {
        if bid_scale < Decimal::ZERO || ask_scale < Decimal::ZERO {
            return Err(MirrorError::InvalidConfig(format!(
                "amount scales must be non-negative (bid {bid_scale}, ask {ask_scale})"
            )));
        }
        if bid_scale.is_zero() && ask_scale.is_zero() {
            return Err(MirrorError::InvalidConfig(
                "amount scales sum to zero".to_string(),
            ));
        }

        for level in &mut self.bids {
            level.amount *= bid_scale;
        }
        for level in &mut self.asks {
            level.amount *= ask_scale;
        }
        Ok(())
    }

    /// Place/cancel steps that turn the tracker's open orders into this model.
    pub fn steps_from<'a>(&self, live_orders: &'a OrderTracker) -> Steps<'a> {
        let mut orders_to_cancel = Vec::new();
        let bids_to_place = diff_side(
            &self.bids,
            live_orders.open_orders(OrderSide::Buy),
            &mut orders_to_cancel,
        );
        let asks_to_place = diff_side(
            &self.asks,
            live_orders.open_orders(OrderSide::Sell),
            &mut orders_to_cancel,
        );

        debug!(
            place_bids = bids_to_place.len(),
            place_asks = asks_to_place.len(),
            cancel = orders_to_cancel.len(),
            "Computed book steps"
        );

        Steps {
            bids_to_place,
            asks_to_place,
            orders_to_cancel,
        }
    }
}

fn aggregate_side(
    levels: &[PriceLevel],
    bucket: impl Fn(Decimal) -> Option<Decimal>,
) -> Option<Vec<PriceLevel>> {
    let mut out: Vec<PriceLevel> = Vec::with_capacity(levels.len());
    // Rounding is monotonic, so colliding levels are always adjacent
    for level in levels {
        let price = bucket(level.price)?;
        match out.last_mut() {
            Some(last) if last.price == price => last.amount += level.amount,
            _ => out.push(PriceLevel::new(price, level.amount, level.reference_id)),
        }
    }
    Some(out)
}

fn validate_ceilings(side: &str, ceilings: &[Decimal]) -> Result<()> {
    if ceilings.is_empty() {
        return Err(MirrorError::InvalidConfig(format!(
            "{side} ceiling schedule is empty"
        )));
    }
    if ceilings.iter().any(|c| *c < Decimal::ZERO) {
        return Err(MirrorError::InvalidConfig(format!(
            "{side} ceiling schedule has a negative entry"
        )));
    }
    Ok(())
}

fn limit_side(levels: &mut Vec<PriceLevel>, ceilings: &[Decimal]) {
    levels.truncate(ceilings.len());
    for (level, ceiling) in levels.iter_mut().zip(ceilings) {
        level.amount = level.amount.min(*ceiling);
    }
}
