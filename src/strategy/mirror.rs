//! Per-pair liquidity mirroring: one tick of planning plus fill handling.

use super::offset::{offset_instruction, OffsetInstruction};
use crate::book::{BookSnapshot, ModelBook, PriceLevel, Steps};
use crate::config::Config;
use crate::error::{MirrorError, Result};
use crate::orders::{OrderSide, OrderTracker};
use crate::risk::{compute_available, AvailableBalances, FreeBalances, PositionManager};
use crate::utils::safe_div;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info, warn};

/// Instructions for the execution layer produced by one tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TickPlan {
    pub bids_to_place: Vec<PriceLevel>,
    pub asks_to_place: Vec<PriceLevel>,
    /// Primary order ids to cancel
    pub orders_to_cancel: Vec<String>,
    /// Capacity the plan was sized against
    pub available: AvailableBalances,
    /// Quoting stopped because realized loss passed the limit
    pub halted: bool,
}

impl TickPlan {
    fn from_steps(steps: Steps<'_>, min_amount: Decimal, available: AvailableBalances) -> Self {
        let keep = |level: &PriceLevel| level.amount > Decimal::ZERO && level.amount >= min_amount;

        Self {
            orders_to_cancel: steps.cancel_ids(),
            bids_to_place: steps.bids_to_place.into_iter().filter(keep).collect(),
            asks_to_place: steps.asks_to_place.into_iter().filter(keep).collect(),
            available,
            halted: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bids_to_place.is_empty()
            && self.asks_to_place.is_empty()
            && self.orders_to_cancel.is_empty()
    }
}

/// State owned by one mirrored trading pair.
///
/// Each pair gets its own instance; nothing is shared across pairs.
pub struct MirrorStrategy {
    config: Config,
    bid_ratios: Vec<Decimal>,
    ask_ratios: Vec<Decimal>,
    primary_orders: OrderTracker,
    offset_orders: OrderTracker,
    position: PositionManager,
}

impl MirrorStrategy {
    /// Create a strategy from a validated configuration.
    pub fn new(config: Config) -> Result<Self> {
        config
            .validate()
            .map_err(|e| MirrorError::InvalidConfig(format!("{e:#}")))?;

        let bid_ratios = config
            .ratios
            .bid_ratios()
            .map_err(|e| MirrorError::InvalidConfig(e.to_string()))?;
        let ask_ratios = config
            .ratios
            .ask_ratios()
            .map_err(|e| MirrorError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            config,
            bid_ratios,
            ask_ratios,
            primary_orders: OrderTracker::new(),
            offset_orders: OrderTracker::new(),
            position: PositionManager::new(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn primary_orders(&self) -> &OrderTracker {
        &self.primary_orders
    }

    pub fn primary_orders_mut(&mut self) -> &mut OrderTracker {
        &mut self.primary_orders
    }

    pub fn offset_orders(&self) -> &OrderTracker {
        &self.offset_orders
    }

    pub fn offset_orders_mut(&mut self) -> &mut OrderTracker {
        &mut self.offset_orders
    }

    pub fn position(&self) -> &PositionManager {
        &self.position
    }

    /// Turn a mirrored-book snapshot into place/cancel instructions.
    ///
    /// `balances` should include funds locked by our own open primary orders,
    /// since the plan describes the full target schedule.
    pub fn plan_tick(&self, snapshot: &BookSnapshot, balances: &FreeBalances) -> Result<TickPlan> {
        let risk = &self.config.risk;

        if self.position.exceeds_loss_limit(risk.max_total_loss) {
            warn!(
                realized_loss = %self.position.realized_loss(),
                max_total_loss = %risk.max_total_loss,
                "Realized loss limit exceeded, cancelling all quotes"
            );
            return Ok(self.halt_plan());
        }

        let best_bid = snapshot.best_bid().unwrap_or(Decimal::ZERO);
        let best_ask = snapshot.best_ask().unwrap_or(Decimal::ZERO);
        let available = compute_available(
            &self.position.state(),
            &self.offset_orders.get_active_exposures(),
            best_bid,
            best_ask,
            risk.max_loss_fraction,
            balances,
        );

        let book_config = &self.config.book;
        let mut book = ModelBook::from_snapshot(snapshot, book_config.min_mirrored_amount);
        // Our own offsetting orders rest in the mirrored book; don't mirror them back
        book.cut_claimed_amounts(&self.offset_orders);
        book.crop(book_config.max_bids, book_config.max_asks);
        book.aggregate(book_config.tick_size)?;
        book.apply_limits();
        book.scale_amounts(self.config.inventory.bid_scale, self.config.inventory.ask_scale)?;

        let (bid_ceilings, ask_ceilings) = self.ceilings(&available, best_bid);
        book.limit_by_ratios(&bid_ceilings, &ask_ceilings)?;

        let markup = &self.config.markup;
        book.markup(markup.bid, markup.ask, markup.symmetric)?;

        let steps = book.steps_from(&self.primary_orders);
        let plan = TickPlan::from_steps(steps, book_config.min_primary_amount, available);

        debug!(
            %best_bid,
            %best_ask,
            available_base = %available.base,
            available_quote = %available.quote,
            place_bids = plan.bids_to_place.len(),
            place_asks = plan.asks_to_place.len(),
            cancel = plan.orders_to_cancel.len(),
            "Planned tick"
        );

        Ok(plan)
    }

    /// Per-level base-amount ceilings for each side.
    fn ceilings(&self, available: &AvailableBalances, best_bid: Decimal) -> (Vec<Decimal>, Vec<Decimal>) {
        let risk = &self.config.risk;
        let base_capacity = available.base.min(risk.max_exposure_base);
        let quote_capacity = available.quote.min(risk.max_exposure_quote);
        // Bids are sized in base; convert the quote budget at the mirrored top
        let bid_capacity = safe_div(quote_capacity, best_bid);

        let bids = self.bid_ratios.iter().map(|r| r.saturating_mul(bid_capacity)).collect();
        let asks = self.ask_ratios.iter().map(|r| r.saturating_mul(base_capacity)).collect();
        (bids, asks)
    }

    fn halt_plan(&self) -> TickPlan {
        TickPlan {
            orders_to_cancel: self
                .primary_orders
                .orders()
                .filter(|o| o.is_open())
                .map(|o| o.id.clone())
                .collect(),
            halted: true,
            ..TickPlan::default()
        }
    }

    /// Apply a primary-exchange fill; returns the order's unfilled remainder.
    pub fn on_primary_fill(&mut self, order_id: &str, price: Decimal, amount: Decimal) -> Result<Decimal> {
        let side = Self::fill_side(&self.primary_orders, order_id)?;
        let remaining = self.primary_orders.register_fill(order_id, amount)?;
        self.position.register_trade(price, side.sign() * amount);

        info!(
            id = %order_id,
            %side,
            %price,
            %amount,
            net_position = %self.position.net_position(),
            "Primary fill"
        );
        Ok(remaining)
    }

    /// Apply an offsetting fill on the mirrored exchange.
    pub fn on_offset_fill(&mut self, order_id: &str, price: Decimal, amount: Decimal) -> Result<Decimal> {
        let side = Self::fill_side(&self.offset_orders, order_id)?;
        let remaining = self.offset_orders.register_fill(order_id, amount)?;
        self.position.register_trade(price, side.sign() * amount);

        info!(
            id = %order_id,
            %side,
            %price,
            %amount,
            net_position = %self.position.net_position(),
            realized_loss = %self.position.realized_loss(),
            "Offset fill"
        );
        Ok(remaining)
    }

    /// The offsetting order the current position calls for, if any.
    pub fn offset_instruction(&self) -> Option<OffsetInstruction> {
        offset_instruction(
            &self.position.state(),
            &self.offset_orders.get_active_exposures(),
            self.config.risk.max_loss_fraction,
        )
    }

    fn fill_side(tracker: &OrderTracker, order_id: &str) -> Result<OrderSide> {
        tracker
            .get(order_id)
            .map(|o| o.side())
            .ok_or_else(|| MirrorError::UnknownOrder(order_id.to_string()))
    }
}
