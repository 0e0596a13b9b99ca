//! Net unhedged position and realized loss tracking.
//!
//! Every fill that changes our inventory (primary fills opening exposure,
//! offsetting fills closing it) is registered as a signed trade. The cost
//! basis is the volume-weighted average price of the open position; loss is
//! realized whenever the position is reduced, closed, or flipped.
//!
//! `register_trade` is not idempotent. Each fill must be delivered exactly
//! once and in order.

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info};

/// Snapshot of the position manager's accounting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PositionState {
    /// VWAP cost basis of the open position (zero when flat)
    pub average_cost: Decimal,
    /// Signed base amount still to offset (positive = long)
    pub net_position: Decimal,
    /// Cumulative realized loss in quote units (negative = gain)
    pub realized_loss: Decimal,
}

impl PositionState {
    pub fn is_flat(&self) -> bool {
        self.net_position.is_zero()
    }

    pub fn is_long(&self) -> bool {
        self.net_position > Decimal::ZERO
    }

    pub fn is_short(&self) -> bool {
        self.net_position < Decimal::ZERO
    }
}

/// Tracks the net unhedged position with weighted-average cost accounting.
#[derive(Debug, Clone, Default)]
pub struct PositionManager {
    state: PositionState,
}

fn has_different_sign(a: Decimal, b: Decimal) -> bool {
    a * b < Decimal::ZERO
}

impl PositionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PositionState {
        self.state
    }

    pub fn average_cost(&self) -> Decimal {
        self.state.average_cost
    }

    pub fn net_position(&self) -> Decimal {
        self.state.net_position
    }

    pub fn realized_loss(&self) -> Decimal {
        self.state.realized_loss
    }

    /// Whether realized loss has gone past `max_total_loss`.
    pub fn exceeds_loss_limit(&self, max_total_loss: Decimal) -> bool {
        self.state.realized_loss > max_total_loss
    }

    /// Register a trade of `signed_amount` base units (positive = bought) at `price`.
    pub fn register_trade(&mut self, price: Decimal, signed_amount: Decimal) {
        if signed_amount.is_zero() {
            return;
        }

        let position = self.state.net_position;
        if position.is_zero() {
            self.state.average_cost = price;
            self.state.net_position = signed_amount;
            info!(%price, amount = %signed_amount, "Opened unhedged position");
            return;
        }

        let new_position = position + signed_amount;
        if new_position.is_zero() {
            self.realize(price, signed_amount);
            self.state.average_cost = Decimal::ZERO;
        } else if has_different_sign(new_position, position) {
            // Flipped through zero: only the old position is closed
            self.realize(price, position);
            self.state.average_cost = price;
        } else if !has_different_sign(signed_amount, position) {
            self.state.average_cost =
                (price * signed_amount + self.state.average_cost * position) / new_position;
        } else {
            self.realize(price, signed_amount);
        }

        self.state.net_position = new_position;

        debug!(
            %price,
            amount = %signed_amount,
            net_position = %self.state.net_position,
            average_cost = %self.state.average_cost,
            realized_loss = %self.state.realized_loss,
            "Registered trade"
        );
    }

    fn realize(&mut self, price: Decimal, amount: Decimal) {
        let closed = amount.abs();
        let loss = if self.state.net_position < Decimal::ZERO {
            (price - self.state.average_cost) * closed
        } else {
            (self.state.average_cost - price) * closed
        };
        self.state.realized_loss += loss;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn state(pm: &PositionManager) -> (Decimal, Decimal, Decimal) {
        (pm.average_cost(), pm.net_position(), pm.realized_loss())
    }

    #[test]
    fn test_basic_short_loss() {
        let mut pm = PositionManager::new();
        pm.register_trade(dec!(100), dec!(-1));
        assert_eq!(state(&pm), (dec!(100), dec!(-1), dec!(0)));
        pm.register_trade(dec!(101), dec!(1));
        assert_eq!(state(&pm), (dec!(0), dec!(0), dec!(1)));
    }

    #[test]
    fn test_basic_long_loss() {
        let mut pm = PositionManager::new();
        pm.register_trade(dec!(101), dec!(1));
        assert_eq!(state(&pm), (dec!(101), dec!(1), dec!(0)));
        pm.register_trade(dec!(100), dec!(-1));
        assert_eq!(state(&pm), (dec!(0), dec!(0), dec!(1)));
    }

    #[test]
    fn test_basic_short_gain() {
        let mut pm = PositionManager::new();
        pm.register_trade(dec!(101), dec!(-1));
        pm.register_trade(dec!(100), dec!(1));
        assert_eq!(state(&pm), (dec!(0), dec!(0), dec!(-1)));
    }

    #[test]
    fn test_basic_long_gain() {
        let mut pm = PositionManager::new();
        pm.register_trade(dec!(100), dec!(1));
        pm.register_trade(dec!(101), dec!(-1));
        assert_eq!(state(&pm), (dec!(0), dec!(0), dec!(-1)));
    }

    #[test]
    fn test_flip_realizes_only_closed_part() {
        let mut pm = PositionManager::new();
        pm.register_trade(dec!(1), dec!(15));
        pm.register_trade(dec!(1), dec!(-20));
        assert_eq!(state(&pm), (dec!(1), dec!(-5), dec!(0)));

        let mut pm = PositionManager::new();
        pm.register_trade(dec!(2), dec!(15));
        pm.register_trade(dec!(1), dec!(-20));
        // 15 units closed at a loss of 1 each, 5 short opened at 1
        assert_eq!(state(&pm), (dec!(1), dec!(-5), dec!(15)));
    }

    #[test]
    fn test_adding_averages_cost() {
        let mut pm = PositionManager::new();
        pm.register_trade(dec!(100), dec!(1));
        pm.register_trade(dec!(110), dec!(3));
        assert_eq!(state(&pm), (dec!(107.5), dec!(4), dec!(0)));
    }

    #[test]
    fn test_reducing_keeps_cost() {
        let mut pm = PositionManager::new();
        pm.register_trade(dec!(100), dec!(-4));
        pm.register_trade(dec!(98), dec!(1));
        assert_eq!(state(&pm), (dec!(100), dec!(-3), dec!(-2)));
    }

    #[test]
    fn test_zero_amount_is_noop() {
        let mut pm = PositionManager::new();
        pm.register_trade(dec!(50), dec!(0));
        assert_eq!(pm.state(), PositionState::default());

        pm.register_trade(dec!(100), dec!(2));
        pm.register_trade(dec!(300), dec!(0));
        assert_eq!(state(&pm), (dec!(100), dec!(2), dec!(0)));
    }

    #[test]
    fn test_exceeds_loss_limit() {
        let mut pm = PositionManager::new();
        pm.register_trade(dec!(100), dec!(1));
        pm.register_trade(dec!(90), dec!(-1));
        assert!(pm.exceeds_loss_limit(dec!(5)));
        assert!(!pm.exceeds_loss_limit(dec!(10)));
    }

    /// Fills from a live BTC-BRL session, oldest first. Positive = bought.
    fn session_fills() -> Vec<(Decimal, Decimal)> {
        vec![
            (dec!(207251.32), dec!(0.0001)),
            (dec!(208260.0), dec!(-0.0001)),
            (dec!(210846.34), dec!(-0.0001)),
            (dec!(209720.0), dec!(0.0001)),
            (dec!(209620.61), dec!(-0.00052091)),
            (dec!(208685.0), dec!(0.0005)),
            (dec!(172535.25), dec!(0.001)),
            (dec!(173350.0), dec!(-0.0009)),
        ]
    }

    #[test]
    fn test_session_replay() {
        let fills = session_fills();
        let mut pm = PositionManager::new();

        for (price, amount) in &fills[..2] {
            pm.register_trade(*price, *amount);
        }
        assert_eq!(state(&pm), (dec!(0), dec!(0), dec!(-0.100868)));

        for (price, amount) in &fills[2..4] {
            pm.register_trade(*price, *amount);
        }
        assert_eq!(state(&pm), (dec!(0), dec!(0), dec!(-0.213502)));

        for (price, amount) in &fills[4..] {
            pm.register_trade(*price, *amount);
        }
        assert_eq!(pm.net_position(), dec!(0.00007909));
        assert_eq!(pm.average_cost(), dec!(172535.25));
        assert_eq!(pm.realized_loss(), dec!(-2.1900368776));
    }

    proptest! {
        #[test]
        fn prop_net_position_is_signed_sum(
            trades in prop::collection::vec((1i64..1_000_000, -10_000i64..10_000), 0..60)
        ) {
            let mut pm = PositionManager::new();
            let mut sum = Decimal::ZERO;
            for (price, amount) in trades {
                let amount = Decimal::new(amount, 4);
                pm.register_trade(Decimal::new(price, 2), amount);
                sum += amount;
                if pm.net_position().is_zero() {
                    prop_assert_eq!(pm.average_cost(), Decimal::ZERO);
                }
            }
            prop_assert_eq!(pm.net_position(), sum);
        }
    }
}
