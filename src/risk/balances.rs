//! Order-size ceilings for the primary exchange.
//!
//! Anything we sell on the primary exchange must be bought back on the
//! mirrored exchange, and anything we buy must be sold there, at a price at
//! most `max_loss_fraction` worse than the current mirrored top of book. The
//! capacity on each side is therefore limited both by the primary free balance
//! and by what the mirrored balances can still cover once the position that is
//! already waiting to be offset has been reserved.

use super::position::PositionState;
use crate::orders::Exposure;
use crate::utils::{non_negative, safe_div};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Free (unreserved) balances on both exchanges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FreeBalances {
    pub primary_base: Decimal,
    pub primary_quote: Decimal,
    pub mirrored_base: Decimal,
    pub mirrored_quote: Decimal,
}

/// How much we may commit to new primary orders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AvailableBalances {
    /// Base we may offer on primary asks
    pub base: Decimal,
    /// Quote we may spend on primary bids
    pub quote: Decimal,
}

/// Compute the primary-exchange order-size ceilings.
///
/// `offset_exposures` are the open orders on the mirrored exchange already
/// working to offset the position. A missing or zero price yields zero
/// capacity on the side that depends on it. Products too large to represent
/// saturate, leaving the primary balance as the binding cap.
pub fn compute_available(
    position: &PositionState,
    offset_exposures: &Exposure,
    best_bid: Decimal,
    best_ask: Decimal,
    max_loss_fraction: Decimal,
    balances: &FreeBalances,
) -> AvailableBalances {
    let mut mirrored_base = non_negative(balances.mirrored_base);
    let mut mirrored_quote = non_negative(balances.mirrored_quote);
    let pending_buys = offset_exposures.net();

    if position.is_short() {
        // Buy-back not yet covered by open offsetting buys
        let pending = non_negative(position.net_position.abs() - non_negative(pending_buys));
        let reserved = pending
            .saturating_mul(position.average_cost)
            .saturating_mul(Decimal::ONE + max_loss_fraction);
        mirrored_quote = non_negative(mirrored_quote - reserved);
    } else if position.is_long() {
        // Sell-off not yet covered by open offsetting sells
        let pending = non_negative(position.net_position + pending_buys.min(Decimal::ZERO));
        mirrored_base = non_negative(mirrored_base - pending);
    }

    let base = if best_ask > Decimal::ZERO {
        let buy_back_price = best_ask.saturating_mul(Decimal::ONE + max_loss_fraction);
        non_negative(balances.primary_base).min(safe_div(mirrored_quote, buy_back_price))
    } else {
        Decimal::ZERO
    };

    let sell_off_price = best_bid.saturating_mul(Decimal::ONE - max_loss_fraction);
    let quote = if sell_off_price > Decimal::ZERO {
        non_negative(balances.primary_quote).min(mirrored_base.saturating_mul(sell_off_price))
    } else {
        Decimal::ZERO
    };

    debug!(
        net_position = %position.net_position,
        %mirrored_base,
        %mirrored_quote,
        available_base = %base,
        available_quote = %quote,
        "Computed available balances"
    );

    AvailableBalances {
        base: non_negative(base),
        quote: non_negative(quote),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::{Order, OrderSide, OrderState, OrderTracker};
    use crate::risk::PositionManager;
    use rust_decimal_macros::dec;

    fn excessive() -> FreeBalances {
        FreeBalances {
            primary_base: dec!(100),
            primary_quote: dec!(300),
            mirrored_base: dec!(100000),
            mirrored_quote: dec!(300000),
        }
    }

    fn limited(mirrored_base: Decimal) -> FreeBalances {
        FreeBalances {
            primary_base: dec!(100),
            primary_quote: dec!(300),
            mirrored_base,
            mirrored_quote: dec!(10),
        }
    }

    fn available(pm: &PositionManager, offsets: &OrderTracker, balances: FreeBalances) -> AvailableBalances {
        compute_available(
            &pm.state(),
            &offsets.get_active_exposures(),
            dec!(1),
            dec!(1.1),
            dec!(0.01),
            &balances,
        )
    }

    fn offset_order(side: OrderSide) -> OrderTracker {
        let mut tracker = OrderTracker::new();
        tracker
            .add_order(Order::with_state("offset", dec!(1), dec!(4), side, OrderState::Active))
            .unwrap();
        tracker
    }

    #[test]
    fn test_basic_excessive_mirrored() {
        let result = available(&PositionManager::new(), &OrderTracker::new(), excessive());
        assert_eq!(result, AvailableBalances { base: dec!(100), quote: dec!(300) });
    }

    #[test]
    fn test_basic_limited_mirrored() {
        let result = available(&PositionManager::new(), &OrderTracker::new(), limited(dec!(30)));
        assert_eq!(result.base, dec!(10) / dec!(1.111));
        assert_eq!(result.quote, dec!(30) * dec!(0.99));
    }

    #[test]
    fn test_long_excessive_mirrored() {
        let mut pm = PositionManager::new();
        pm.register_trade(dec!(1), dec!(15));
        let result = available(&pm, &OrderTracker::new(), excessive());
        assert_eq!(result, AvailableBalances { base: dec!(100), quote: dec!(300) });
    }

    #[test]
    fn test_long_limited_mirrored() {
        let mut pm = PositionManager::new();
        pm.register_trade(dec!(1), dec!(15));
        let result = available(&pm, &OrderTracker::new(), limited(dec!(30)));
        assert_eq!(result.base, dec!(10) / dec!(1.111));
        assert_eq!(result.quote, dec!(15) * dec!(0.99));
    }

    #[test]
    fn test_short_excessive_mirrored() {
        let mut pm = PositionManager::new();
        pm.register_trade(dec!(1), dec!(-15));
        let result = available(&pm, &OrderTracker::new(), excessive());
        assert_eq!(result, AvailableBalances { base: dec!(100), quote: dec!(300) });
    }

    #[test]
    fn test_short_limited_mirrored() {
        let mut pm = PositionManager::new();
        pm.register_trade(dec!(1), dec!(-5));
        let result = available(&pm, &OrderTracker::new(), limited(dec!(30)));
        assert_eq!(result.base, (dec!(10) - dec!(5) * dec!(1.01)) / dec!(1.111));
        assert_eq!(result.quote, dec!(30) * dec!(0.99));
    }

    #[test]
    fn test_long_limited_mirrored_with_pending_offsets() {
        let mut pm = PositionManager::new();
        pm.register_trade(dec!(1), dec!(5));
        let result = available(&pm, &offset_order(OrderSide::Sell), limited(dec!(4)));
        assert_eq!(result.base, dec!(10) / dec!(1.111));
        assert_eq!(result.quote, dec!(3) * dec!(0.99));
    }

    #[test]
    fn test_short_limited_mirrored_with_pending_offsets() {
        let mut pm = PositionManager::new();
        pm.register_trade(dec!(1), dec!(-5));
        let result = available(&pm, &offset_order(OrderSide::Buy), limited(dec!(4)));
        assert_eq!(result.base, dec!(8.99) / dec!(1.111));
        assert_eq!(result.quote, dec!(4) * dec!(0.99));
    }

    #[test]
    fn test_flat_with_pending_offsets() {
        let pm = PositionManager::new();
        let result = available(&pm, &offset_order(OrderSide::Buy), excessive());
        assert_eq!(result, AvailableBalances { base: dec!(100), quote: dec!(300) });

        let result = available(&pm, &offset_order(OrderSide::Sell), limited(dec!(30)));
        assert_eq!(result.base, dec!(10) / dec!(1.111));
        assert_eq!(result.quote, dec!(30) * dec!(0.99));
    }

    #[test]
    fn test_over_covered_position_reserves_nothing() {
        let mut pm = PositionManager::new();
        pm.register_trade(dec!(1), dec!(-2));
        let result = available(&pm, &offset_order(OrderSide::Buy), limited(dec!(30)));
        assert_eq!(result.base, dec!(10) / dec!(1.111));
    }

    #[test]
    fn test_empty_book_yields_zero_capacity() {
        let result = compute_available(
            &PositionState::default(),
            &Exposure::default(),
            Decimal::ZERO,
            Decimal::ZERO,
            dec!(0.01),
            &excessive(),
        );
        assert_eq!(result, AvailableBalances::default());
    }

    #[test]
    fn test_extreme_prices_leave_primary_balance_binding() {
        let dust = dec!(0.00000000000000000001);
        let balances = FreeBalances {
            mirrored_quote: dec!(1000000000000),
            ..excessive()
        };
        let result = compute_available(
            &PositionState::default(),
            &Exposure::default(),
            dust,
            dust,
            dec!(0.01),
            &balances,
        );
        assert_eq!(result.base, dec!(100));
        assert_eq!(result.quote, dec!(100000) * (dust * dec!(0.99)));

        let huge = Decimal::MAX / dec!(2);
        let result = compute_available(
            &PositionState::default(),
            &Exposure::default(),
            huge,
            huge,
            dec!(0.01),
            &excessive(),
        );
        assert_eq!(result.quote, dec!(300));
        assert!(result.base < dec!(0.000001));
    }

    #[test]
    fn test_zero_balances_yield_zero_capacity() {
        let result = compute_available(
            &PositionState::default(),
            &Exposure::default(),
            dec!(1),
            dec!(1.1),
            dec!(0.01),
            &FreeBalances::default(),
        );
        assert_eq!(result, AvailableBalances::default());
    }
}
