//! A single strategy-owned order and its lifecycle.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Order side (buy or sell).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// Sign applied to a filled amount when it reaches the position manager.
    pub fn sign(&self) -> Decimal {
        match self {
            OrderSide::Buy => Decimal::ONE,
            OrderSide::Sell => Decimal::NEGATIVE_ONE,
        }
    }

    pub fn opposite(&self) -> Self {
        match self {
            OrderSide::Buy => OrderSide::Sell,
            OrderSide::Sell => OrderSide::Buy,
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "BUY"),
            OrderSide::Sell => write!(f, "SELL"),
        }
    }
}

/// Order lifecycle.
///
/// `Unsent -> {Active, Pending} -> PendingCancel -> Cancelled`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderState {
    /// Created locally, not yet acknowledged by the exchange
    Unsent,
    /// Resting on the exchange
    Active,
    /// Submitted, acknowledgement outstanding
    Pending,
    /// Cancel requested
    PendingCancel,
    /// Cancel confirmed
    Cancelled,
}

impl OrderState {
    /// Whether the lifecycle allows moving from `self` to `next`.
    ///
    /// Staying in the same state is always allowed; nothing moves backwards.
    pub fn can_transition_to(self, next: OrderState) -> bool {
        use OrderState::*;
        self == next
            || matches!(
                (self, next),
                (Unsent, Active | Pending | PendingCancel | Cancelled)
                    | (Pending, Active | PendingCancel | Cancelled)
                    | (Active, PendingCancel | Cancelled)
                    | (PendingCancel, Cancelled)
            )
    }
}

/// An order placed (or about to be placed) by the strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    price: Decimal,
    side: OrderSide,
    pub amount_remaining: Decimal,
    pub state: OrderState,
}

impl Order {
    /// Create a new order in the `Unsent` state.
    pub fn new(id: impl Into<String>, price: Decimal, amount: Decimal, side: OrderSide) -> Self {
        Self::with_state(id, price, amount, side, OrderState::Unsent)
    }

    pub fn with_state(
        id: impl Into<String>,
        price: Decimal,
        amount: Decimal,
        side: OrderSide,
        state: OrderState,
    ) -> Self {
        Self {
            id: id.into(),
            price,
            side,
            amount_remaining: amount,
            state,
        }
    }

    pub fn price(&self) -> Decimal {
        self.price
    }

    pub fn side(&self) -> OrderSide {
        self.side
    }

    /// Quote notional of the unfilled remainder.
    pub fn total(&self) -> Decimal {
        self.price * self.amount_remaining
    }

    /// Acknowledged by the exchange and not being cancelled.
    pub fn is_live_uncancelled(&self) -> bool {
        matches!(self.state, OrderState::Active | OrderState::Pending)
    }

    /// Still expected to rest on the book: live, or sent but not yet acknowledged.
    pub fn is_open(&self) -> bool {
        matches!(
            self.state,
            OrderState::Unsent | OrderState::Active | OrderState::Pending
        )
    }

    /// Request cancellation. No-op once a cancel is already in flight or done.
    pub fn mark_canceled(&mut self) {
        if self.is_open() {
            self.state = OrderState::PendingCancel;
        }
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(id={}, price={}, amount_remaining={}, state={:?}, side={})",
            self.id, self.price, self.amount_remaining, self.state, self.side
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_new_order_is_unsent() {
        let order = Order::new("a", dec!(100), dec!(2), OrderSide::Buy);
        assert_eq!(order.state, OrderState::Unsent);
        assert!(order.is_open());
        assert!(!order.is_live_uncancelled());
        assert_eq!(order.total(), dec!(200));
    }

    #[test]
    fn test_mark_canceled_transitions() {
        for state in [OrderState::Unsent, OrderState::Active, OrderState::Pending] {
            let mut order = Order::with_state("a", dec!(1), dec!(1), OrderSide::Sell, state);
            order.mark_canceled();
            assert_eq!(order.state, OrderState::PendingCancel);
        }

        let mut done = Order::with_state("b", dec!(1), dec!(1), OrderSide::Sell, OrderState::Cancelled);
        done.mark_canceled();
        assert_eq!(done.state, OrderState::Cancelled);
    }

    #[test]
    fn test_state_transitions_only_move_forward() {
        use OrderState::*;
        assert!(Unsent.can_transition_to(Pending));
        assert!(Pending.can_transition_to(Active));
        assert!(Active.can_transition_to(PendingCancel));
        assert!(PendingCancel.can_transition_to(Cancelled));
        assert!(Active.can_transition_to(Active));

        assert!(!Cancelled.can_transition_to(Active));
        assert!(!PendingCancel.can_transition_to(Active));
        assert!(!Active.can_transition_to(Pending));
        assert!(!Active.can_transition_to(Unsent));
    }

    #[test]
    fn test_side_sign() {
        assert_eq!(OrderSide::Buy.sign() * dec!(3), dec!(3));
        assert_eq!(OrderSide::Sell.sign() * dec!(3), dec!(-3));
        assert_eq!(OrderSide::Sell.opposite(), OrderSide::Buy);
    }
}
