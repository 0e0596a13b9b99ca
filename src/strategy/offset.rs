//! Offsetting orders for the unhedged position.

use crate::orders::{Exposure, OrderSide};
use crate::risk::PositionState;
use crate::utils::non_negative;
use rust_decimal::Decimal;
use serde::Serialize;

/// An order the mirrored exchange should receive to flatten the position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OffsetInstruction {
    pub side: OrderSide,
    /// Base amount not yet covered by open offsetting orders
    pub amount: Decimal,
    /// Worst price at which the offset stays within the loss bound
    pub limit_price: Decimal,
}

/// What still needs offsetting, after netting open offsetting orders.
///
/// Returns `None` when flat or when open offsetting orders already cover the
/// whole position.
pub fn offset_instruction(
    position: &PositionState,
    offset_exposures: &Exposure,
    max_loss_fraction: Decimal,
) -> Option<OffsetInstruction> {
    let net_buys = offset_exposures.net();

    let instruction = if position.is_short() {
        OffsetInstruction {
            side: OrderSide::Buy,
            amount: non_negative(position.net_position.abs() - non_negative(net_buys)),
            limit_price: position.average_cost.saturating_mul(Decimal::ONE + max_loss_fraction),
        }
    } else if position.is_long() {
        OffsetInstruction {
            side: OrderSide::Sell,
            amount: non_negative(position.net_position + net_buys.min(Decimal::ZERO)),
            limit_price: position.average_cost.saturating_mul(Decimal::ONE - max_loss_fraction),
        }
    } else {
        return None;
    };

    (instruction.amount > Decimal::ZERO).then_some(instruction)
}
