//! Decimal arithmetic helpers shared by the book model and risk code.

use rust_decimal::Decimal;

/// Round a price down onto a tick grid (bids bucket toward the worse price).
///
/// Returns the value unchanged for a zero tick, and `None` when the grid is
/// too fine to represent at this price.
pub fn floor_to_tick(value: Decimal, tick_size: Decimal) -> Option<Decimal> {
    if tick_size == Decimal::ZERO {
        return Some(value);
    }
    value.checked_div(tick_size)?.floor().checked_mul(tick_size)
}

/// Round a price up onto a tick grid (asks bucket toward the worse price).
pub fn ceil_to_tick(value: Decimal, tick_size: Decimal) -> Option<Decimal> {
    if tick_size == Decimal::ZERO {
        return Some(value);
    }
    value.checked_div(tick_size)?.ceil().checked_mul(tick_size)
}

/// Safe division that returns zero if divisor is zero.
///
/// A quotient too large to represent saturates at `Decimal::MAX` / `Decimal::MIN`.
pub fn safe_div(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator == Decimal::ZERO {
        return Decimal::ZERO;
    }
    numerator.checked_div(denominator).unwrap_or_else(|| {
        if numerator.is_sign_negative() != denominator.is_sign_negative() {
            Decimal::MIN
        } else {
            Decimal::MAX
        }
    })
}

/// Clamp negative values to zero.
pub fn non_negative(value: Decimal) -> Decimal {
    value.max(Decimal::ZERO)
}

/// Normalize a list of weights so they sum to one.
///
/// Returns `None` for an empty list, a negative weight, or a zero sum.
pub fn normalize_weights(weights: &[Decimal]) -> Option<Vec<Decimal>> {
    if weights.is_empty() || weights.iter().any(|w| *w < Decimal::ZERO) {
        return None;
    }

    let total: Decimal = weights.iter().copied().sum();
    if total == Decimal::ZERO {
        return None;
    }

    Some(weights.iter().map(|w| w / total).collect())
}
