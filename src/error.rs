//! Error types for the mirroring engine.

use crate::orders::OrderState;
use thiserror::Error;

/// Errors surfaced by the book model, order trackers and strategy.
///
/// None of these are retried internally; the embedding layer decides whether
/// to skip the tick or halt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MirrorError {
    /// A transformation parameter is unusable (empty schedule, bad tick size, ...).
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// An update referenced an order id the tracker does not hold.
    #[error("unknown order id: {0}")]
    UnknownOrder(String),

    /// An order with the same id is already tracked.
    #[error("duplicate order id: {0}")]
    DuplicateOrder(String),

    /// A state update that would move an order backwards in its lifecycle.
    #[error("invalid state transition for order {id}: {from:?} -> {to:?}")]
    InvalidTransition {
        id: String,
        from: OrderState,
        to: OrderState,
    },

    /// A fill that cannot be applied to the referenced order.
    #[error("inconsistent fill for order {id}: {reason}")]
    InconsistentFill { id: String, reason: String },
}

pub type Result<T> = std::result::Result<T, MirrorError>;
