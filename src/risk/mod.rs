//! Risk accounting for the mirrored pair.
//!
//! - `PositionManager`: net unhedged position, VWAP cost basis, realized loss
//! - `compute_available`: order-size ceilings that keep every fill offsettable

mod balances;
mod position;

pub use balances::{compute_available, AvailableBalances, FreeBalances};
pub use position::{PositionManager, PositionState};
