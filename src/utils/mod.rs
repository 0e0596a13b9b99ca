//! Shared utilities.

pub mod decimal;

pub use decimal::{ceil_to_tick, floor_to_tick, non_negative, normalize_weights, safe_div};
