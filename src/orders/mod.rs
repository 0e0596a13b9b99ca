//! Strategy-owned orders and per-exchange order tracking.
//!
//! - `Order`: price/side fixed at creation, remaining amount and state mutable
//! - `OrderTracker`: id-indexed ownership plus per-side base exposure totals

mod order;
mod tracker;

pub use order::{Order, OrderSide, OrderState};
pub use tracker::{Exposure, OrderTracker};
