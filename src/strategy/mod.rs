//! Strategy driver.
//!
//! Wires the book model, the order trackers, and the risk accounting into a
//! per-tick plan, and routes fills back into the position.

mod mirror;
mod offset;

pub use mirror::{MirrorStrategy, TickPlan};
pub use offset::{offset_instruction, OffsetInstruction};
