//! Book modeling for the mirrored exchange.
//!
//! Turns a raw mirrored-book snapshot into the quote schedule the strategy
//! wants on the primary exchange, and diffs that schedule against the
//! strategy's own open orders.

mod level;
mod model;
mod steps;

pub use level::{BookSnapshot, PriceLevel};
pub use model::ModelBook;
pub use steps::Steps;
