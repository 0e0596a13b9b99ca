//! # Liquidity Mirror
//!
//! Mirrors the order book of one exchange onto another with a markup, while
//! keeping every primary-exchange fill offsettable on the mirrored exchange.
//!
//! ## Architecture
//!
//! - `book`: Book model pipeline (aggregate, limit, cut, ratio-limit, markup, diff)
//! - `orders`: Strategy-owned orders and per-exchange tracking
//! - `risk`: Position accounting and balance availability
//! - `strategy`: Per-tick planning and fill handling
//! - `config`: Configuration management and validation
//! - `utils`: Shared decimal arithmetic

pub mod book;
pub mod config;
pub mod error;
pub mod orders;
pub mod risk;
pub mod strategy;
pub mod utils;

pub use config::Config;
pub use error::MirrorError;
