//! Configuration management for the liquidity mirror.
//!
//! Loads settings from environment variables and config files.

use crate::utils::normalize_weights;
use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Main application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Book shaping parameters
    #[serde(default)]
    pub book: BookConfig,
    /// Per-level sizing schedules
    #[serde(default)]
    pub ratios: RatioConfig,
    /// Price markups applied to the mirrored levels
    #[serde(default)]
    pub markup: MarkupConfig,
    /// Inventory skew applied to level amounts
    #[serde(default)]
    pub inventory: InventoryConfig,
    /// Risk bounds
    #[serde(default)]
    pub risk: RiskConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookConfig {
    /// Price grid used to aggregate mirrored levels
    #[serde(default = "default_tick_size")]
    pub tick_size: Decimal,
    /// Mirrored bid levels considered before aggregation
    #[serde(default = "default_max_levels")]
    pub max_bids: usize,
    /// Mirrored ask levels considered before aggregation
    #[serde(default = "default_max_levels")]
    pub max_asks: usize,
    /// Mirrored levels smaller than this are ignored
    #[serde(default)]
    pub min_mirrored_amount: Decimal,
    /// Placements smaller than this are not sent to the primary exchange
    #[serde(default = "default_min_primary_amount")]
    pub min_primary_amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatioConfig {
    /// Raw weights, best level first; normalized to sum to one
    #[serde(default = "default_amount_ratios")]
    pub bid_amount_ratios: Vec<Decimal>,
    #[serde(default = "default_amount_ratios")]
    pub ask_amount_ratios: Vec<Decimal>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarkupConfig {
    /// Fraction taken off bid prices (0.001 = 10 bps)
    #[serde(default)]
    pub bid: Decimal,
    /// Fraction added to ask prices
    #[serde(default)]
    pub ask: Decimal,
    /// Added to both sides
    #[serde(default)]
    pub symmetric: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryConfig {
    #[serde(default = "default_scale")]
    pub bid_scale: Decimal,
    #[serde(default = "default_scale")]
    pub ask_scale: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskConfig {
    /// Worst acceptable offset price relative to the mirrored top (0.0-1.0)
    #[serde(default = "default_max_loss_fraction")]
    pub max_loss_fraction: Decimal,
    /// Realized loss (quote units) past which quoting halts
    #[serde(default = "default_max_total_loss")]
    pub max_total_loss: Decimal,
    /// Cap on base committed to primary asks
    #[serde(default = "default_max_exposure")]
    pub max_exposure_base: Decimal,
    /// Cap on quote committed to primary bids
    #[serde(default = "default_max_exposure")]
    pub max_exposure_quote: Decimal,
}

// Default value functions
fn default_tick_size() -> Decimal {
    Decimal::new(1, 2) // 0.01
}

// Finer grids overflow the 28-digit mantissa at ordinary prices
fn min_tick_size() -> Decimal {
    Decimal::new(1, 18)
}

fn default_max_levels() -> usize {
    50
}

fn default_min_primary_amount() -> Decimal {
    Decimal::new(1, 4) // 0.0001
}

fn default_amount_ratios() -> Vec<Decimal> {
    // 1/55, 2/55, ... 10/55 once normalized: deeper levels get more size
    (1..=10).map(Decimal::from).collect()
}

fn default_scale() -> Decimal {
    Decimal::ONE
}

fn default_max_loss_fraction() -> Decimal {
    Decimal::new(1, 2) // 0.01
}

fn default_max_total_loss() -> Decimal {
    Decimal::new(100, 0)
}

fn default_max_exposure() -> Decimal {
    Decimal::MAX
}

impl Config {
    /// Load configuration from environment variables and config files.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::Environment::default().separator("__").prefix("LMIR"))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Load from an explicit file, still honouring environment overrides.
    pub fn load_from(path: &str) -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::default().separator("__").prefix("LMIR"))
            .build()
            .with_context(|| format!("Failed to read configuration from {path}"))?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.book.tick_size > Decimal::ZERO,
            "tick_size must be positive"
        );

        anyhow::ensure!(
            self.book.tick_size >= min_tick_size(),
            "tick_size must be at least {}",
            min_tick_size()
        );

        anyhow::ensure!(
            self.book.min_mirrored_amount >= Decimal::ZERO
                && self.book.min_primary_amount >= Decimal::ZERO,
            "minimum amounts must be non-negative"
        );

        self.ratios.bid_ratios()?;
        self.ratios.ask_ratios()?;

        anyhow::ensure!(
            Decimal::ONE - (self.markup.bid + self.markup.symmetric) > Decimal::ZERO
                && Decimal::ONE + (self.markup.ask + self.markup.symmetric) > Decimal::ZERO,
            "markups must leave positive prices"
        );

        anyhow::ensure!(
            self.inventory.bid_scale >= Decimal::ZERO && self.inventory.ask_scale >= Decimal::ZERO,
            "inventory scales must be non-negative"
        );

        anyhow::ensure!(
            !(self.inventory.bid_scale.is_zero() && self.inventory.ask_scale.is_zero()),
            "inventory scales must not both be zero"
        );

        anyhow::ensure!(
            self.risk.max_loss_fraction >= Decimal::ZERO
                && self.risk.max_loss_fraction < Decimal::ONE,
            "max_loss_fraction must be between 0 and 1"
        );

        anyhow::ensure!(
            self.risk.max_exposure_base >= Decimal::ZERO
                && self.risk.max_exposure_quote >= Decimal::ZERO,
            "max exposures must be non-negative"
        );

        Ok(())
    }
}

impl RatioConfig {
    /// Bid ratios normalized to sum to one.
    pub fn bid_ratios(&self) -> Result<Vec<Decimal>> {
        normalize_weights(&self.bid_amount_ratios)
            .context("bid_amount_ratios must be non-empty, non-negative and sum above zero")
    }

    /// Ask ratios normalized to sum to one.
    pub fn ask_ratios(&self) -> Result<Vec<Decimal>> {
        normalize_weights(&self.ask_amount_ratios)
            .context("ask_amount_ratios must be non-empty, non-negative and sum above zero")
    }
}

impl Default for BookConfig {
    fn default() -> Self {
        Self {
            tick_size: default_tick_size(),
            max_bids: default_max_levels(),
            max_asks: default_max_levels(),
            min_mirrored_amount: Decimal::ZERO,
            min_primary_amount: default_min_primary_amount(),
        }
    }
}

impl Default for RatioConfig {
    fn default() -> Self {
        Self {
            bid_amount_ratios: default_amount_ratios(),
            ask_amount_ratios: default_amount_ratios(),
        }
    }
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            bid_scale: default_scale(),
            ask_scale: default_scale(),
        }
    }
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            max_loss_fraction: default_max_loss_fraction(),
            max_total_loss: default_max_total_loss(),
            max_exposure_base: default_max_exposure(),
            max_exposure_quote: default_max_exposure(),
        }
    }
}
