//! Liquidity Mirror - Offline Entry Point
//!
//! Runs a single planning tick or replays a fill history from JSON files.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use liquidity_mirror::book::BookSnapshot;
use liquidity_mirror::config::Config;
use liquidity_mirror::orders::{Order, OrderSide};
use liquidity_mirror::risk::{FreeBalances, PositionManager};
use liquidity_mirror::strategy::MirrorStrategy;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, info, Level};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "liquidity-mirror")]
#[command(about = "Mirror an order book across exchanges with bounded offset risk", long_about = None)]
struct Cli {
    /// Path to a config file (defaults to ./config.* when present)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Plan one tick from a mirrored-book snapshot and print it as JSON
    Plan {
        /// JSON file with `snapshot`, `balances` and optional open orders
        #[arg(short, long)]
        input: String,
    },

    /// Replay fills through a position manager and print the final state
    Replay {
        /// JSON array of `{side, price, amount}` fills
        #[arg(short, long)]
        fills: String,
    },
}

/// Everything one planning tick needs.
#[derive(Debug, Deserialize)]
struct TickInput {
    snapshot: BookSnapshot,
    balances: FreeBalances,
    /// Our open orders on the primary exchange
    #[serde(default)]
    primary_orders: Vec<Order>,
    /// Our open offsetting orders on the mirrored exchange
    #[serde(default)]
    offset_orders: Vec<Order>,
}

#[derive(Debug, Deserialize)]
struct Fill {
    side: OrderSide,
    price: Decimal,
    amount: Decimal,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging()?;

    let config = match cli.config.as_deref() {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    config.validate()?;
    log_config(&config);

    match cli.command {
        Commands::Plan { input } => run_plan(config, &input),
        Commands::Replay { fills } => run_replay(&fills),
    }
}

/// Initialize logging to stderr plus a daily log file.
///
/// Stdout is reserved for the JSON result.
fn init_logging() -> Result<()> {
    use tracing_subscriber::fmt::writer::MakeWriterExt;

    std::fs::create_dir_all("logs")?;

    let file_appender = tracing_appender::rolling::daily("logs", "liquidity-mirror.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    // Keep the writer flushing for the program duration
    Box::leak(Box::new(guard));

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("liquidity_mirror=debug".parse()?)
                .add_directive(Level::INFO.into()),
        )
        .with_writer(std::io::stderr.and(file_writer))
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false)
        .init();

    Ok(())
}

fn log_config(config: &Config) {
    info!(
        tick_size = %config.book.tick_size,
        max_bids = config.book.max_bids,
        max_asks = config.book.max_asks,
        bid_levels = config.ratios.bid_amount_ratios.len(),
        ask_levels = config.ratios.ask_amount_ratios.len(),
        "Book configuration"
    );
    info!(
        markup_bid = %config.markup.bid,
        markup_ask = %config.markup.ask,
        markup_symmetric = %config.markup.symmetric,
        max_loss_fraction = %config.risk.max_loss_fraction,
        max_total_loss = %config.risk.max_total_loss,
        "Pricing and risk configuration"
    );
}

fn read_json<T: serde::de::DeserializeOwned>(path: &str) -> Result<T> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("Failed to read {path}"))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse {path}"))
}

fn run_plan(config: Config, input_path: &str) -> Result<()> {
    let input: TickInput = read_json(input_path)?;
    let mut strategy = MirrorStrategy::new(config)?;

    for order in input.primary_orders {
        strategy.primary_orders_mut().add_order(order)?;
    }
    for order in input.offset_orders {
        strategy.offset_orders_mut().add_order(order)?;
    }

    let plan = strategy.plan_tick(&input.snapshot, &input.balances)?;
    info!(
        place_bids = plan.bids_to_place.len(),
        place_asks = plan.asks_to_place.len(),
        cancel = plan.orders_to_cancel.len(),
        halted = plan.halted,
        "Tick planned"
    );

    println!("{}", serde_json::to_string_pretty(&plan)?);
    Ok(())
}

fn run_replay(fills_path: &str) -> Result<()> {
    let fills: Vec<Fill> = read_json(fills_path)?;
    let mut position = PositionManager::new();

    for (i, fill) in fills.iter().enumerate() {
        anyhow::ensure!(
            fill.amount >= Decimal::ZERO,
            "fill #{i} has negative amount {}, use `side` for direction",
            fill.amount
        );
        position.register_trade(fill.price, fill.side.sign() * fill.amount);
        debug!(
            fill = i,
            side = %fill.side,
            price = %fill.price,
            amount = %fill.amount,
            "Replayed fill"
        );
    }

    info!(
        fills = fills.len(),
        net_position = %position.net_position(),
        realized_loss = %position.realized_loss(),
        "Replay complete"
    );

    println!("{}", serde_json::to_string_pretty(&position.state())?);
    Ok(())
}
