//! # seesaw
//!
//! Runs one alternating sell/buy position on a single spot pair until
//! Ctrl+C or the first fatal error.
//!
//! # Usage
//!
//! ```bash
//! seesaw --key $KEY --secret $SECRET --pair BTC_USDT --enter 70000 --exit 68000 --amount 0.01
//! seesaw --key x --secret x --pair BTC_USDT --enter 100 --exit 90 --amount 10 --paper
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use seesaw_core::config::{
    EngineSettings, TradeParams, load_config, parse_decimal, require_non_empty,
};
use seesaw_engine::AlternationEngine;
use seesaw_engine::clock::{IntervalTicker, SystemClock};
use seesaw_engine::preflight::preflight;
use seesaw_td::Gateway;
use seesaw_td::binance::BinanceSpotGateway;
use seesaw_td::binance::config::BinanceSpotConfig;
use seesaw_td::paper::PaperGateway;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// Alternating spot-trading loop.
#[derive(Parser)]
#[command(name = "seesaw", about = "Alternate sell-at-enter / buy-at-exit orders on one spot pair")]
struct Cli {
    /// API key.
    #[arg(long, default_value = "")]
    key: String,

    /// API secret.
    #[arg(long, default_value = "")]
    secret: String,

    /// Pair as BASE_QUOTE, e.g. BTC_USDT.
    #[arg(long, default_value = "")]
    pair: String,

    /// Sell price.
    #[arg(long, default_value = "")]
    enter: String,

    /// Buy price.
    #[arg(long, default_value = "")]
    exit: String,

    /// Starting amount in base currency.
    #[arg(long, default_value = "")]
    amount: String,

    /// Optional JSON config file with "engine" and "binance" blocks.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Delay between fill polls.
    #[arg(long)]
    poll_interval_ms: Option<u64>,

    /// Fraction of each buy withheld for fees.
    #[arg(long)]
    fee_rate: Option<String>,

    /// Round buy amounts toward zero to this many decimals.
    #[arg(long)]
    amount_decimals: Option<u32>,

    /// Trade against an in-memory gateway that fills every order at once.
    #[arg(long)]
    paper: bool,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Optional log directory for file output.
    #[arg(long)]
    log_dir: Option<String>,
}

/// Shape of the `--config` file. Both blocks are optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    engine: EngineSettings,
    binance: BinanceSpotConfig,
}

impl FileConfig {
    fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => load_config(p),
            None => Ok(Self::default()),
        }
    }
}

/// Apply CLI overrides on top of the file settings.
fn engine_settings(cli: &Cli, mut settings: EngineSettings) -> Result<EngineSettings> {
    if let Some(ms) = cli.poll_interval_ms {
        settings.poll_interval_ms = ms;
    }
    if let Some(fee) = &cli.fee_rate {
        settings.fee_rate = parse_decimal("fee-rate", fee)?;
    }
    if let Some(dp) = cli.amount_decimals {
        settings.amount_decimals = Some(dp);
    }
    settings.validate()?;
    Ok(settings)
}

fn build_gateway(
    cli: &Cli,
    file: BinanceSpotConfig,
    params: &TradeParams,
) -> Result<Arc<dyn Gateway>> {
    if cli.paper {
        warn!("paper mode: orders are filled in memory, nothing reaches the exchange");
        let gw = PaperGateway::new()
            .with_auto_fill()
            .with_balance(params.pair.base(), params.amount);
        return Ok(Arc::new(gw));
    }

    let config = BinanceSpotConfig {
        api_key: cli.key.clone(),
        secret_key: cli.secret.clone(),
        ..file
    };
    let gw = BinanceSpotGateway::new(config).context("failed to build binance gateway")?;
    Ok(Arc::new(gw))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let _log_guard =
        seesaw_core::logging::init_logging(&cli.log_level, cli.log_dir.as_deref(), "seesaw");

    if let Err(e) = run(cli).await {
        error!("{e:#}");
        return Err(e);
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    // 1. Validate inputs before anything touches the network.
    require_non_empty("key", &cli.key)?;
    require_non_empty("secret", &cli.secret)?;
    let params = TradeParams::parse(&cli.pair, &cli.enter, &cli.exit, &cli.amount)?;

    let file = FileConfig::load(cli.config.as_deref())?;
    let settings = engine_settings(&cli, file.engine)?;
    info!(
        "seesaw starting: pair={} enter={} exit={} amount={} poll={}ms",
        params.pair, params.enter, params.exit, params.amount, settings.poll_interval_ms
    );

    // 2. Gateway and startup checks.
    let gateway = build_gateway(&cli, file.binance, &params)?;
    let params = preflight(gateway.as_ref(), &params).await?;

    // 3. Initial sell.
    let mut engine = AlternationEngine::new(gateway, SystemClock, params, &settings)?;
    engine.initialize().await?;

    // 4. Poll until Ctrl+C.
    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("shutdown signal received, stopping after the current tick"),
            Err(e) => error!("failed to listen for Ctrl+C: {e}"),
        }
        stop_tx.send_replace(true);
    });

    let mut ticker = IntervalTicker::new(Duration::from_millis(settings.poll_interval_ms));
    engine.run(&mut ticker, stop_rx).await?;

    let pos = engine.position();
    info!(
        "session finished: {} fill(s), last fill at {:?}, {} order {:?} left open",
        pos.cycles(),
        pos.last_fill_ms(),
        pos.phase().side(),
        pos.pending()
    );
    Ok(())
}
