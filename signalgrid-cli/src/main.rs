//! signalgrid CLI: backtest, incremental update, stored-result and indicator views.
//!
//! Commands:
//! - `backtest`: grid-search all five families for one symbol and store the result
//! - `update`: extend the stored result with newer candles
//! - `show`: print the stored result, optionally only some families
//! - `indicators`: print an indicator frame for a series
//!
//! JSON goes to stdout; logs go to stderr (`RUST_LOG` overrides the `info` default).

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use signalgrid_core::domain::PriceSeries;
use signalgrid_core::indicators::{BandRequest, IndicatorFrame, IndicatorRequest, MacdRequest};
use signalgrid_core::optimize::Optimizer;
use signalgrid_core::signals::Family;
use signalgrid_runner::{
    load_csv, synthetic_series, BacktestRequest, Backtester, JsonFileStore, DEFAULT_LOOKBACK_DAYS,
};

#[derive(Parser)]
#[command(
    name = "signalgrid",
    about = "signalgrid: indicator rule backtesting by exhaustive parameter search"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Where candles come from.
#[derive(Args)]
#[group(required = true, multiple = false)]
struct Source {
    /// CSV file with a date,open,high,low,close,volume header.
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Generate a seeded synthetic series instead of reading a file.
    #[arg(long)]
    synthetic: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Optimize every family for a symbol and store the result.
    Backtest {
        /// Symbol (e.g., VOO).
        #[arg(long)]
        symbol: String,

        #[command(flatten)]
        source: Source,

        /// Request file (TOML, or JSON with a .json extension).
        #[arg(long)]
        config: Option<PathBuf>,

        /// Most recent candles to use. Overrides the request file.
        #[arg(long)]
        lookback: Option<usize>,

        /// Result directory. Defaults to ./results.
        #[arg(long, default_value = "results")]
        store_dir: PathBuf,

        /// Evaluate candidates on one thread.
        #[arg(long, default_value_t = false)]
        sequential: bool,
    },
    /// Append new signals to the stored result using its parameters.
    Update {
        /// Symbol (e.g., VOO).
        #[arg(long)]
        symbol: String,

        #[command(flatten)]
        source: Source,

        /// Most recent candles to use. Defaults to the whole CSV.
        #[arg(long)]
        lookback: Option<usize>,

        /// Result directory. Defaults to ./results.
        #[arg(long, default_value = "results")]
        store_dir: PathBuf,
    },
    /// Print the stored result for a symbol.
    Show {
        /// Symbol (e.g., VOO).
        #[arg(long)]
        symbol: String,

        /// Result directory. Defaults to ./results.
        #[arg(long, default_value = "results")]
        store_dir: PathBuf,

        /// Only these families: ema, bb, macd, rsi, willr. Also prints their
        /// signals merged in date order.
        #[arg(long = "family")]
        families: Vec<Family>,
    },
    /// Print indicator overlays for a series.
    Indicators {
        /// Symbol (e.g., VOO).
        #[arg(long)]
        symbol: String,

        #[command(flatten)]
        source: Source,

        /// Most recent candles to use.
        #[arg(long)]
        lookback: Option<usize>,

        /// Simple moving average periods.
        #[arg(long)]
        sma: Vec<usize>,

        /// Exponential moving average periods.
        #[arg(long)]
        ema: Vec<usize>,

        /// Bollinger bands (20, 2.0).
        #[arg(long, default_value_t = false)]
        bbands: bool,

        /// MACD (12, 26, 9).
        #[arg(long, default_value_t = false)]
        macd: bool,

        /// RSI with an optional period (default 14).
        #[arg(long, num_args = 0..=1, default_missing_value = "14")]
        rsi: Option<usize>,

        /// Williams %R with an optional period (default 14).
        #[arg(long, num_args = 0..=1, default_missing_value = "14")]
        willr: Option<usize>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Backtest {
            symbol,
            source,
            config,
            lookback,
            store_dir,
            sequential,
        } => run_backtest_cmd(symbol, source, config, lookback, store_dir, sequential),
        Commands::Update {
            symbol,
            source,
            lookback,
            store_dir,
        } => run_update_cmd(symbol, source, lookback, store_dir),
        Commands::Show {
            symbol,
            store_dir,
            families,
        } => run_show_cmd(&symbol, store_dir, &families),
        Commands::Indicators {
            symbol,
            source,
            lookback,
            sma,
            ema,
            bbands,
            macd,
            rsi,
            willr,
        } => {
            let request = IndicatorRequest {
                sma,
                ema,
                bbands: bbands.then(BandRequest::default),
                macd: macd.then(MacdRequest::default),
                rsi,
                willr,
            };
            run_indicators_cmd(&symbol, &source, lookback, &request)
        }
    }
}

fn run_backtest_cmd(
    symbol: String,
    source: Source,
    config: Option<PathBuf>,
    lookback: Option<usize>,
    store_dir: PathBuf,
    sequential: bool,
) -> Result<()> {
    let mut request = match config {
        Some(path) => BacktestRequest::from_file(&path)
            .with_context(|| format!("loading request {}", path.display()))?,
        None => BacktestRequest::new(symbol.clone()),
    };
    if request.symbol.is_empty() {
        request.symbol = symbol.clone();
    } else if request.symbol != symbol {
        bail!(
            "--symbol {symbol} does not match symbol '{}' in the request file",
            request.symbol
        );
    }
    if let Some(n) = lookback {
        request.lookback_days = n;
    }
    request.validate()?;

    let series = load_series(&symbol, &source, Some(request.lookback_days))?;
    let store = JsonFileStore::new(&store_dir)?;
    let backtester =
        Backtester::new(store).with_optimizer(Optimizer::new().with_parallelism(!sequential));

    let result = backtester.run_and_store(&request, &series)?;
    print_json(&result)
}

fn run_update_cmd(
    symbol: String,
    source: Source,
    lookback: Option<usize>,
    store_dir: PathBuf,
) -> Result<()> {
    let series = load_series(&symbol, &source, lookback)?;
    let backtester = Backtester::new(JsonFileStore::new(&store_dir)?);

    match backtester.update_and_store(&series)? {
        Some(report) => print_json(&report),
        None => {
            println!("no result available");
            Ok(())
        }
    }
}

fn run_show_cmd(symbol: &str, store_dir: PathBuf, families: &[Family]) -> Result<()> {
    let backtester = Backtester::new(JsonFileStore::new(&store_dir)?);

    let Some(result) = backtester.latest(symbol)? else {
        println!("no result available");
        return Ok(());
    };

    if families.is_empty() {
        return print_json(&result);
    }

    print_json(&serde_json::json!({
        "symbol": result.symbol,
        "through": result.through,
        "createdAt": result.created_at,
        "families": result.select(families),
        "signals": result.signals(families),
    }))
}

fn run_indicators_cmd(
    symbol: &str,
    source: &Source,
    lookback: Option<usize>,
    request: &IndicatorRequest,
) -> Result<()> {
    let series = load_series(symbol, source, lookback)?;
    print_json(&IndicatorFrame::build(&series, request))
}

fn load_series(symbol: &str, source: &Source, lookback: Option<usize>) -> Result<PriceSeries> {
    let series = match &source.csv {
        Some(path) => load_csv(path, symbol, lookback)
            .with_context(|| format!("loading {}", path.display()))?,
        None => {
            tracing::warn!(symbol, "using synthetic data");
            let today = chrono::Local::now().date_naive();
            synthetic_series(symbol, today, lookback.unwrap_or(DEFAULT_LOOKBACK_DAYS))?
        }
    };
    Ok(series)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
