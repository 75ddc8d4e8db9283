//! Price-series loading.
//!
//! Two sources:
//! 1. CSV with a `date,open,high,low,close,volume` header, rows in any order
//! 2. A seeded synthetic random walk over weekdays (development only)
//!
//! Both return a validated [`PriceSeries`] trimmed to the requested lookback.
//! A candle with a NaN price, a high below its low, or a non-positive close
//! fails the load.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::Deserialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;

use signalgrid_core::domain::{Candle, PriceSeries, SeriesError};

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid price series: {0}")]
    Series(#[from] SeriesError),

    #[error("no candles for '{symbol}'")]
    Empty { symbol: String },

    #[error("broken candle for '{symbol}' on {date}: prices are missing or inconsistent")]
    InvalidCandle { symbol: String, date: NaiveDate },
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    date: NaiveDate,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: u64,
}

/// Load a CSV file. `lookback` keeps only the most recent candles.
pub fn load_csv(path: &Path, symbol: &str, lookback: Option<usize>) -> Result<PriceSeries, LoadError> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_csv(file, symbol, lookback)
}

/// Parse CSV from any reader, sort by date, and apply the lookback.
pub fn read_csv<R: Read>(reader: R, symbol: &str, lookback: Option<usize>) -> Result<PriceSeries, LoadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut candles = Vec::new();
    for row in rdr.deserialize::<CsvRow>() {
        let row = row?;
        candles.push(Candle {
            date: row.date,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
        });
    }
    candles.sort_by_key(|c| c.date);

    finish(symbol, candles, lookback)
}

/// Deterministic synthetic series of `days` weekday candles ending on or
/// before `end`.
///
/// The walk is seeded from the symbol, so the same symbol always yields the
/// same prices. Results on this data carry no meaning beyond exercising the
/// pipeline.
pub fn synthetic_series(symbol: &str, end: NaiveDate, days: usize) -> Result<PriceSeries, LoadError> {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let seed: [u8; 32] = *blake3::hash(symbol.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let mut dates = Vec::with_capacity(days);
    let mut current = end;
    while dates.len() < days {
        if !matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
            dates.push(current);
        }
        match current.pred_opt() {
            Some(prev) => current = prev,
            None => break,
        }
    }
    dates.reverse();

    let mut price = 100.0_f64;
    let candles = dates
        .into_iter()
        .map(|date| {
            let daily_return: f64 = rng.gen_range(-0.03..0.03);
            let open = price;
            let close = price * (1.0 + daily_return);
            let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
            let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
            let volume = rng.gen_range(500_000..5_000_000u64);
            price = close;
            Candle {
                date,
                open,
                high,
                low,
                close,
                volume,
            }
        })
        .collect();

    finish(symbol, candles, None)
}

fn finish(symbol: &str, candles: Vec<Candle>, lookback: Option<usize>) -> Result<PriceSeries, LoadError> {
    if candles.is_empty() {
        return Err(LoadError::Empty {
            symbol: symbol.to_string(),
        });
    }
    if let Some(bad) = candles.iter().find(|c| !c.is_sane()) {
        return Err(LoadError::InvalidCandle {
            symbol: symbol.to_string(),
            date: bad.date,
        });
    }
    let series = PriceSeries::new(symbol, candles)?;
    Ok(match lookback {
        Some(n) => series.tail(n),
        None => series,
    })
}
