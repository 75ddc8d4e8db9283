//! PriceSeries: the ordered candle history one backtest runs against.

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use super::Candle;

/// Errors raised when building a [`PriceSeries`].
#[derive(Debug, Error, PartialEq)]
pub enum SeriesError {
    #[error("candle {index} is dated before its predecessor")]
    Unordered { index: usize },

    #[error("duplicate candle for {date}")]
    DuplicateDate { date: NaiveDate },
}

/// Immutable, ascending-by-date candle history for one symbol.
///
/// Numeric views (`closes()`, `highs()`, ...) are derived on demand and never
/// cached; the candles themselves cannot be changed after construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSeries {
    symbol: String,
    candles: Vec<Candle>,
}

impl PriceSeries {
    /// Build a series, rejecting out-of-order or duplicate dates.
    pub fn new(symbol: impl Into<String>, candles: Vec<Candle>) -> Result<Self, SeriesError> {
        for (i, pair) in candles.windows(2).enumerate() {
            if pair[1].date == pair[0].date {
                return Err(SeriesError::DuplicateDate { date: pair[1].date });
            }
            if pair[1].date < pair[0].date {
                return Err(SeriesError::Unordered { index: i + 1 });
            }
        }
        Ok(Self {
            symbol: symbol.into(),
            candles,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.candles.first().map(|c| c.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.candles.last().map(|c| c.date)
    }

    /// Index of the candle dated `date`, if present.
    pub fn position_of(&self, date: NaiveDate) -> Option<usize> {
        self.candles.binary_search_by_key(&date, |c| c.date).ok()
    }

    /// The most recent `n` candles as a new series (the whole series if shorter).
    pub fn tail(&self, n: usize) -> PriceSeries {
        let start = self.candles.len().saturating_sub(n);
        PriceSeries {
            symbol: self.symbol.clone(),
            candles: self.candles[start..].to_vec(),
        }
    }

    pub fn opens(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.open).collect()
    }

    pub fn highs(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.high).collect()
    }

    pub fn lows(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.low).collect()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.close).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.volume as f64).collect()
    }
}

/// Build a series from close prices (tests, benches, demos).
///
/// Generates plausible OHLV: open = prev_close (or close for the first candle),
/// high = max(open,close) + 1.0, low = min(open,close) - 1.0, volume = 1000.
pub fn series_from_closes(symbol: &str, closes: &[f64]) -> PriceSeries {
    let base_date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap_or(NaiveDate::MIN);
    let candles = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Candle {
                date: base_date + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000,
            }
        })
        .collect();
    PriceSeries {
        symbol: symbol.to_string(),
        candles,
    }
}
