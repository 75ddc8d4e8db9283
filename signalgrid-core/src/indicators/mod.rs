//! Indicator computation.
//!
//! Every indicator is a pure function of the price history: the same series in
//! gives the same per-day values out, with `f64::NAN` for warm-up days. The
//! free `*_of_series` functions operate on raw slices and are what the signal
//! generator calls; the structs implement [`Indicator`] for overlay frames.
//!
//! Multi-series indicators (Bollinger, MACD) are exposed as separate named
//! instances per line, keeping the single-series `Indicator` trait unchanged.

pub mod bollinger;
pub mod ema;
pub mod frame;
pub mod macd;
pub mod rsi;
pub mod sma;
pub mod williams_r;

pub use bollinger::{bollinger_bands, Bollinger, BollingerBand, BollingerSeries};
pub use ema::{ema_of_series, Ema};
pub use frame::{BandRequest, IndicatorFrame, IndicatorRequest, MacdRequest};
pub use macd::{macd_lines, Macd, MacdLine, MacdSeries};
pub use rsi::{rsi_of_series, Rsi};
pub use sma::{sma_of_series, Sma};
pub use williams_r::{williams_r_of_series, WilliamsR};

use crate::domain::PriceSeries;

/// Trait for indicators.
///
/// Indicators take a full price series and produce a numeric output series of
/// the same length. The first `lookback()` values are `f64::NAN` (warmup).
///
/// # Look-ahead contamination guard
/// No indicator value at day t may depend on price data from day t+1 or later.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "sma_20", "rsi_14").
    fn name(&self) -> &str;

    /// Number of days needed before the indicator produces valid output.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire series.
    fn compute(&self, series: &PriceSeries) -> Vec<f64>;
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
