//! Backtest request: symbol, lookback and the search range per family.
//!
//! Requests are read from TOML or JSON. Every field except `symbol` is
//! optional; a missing range block (or a missing bound inside one) falls back
//! to the standard search ranges.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use signalgrid_core::optimize::{IntRange, ParameterSpace, RealRange, MAX_CANDIDATES, REAL_STEP};
use signalgrid_core::signals::Family;

/// Default number of most recent candles a backtest looks at.
pub const DEFAULT_LOOKBACK_DAYS: usize = 200;

/// Default step for oscillator thresholds.
pub const DEFAULT_THRESHOLD_STEP: f64 = 1.0;

/// Errors from loading or validating a request.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("config is missing a symbol")]
    MissingSymbol,

    #[error("lookbackDays must be at least 1")]
    ZeroLookback,

    #[error("invalid range for {field}: low {low} > high {high}")]
    InvalidRange {
        field: &'static str,
        low: f64,
        high: f64,
    },

    #[error("invalid step for {field}: {step}")]
    InvalidStep { field: &'static str, step: f64 },

    #[error("{family} grid has {size} candidates, limit is {limit}")]
    GridTooLarge {
        family: Family,
        /// Saturates at `usize::MAX`.
        size: usize,
        limit: usize,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// One backtest request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestRequest {
    #[serde(default)]
    pub symbol: String,
    #[serde(default = "default_lookback")]
    pub lookback_days: usize,
    #[serde(default)]
    pub ema: EmaRanges,
    #[serde(default)]
    pub bb: BbRanges,
    #[serde(default)]
    pub macd: MacdRanges,
    #[serde(default)]
    pub rsi: RsiRanges,
    #[serde(default)]
    pub willr: WillrRanges,
}

fn default_lookback() -> usize {
    DEFAULT_LOOKBACK_DAYS
}

fn default_threshold_step() -> f64 {
    DEFAULT_THRESHOLD_STEP
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EmaRanges {
    pub short_low: usize,
    pub short_high: usize,
    pub long_low: usize,
    pub long_high: usize,
}

impl Default for EmaRanges {
    fn default() -> Self {
        Self {
            short_low: 5,
            short_high: 15,
            long_low: 12,
            long_high: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BbRanges {
    pub n_low: usize,
    pub n_high: usize,
    pub k_low: f64,
    pub k_high: f64,
}

impl Default for BbRanges {
    fn default() -> Self {
        Self {
            n_low: 10,
            n_high: 20,
            k_low: 1.8,
            k_high: 2.2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MacdRanges {
    pub fast_low: usize,
    pub fast_high: usize,
    pub slow_low: usize,
    pub slow_high: usize,
    pub signal_low: usize,
    pub signal_high: usize,
}

impl Default for MacdRanges {
    fn default() -> Self {
        Self {
            fast_low: 10,
            fast_high: 19,
            slow_low: 20,
            slow_high: 30,
            signal_low: 5,
            signal_high: 15,
        }
    }
}

/// Period and thresholds for RSI, bounded [0, 100].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RsiRanges {
    pub period_low: usize,
    pub period_high: usize,
    pub buy_low: f64,
    pub buy_high: f64,
    pub sell_low: f64,
    pub sell_high: f64,
    #[serde(default = "default_threshold_step")]
    pub threshold_step: f64,
}

impl Default for RsiRanges {
    fn default() -> Self {
        Self {
            period_low: 6,
            period_high: 30,
            buy_low: 25.0,
            buy_high: 35.0,
            sell_low: 75.0,
            sell_high: 85.0,
            threshold_step: DEFAULT_THRESHOLD_STEP,
        }
    }
}

/// Period and thresholds for Williams %R, bounded [-100, 0].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WillrRanges {
    pub period_low: usize,
    pub period_high: usize,
    pub buy_low: f64,
    pub buy_high: f64,
    pub sell_low: f64,
    pub sell_high: f64,
    #[serde(default = "default_threshold_step")]
    pub threshold_step: f64,
}

impl Default for WillrRanges {
    fn default() -> Self {
        Self {
            period_low: 5,
            period_high: 20,
            buy_low: -25.0,
            buy_high: -15.0,
            sell_low: -85.0,
            sell_high: -75.0,
            threshold_step: DEFAULT_THRESHOLD_STEP,
        }
    }
}

impl BacktestRequest {
    /// Request for `symbol` with the standard lookback and ranges.
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            ema: EmaRanges::default(),
            bb: BbRanges::default(),
            macd: MacdRanges::default(),
            rsi: RsiRanges::default(),
            willr: WillrRanges::default(),
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Read a request file. `.json` files are parsed as JSON, anything else as
    /// TOML. The result is not validated.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&content),
            _ => Self::from_toml_str(&content),
        }
    }

    /// Check the symbol, the lookback and every range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.symbol.trim().is_empty() {
            return Err(ConfigError::MissingSymbol);
        }
        if self.lookback_days == 0 {
            return Err(ConfigError::ZeroLookback);
        }

        int_bounds("ema.short", self.ema.short_low, self.ema.short_high)?;
        int_bounds("ema.long", self.ema.long_low, self.ema.long_high)?;

        int_bounds("bb.n", self.bb.n_low, self.bb.n_high)?;
        real_bounds("bb.k", self.bb.k_low, self.bb.k_high)?;

        int_bounds("macd.fast", self.macd.fast_low, self.macd.fast_high)?;
        int_bounds("macd.slow", self.macd.slow_low, self.macd.slow_high)?;
        int_bounds("macd.signal", self.macd.signal_low, self.macd.signal_high)?;

        int_bounds("rsi.period", self.rsi.period_low, self.rsi.period_high)?;
        real_bounds("rsi.buy", self.rsi.buy_low, self.rsi.buy_high)?;
        real_bounds("rsi.sell", self.rsi.sell_low, self.rsi.sell_high)?;
        step("rsi.thresholdStep", self.rsi.threshold_step)?;

        int_bounds("willr.period", self.willr.period_low, self.willr.period_high)?;
        real_bounds("willr.buy", self.willr.buy_low, self.willr.buy_high)?;
        real_bounds("willr.sell", self.willr.sell_low, self.willr.sell_high)?;
        step("willr.thresholdStep", self.willr.threshold_step)?;

        for family in Family::ALL {
            let size = self.space(family).size();
            if size > MAX_CANDIDATES {
                return Err(ConfigError::GridTooLarge {
                    family,
                    size,
                    limit: MAX_CANDIDATES,
                });
            }
        }

        Ok(())
    }

    /// Search space for one family.
    pub fn space(&self, family: Family) -> ParameterSpace {
        match family {
            Family::Ema => ParameterSpace::Ema {
                short: IntRange::new(self.ema.short_low, self.ema.short_high),
                long: IntRange::new(self.ema.long_low, self.ema.long_high),
            },
            Family::Bb => ParameterSpace::Bb {
                n: IntRange::new(self.bb.n_low, self.bb.n_high),
                k: RealRange::new(self.bb.k_low, self.bb.k_high, REAL_STEP),
            },
            Family::Macd => ParameterSpace::Macd {
                fast: IntRange::new(self.macd.fast_low, self.macd.fast_high),
                slow: IntRange::new(self.macd.slow_low, self.macd.slow_high),
                signal: IntRange::new(self.macd.signal_low, self.macd.signal_high),
            },
            Family::Rsi => {
                let r = &self.rsi;
                ParameterSpace::Rsi {
                    period: IntRange::new(r.period_low, r.period_high),
                    buy: RealRange::new(r.buy_low, r.buy_high, r.threshold_step),
                    sell: RealRange::new(r.sell_low, r.sell_high, r.threshold_step),
                }
            }
            Family::Willr => {
                let r = &self.willr;
                ParameterSpace::Willr {
                    period: IntRange::new(r.period_low, r.period_high),
                    buy: RealRange::new(r.buy_low, r.buy_high, r.threshold_step),
                    sell: RealRange::new(r.sell_low, r.sell_high, r.threshold_step),
                }
            }
        }
    }

    /// BLAKE3 fingerprint of the canonical JSON form.
    ///
    /// Two requests with identical fields share a hash, whichever file format
    /// they came from.
    pub fn request_hash(&self) -> Result<String, ConfigError> {
        let json = serde_json::to_string(self)?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }
}

fn int_bounds(field: &'static str, low: usize, high: usize) -> Result<(), ConfigError> {
    if low > high {
        return Err(ConfigError::InvalidRange {
            field,
            low: low as f64,
            high: high as f64,
        });
    }
    Ok(())
}

fn real_bounds(field: &'static str, low: f64, high: f64) -> Result<(), ConfigError> {
    if !low.is_finite() || !high.is_finite() || low > high {
        return Err(ConfigError::InvalidRange { field, low, high });
    }
    Ok(())
}

fn step(field: &'static str, step: f64) -> Result<(), ConfigError> {
    if !step.is_finite() || step <= 0.0 {
        return Err(ConfigError::InvalidStep { field, step });
    }
    Ok(())
}
