//! Parameter spaces: inclusive ranges per tunable, one descriptor per family.

use serde::{Deserialize, Serialize};

use crate::signals::{Family, RuleParams};

/// Inclusive integer range, step 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntRange {
    pub low: usize,
    pub high: usize,
}

impl IntRange {
    pub fn new(low: usize, high: usize) -> Self {
        Self { low, high }
    }

    pub fn values(&self) -> impl Iterator<Item = usize> + Clone {
        self.low..=self.high
    }

    /// Number of values, saturating at `usize::MAX` for `0..=usize::MAX`.
    pub fn len(&self) -> usize {
        if self.low > self.high {
            0
        } else {
            (self.high - self.low).saturating_add(1)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Inclusive real range walked as `low + i * step`.
///
/// Each value is rounded to the finer of the decimal precisions of `low` and
/// `step`, so a 0.1 step from 1.8 yields exactly 1.8, 1.9, 2.0, 2.1, 2.2 with
/// no accumulated drift, and a 2.5 step from 25 keeps its halves.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RealRange {
    pub low: f64,
    pub high: f64,
    pub step: f64,
}

/// Default step for real-valued tunables.
pub const REAL_STEP: f64 = 0.1;

impl RealRange {
    pub fn new(low: f64, high: f64, step: f64) -> Self {
        Self { low, high, step }
    }

    /// Number of values, saturating at `usize::MAX` for absurdly fine grids.
    pub fn len(&self) -> usize {
        if !(self.step > 0.0) || self.low > self.high {
            return 0;
        }
        let steps = ((self.high - self.low) / self.step + 1e-9).floor();
        if !steps.is_finite() || steps >= usize::MAX as f64 {
            return usize::MAX;
        }
        (steps as usize).saturating_add(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn values(&self) -> Vec<f64> {
        let decimals = decimals_of(self.low).max(decimals_of(self.step));
        (0..self.len())
            .map(|i| round_to(self.low + i as f64 * self.step, decimals))
            .collect()
    }
}

const MAX_DECIMALS: i32 = 9;

/// Fewest decimals that represent `value` exactly (capped at nine).
fn decimals_of(value: f64) -> i32 {
    if !value.is_finite() {
        return 0;
    }
    (0..MAX_DECIMALS)
        .find(|&d| {
            let scaled = value.abs() * 10f64.powi(d);
            (scaled - scaled.round()).abs() <= 1e-9 * scaled.max(1.0)
        })
        .unwrap_or(MAX_DECIMALS)
}

/// Round `value` to `decimals` places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

/// Largest grid a request may declare for a single family.
pub const MAX_CANDIDATES: usize = 1_000_000;

/// Search space for one family, declared outer-to-inner.
///
/// Candidates are enumerated in ascending nested order: the first declared
/// tunable is the outermost loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "lowercase")]
pub enum ParameterSpace {
    Ema {
        short: IntRange,
        long: IntRange,
    },
    Bb {
        n: IntRange,
        k: RealRange,
    },
    Macd {
        fast: IntRange,
        slow: IntRange,
        signal: IntRange,
    },
    Rsi {
        period: IntRange,
        buy: RealRange,
        sell: RealRange,
    },
    Willr {
        period: IntRange,
        buy: RealRange,
        sell: RealRange,
    },
}

impl ParameterSpace {
    pub fn family(&self) -> Family {
        match self {
            ParameterSpace::Ema { .. } => Family::Ema,
            ParameterSpace::Bb { .. } => Family::Bb,
            ParameterSpace::Macd { .. } => Family::Macd,
            ParameterSpace::Rsi { .. } => Family::Rsi,
            ParameterSpace::Willr { .. } => Family::Willr,
        }
    }

    /// Number of combinations in the Cartesian product, or `None` when it
    /// does not fit in a `usize`.
    pub fn checked_size(&self) -> Option<usize> {
        let lens = match self {
            ParameterSpace::Ema { short, long } => vec![short.len(), long.len()],
            ParameterSpace::Bb { n, k } => vec![n.len(), k.len()],
            ParameterSpace::Macd { fast, slow, signal } => {
                vec![fast.len(), slow.len(), signal.len()]
            }
            ParameterSpace::Rsi { period, buy, sell }
            | ParameterSpace::Willr { period, buy, sell } => {
                vec![period.len(), buy.len(), sell.len()]
            }
        };
        lens.into_iter().try_fold(1usize, |acc, len| acc.checked_mul(len))
    }

    /// Number of combinations, saturating at `usize::MAX`.
    pub fn size(&self) -> usize {
        self.checked_size().unwrap_or(usize::MAX)
    }

    /// Every combination, in canonical (nested ascending) order.
    pub fn candidates(&self) -> Vec<RuleParams> {
        let mut out = Vec::with_capacity(self.size().min(MAX_CANDIDATES));

        match self {
            ParameterSpace::Ema { short, long } => {
                for short in short.values() {
                    for long in long.values() {
                        out.push(RuleParams::Ema { short, long });
                    }
                }
            }
            ParameterSpace::Bb { n, k } => {
                let ks = k.values();
                for n in n.values() {
                    for &k in &ks {
                        out.push(RuleParams::Bb { n, k });
                    }
                }
            }
            ParameterSpace::Macd { fast, slow, signal } => {
                for fast in fast.values() {
                    for slow in slow.values() {
                        for signal in signal.values() {
                            out.push(RuleParams::Macd { fast, slow, signal });
                        }
                    }
                }
            }
            ParameterSpace::Rsi { period, buy, sell } => {
                let (buys, sells) = (buy.values(), sell.values());
                for period in period.values() {
                    for &buy in &buys {
                        for &sell in &sells {
                            out.push(RuleParams::Rsi { period, buy, sell });
                        }
                    }
                }
            }
            ParameterSpace::Willr { period, buy, sell } => {
                let (buys, sells) = (buy.values(), sell.values());
                for period in period.values() {
                    for &buy in &buys {
                        for &sell in &sells {
                            out.push(RuleParams::Willr { period, buy, sell });
                        }
                    }
                }
            }
        }

        out
    }
}
