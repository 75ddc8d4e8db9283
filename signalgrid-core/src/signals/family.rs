//! Rule families and their parameter tuples.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The five indicator rule families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Family {
    /// Short/long EMA crossover.
    Ema,
    /// Bollinger band rebound/breakdown.
    Bb,
    /// MACD line crossing its signal line.
    Macd,
    /// RSI threshold crossings, bounded [0, 100].
    Rsi,
    /// Williams %R threshold crossings, bounded [-100, 0].
    Willr,
}

impl Family {
    /// Canonical order used for runs and reports.
    pub const ALL: [Family; 5] = [
        Family::Ema,
        Family::Bb,
        Family::Macd,
        Family::Rsi,
        Family::Willr,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Family::Ema => "ema",
            Family::Bb => "bb",
            Family::Macd => "macd",
            Family::Rsi => "rsi",
            Family::Willr => "willr",
        }
    }

    /// Fallback parameters reported when no combination beats a zero score.
    pub fn default_params(&self) -> RuleParams {
        match self {
            Family::Ema => RuleParams::Ema { short: 7, long: 14 },
            Family::Bb => RuleParams::Bb { n: 20, k: 2.0 },
            Family::Macd => RuleParams::Macd {
                fast: 12,
                slow: 26,
                signal: 9,
            },
            Family::Rsi => RuleParams::Rsi {
                period: 14,
                buy: 30.0,
                sell: 70.0,
            },
            Family::Willr => RuleParams::Willr {
                period: 10,
                buy: -20.0,
                sell: -80.0,
            },
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Family {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ema" => Ok(Family::Ema),
            "bb" => Ok(Family::Bb),
            "macd" => Ok(Family::Macd),
            "rsi" => Ok(Family::Rsi),
            "willr" => Ok(Family::Willr),
            other => Err(format!("unknown family '{other}' (expected ema, bb, macd, rsi, willr)")),
        }
    }
}

/// One concrete parameter tuple for one family.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "lowercase")]
pub enum RuleParams {
    Ema { short: usize, long: usize },
    Bb { n: usize, k: f64 },
    Macd { fast: usize, slow: usize, signal: usize },
    Rsi { period: usize, buy: f64, sell: f64 },
    Willr { period: usize, buy: f64, sell: f64 },
}

impl RuleParams {
    pub fn family(&self) -> Family {
        match self {
            RuleParams::Ema { .. } => Family::Ema,
            RuleParams::Bb { .. } => Family::Bb,
            RuleParams::Macd { .. } => Family::Macd,
            RuleParams::Rsi { .. } => Family::Rsi,
            RuleParams::Willr { .. } => Family::Willr,
        }
    }

    /// Every window length this tuple needs, in declaration order.
    pub fn periods(&self) -> Vec<usize> {
        match *self {
            RuleParams::Ema { short, long } => vec![short, long],
            RuleParams::Bb { n, .. } => vec![n],
            RuleParams::Macd { fast, slow, signal } => vec![fast, slow, signal],
            RuleParams::Rsi { period, .. } | RuleParams::Willr { period, .. } => vec![period],
        }
    }

    /// Whether every period fits a series of `len` days (`0 < period < len`).
    pub fn is_feasible(&self, len: usize) -> bool {
        self.periods().iter().all(|&p| p > 0 && p < len)
    }

    /// First day the crossing rule may be evaluated.
    pub fn warmup(&self) -> usize {
        self.periods().into_iter().max().unwrap_or(0)
    }
}

impl fmt::Display for RuleParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleParams::Ema { short, long } => write!(f, "ema(short={short}, long={long})"),
            RuleParams::Bb { n, k } => write!(f, "bb(n={n}, k={k:.1})"),
            RuleParams::Macd { fast, slow, signal } => {
                write!(f, "macd(fast={fast}, slow={slow}, signal={signal})")
            }
            RuleParams::Rsi { period, buy, sell } => {
                write!(f, "rsi(period={period}, buy={buy}, sell={sell})")
            }
            RuleParams::Willr { period, buy, sell } => {
                write!(f, "willr(period={period}, buy={buy}, sell={sell})")
            }
        }
    }
}
