//! Persisted backtest records.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use signalgrid_core::domain::{SignalEvent, SignalHistory};
use signalgrid_core::optimize::round_to;
use signalgrid_core::signals::{Family, RuleParams};

/// Current schema version for persisted results.
pub const SCHEMA_VERSION: u32 = 1;

/// Winner of one family's search plus the signals it produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationResult {
    pub family: Family,
    /// Realized profit of the winning tuple, rounded to cents.
    pub best_performance: f64,
    pub best_parameters: RuleParams,
    pub signals: SignalHistory,
}

impl OptimizationResult {
    /// Build a reported result. Performance is rounded to 2 decimals and a
    /// band width to 1 decimal.
    pub fn new(params: RuleParams, score: f64, signals: SignalHistory) -> Self {
        let best_parameters = match params {
            RuleParams::Bb { n, k } => RuleParams::Bb {
                n,
                k: round_to(k, 1),
            },
            other => other,
        };
        Self {
            family: best_parameters.family(),
            best_performance: round_to(score, 2),
            best_parameters,
            signals,
        }
    }
}

/// Aggregate record for one symbol: one [`OptimizationResult`] per family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestResult {
    pub schema_version: u32,
    pub symbol: String,
    pub created_at: DateTime<Utc>,
    /// Date of the last candle processed.
    pub through: NaiveDate,
    pub request_hash: String,
    pub ema: OptimizationResult,
    pub bb: OptimizationResult,
    pub macd: OptimizationResult,
    pub rsi: OptimizationResult,
    pub willr: OptimizationResult,
}

impl BacktestResult {
    pub fn family(&self, family: Family) -> &OptimizationResult {
        match family {
            Family::Ema => &self.ema,
            Family::Bb => &self.bb,
            Family::Macd => &self.macd,
            Family::Rsi => &self.rsi,
            Family::Willr => &self.willr,
        }
    }

    pub fn family_mut(&mut self, family: Family) -> &mut OptimizationResult {
        match family {
            Family::Ema => &mut self.ema,
            Family::Bb => &mut self.bb,
            Family::Macd => &mut self.macd,
            Family::Rsi => &mut self.rsi,
            Family::Willr => &mut self.willr,
        }
    }

    /// Results for the requested families, keyed by family. An empty
    /// selection means all five.
    pub fn select(&self, families: &[Family]) -> BTreeMap<Family, &OptimizationResult> {
        let wanted: &[Family] = if families.is_empty() {
            &Family::ALL
        } else {
            families
        };
        wanted.iter().map(|&f| (f, self.family(f))).collect()
    }

    /// Signals of the requested families merged in date order. Same-day
    /// events keep family order.
    pub fn signals(&self, families: &[Family]) -> Vec<FamilySignal<'_>> {
        let mut merged: Vec<FamilySignal<'_>> = self
            .select(families)
            .into_iter()
            .flat_map(|(family, result)| {
                result
                    .signals
                    .events()
                    .iter()
                    .map(move |event| FamilySignal { family, event })
            })
            .collect();
        merged.sort_by_key(|s| s.event.date);
        merged
    }
}

/// One row of the merged signal view: an event tagged with its family.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FamilySignal<'a> {
    pub family: Family,
    #[serde(flatten)]
    pub event: &'a SignalEvent,
}
