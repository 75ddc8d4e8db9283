//! Backtest orchestration.
//!
//! Flow per run:
//! 1. Validate the request, apply its lookback to the series
//! 2. Grid-search each family's space
//! 3. Regenerate each winner's signals
//! 4. Assemble one [`BacktestResult`] and hand it to the store
//!
//! Incremental mode resumes each family's history from its last event with
//! the stored winning parameters instead of searching again.

use chrono::Utc;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, info, warn};

use signalgrid_core::domain::PriceSeries;
use signalgrid_core::optimize::Optimizer;
use signalgrid_core::signals::{generate, generate_from, Family};

use crate::config::{BacktestRequest, ConfigError};
use crate::result::{BacktestResult, OptimizationResult, SCHEMA_VERSION};
use crate::store::{ResultStore, StoreError};

/// Errors from the orchestrator.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("price series is empty")]
    EmptySeries,

    #[error("need at least 2 candles, got {len}")]
    InsufficientHistory { len: usize },

    #[error("symbol mismatch: expected '{expected}', got '{actual}'")]
    SymbolMismatch { expected: String, actual: String },

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Outcome of extending a stored result with newer candles.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IncrementalReport {
    pub result: BacktestResult,
    /// New events appended per family.
    pub appended: BTreeMap<Family, usize>,
    /// Families left untouched because their anchor date was not in the series.
    pub skipped: Vec<Family>,
}

/// Runs all five families against one series and persists the aggregate.
pub struct Backtester<S> {
    store: S,
    optimizer: Optimizer,
}

impl<S: ResultStore> Backtester<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            optimizer: Optimizer::new(),
        }
    }

    pub fn with_optimizer(mut self, optimizer: Optimizer) -> Self {
        self.optimizer = optimizer;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Optimize every family over the request's lookback window.
    pub fn run(&self, request: &BacktestRequest, series: &PriceSeries) -> Result<BacktestResult, RunError> {
        request.validate()?;
        if series.symbol() != request.symbol {
            return Err(RunError::SymbolMismatch {
                expected: request.symbol.clone(),
                actual: series.symbol().to_string(),
            });
        }

        let series = series.tail(request.lookback_days);
        let through = check_series(&series)?;

        info!(
            symbol = %request.symbol,
            candles = series.len(),
            %through,
            parallel = self.optimizer.is_parallel(),
            "starting backtest"
        );

        let [ema, bb, macd, rsi, willr] =
            Family::ALL.map(|family| self.optimize_family(request, &series, family));

        Ok(BacktestResult {
            schema_version: SCHEMA_VERSION,
            symbol: request.symbol.clone(),
            created_at: Utc::now(),
            through,
            request_hash: request.request_hash()?,
            ema,
            bb,
            macd,
            rsi,
            willr,
        })
    }

    fn optimize_family(
        &self,
        request: &BacktestRequest,
        series: &PriceSeries,
        family: Family,
    ) -> OptimizationResult {
        let space = request.space(family);
        debug!(%family, candidates = space.size(), "searching");

        let outcome = self.optimizer.optimize(series, &space);
        let signals = generate(series, &outcome.best_params, 1).unwrap_or_default();

        info!(
            %family,
            score = outcome.best_score,
            params = %outcome.best_params,
            evaluated = outcome.evaluated,
            skipped = outcome.skipped,
            events = signals.len(),
            "family optimized"
        );

        OptimizationResult::new(outcome.best_params, outcome.best_score, signals)
    }

    /// [`run`](Self::run), then replace the stored record for the symbol.
    pub fn run_and_store(
        &self,
        request: &BacktestRequest,
        series: &PriceSeries,
    ) -> Result<BacktestResult, RunError> {
        let result = self.run(request, series)?;
        self.store.replace(&result)?;
        info!(symbol = %result.symbol, "result stored");
        Ok(result)
    }

    /// Append new events to `previous` using its stored parameters.
    ///
    /// Each family resumes the day after its last event (or after `through`
    /// when it has none). A family whose anchor date is missing from `series`
    /// is skipped and keeps its history. Performance and parameters are
    /// carried over as they are.
    pub fn extend(
        &self,
        previous: &BacktestResult,
        series: &PriceSeries,
    ) -> Result<IncrementalReport, RunError> {
        if series.symbol() != previous.symbol {
            return Err(RunError::SymbolMismatch {
                expected: previous.symbol.clone(),
                actual: series.symbol().to_string(),
            });
        }
        let through = check_series(series)?;

        let mut result = previous.clone();
        let mut appended = BTreeMap::new();
        let mut skipped = Vec::new();

        for family in Family::ALL {
            let current = result.family_mut(family);
            let anchor = current.signals.last().map_or(previous.through, |e| e.date);

            let Some(index) = series.position_of(anchor) else {
                warn!(%family, %anchor, "anchor date not in series, skipping family");
                skipped.push(family);
                continue;
            };

            let before = current.signals.len();
            match generate_from(series, &current.best_parameters, index + 1, current.signals.clone()) {
                Some(history) => {
                    let added = history.len() - before;
                    debug!(%family, %anchor, added, "extended");
                    current.signals = history;
                    appended.insert(family, added);
                }
                None => {
                    warn!(%family, params = %current.best_parameters, "parameters do not fit series, skipping family");
                    skipped.push(family);
                }
            }
        }

        result.through = through.max(previous.through);
        result.created_at = Utc::now();

        info!(
            symbol = %result.symbol,
            %through,
            appended = appended.values().sum::<usize>(),
            skipped = skipped.len(),
            "incremental update"
        );

        Ok(IncrementalReport {
            result,
            appended,
            skipped,
        })
    }

    /// Extend the stored result for the series' symbol and store it again.
    ///
    /// `Ok(None)` when there is no stored result to extend.
    pub fn update_and_store(&self, series: &PriceSeries) -> Result<Option<IncrementalReport>, RunError> {
        let Some(previous) = self.store.load(series.symbol())? else {
            info!(symbol = series.symbol(), "no result available");
            return Ok(None);
        };

        let report = self.extend(&previous, series)?;
        self.store.replace(&report.result)?;
        Ok(Some(report))
    }

    /// Stored result for `symbol`, if any.
    pub fn latest(&self, symbol: &str) -> Result<Option<BacktestResult>, RunError> {
        Ok(self.store.load(symbol)?)
    }
}

/// Reject series the families cannot scan; returns the last date.
fn check_series(series: &PriceSeries) -> Result<chrono::NaiveDate, RunError> {
    match series.last_date() {
        None => Err(RunError::EmptySeries),
        Some(_) if series.len() < 2 => Err(RunError::InsufficientHistory { len: series.len() }),
        Some(last) => Ok(last),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use signalgrid_core::domain::series_from_closes;

    fn small_request(symbol: &str) -> BacktestRequest {
        let mut request = BacktestRequest::new(symbol);
        request.ema.short_high = 6;
        request.ema.long_high = 13;
        request.macd.fast_high = 11;
        request.macd.slow_high = 21;
        request.macd.signal_high = 6;
        request.rsi.period_high = 8;
        request.willr.period_high = 7;
        request
    }

    #[test]
    fn empty_and_single_candle_series_are_rejected() {
        let backtester = Backtester::new(InMemoryStore::new());
        let request = small_request("ONE");

        let one = series_from_closes("ONE", &[10.0]);
        assert!(matches!(
            backtester.run(&request, &one),
            Err(RunError::InsufficientHistory { len: 1 })
        ));

        let none = series_from_closes("ONE", &[]);
        assert!(matches!(backtester.run(&request, &none), Err(RunError::EmptySeries)));
    }

    #[test]
    fn symbol_must_match_request() {
        let backtester = Backtester::new(InMemoryStore::new());
        let series = series_from_closes("SPY", &[1.0, 2.0, 3.0]);
        assert!(matches!(
            backtester.run(&small_request("QQQ"), &series),
            Err(RunError::SymbolMismatch { .. })
        ));
    }

    #[test]
    fn invalid_request_is_a_config_error() {
        let backtester = Backtester::new(InMemoryStore::new());
        let series = series_from_closes("SPY", &[1.0, 2.0, 3.0]);
        let mut request = small_request("SPY");
        request.lookback_days = 0;
        assert!(matches!(
            backtester.run(&request, &series),
            Err(RunError::Config(ConfigError::ZeroLookback))
        ));
    }

    #[test]
    fn short_series_reports_defaults_with_no_signals() {
        let backtester = Backtester::new(InMemoryStore::new());
        let series = series_from_closes("SPY", &[10.0, 11.0, 12.0, 11.0]);
        let result = backtester.run(&small_request("SPY"), &series).unwrap();

        for family in Family::ALL {
            let r = result.family(family);
            assert_eq!(r.best_performance, 0.0);
            assert_eq!(r.best_parameters, family.default_params());
            assert!(r.signals.is_empty());
        }
        assert_eq!(result.through, series.last_date().unwrap());
    }

    #[test]
    fn latest_is_none_before_any_run() {
        let backtester = Backtester::new(InMemoryStore::new());
        assert!(backtester.latest("SPY").unwrap().is_none());
    }
}
