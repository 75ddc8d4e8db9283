//! Integration tests for the runner: full runs, storage, and incremental
//! updates on deterministic synthetic data.

use chrono::NaiveDate;
use signalgrid_core::domain::{Action, PriceSeries};
use signalgrid_core::optimize::{round_to, Optimizer};
use signalgrid_core::signals::{generate, Family};
use signalgrid_runner::{
    synthetic_series, BacktestRequest, Backtester, InMemoryStore, JsonFileStore, ResultStore,
    RunError,
};

fn end_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 28).unwrap()
}

fn prefix(series: &PriceSeries, n: usize) -> PriceSeries {
    PriceSeries::new(series.symbol(), series.candles()[..n].to_vec()).unwrap()
}

/// Narrower ranges so the suite stays quick.
fn quick_request(symbol: &str) -> BacktestRequest {
    let mut request = BacktestRequest::new(symbol);
    request.lookback_days = 1000;
    request.macd.fast_high = 13;
    request.macd.slow_high = 24;
    request.macd.signal_high = 9;
    request.rsi.period_high = 14;
    request.rsi.threshold_step = 5.0;
    request.willr.period_high = 12;
    request.willr.threshold_step = 5.0;
    request
}

fn assert_alternates(result: &signalgrid_runner::BacktestResult) {
    for family in Family::ALL {
        let events = result.family(family).signals.events();
        if let Some(first) = events.first() {
            assert_eq!(first.action, Action::Buy, "{family}");
        }
        for pair in events.windows(2) {
            assert_ne!(pair[0].action, pair[1].action, "{family}");
        }
    }
}

// ── Full runs ────────────────────────────────────────────────────────

#[test]
fn default_request_end_to_end() {
    let series = synthetic_series("VOO", end_date(), 300).unwrap();
    let backtester = Backtester::new(InMemoryStore::new());
    let request = BacktestRequest::new("VOO");

    let result = backtester.run_and_store(&request, &series).unwrap();

    assert_eq!(result.symbol, "VOO");
    assert_eq!(result.through, end_date());
    assert_eq!(result.request_hash, request.request_hash().unwrap());
    assert_alternates(&result);

    let window = series.tail(request.lookback_days);
    for family in Family::ALL {
        let r = result.family(family);
        assert_eq!(r.family, family);
        assert!(r.best_performance >= 0.0);
        assert!(
            r.best_performance == 0.0 || round_to(r.signals.profit(), 2) == r.best_performance,
            "{family}"
        );
        let regenerated = generate(&window, &r.best_parameters, 1).unwrap();
        assert_eq!(regenerated, r.signals, "{family}");
    }

    assert_eq!(backtester.latest("VOO").unwrap(), Some(result));
}

#[test]
fn repeated_and_parallel_runs_agree() {
    let series = synthetic_series("SPY", end_date(), 180).unwrap();
    let request = quick_request("SPY");

    let parallel = Backtester::new(InMemoryStore::new());
    let sequential =
        Backtester::new(InMemoryStore::new()).with_optimizer(Optimizer::new().with_parallelism(false));

    let a = parallel.run(&request, &series).unwrap();
    let b = parallel.run(&request, &series).unwrap();
    let c = sequential.run(&request, &series).unwrap();

    for family in Family::ALL {
        assert_eq!(a.family(family), b.family(family), "{family}");
        assert_eq!(a.family(family), c.family(family), "{family}");
    }
}

#[test]
fn lookback_limits_the_window() {
    let series = synthetic_series("IWM", end_date(), 120).unwrap();
    let mut request = quick_request("IWM");
    request.lookback_days = 60;

    let result = Backtester::new(InMemoryStore::new()).run(&request, &series).unwrap();
    let first_kept = series.tail(60).first_date().unwrap();
    for family in Family::ALL {
        assert!(result
            .family(family)
            .signals
            .events()
            .iter()
            .all(|e| e.date >= first_kept));
    }
}

#[test]
fn rerun_replaces_prior_record() {
    let backtester = Backtester::new(InMemoryStore::new());
    let series = synthetic_series("DIA", end_date(), 150).unwrap();

    backtester.run_and_store(&quick_request("DIA"), &series).unwrap();
    let mut narrower = quick_request("DIA");
    narrower.ema.short_high = 6;
    let second = backtester.run_and_store(&narrower, &series).unwrap();

    assert_eq!(backtester.store().len(), 1);
    let stored = backtester.latest("DIA").unwrap().unwrap();
    assert_eq!(stored.request_hash, second.request_hash);
}

// ── Incremental updates ──────────────────────────────────────────────

#[test]
fn extending_over_the_same_data_appends_nothing() {
    let series = synthetic_series("QQQ", end_date(), 160).unwrap();
    let backtester = Backtester::new(InMemoryStore::new());
    let result = backtester.run(&quick_request("QQQ"), &series).unwrap();

    let report = backtester.extend(&result, &series).unwrap();

    assert!(report.skipped.is_empty());
    assert!(report.appended.values().all(|&n| n == 0));
    for family in Family::ALL {
        assert_eq!(report.result.family(family), result.family(family), "{family}");
    }
    assert_eq!(report.result.through, result.through);
}

#[test]
fn extending_with_new_candles_matches_full_regeneration() {
    let full = synthetic_series("XLK", end_date(), 260).unwrap();
    let earlier = prefix(&full, 160);

    let backtester = Backtester::new(InMemoryStore::new());
    let previous = backtester.run(&quick_request("XLK"), &earlier).unwrap();
    let report = backtester.extend(&previous, &full).unwrap();

    assert!(report.skipped.is_empty());
    assert_eq!(report.result.through, end_date());
    assert_alternates(&report.result);

    for family in Family::ALL {
        let before = previous.family(family);
        let after = report.result.family(family);

        let regenerated = generate(&full, &after.best_parameters, 1).unwrap();
        assert_eq!(after.signals, regenerated, "{family}");
        assert_eq!(report.appended[&family], regenerated.len() - before.signals.len());

        assert_eq!(after.best_parameters, before.best_parameters);
        assert_eq!(after.best_performance, before.best_performance);
    }
}

#[test]
fn missing_anchor_dates_skip_families() {
    let full = synthetic_series("XLE", end_date(), 260).unwrap();
    let earlier = prefix(&full, 160);

    let backtester = Backtester::new(InMemoryStore::new());
    let previous = backtester.run(&quick_request("XLE"), &earlier).unwrap();

    // Starts well after every date the earlier run could anchor on.
    let recent = full.tail(50);
    let report = backtester.extend(&previous, &recent).unwrap();

    assert_eq!(report.skipped, Family::ALL.to_vec());
    assert!(report.appended.is_empty());
    for family in Family::ALL {
        assert_eq!(report.result.family(family), previous.family(family));
    }
    assert_eq!(report.result.through, end_date());
}

#[test]
fn extend_rejects_other_symbols() {
    let backtester = Backtester::new(InMemoryStore::new());
    let spy = synthetic_series("SPY", end_date(), 80).unwrap();
    let qqq = synthetic_series("QQQ", end_date(), 80).unwrap();
    let result = backtester.run(&quick_request("SPY"), &spy).unwrap();

    assert!(matches!(
        backtester.extend(&result, &qqq),
        Err(RunError::SymbolMismatch { .. })
    ));
}

#[test]
fn update_without_prior_result_is_none() {
    let backtester = Backtester::new(InMemoryStore::new());
    let series = synthetic_series("TLT", end_date(), 60).unwrap();

    assert!(backtester.update_and_store(&series).unwrap().is_none());
    assert!(backtester.store().is_empty());
}

#[test]
fn update_stores_the_extended_result() {
    let full = synthetic_series("GLD", end_date(), 220).unwrap();
    let backtester = Backtester::new(InMemoryStore::new());
    backtester
        .run_and_store(&quick_request("GLD"), &prefix(&full, 150))
        .unwrap();

    let report = backtester.update_and_store(&full).unwrap().unwrap();
    let stored = backtester.latest("GLD").unwrap().unwrap();

    assert_eq!(stored, report.result);
    assert_eq!(stored.through, end_date());
}

// ── File store ───────────────────────────────────────────────────────

#[test]
fn json_file_store_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path()).unwrap();
    let backtester = Backtester::new(store);
    let series = synthetic_series("VTI", end_date(), 120).unwrap();

    let result = backtester.run_and_store(&quick_request("VTI"), &series).unwrap();
    assert!(backtester.store().result_path("VTI").exists());
    assert_eq!(backtester.latest("VTI").unwrap(), Some(result));

    backtester.store().delete("VTI").unwrap();
    assert!(backtester.latest("VTI").unwrap().is_none());
}
