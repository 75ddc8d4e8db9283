//! signalgrid runner: orchestration, request config, result storage, data loading.
//!
//! This crate builds on `signalgrid-core` to provide:
//! - Backtest requests read from TOML or JSON, with standard search ranges
//! - The orchestrator running all five families and the incremental update
//! - Persisted result records and the storage capability
//! - Price loading from CSV or a seeded synthetic walk

pub mod config;
pub mod data_loader;
pub mod orchestrator;
pub mod result;
pub mod store;

pub use config::{BacktestRequest, ConfigError, DEFAULT_LOOKBACK_DAYS};
pub use data_loader::{load_csv, read_csv, synthetic_series, LoadError};
pub use orchestrator::{Backtester, IncrementalReport, RunError};
pub use result::{BacktestResult, FamilySignal, OptimizationResult, SCHEMA_VERSION};
pub use store::{InMemoryStore, JsonFileStore, ResultStore, StoreError};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn request_is_send_sync() {
        assert_send::<BacktestRequest>();
        assert_sync::<BacktestRequest>();
    }

    #[test]
    fn results_are_send_sync() {
        assert_send::<BacktestResult>();
        assert_sync::<BacktestResult>();
        assert_send::<OptimizationResult>();
        assert_sync::<OptimizationResult>();
        assert_send::<IncrementalReport>();
        assert_sync::<IncrementalReport>();
    }

    #[test]
    fn stores_are_send_sync() {
        assert_send::<InMemoryStore>();
        assert_sync::<InMemoryStore>();
        assert_send::<JsonFileStore>();
        assert_sync::<JsonFileStore>();
    }

    #[test]
    fn backtester_is_send_sync() {
        assert_send::<Backtester<InMemoryStore>>();
        assert_sync::<Backtester<JsonFileStore>>();
    }
}
