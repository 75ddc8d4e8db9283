//! Domain types for signalgrid

pub mod candle;
pub mod series;
pub mod signal;

pub use candle::Candle;
pub use series::{series_from_closes, PriceSeries, SeriesError};
pub use signal::{Action, HistoryError, SignalEvent, SignalHistory};
