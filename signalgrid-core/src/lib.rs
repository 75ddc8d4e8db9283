//! signalgrid core: indicators, signal generation, profit scoring, grid search.
//!
//! This crate contains the algorithmic heart of signalgrid:
//! - Domain types (candles, price series, signal events and histories)
//! - Indicator computation (SMA, EMA, Bollinger, MACD, RSI, Williams %R)
//! - Signal generation with warm-up, degenerate-value and alternation guards
//! - Realized-profit scoring of a signal history
//! - Exhaustive parameter search with a deterministic tie-break
//!
//! Nothing here performs I/O.

pub mod domain;
pub mod indicators;
pub mod optimize;
pub mod signals;
