//! Signal generation.
//!
//! Turns one family's indicator lines into a strictly alternating buy/sell
//! history. Generation is a pure function of the series and the parameters;
//! it never sees scores, other families, or storage.

pub mod family;
pub mod rules;

pub use family::{Family, RuleParams};
pub use rules::{build_rule, line_crossing, threshold_crossing, Crossing, DayRule};

use crate::domain::{PriceSeries, SignalHistory};

/// Generate a fresh history for `params`, scanning from `start_day`.
///
/// Returns `None` when any period does not fit the series (`period >= len`);
/// that is "no result", distinct from an empty history.
pub fn generate(
    series: &PriceSeries,
    params: &RuleParams,
    start_day: usize,
) -> Option<SignalHistory> {
    generate_from(series, params, start_day, SignalHistory::new())
}

/// Continue `history` from `start_day`, keeping its alternation state.
pub fn generate_from(
    series: &PriceSeries,
    params: &RuleParams,
    start_day: usize,
    history: SignalHistory,
) -> Option<SignalHistory> {
    if !params.is_feasible(series.len()) {
        return None;
    }
    let rule = build_rule(series, params);
    Some(walk_days(series, start_day, params.warmup(), history, rule))
}

/// Walk days `max(start_day, 1)..len`, applying `rule` through the alternation
/// gate. Days before `warmup` are skipped. Events take the date and close of
/// the day the condition completed.
pub fn walk_days<F>(
    series: &PriceSeries,
    start_day: usize,
    warmup: usize,
    mut history: SignalHistory,
    rule: F,
) -> SignalHistory
where
    F: Fn(usize) -> Crossing,
{
    let symbol = series.symbol();
    let candles = series.candles();

    for d in start_day.max(1)..candles.len() {
        if d < warmup {
            continue;
        }
        let crossing = rule(d);
        let candle = &candles[d];
        if crossing.buy {
            history.buy(symbol, candle.date, candle.close);
        }
        if crossing.sell {
            history.sell(symbol, candle.date, candle.close);
        }
    }

    history
}
