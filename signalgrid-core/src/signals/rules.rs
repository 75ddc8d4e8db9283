//! Per-family crossing and threshold rules.
//!
//! Each rule looks only at yesterday (`d - 1`) and today (`d`).

use crate::domain::PriceSeries;
use crate::indicators::{
    bollinger_bands, ema_of_series, macd_lines, rsi_of_series, williams_r_of_series,
};

use super::RuleParams;

/// Which conditions completed on a given day. Buy is applied before sell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Crossing {
    pub buy: bool,
    pub sell: bool,
}

impl Crossing {
    pub const NONE: Crossing = Crossing {
        buy: false,
        sell: false,
    };
}

/// Day-indexed rule: `rule(d)` reports what completed on day `d` (`d >= 1`).
pub type DayRule = Box<dyn Fn(usize) -> Crossing + Send + Sync>;

/// Precompute the indicator lines for `params` and close over them.
pub fn build_rule(series: &PriceSeries, params: &RuleParams) -> DayRule {
    let closes = series.closes();

    match *params {
        RuleParams::Ema { short, long } => {
            let short_ema = ema_of_series(&closes, short);
            let long_ema = ema_of_series(&closes, long);
            Box::new(move |d| line_crossing(&short_ema, &long_ema, d))
        }
        RuleParams::Bb { n, k } => {
            let bands = bollinger_bands(&closes, n, k);
            Box::new(move |d| Crossing {
                buy: closes[d - 1] < bands.lower[d - 1] && closes[d] >= bands.lower[d],
                sell: closes[d - 1] > bands.upper[d - 1] && closes[d] <= bands.upper[d],
            })
        }
        RuleParams::Macd { fast, slow, signal } => {
            let lines = macd_lines(&closes, fast, slow, signal);
            Box::new(move |d| {
                let (m, s) = (lines.macd[d], lines.signal[d]);
                let crossing = line_crossing(&lines.macd, &lines.signal, d);
                Crossing {
                    buy: m < 0.0 && s < 0.0 && crossing.buy,
                    sell: m > 0.0 && s > 0.0 && crossing.sell,
                }
            })
        }
        RuleParams::Rsi { period, buy, sell } => {
            let rsi = rsi_of_series(&closes, period);
            Box::new(move |d| threshold_crossing(&rsi, d, buy, sell, (0.0, 100.0)))
        }
        RuleParams::Willr { period, buy, sell } => {
            let willr = williams_r_of_series(&series.highs(), &series.lows(), &closes, period);
            Box::new(move |d| threshold_crossing(&willr, d, buy, sell, (-100.0, 0.0)))
        }
    }
}

/// `a` crossing `b`: up-cross buys, down-cross sells. Touching counts as a cross.
pub fn line_crossing(a: &[f64], b: &[f64], d: usize) -> Crossing {
    Crossing {
        buy: a[d - 1] < b[d - 1] && a[d] >= b[d],
        sell: a[d - 1] > b[d - 1] && a[d] <= b[d],
    }
}

/// Bounded oscillator crossing its buy threshold upward or its sell threshold
/// downward.
///
/// Yesterday's value sitting exactly on either bound means the window was
/// degenerate (flat or clamped), so nothing fires that day.
pub fn threshold_crossing(
    values: &[f64],
    d: usize,
    buy: f64,
    sell: f64,
    (min, max): (f64, f64),
) -> Crossing {
    let (prev, curr) = (values[d - 1], values[d]);
    if prev == min || prev == max {
        return Crossing::NONE;
    }
    Crossing {
        buy: prev < buy && curr >= buy,
        sell: prev > sell && curr <= sell,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_crossing_up_and_down() {
        let a = [1.0, 3.0, 1.0];
        let b = [2.0, 2.0, 2.0];
        assert_eq!(
            line_crossing(&a, &b, 1),
            Crossing {
                buy: true,
                sell: false
            }
        );
        assert_eq!(
            line_crossing(&a, &b, 2),
            Crossing {
                buy: false,
                sell: true
            }
        );
    }

    #[test]
    fn touching_completes_a_cross() {
        assert!(line_crossing(&[1.0, 2.0], &[2.0, 2.0], 1).buy);
        assert!(line_crossing(&[3.0, 2.0], &[2.0, 2.0], 1).sell);
    }

    #[test]
    fn nan_never_crosses() {
        assert_eq!(line_crossing(&[f64::NAN, 3.0], &[2.0, 2.0], 1), Crossing::NONE);
    }

    #[test]
    fn threshold_buy_on_upward_cross() {
        let rsi = [25.0, 28.0, 31.0];
        assert_eq!(threshold_crossing(&rsi, 1, 30.0, 70.0, (0.0, 100.0)), Crossing::NONE);
        assert!(threshold_crossing(&rsi, 2, 30.0, 70.0, (0.0, 100.0)).buy);
    }

    #[test]
    fn threshold_ignores_degenerate_yesterday() {
        let rsi = [0.0, 35.0, 100.0, 60.0];
        assert_eq!(threshold_crossing(&rsi, 1, 30.0, 70.0, (0.0, 100.0)), Crossing::NONE);
        assert_eq!(threshold_crossing(&rsi, 3, 30.0, 70.0, (0.0, 100.0)), Crossing::NONE);

        let willr = [-100.0, -10.0];
        assert_eq!(
            threshold_crossing(&willr, 1, -20.0, -80.0, (-100.0, 0.0)),
            Crossing::NONE
        );
    }

    #[test]
    fn threshold_sell_on_downward_cross() {
        let willr = [-70.0, -85.0];
        assert!(threshold_crossing(&willr, 1, -20.0, -80.0, (-100.0, 0.0)).sell);
    }
}
