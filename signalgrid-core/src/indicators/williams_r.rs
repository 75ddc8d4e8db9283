//! Williams %R.
//!
//! %R = -100 * (highest_high - close) / (highest_high - lowest_low)
//! over the trailing `period` days, bounded to [-100, 0].
//! Lookback: period - 1. A zero-width window yields 0.

use super::Indicator;
use crate::domain::PriceSeries;

#[derive(Debug, Clone)]
pub struct WilliamsR {
    period: usize,
    name: String,
}

impl WilliamsR {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "Williams %R period must be >= 1");
        Self {
            period,
            name: format!("willr_{period}"),
        }
    }
}

impl Indicator for WilliamsR {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, series: &PriceSeries) -> Vec<f64> {
        williams_r_of_series(&series.highs(), &series.lows(), &series.closes(), self.period)
    }
}

/// Compute Williams %R from high/low/close slices of equal length.
pub fn williams_r_of_series(highs: &[f64], lows: &[f64], closes: &[f64], period: usize) -> Vec<f64> {
    let n = closes.len().min(highs.len()).min(lows.len());
    let mut result = vec![f64::NAN; closes.len()];

    if period == 0 || n < period {
        return result;
    }

    for i in (period - 1)..n {
        let start = i + 1 - period;
        let (high_window, low_window) = (&highs[start..=i], &lows[start..=i]);
        let close = closes[i];

        if close.is_nan() || high_window.iter().chain(low_window).any(|v| v.is_nan()) {
            continue;
        }

        let highest = high_window.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let lowest = low_window.iter().copied().fold(f64::INFINITY, f64::min);

        let width = highest - lowest;
        result[i] = if width == 0.0 {
            0.0
        } else {
            -100.0 * (highest - close) / width
        };
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::series_from_closes;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn willr_known_value() {
        let highs = [10.0, 12.0, 11.0];
        let lows = [8.0, 9.0, 7.0];
        let closes = [9.0, 11.0, 10.0];
        let result = williams_r_of_series(&highs, &lows, &closes, 3);
        // highest 12, lowest 7, close 10 → -100 * 2 / 5 = -40
        assert!(result[1].is_nan());
        assert_approx(result[2], -40.0, DEFAULT_EPSILON);
    }

    #[test]
    fn willr_close_at_high_is_zero_and_at_low_is_minus_100() {
        let highs = [10.0, 10.0];
        let lows = [5.0, 5.0];
        assert_approx(williams_r_of_series(&highs, &lows, &[7.0, 10.0], 2)[1], 0.0, DEFAULT_EPSILON);
        assert_approx(
            williams_r_of_series(&highs, &lows, &[7.0, 5.0], 2)[1],
            -100.0,
            DEFAULT_EPSILON,
        );
    }

    #[test]
    fn willr_zero_width_window() {
        let flat = [5.0, 5.0, 5.0];
        assert_eq!(williams_r_of_series(&flat, &flat, &flat, 2)[2], 0.0);
    }

    #[test]
    fn willr_bounds() {
        let series = series_from_closes("TEST", &[100.0, 104.0, 97.0, 108.0, 95.0, 111.0, 92.0]);
        for v in WilliamsR::new(3).compute(&series) {
            if !v.is_nan() {
                assert!((-100.0..=0.0).contains(&v), "%R out of bounds: {v}");
            }
        }
    }

    #[test]
    fn willr_lookback() {
        assert_eq!(WilliamsR::new(14).lookback(), 13);
    }
}
