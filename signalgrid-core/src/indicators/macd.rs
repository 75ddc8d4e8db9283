//! Moving Average Convergence/Divergence (MACD).
//!
//! - Line: EMA(close, fast) - EMA(close, slow)
//! - Signal: EMA(line, signal)
//! - Histogram: line - signal
//!
//! Lookback: max(fast, slow) - 1 for the line, plus signal - 1 for the signal
//! line and histogram.

use serde::Serialize;

use super::ema::ema_of_series;
use super::Indicator;
use crate::domain::PriceSeries;

/// Which MACD output to expose through [`Indicator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacdLine {
    Macd,
    Signal,
    Histogram,
}

/// All three MACD outputs, each the length of the input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MacdSeries {
    pub macd: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct Macd {
    fast: usize,
    slow: usize,
    signal: usize,
    line: MacdLine,
    name: String,
}

impl Macd {
    pub fn new(fast: usize, slow: usize, signal: usize, line: MacdLine) -> Self {
        assert!(
            fast >= 1 && slow >= 1 && signal >= 1,
            "MACD periods must be >= 1"
        );
        let label = match line {
            MacdLine::Macd => "line",
            MacdLine::Signal => "signal",
            MacdLine::Histogram => "hist",
        };
        Self {
            fast,
            slow,
            signal,
            line,
            name: format!("macd_{label}_{fast}_{slow}_{signal}"),
        }
    }
}

impl Indicator for Macd {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        let line = self.fast.max(self.slow) - 1;
        match self.line {
            MacdLine::Macd => line,
            MacdLine::Signal | MacdLine::Histogram => line + self.signal - 1,
        }
    }

    fn compute(&self, series: &PriceSeries) -> Vec<f64> {
        let lines = macd_lines(&series.closes(), self.fast, self.slow, self.signal);
        match self.line {
            MacdLine::Macd => lines.macd,
            MacdLine::Signal => lines.signal,
            MacdLine::Histogram => lines.histogram,
        }
    }
}

/// Compute the MACD line, its signal line and the histogram.
pub fn macd_lines(closes: &[f64], fast: usize, slow: usize, signal: usize) -> MacdSeries {
    let fast_ema = ema_of_series(closes, fast);
    let slow_ema = ema_of_series(closes, slow);

    let macd: Vec<f64> = fast_ema
        .iter()
        .zip(&slow_ema)
        .map(|(f, s)| f - s)
        .collect();
    let signal_line = ema_of_series(&macd, signal);
    let histogram = macd
        .iter()
        .zip(&signal_line)
        .map(|(m, s)| m - s)
        .collect();

    MacdSeries {
        macd,
        signal: signal_line,
        histogram,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn macd_warmup_lengths() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        let lines = macd_lines(&closes, 3, 5, 4);

        // line valid from index slow - 1
        assert!(lines.macd[3].is_nan());
        assert!(!lines.macd[4].is_nan());
        // signal valid from (slow - 1) + (signal - 1)
        assert!(lines.signal[6].is_nan());
        assert!(!lines.signal[7].is_nan());
        assert!(lines.histogram[6].is_nan());
        assert!(!lines.histogram[7].is_nan());
    }

    #[test]
    fn macd_histogram_is_line_minus_signal() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0).collect();
        let lines = macd_lines(&closes, 3, 6, 3);
        for i in 0..closes.len() {
            if lines.histogram[i].is_nan() {
                continue;
            }
            assert_approx(
                lines.histogram[i],
                lines.macd[i] - lines.signal[i],
                DEFAULT_EPSILON,
            );
        }
    }

    #[test]
    fn macd_linear_trend_is_positive() {
        // A steady climb keeps the fast EMA above the slow one.
        let closes: Vec<f64> = (0..30).map(|i| 50.0 + i as f64).collect();
        let lines = macd_lines(&closes, 3, 8, 3);
        assert!(lines.macd[29] > 0.0);
    }

    #[test]
    fn macd_lookback() {
        assert_eq!(Macd::new(12, 26, 9, MacdLine::Macd).lookback(), 25);
        assert_eq!(Macd::new(12, 26, 9, MacdLine::Signal).lookback(), 33);
    }
}
