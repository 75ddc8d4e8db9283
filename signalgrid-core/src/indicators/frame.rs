//! Indicator overlay frames.
//!
//! A frame bundles several indicators computed over one series so a caller can
//! chart them next to the candles. Requests whose periods do not fit the series
//! are left out of the frame rather than reported as errors.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{Bollinger, Ema, Indicator, Macd, MacdLine, Rsi, Sma, WilliamsR};
use crate::domain::PriceSeries;

/// Which indicators to include in a frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorRequest {
    pub sma: Vec<usize>,
    pub ema: Vec<usize>,
    pub bbands: Option<BandRequest>,
    pub macd: Option<MacdRequest>,
    pub rsi: Option<usize>,
    pub willr: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandRequest {
    pub n: usize,
    pub k: f64,
}

impl Default for BandRequest {
    fn default() -> Self {
        Self { n: 20, k: 2.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacdRequest {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
}

impl Default for MacdRequest {
    fn default() -> Self {
        Self {
            fast: 12,
            slow: 26,
            signal: 9,
        }
    }
}

/// One named single-line indicator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineOverlay {
    pub name: String,
    pub period: usize,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BandOverlay {
    pub n: usize,
    pub k: f64,
    pub upper: Vec<f64>,
    pub middle: Vec<f64>,
    pub lower: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MacdOverlay {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
    pub macd: Vec<f64>,
    pub macd_signal: Vec<f64>,
    pub macd_hist: Vec<f64>,
}

/// Indicators computed over one series, aligned with `dates`.
///
/// Warm-up values serialize as `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorFrame {
    pub symbol: String,
    pub dates: Vec<NaiveDate>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub smas: Vec<LineOverlay>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub emas: Vec<LineOverlay>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bbands: Option<BandOverlay>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub macd: Option<MacdOverlay>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rsi: Option<LineOverlay>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub willr: Option<LineOverlay>,
}

impl IndicatorFrame {
    pub fn build(series: &PriceSeries, request: &IndicatorRequest) -> Self {
        let fits = |period: usize| period >= 1 && period < series.len();

        let smas = request
            .sma
            .iter()
            .copied()
            .filter(|&p| fits(p))
            .map(|p| line(series, &Sma::new(p), p))
            .collect();
        let emas = request
            .ema
            .iter()
            .copied()
            .filter(|&p| fits(p))
            .map(|p| line(series, &Ema::new(p), p))
            .collect();

        let bbands = request.bbands.filter(|b| fits(b.n)).map(|b| BandOverlay {
            n: b.n,
            k: b.k,
            upper: Bollinger::upper(b.n, b.k).compute(series),
            middle: Bollinger::middle(b.n, b.k).compute(series),
            lower: Bollinger::lower(b.n, b.k).compute(series),
        });

        let macd = request
            .macd
            .filter(|m| fits(m.fast) && fits(m.slow) && fits(m.signal))
            .map(|m| MacdOverlay {
                fast: m.fast,
                slow: m.slow,
                signal: m.signal,
                macd: Macd::new(m.fast, m.slow, m.signal, MacdLine::Macd).compute(series),
                macd_signal: Macd::new(m.fast, m.slow, m.signal, MacdLine::Signal).compute(series),
                macd_hist: Macd::new(m.fast, m.slow, m.signal, MacdLine::Histogram)
                    .compute(series),
            });

        let rsi = request.rsi.filter(|&p| fits(p)).map(|p| line(series, &Rsi::new(p), p));
        let willr = request
            .willr
            .filter(|&p| fits(p))
            .map(|p| line(series, &WilliamsR::new(p), p));

        Self {
            symbol: series.symbol().to_string(),
            dates: series.candles().iter().map(|c| c.date).collect(),
            smas,
            emas,
            bbands,
            macd,
            rsi,
            willr,
        }
    }
}

fn line(series: &PriceSeries, indicator: &dyn Indicator, period: usize) -> LineOverlay {
    LineOverlay {
        name: indicator.name().to_string(),
        period,
        values: indicator.compute(series),
    }
}
