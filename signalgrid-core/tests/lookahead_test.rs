//! Look-ahead checks.
//!
//! No indicator value or signal event at day t may depend on prices from day
//! t+1 or later. Each check runs on a truncated series (days 0..100) and on
//! the full series (days 0..200) and compares the overlapping part.

use signalgrid_core::domain::{series_from_closes, PriceSeries};
use signalgrid_core::indicators::*;
use signalgrid_core::signals::{generate, Family, RuleParams};

fn make_series(n: usize) -> PriceSeries {
    let mut price = 100.0;
    let closes: Vec<f64> = (0..n)
        .map(|i| {
            let seed = (i as u64).wrapping_mul(6364136223846793005).wrapping_add(1);
            price += ((seed % 200) as f64 - 100.0) * 0.05;
            price = f64::max(price, 10.0);
            price
        })
        .collect();
    series_from_closes("TEST", &closes)
}

fn assert_no_lookahead(indicator: &dyn Indicator, full: &PriceSeries, truncated_len: usize) {
    let truncated = PriceSeries::new(full.symbol(), full.candles()[..truncated_len].to_vec())
        .expect("prefix of a valid series is valid");

    let short = indicator.compute(&truncated);
    let long = indicator.compute(full);

    for i in 0..truncated_len {
        let (a, b) = (short[i], long[i]);
        assert!(
            (a.is_nan() && b.is_nan()) || a == b,
            "{} differs at day {i}: truncated={a}, full={b}",
            indicator.name()
        );
    }
}

#[test]
fn indicators_do_not_look_ahead() {
    let full = make_series(200);
    let indicators: Vec<Box<dyn Indicator>> = vec![
        Box::new(Sma::new(20)),
        Box::new(Ema::new(12)),
        Box::new(Bollinger::upper(20, 2.0)),
        Box::new(Bollinger::middle(20, 2.0)),
        Box::new(Bollinger::lower(20, 2.0)),
        Box::new(Macd::new(12, 26, 9, MacdLine::Macd)),
        Box::new(Macd::new(12, 26, 9, MacdLine::Signal)),
        Box::new(Macd::new(12, 26, 9, MacdLine::Histogram)),
        Box::new(Rsi::new(14)),
        Box::new(WilliamsR::new(10)),
    ];

    for indicator in &indicators {
        assert_no_lookahead(indicator.as_ref(), &full, 100);
    }
}

#[test]
fn signals_do_not_look_ahead() {
    let full = make_series(200);
    let truncated = PriceSeries::new(full.symbol(), full.candles()[..100].to_vec()).unwrap();
    let cutoff = truncated.last_date().unwrap();

    let mut params: Vec<RuleParams> = Family::ALL.iter().map(|f| f.default_params()).collect();
    params.push(RuleParams::Rsi {
        period: 6,
        buy: 35.0,
        sell: 65.0,
    });

    for p in &params {
        let short = generate(&truncated, p, 1).unwrap();
        let long = generate(&full, p, 1).unwrap();
        let long_prefix: Vec<_> = long
            .events()
            .iter()
            .filter(|e| e.date <= cutoff)
            .cloned()
            .collect();
        assert_eq!(short.events(), long_prefix.as_slice(), "{p}");
    }
}
