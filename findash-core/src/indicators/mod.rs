//! Indicator engine.
//!
//! Every study implements the single-series `Indicator` trait. Multi-line
//! studies (MACD) are exposed as one named instance per line. All windows
//! use a minimum of one observation, so short histories still produce
//! values from the first row.

pub mod atr;
pub mod code;
pub mod compute;
pub mod ema;
pub mod macd;
pub mod rolling;
pub mod rsi;
pub mod sma;

pub use atr::Atr;
pub use code::{parse_codes, IndicatorCode};
pub use compute::{compute_indicators, compute_indicators_from_strs};
pub use ema::Ema;
pub use macd::{Macd, MacdLine};
pub use rsi::Rsi;
pub use sma::Sma;

use crate::domain::OhlcvSeries;

/// A derived series computed from OHLCV bars.
///
/// `compute` returns one value per bar. NaN marks an undefined row.
pub trait Indicator: Send + Sync {
    /// Output column name (e.g. "SMA_20").
    fn name(&self) -> &str;

    fn compute(&self, series: &OhlcvSeries) -> Vec<f64>;
}

/// Create a series from close prices for testing.
///
/// Generates plausible OHLV: open = prev_close (or close for first bar),
/// high = max(open,close) + 1.0, low = min(open,close) - 1.0, volume = 1000.
#[cfg(test)]
pub fn make_series(closes: &[f64]) -> OhlcvSeries {
    let bars: Vec<(f64, f64, f64, f64)> = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            (open, open.max(close) + 1.0, open.min(close) - 1.0, close)
        })
        .collect();
    make_ohlc_series(&bars)
}

/// Create a daily series from explicit (open, high, low, close) tuples.
#[cfg(test)]
pub fn make_ohlc_series(ohlc: &[(f64, f64, f64, f64)]) -> OhlcvSeries {
    use crate::domain::Bar;
    let base = chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let bars = ohlc
        .iter()
        .enumerate()
        .map(|(i, &(open, high, low, close))| Bar {
            timestamp: base + chrono::Duration::days(i as i64),
            open,
            high,
            low,
            close,
            volume: 1000,
        })
        .collect();
    OhlcvSeries::new("TEST", bars)
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
