//! Average True Range (ATR).
//!
//! True Range: max(high-low, |high-prev_close|, |low-prev_close|).
//! The first row has no previous close, so TR[0] = high - low.
//! ATR = rolling mean of TR over 14 rows, min-periods 1.

use super::rolling::rolling_mean;
use super::Indicator;
use crate::domain::OhlcvSeries;

/// Window used by the dashboard's ATR.
pub const ATR_WINDOW: usize = 14;

#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
}

impl Atr {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ATR period must be >= 1");
        Self { period }
    }
}

impl Default for Atr {
    fn default() -> Self {
        Self::new(ATR_WINDOW)
    }
}

/// True Range per row. Undefined components are skipped; a row with no
/// defined component is NaN.
pub fn true_range(series: &OhlcvSeries) -> Vec<f64> {
    let bars = series.bars();
    let mut tr = Vec::with_capacity(bars.len());

    for (i, bar) in bars.iter().enumerate() {
        let hl = bar.high - bar.low;
        let (hc, lc) = match i.checked_sub(1).map(|p| bars[p].close) {
            Some(pc) => ((bar.high - pc).abs(), (bar.low - pc).abs()),
            None => (f64::NAN, f64::NAN),
        };
        let max = [hl, hc, lc]
            .into_iter()
            .filter(|v| !v.is_nan())
            .fold(f64::NAN, f64::max);
        tr.push(max);
    }

    tr
}

impl Indicator for Atr {
    fn name(&self) -> &str {
        "ATR"
    }

    fn compute(&self, series: &OhlcvSeries) -> Vec<f64> {
        rolling_mean(&true_range(series), self.period)
    }
}
