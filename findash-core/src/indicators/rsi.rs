//! Relative Strength Index (RSI).
//!
//! Built on percent changes of the close, scaled by 100. Average gain and
//! average loss are simple rolling means over `period` rows (min-periods 1).
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss)
//! Row 0 has no change and is NaN.
//! Edge cases: avg_loss == 0 → RSI = 100; avg_gain == avg_loss == 0 → RSI = 50.

use super::rolling::rolling_mean;
use super::Indicator;
use crate::domain::OhlcvSeries;

/// Window used by the dashboard's RSI.
pub const RSI_WINDOW: usize = 14;

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self { period }
    }
}

impl Default for Rsi {
    fn default() -> Self {
        Self::new(RSI_WINDOW)
    }
}

/// Percent change of consecutive closes, scaled by 100. Row 0 is NaN.
pub fn percent_changes(closes: &[f64]) -> Vec<f64> {
    let mut changes = vec![f64::NAN; closes.len()];
    for i in 1..closes.len() {
        let prev = closes[i - 1];
        changes[i] = (closes[i] - prev) / prev * 100.0;
    }
    changes
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        "RSI"
    }

    fn compute(&self, series: &OhlcvSeries) -> Vec<f64> {
        let changes = percent_changes(&series.closes());

        // Undefined changes count as neither gain nor loss.
        let gains: Vec<f64> = changes
            .iter()
            .map(|&d| if d > 0.0 { d } else { 0.0 })
            .collect();
        let losses: Vec<f64> = changes
            .iter()
            .map(|&d| if d < 0.0 { -d } else { 0.0 })
            .collect();

        let avg_gain = rolling_mean(&gains, self.period);
        let avg_loss = rolling_mean(&losses, self.period);

        let mut result = vec![f64::NAN; changes.len()];
        for i in 1..changes.len() {
            result[i] = compute_rsi(avg_gain[i], avg_loss[i]);
        }
        result
    }
}

fn compute_rsi(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 && avg_gain == 0.0 {
        50.0
    } else if avg_loss == 0.0 {
        100.0
    } else if avg_gain == 0.0 {
        0.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_series, DEFAULT_EPSILON};

    #[test]
    fn rsi_first_row_undefined() {
        let series = make_series(&[10.0, 11.0, 12.0]);
        let result = Rsi::default().compute(&series);
        assert!(result[0].is_nan());
        assert!(!result[1].is_nan());
    }

    #[test]
    fn rsi_all_gains_is_100() {
        let series = make_series(&[10.0, 11.0, 12.0, 13.0, 14.0, 15.0]);
        let result = Rsi::default().compute(&series);
        for &v in &result[1..] {
            assert_approx(v, 100.0, DEFAULT_EPSILON);
        }
    }

    #[test]
    fn rsi_all_losses_is_0() {
        let series = make_series(&[15.0, 14.0, 13.0, 12.0]);
        let result = Rsi::default().compute(&series);
        for &v in &result[1..] {
            assert_approx(v, 0.0, DEFAULT_EPSILON);
        }
    }

    #[test]
    fn rsi_flat_is_50() {
        let series = make_series(&[20.0, 20.0, 20.0, 20.0]);
        let result = Rsi::default().compute(&series);
        for &v in &result[1..] {
            assert_approx(v, 50.0, DEFAULT_EPSILON);
        }
    }

    #[test]
    fn rsi_mixed_changes() {
        // changes: +10%, -5%  (100 → 110 → 104.5)
        // row 2: avg_gain = (0 + 10 + 0)/3, avg_loss = (0 + 0 + 5)/3
        // RSI = 100 - 100/(1 + 2) = 66.666...
        let series = make_series(&[100.0, 110.0, 104.5]);
        let result = Rsi::default().compute(&series);
        assert_approx(result[2], 200.0 / 3.0, 1e-9);
    }

    #[test]
    fn rsi_flat_tail_after_movement_is_50() {
        // 15 moving closes, then 30 repeats of the last one.
        let mut closes: Vec<f64> = (0..15)
            .map(|i| 100.0 + i as f64 * 0.11 + if i % 3 == 0 { 0.4 } else { 0.0 })
            .collect();
        let last = closes[14];
        closes.extend(std::iter::repeat(last).take(30));

        let result = Rsi::default().compute(&make_series(&closes));
        for (i, &v) in result.iter().enumerate().skip(1) {
            assert!((0.0..=100.0).contains(&v), "row {i}: RSI out of range: {v}");
        }
        // Rows 28.. see only zero changes in their 14-row window.
        for &v in &result[28..] {
            assert_eq!(v, 50.0);
        }
    }

    #[test]
    fn rsi_within_bounds() {
        let closes: Vec<f64> = (0..60)
            .map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0)
            .collect();
        let result = Rsi::default().compute(&make_series(&closes));
        for &v in &result[1..] {
            assert!((0.0..=100.0).contains(&v), "RSI out of range: {v}");
        }
    }
}
