//! Exponential Moving Average (EMA).
//!
//! Recursive: EMA[t] = alpha * close[t] + (1 - alpha) * EMA[t-1], alpha = 2/(span+1).
//! Seed: EMA[0] = close[0] (adjust off, min-periods 1).

use super::rolling::ewm_mean;
use super::Indicator;
use crate::domain::OhlcvSeries;

#[derive(Debug, Clone)]
pub struct Ema {
    span: usize,
    name: String,
}

impl Ema {
    pub fn new(span: usize) -> Self {
        assert!(span >= 1, "EMA span must be >= 1");
        Self {
            span,
            name: format!("EMA_{span}"),
        }
    }
}

impl Indicator for Ema {
    fn name(&self) -> &str {
        &self.name
    }

    fn compute(&self, series: &OhlcvSeries) -> Vec<f64> {
        ewm_mean(&series.closes(), self.span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_series, DEFAULT_EPSILON};

    #[test]
    fn ema_span_1_equals_close() {
        let series = make_series(&[100.0, 200.0, 300.0]);
        let result = Ema::new(1).compute(&series);
        assert_approx(result[0], 100.0, DEFAULT_EPSILON);
        assert_approx(result[1], 200.0, DEFAULT_EPSILON);
        assert_approx(result[2], 300.0, DEFAULT_EPSILON);
    }

    #[test]
    fn ema_5_seed_and_recursion() {
        // alpha = 2/6 = 1/3
        // EMA[0] = 10
        // EMA[1] = 11/3 + 2/3*10 = 31/3
        // EMA[2] = 12/3 + 2/3*31/3 = 98/9
        let series = make_series(&[10.0, 11.0, 12.0, 11.0, 10.0]);
        let result = Ema::new(5).compute(&series);
        assert_approx(result[0], 10.0, DEFAULT_EPSILON);
        assert_approx(result[1], 31.0 / 3.0, DEFAULT_EPSILON);
        assert_approx(result[2], 98.0 / 9.0, DEFAULT_EPSILON);
    }

    #[test]
    fn ema_defined_on_every_row() {
        let series = make_series(&[5.0, 6.0, 7.0]);
        assert!(Ema::new(50).compute(&series).iter().all(|v| !v.is_nan()));
    }
}
