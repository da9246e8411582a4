//! Simple Moving Average (SMA).
//!
//! Rolling mean of close prices over `period` rows with a minimum of one
//! observation: row i < period - 1 averages the i + 1 closes seen so far.

use super::rolling::rolling_mean;
use super::Indicator;
use crate::domain::OhlcvSeries;

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    name: String,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "SMA period must be >= 1");
        Self {
            period,
            name: format!("SMA_{period}"),
        }
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn compute(&self, series: &OhlcvSeries) -> Vec<f64> {
        rolling_mean(&series.closes(), self.period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_series, DEFAULT_EPSILON};

    #[test]
    fn sma_5_reference_values() {
        let series = make_series(&[10.0, 11.0, 12.0, 11.0, 10.0, 9.0, 10.0, 11.0, 12.0, 13.0, 14.0]);
        let result = Sma::new(5).compute(&series);

        assert_eq!(result.len(), 11);
        // Partial windows
        assert_approx(result[0], 10.0, DEFAULT_EPSILON);
        assert_approx(result[1], 10.5, DEFAULT_EPSILON);
        // mean(10,11,12,11,10)
        assert_approx(result[4], 10.8, DEFAULT_EPSILON);
        // mean(11,12,11,10,9)
        assert_approx(result[5], 10.6, DEFAULT_EPSILON);
        // mean(10,11,12,13,14)
        assert_approx(result[10], 12.0, DEFAULT_EPSILON);
    }

    #[test]
    fn sma_1_is_close() {
        let series = make_series(&[100.0, 200.0, 300.0]);
        let result = Sma::new(1).compute(&series);
        assert_eq!(result, vec![100.0, 200.0, 300.0]);
    }

    #[test]
    fn sma_defined_with_fewer_rows_than_period() {
        let series = make_series(&[10.0, 11.0]);
        let result = Sma::new(200).compute(&series);
        assert!(result.iter().all(|v| !v.is_nan()));
        assert_approx(result[1], 10.5, DEFAULT_EPSILON);
    }

    #[test]
    fn sma_name() {
        assert_eq!(Sma::new(45).name(), "SMA_45");
    }
}
