//! MACD (Moving Average Convergence Divergence).
//!
//! MACD = EMA(fast) - EMA(slow) of the close.
//! Signal = EMA(signal) of MACD. Histogram = MACD - Signal.
//! All three use the seeded EMA, so every row is defined.
//!
//! Exposed as one instance per line, like the band indicators, so the
//! single-series `Indicator` trait stays unchanged.

use super::rolling::ewm_mean;
use super::Indicator;
use crate::domain::OhlcvSeries;

pub const MACD_FAST: usize = 12;
pub const MACD_SLOW: usize = 26;
pub const MACD_SIGNAL: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacdLine {
    Macd,
    Signal,
    Histogram,
}

impl MacdLine {
    pub const ALL: [MacdLine; 3] = [MacdLine::Macd, MacdLine::Signal, MacdLine::Histogram];

    pub fn column_name(&self) -> &'static str {
        match self {
            MacdLine::Macd => "MACD",
            MacdLine::Signal => "Signal",
            MacdLine::Histogram => "MACD_Hist",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Macd {
    fast: usize,
    slow: usize,
    signal: usize,
    line: MacdLine,
}

impl Macd {
    pub fn new(fast: usize, slow: usize, signal: usize, line: MacdLine) -> Self {
        assert!(fast >= 1 && slow >= 1 && signal >= 1, "MACD spans must be >= 1");
        Self {
            fast,
            slow,
            signal,
            line,
        }
    }

    /// Standard 12/26/9 MACD for one line.
    pub fn standard(line: MacdLine) -> Self {
        Self::new(MACD_FAST, MACD_SLOW, MACD_SIGNAL, line)
    }

    /// All three lines in one pass: (macd, signal, histogram).
    pub fn lines(&self, series: &OhlcvSeries) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
        let closes = series.closes();
        let fast = ewm_mean(&closes, self.fast);
        let slow = ewm_mean(&closes, self.slow);
        let macd: Vec<f64> = fast.iter().zip(&slow).map(|(f, s)| f - s).collect();
        let signal = ewm_mean(&macd, self.signal);
        let hist = macd.iter().zip(&signal).map(|(m, s)| m - s).collect();
        (macd, signal, hist)
    }
}

impl Indicator for Macd {
    fn name(&self) -> &str {
        self.line.column_name()
    }

    fn compute(&self, series: &OhlcvSeries) -> Vec<f64> {
        let (macd, signal, hist) = self.lines(series);
        match self.line {
            MacdLine::Macd => macd,
            MacdLine::Signal => signal,
            MacdLine::Histogram => hist,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_series, DEFAULT_EPSILON};

    #[test]
    fn macd_starts_at_zero() {
        let series = make_series(&[50.0, 51.0, 52.0]);
        let (macd, signal, hist) = Macd::standard(MacdLine::Macd).lines(&series);
        assert_approx(macd[0], 0.0, DEFAULT_EPSILON);
        assert_approx(signal[0], 0.0, DEFAULT_EPSILON);
        assert_approx(hist[0], 0.0, DEFAULT_EPSILON);
    }

    #[test]
    fn histogram_is_macd_minus_signal() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + (i as f64).sqrt() * 3.0).collect();
        let series = make_series(&closes);
        let macd = Macd::standard(MacdLine::Macd).compute(&series);
        let signal = Macd::standard(MacdLine::Signal).compute(&series);
        let hist = Macd::standard(MacdLine::Histogram).compute(&series);
        for i in 0..closes.len() {
            assert_approx(hist[i], macd[i] - signal[i], DEFAULT_EPSILON);
        }
    }

    #[test]
    fn rising_prices_give_positive_macd() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let macd = Macd::standard(MacdLine::Macd).compute(&make_series(&closes));
        assert!(macd[1..].iter().all(|&v| v > 0.0));
    }

    #[test]
    fn second_row_by_hand() {
        // fast alpha = 2/13, slow alpha = 2/27
        // MACD[1] = (2/13 - 2/27) * (c1 - c0)
        let series = make_series(&[100.0, 127.0]);
        let macd = Macd::standard(MacdLine::Macd).compute(&series);
        let expected = (2.0 / 13.0 - 2.0 / 27.0) * 27.0;
        assert_approx(macd[1], expected, 1e-9);
    }

    #[test]
    fn line_column_names() {
        let names: Vec<_> = MacdLine::ALL.iter().map(|l| l.column_name()).collect();
        assert_eq!(names, vec!["MACD", "Signal", "MACD_Hist"]);
    }
}
