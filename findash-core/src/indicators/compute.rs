//! Indicator engine: turn a set of codes into derived columns.

use std::collections::BTreeSet;

use super::{Atr, Ema, Indicator, IndicatorCode, Macd, MacdLine, Rsi, Sma};
use crate::domain::{IndicatorFrame, OhlcvSeries};

/// Compute `codes` over `series`.
///
/// Pure: the input series is cloned into the frame, never mutated. Codes
/// are evaluated independently, so their order does not affect any column.
/// A repeated code is computed once.
pub fn compute_indicators(series: &OhlcvSeries, codes: &[IndicatorCode]) -> IndicatorFrame {
    let mut frame = IndicatorFrame::new(series.clone());
    let mut seen = BTreeSet::new();

    for code in codes {
        if !seen.insert(*code) {
            continue;
        }
        for indicator in instances(code) {
            let values = indicator.compute(series);
            if let Err(e) = frame.insert(indicator.name(), values) {
                tracing::warn!(code = %code, error = %e, "indicator column rejected");
            }
        }
    }

    frame
}

/// Parse `codes` (dropping unknown ones) and compute them.
pub fn compute_indicators_from_strs(series: &OhlcvSeries, codes: &[&str]) -> IndicatorFrame {
    let parsed: Vec<IndicatorCode> = codes.iter().filter_map(|c| IndicatorCode::parse(c)).collect();
    compute_indicators(series, &parsed)
}

fn instances(code: &IndicatorCode) -> Vec<Box<dyn Indicator>> {
    match *code {
        IndicatorCode::Sma(0) | IndicatorCode::Ema(0) => Vec::new(),
        IndicatorCode::Sma(n) => vec![Box::new(Sma::new(n))],
        IndicatorCode::Ema(n) => vec![Box::new(Ema::new(n))],
        IndicatorCode::Atr => vec![Box::new(Atr::default())],
        IndicatorCode::Macd => MacdLine::ALL
            .iter()
            .map(|&line| Box::new(Macd::standard(line)) as Box<dyn Indicator>)
            .collect(),
        IndicatorCode::Rsi => vec![Box::new(Rsi::default())],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_series, DEFAULT_EPSILON};

    fn reference_series() -> OhlcvSeries {
        make_series(&[10.0, 11.0, 12.0, 11.0, 10.0, 9.0, 10.0, 11.0, 12.0, 13.0, 14.0])
    }

    #[test]
    fn reference_values() {
        let frame = compute_indicators_from_strs(&reference_series(), &["SMA_5", "EMA_5"]);
        let sma = frame.column("SMA_5").unwrap();
        let ema = frame.column("EMA_5").unwrap();
        assert_approx(sma[4], 10.8, DEFAULT_EPSILON);
        assert_approx(ema[0], 10.0, DEFAULT_EPSILON);
        assert_eq!(frame.column_names(), vec!["SMA_5", "EMA_5"]);
    }

    #[test]
    fn macd_adds_three_columns() {
        let frame = compute_indicators(&reference_series(), &[IndicatorCode::Macd]);
        assert_eq!(frame.column_names(), vec!["MACD", "Signal", "MACD_Hist"]);
        let macd = frame.column("MACD").unwrap();
        let signal = frame.column("Signal").unwrap();
        let hist = frame.column("MACD_Hist").unwrap();
        for i in 0..macd.len() {
            assert_approx(hist[i], macd[i] - signal[i], DEFAULT_EPSILON);
        }
    }

    #[test]
    fn unknown_codes_are_dropped() {
        let frame = compute_indicators_from_strs(&reference_series(), &["BOGUS", "RSI", "SMA_0"]);
        assert_eq!(frame.column_names(), vec!["RSI"]);
    }

    #[test]
    fn duplicates_computed_once() {
        let codes = [IndicatorCode::Atr, IndicatorCode::Atr, IndicatorCode::Sma(3)];
        let frame = compute_indicators(&reference_series(), &codes);
        assert_eq!(frame.column_names(), vec!["ATR", "SMA_3"]);
    }

    #[test]
    fn input_series_unchanged() {
        let series = reference_series();
        let before = series.clone();
        let frame = compute_indicators(&series, &[IndicatorCode::Rsi, IndicatorCode::Ema(3)]);
        assert_eq!(series, before);
        assert_eq!(frame.series(), &before);
    }

    #[test]
    fn order_does_not_change_values() {
        let series = reference_series();
        let a = compute_indicators(&series, &[IndicatorCode::Sma(3), IndicatorCode::Rsi]);
        let b = compute_indicators(&series, &[IndicatorCode::Rsi, IndicatorCode::Sma(3)]);
        for name in ["SMA_3", "RSI"] {
            let (x, y) = (a.column(name).unwrap(), b.column(name).unwrap());
            for (p, q) in x.iter().zip(y) {
                assert!(p == q || (p.is_nan() && q.is_nan()));
            }
        }
    }

    #[test]
    fn empty_series_gives_empty_columns() {
        let series = OhlcvSeries::new("EMPTY", Vec::new());
        let frame = compute_indicators(&series, &[IndicatorCode::Sma(5), IndicatorCode::Macd]);
        assert!(frame.column("SMA_5").unwrap().is_empty());
        assert!(frame.to_table().is_empty());
    }
}
