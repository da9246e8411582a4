//! Bar: one OHLCV record for a single time interval.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// OHLCV bar for one interval of one symbol.
///
/// Timestamps are naive UTC. Intraday intervals carry a time component,
/// daily and coarser intervals sit at midnight. A missing price is NaN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl Bar {
    /// Bar from nullable provider fields. `None` when every field is null;
    /// otherwise missing prices become NaN and missing volume zero.
    pub fn from_nullable(
        timestamp: NaiveDateTime,
        open: Option<f64>,
        high: Option<f64>,
        low: Option<f64>,
        close: Option<f64>,
        volume: Option<u64>,
    ) -> Option<Self> {
        if [open, high, low, close].iter().all(Option::is_none) && volume.is_none() {
            return None;
        }
        let price = |v: Option<f64>| v.unwrap_or(f64::NAN);
        Some(Self {
            timestamp,
            open: price(open),
            high: price(high),
            low: price(low),
            close: price(close),
            volume: volume.unwrap_or(0),
        })
    }

    /// High minus low; NaN when either is missing.
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    /// True when every price is defined and high and low bracket open and
    /// close.
    pub fn is_consistent(&self) -> bool {
        if [self.open, self.high, self.low, self.close].iter().any(|v| v.is_nan()) {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open.max(self.close)
            && self.low <= self.open.min(self.close)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(14, 30, 0)
            .unwrap()
    }

    #[test]
    fn all_null_row_is_skipped() {
        assert!(Bar::from_nullable(at(), None, None, None, None, None).is_none());
    }

    #[test]
    fn partial_row_keeps_nan_prices() {
        let bar = Bar::from_nullable(at(), None, Some(11.0), Some(9.0), Some(10.0), None).unwrap();
        assert!(bar.open.is_nan());
        assert_eq!(bar.volume, 0);
        assert_eq!(bar.range(), 2.0);
        // A missing price is never consistent.
        assert!(!bar.is_consistent());
    }

    #[test]
    fn consistency_checks_high_and_low() {
        let mut bar =
            Bar::from_nullable(at(), Some(10.0), Some(12.0), Some(9.0), Some(11.0), Some(5)).unwrap();
        assert!(bar.is_consistent());
        bar.high = 10.5;
        assert!(!bar.is_consistent());
    }

    #[test]
    fn nan_close_or_low_is_inconsistent() {
        let bar = Bar::from_nullable(at(), Some(10.0), Some(12.0), Some(9.0), None, None).unwrap();
        assert!(!bar.is_consistent());
        let bar = Bar::from_nullable(at(), Some(10.0), Some(12.0), None, Some(11.0), None).unwrap();
        assert!(!bar.is_consistent());
    }

    #[test]
    fn serializes_timestamp_with_time() {
        let bar = Bar::from_nullable(at(), Some(1.0), Some(1.0), Some(1.0), Some(1.0), Some(1)).unwrap();
        let json = serde_json::to_string(&bar).unwrap();
        assert!(json.contains("\"timestamp\":\"2024-01-02T14:30:00\""));
    }
}
