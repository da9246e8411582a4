//! Time-ordered OHLCV series and the derived indicator frame.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::bar::Bar;
use super::table::{ColumnData, Table};

/// OHLCV field names. Derived columns may not reuse them.
pub const OHLCV_COLUMNS: [&str; 6] = ["Timestamp", "Open", "High", "Low", "Close", "Volume"];

/// Errors from building series, frames and tables.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SeriesError {
    #[error("column '{0}' collides with an OHLCV field")]
    ColumnCollision(String),

    #[error("column '{0}' already exists")]
    DuplicateColumn(String),

    #[error("column '{0}' not found")]
    MissingColumn(String),

    #[error("column '{column}' has {actual} rows, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },
}

/// Bars sorted ascending by timestamp, unique per timestamp.
///
/// The only constructor sorts and de-duplicates, so every rolling or
/// recursive computation downstream can rely on ordering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OhlcvSeries {
    symbol: String,
    bars: Vec<Bar>,
}

impl OhlcvSeries {
    /// Sort by timestamp and drop duplicate timestamps (the later record wins).
    pub fn new(symbol: impl Into<String>, mut bars: Vec<Bar>) -> Self {
        // Stable sort keeps arrival order among equal timestamps.
        bars.sort_by_key(|b| b.timestamp);
        let mut unique: Vec<Bar> = Vec::with_capacity(bars.len());
        for bar in bars {
            match unique.last_mut() {
                Some(prev) if prev.timestamp == bar.timestamp => *prev = bar,
                _ => unique.push(bar),
            }
        }
        Self {
            symbol: symbol.into(),
            bars: unique,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first(&self) -> Option<&Bar> {
        self.bars.first()
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    pub fn timestamps(&self) -> Vec<NaiveDateTime> {
        self.bars.iter().map(|b| b.timestamp).collect()
    }

    pub fn opens(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.open).collect()
    }

    pub fn highs(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.high).collect()
    }

    pub fn lows(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.low).collect()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn volumes(&self) -> Vec<u64> {
        self.bars.iter().map(|b| b.volume).collect()
    }

    /// Deterministic BLAKE3 hash over the symbol and all bar values.
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.symbol.as_bytes());
        for bar in &self.bars {
            hasher.update(&bar.timestamp.and_utc().timestamp().to_le_bytes());
            hasher.update(&bar.open.to_le_bytes());
            hasher.update(&bar.high.to_le_bytes());
            hasher.update(&bar.low.to_le_bytes());
            hasher.update(&bar.close.to_le_bytes());
            hasher.update(&bar.volume.to_le_bytes());
        }
        hasher.finalize().to_hex().to_string()
    }

    /// Table with `Timestamp, Open, High, Low, Close, Volume`.
    pub fn to_table(&self) -> Table {
        let some = |v: Vec<f64>| -> Vec<Option<f64>> { v.into_iter().map(Some).collect() };
        let columns = [
            (
                "Timestamp",
                ColumnData::Timestamp(self.bars.iter().map(|b| Some(b.timestamp)).collect()),
            ),
            ("Open", ColumnData::Number(some(self.opens()))),
            ("High", ColumnData::Number(some(self.highs()))),
            ("Low", ColumnData::Number(some(self.lows()))),
            ("Close", ColumnData::Number(some(self.closes()))),
            (
                "Volume",
                ColumnData::Number(self.bars.iter().map(|b| Some(b.volume as f64)).collect()),
            ),
        ];
        let mut table = Table::new();
        for (name, data) in columns {
            // Fixed names and equal lengths: cannot fail.
            let _ = table.push_column(name, data);
        }
        table
    }
}

/// One derived numeric column aligned 1:1 with its series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorColumn {
    pub name: String,
    pub values: Vec<f64>,
}

/// A copy of the input series plus derived indicator columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorFrame {
    series: OhlcvSeries,
    columns: Vec<IndicatorColumn>,
}

impl IndicatorFrame {
    pub fn new(series: OhlcvSeries) -> Self {
        Self {
            series,
            columns: Vec::new(),
        }
    }

    pub fn series(&self) -> &OhlcvSeries {
        &self.series
    }

    pub fn columns(&self) -> &[IndicatorColumn] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Add a derived column.
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) -> Result<(), SeriesError> {
        let name = name.into();
        if OHLCV_COLUMNS.iter().any(|c| c.eq_ignore_ascii_case(&name)) {
            return Err(SeriesError::ColumnCollision(name));
        }
        if self.column(&name).is_some() {
            return Err(SeriesError::DuplicateColumn(name));
        }
        if values.len() != self.series.len() {
            return Err(SeriesError::LengthMismatch {
                column: name,
                expected: self.series.len(),
                actual: values.len(),
            });
        }
        self.columns.push(IndicatorColumn { name, values });
        Ok(())
    }

    /// Series table followed by the indicator columns (NaN becomes a missing cell).
    pub fn to_table(&self) -> Table {
        let mut table = self.series.to_table();
        for col in &self.columns {
            let data = col
                .values
                .iter()
                .map(|v| if v.is_nan() { None } else { Some(*v) })
                .collect();
            let _ = table.push_column(col.name.clone(), ColumnData::Number(data));
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bar(day: u32, close: f64) -> Bar {
        Bar {
            timestamp: NaiveDate::from_ymd_opt(2024, 1, day)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 100,
        }
    }

    #[test]
    fn new_sorts_ascending() {
        let s = OhlcvSeries::new("X", vec![bar(3, 3.0), bar(1, 1.0), bar(2, 2.0)]);
        assert_eq!(s.closes(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn new_drops_duplicate_timestamps_keeping_last() {
        let s = OhlcvSeries::new("X", vec![bar(1, 1.0), bar(2, 2.0), bar(2, 2.5)]);
        assert_eq!(s.len(), 2);
        assert_eq!(s.closes(), vec![1.0, 2.5]);
    }

    #[test]
    fn fingerprint_tracks_content() {
        let a = OhlcvSeries::new("X", vec![bar(1, 1.0), bar(2, 2.0)]);
        let b = OhlcvSeries::new("X", vec![bar(2, 2.0), bar(1, 1.0)]);
        let c = OhlcvSeries::new("X", vec![bar(1, 1.0), bar(2, 2.1)]);
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
    }

    #[test]
    fn frame_rejects_ohlcv_names() {
        let mut frame = IndicatorFrame::new(OhlcvSeries::new("X", vec![bar(1, 1.0)]));
        let err = frame.insert("Close", vec![1.0]).unwrap_err();
        assert_eq!(err, SeriesError::ColumnCollision("Close".into()));
        assert!(frame.insert("SMA_5", vec![1.0]).is_ok());
        assert!(matches!(
            frame.insert("EMA_5", vec![1.0, 2.0]),
            Err(SeriesError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn frame_table_appends_indicator_columns() {
        let mut frame = IndicatorFrame::new(OhlcvSeries::new("X", vec![bar(1, 1.0), bar(2, 2.0)]));
        frame.insert("RSI", vec![f64::NAN, 100.0]).unwrap();
        let table = frame.to_table();
        assert_eq!(
            table.column_names(),
            vec!["Timestamp", "Open", "High", "Low", "Close", "Volume", "RSI"]
        );
        assert_eq!(table.numbers("RSI").unwrap(), &[None, Some(100.0)]);
    }
}
