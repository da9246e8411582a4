//! Column-oriented table used for scraped pages, statements, local files and
//! the raw-data views.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::io::Write;

use super::series::SeriesError;

/// Typed storage for one column. `None` marks a missing cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "values", rename_all = "snake_case")]
pub enum ColumnData {
    Number(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
    Timestamp(Vec<Option<NaiveDateTime>>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Number(v) => v.len(),
            ColumnData::Text(v) => v.len(),
            ColumnData::Timestamp(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnData::Number(_))
    }

    fn take_rows(&self, rows: &[usize]) -> ColumnData {
        match self {
            ColumnData::Number(v) => ColumnData::Number(rows.iter().map(|&i| v[i]).collect()),
            ColumnData::Text(v) => ColumnData::Text(rows.iter().map(|&i| v[i].clone()).collect()),
            ColumnData::Timestamp(v) => {
                ColumnData::Timestamp(rows.iter().map(|&i| v[i]).collect())
            }
        }
    }

    /// Display text of a single cell; `None` for a missing value.
    pub fn cell_text(&self, row: usize) -> Option<String> {
        match self {
            ColumnData::Number(v) => v
                .get(row)
                .copied()
                .flatten()
                .filter(|x| !x.is_nan())
                .map(|x| format!("{x}")),
            ColumnData::Text(v) => v.get(row).cloned().flatten(),
            ColumnData::Timestamp(v) => v.get(row).copied().flatten().map(format_timestamp),
        }
    }
}

/// A named column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

/// Column-oriented table. All columns share the same height.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a two-column key/value table (`Field`, `Value`).
    pub fn key_value<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let (keys, values): (Vec<_>, Vec<_>) = pairs
            .into_iter()
            .map(|(k, v)| (Some(k.into()), Some(v.into())))
            .unzip();
        Table {
            columns: vec![
                Column {
                    name: "Field".into(),
                    data: ColumnData::Text(keys),
                },
                Column {
                    name: "Value".into(),
                    data: ColumnData::Text(values),
                },
            ],
        }
    }

    /// Append a column. Rejects duplicate names and height mismatches.
    pub fn push_column(
        &mut self,
        name: impl Into<String>,
        data: ColumnData,
    ) -> Result<(), SeriesError> {
        let name = name.into();
        if self.column(&name).is_some() {
            return Err(SeriesError::DuplicateColumn(name));
        }
        if !self.columns.is_empty() && data.len() != self.height() {
            return Err(SeriesError::LengthMismatch {
                column: name,
                expected: self.height(),
                actual: data.len(),
            });
        }
        self.columns.push(Column { name, data });
        Ok(())
    }

    /// Builder-style [`Table::push_column`].
    pub fn with_column(
        mut self,
        name: impl Into<String>,
        data: ColumnData,
    ) -> Result<Self, SeriesError> {
        self.push_column(name, data)?;
        Ok(self)
    }

    /// Remove a column by name. Returns true if it existed.
    pub fn drop_column(&mut self, name: &str) -> bool {
        let before = self.columns.len();
        self.columns.retain(|c| c.name != name);
        self.columns.len() != before
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn numbers(&self, name: &str) -> Option<&[Option<f64>]> {
        match &self.column(name)?.data {
            ColumnData::Number(v) => Some(v),
            _ => None,
        }
    }

    pub fn texts(&self, name: &str) -> Option<&[Option<String>]> {
        match &self.column(name)?.data {
            ColumnData::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn timestamps(&self, name: &str) -> Option<&[Option<NaiveDateTime>]> {
        match &self.column(name)?.data {
            ColumnData::Timestamp(v) => Some(v),
            _ => None,
        }
    }

    pub fn height(&self) -> usize {
        self.columns.first().map(|c| c.data.len()).unwrap_or(0)
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.height() == 0
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn numeric_column_names(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.data.is_numeric())
            .map(|c| c.name.as_str())
            .collect()
    }

    /// Display text of the cell at (`column`, `row`).
    pub fn cell_text(&self, column: &str, row: usize) -> Option<String> {
        self.column(column)?.data.cell_text(row)
    }

    /// New table holding only the given rows, in the given order.
    pub fn take_rows(&self, rows: &[usize]) -> Table {
        Table {
            columns: self
                .columns
                .iter()
                .map(|c| Column {
                    name: c.name.clone(),
                    data: c.data.take_rows(rows),
                })
                .collect(),
        }
    }

    /// Keep rows for which `keep(row_index)` is true.
    pub fn filter_rows(&self, mut keep: impl FnMut(usize) -> bool) -> Table {
        let rows: Vec<usize> = (0..self.height()).filter(|&i| keep(i)).collect();
        self.take_rows(&rows)
    }

    /// Keep rows whose `column` cell displays exactly as `value`.
    pub fn filter_eq(&self, column: &str, value: &str) -> Result<Table, SeriesError> {
        let col = self
            .column(column)
            .ok_or_else(|| SeriesError::MissingColumn(column.to_string()))?;
        Ok(self.filter_rows(|i| col.data.cell_text(i).as_deref() == Some(value)))
    }

    /// Keep rows whose timestamp in `column` falls within the inclusive date range.
    /// Rows without a timestamp are dropped when any bound is set.
    pub fn filter_date_range(
        &self,
        column: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Table, SeriesError> {
        let ts = self
            .timestamps(column)
            .ok_or_else(|| SeriesError::MissingColumn(column.to_string()))?;
        if start.is_none() && end.is_none() {
            return Ok(self.clone());
        }
        Ok(self.filter_rows(|i| match ts[i] {
            Some(t) => {
                let d = t.date();
                start.map_or(true, |s| d >= s) && end.map_or(true, |e| d <= e)
            }
            None => false,
        }))
    }

    /// Stable sort by a timestamp column, missing timestamps last.
    pub fn sort_by_timestamp(&self, column: &str) -> Result<Table, SeriesError> {
        let ts = self
            .timestamps(column)
            .ok_or_else(|| SeriesError::MissingColumn(column.to_string()))?;
        let mut rows: Vec<usize> = (0..self.height()).collect();
        rows.sort_by_key(|&i| (ts[i].is_none(), ts[i]));
        Ok(self.take_rows(&rows))
    }

    /// Distinct display values of a column, sorted.
    pub fn distinct_values(&self, column: &str) -> Vec<String> {
        let Some(col) = self.column(column) else {
            return Vec::new();
        };
        let set: BTreeSet<String> = (0..self.height())
            .filter_map(|i| col.data.cell_text(i))
            .collect();
        set.into_iter().collect()
    }

    /// Convert a text column to timestamps when every present value parses.
    /// Returns false (and leaves the column untouched) otherwise.
    pub fn parse_timestamp_column(&mut self, column: &str) -> bool {
        let Some(col) = self.columns.iter_mut().find(|c| c.name == column) else {
            return false;
        };
        let ColumnData::Text(values) = &col.data else {
            return matches!(col.data, ColumnData::Timestamp(_));
        };
        let mut parsed = Vec::with_capacity(values.len());
        for v in values {
            match v {
                Some(s) => match parse_timestamp(s) {
                    Some(t) => parsed.push(Some(t)),
                    None => return false,
                },
                None => parsed.push(None),
            }
        }
        col.data = ColumnData::Timestamp(parsed);
        true
    }

    /// Write the table as CSV with a header row.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(self.columns.iter().map(|c| c.name.as_str()))?;
        for row in 0..self.height() {
            wtr.write_record(
                self.columns
                    .iter()
                    .map(|c| c.data.cell_text(row).unwrap_or_default()),
            )?;
        }
        wtr.flush()?;
        Ok(())
    }
}

/// Render a timestamp as a date when it sits at midnight, else date and time.
pub fn format_timestamp(t: NaiveDateTime) -> String {
    if t.time() == chrono::NaiveTime::MIN {
        t.date().format("%Y-%m-%d").to_string()
    } else {
        t.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

/// Parse the date/time spellings found in exported market data.
///
/// Offsets are converted to UTC and dropped.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%:z") {
        return Some(dt.naive_utc());
    }
    for fmt in [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(t) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(t);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(chrono::NaiveTime::MIN))
}
