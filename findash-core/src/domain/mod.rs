//! Domain types for findash

pub mod bar;
pub mod period;
pub mod quote;
pub mod series;
pub mod statement;
pub mod table;

pub use bar::Bar;
pub use period::{validate_range, Interval, Period, RangeError};
pub use quote::QuoteSnapshot;
pub use series::{IndicatorColumn, IndicatorFrame, OhlcvSeries, SeriesError, OHLCV_COLUMNS};
pub use statement::{StatementKind, StatementPeriod};
pub use table::{format_timestamp, parse_timestamp, Column, ColumnData, Table};

/// Symbol type alias
pub type Symbol = String;
