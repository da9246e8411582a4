//! Local table sources for the data explorer: CSV/Parquet files and SQLite tables.

use std::path::{Path, PathBuf};

use polars::prelude::*;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};

use super::provider::DataError;
use crate::domain::{ColumnData, Table};

/// Column parsed to timestamps when every value parses.
pub const DATE_COLUMN: &str = "Date";

const TABLE_EXTENSIONS: [&str; 2] = ["csv", "parquet"];

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
}

/// Read a `.csv` or `.parquet` file into a [`Table`].
pub fn read_table_file(path: &Path) -> Result<Table, DataError> {
    let local = |e: PolarsError| DataError::Local(format!("{}: {e}", path.display()));

    let df = match extension(path).as_deref() {
        Some("csv") => LazyCsvReader::new(path)
            .with_has_header(true)
            .finish()
            .and_then(|lf| lf.collect())
            .map_err(local)?,
        Some("parquet") => LazyFrame::scan_parquet(path, Default::default())
            .and_then(|lf| lf.collect())
            .map_err(local)?,
        _ => {
            return Err(DataError::Unsupported(format!(
                "{}: expected a .csv or .parquet file",
                path.display()
            )))
        }
    };

    let mut table = dataframe_to_table(&df).map_err(local)?;
    table.parse_timestamp_column(DATE_COLUMN);
    tracing::info!(path = %path.display(), rows = table.height(), cols = table.width(), "read table file");
    Ok(table)
}

fn is_number(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Numeric dtypes become Number columns, dates become Timestamp columns,
/// everything else is rendered as text.
fn dataframe_to_table(df: &DataFrame) -> PolarsResult<Table> {
    let mut table = Table::new();
    for col in df.get_columns() {
        let series = col.as_materialized_series();
        let name = col.name().to_string();
        let dtype = series.dtype().clone();

        let data = if is_number(&dtype) {
            let cast = series.cast(&DataType::Float64)?;
            ColumnData::Number(cast.f64()?.into_iter().collect())
        } else {
            let cast = series.cast(&DataType::String)?;
            let texts: Vec<Option<String>> =
                cast.str()?.into_iter().map(|v| v.map(str::to_string)).collect();
            if matches!(dtype, DataType::Date | DataType::Datetime(_, _)) {
                ColumnData::Timestamp(
                    texts
                        .iter()
                        .map(|t| t.as_deref().and_then(crate::domain::parse_timestamp))
                        .collect(),
                )
            } else {
                ColumnData::Text(texts)
            }
        };

        table
            .push_column(name, data)
            .map_err(|e| PolarsError::ComputeError(e.to_string().into()))?;
    }
    Ok(table)
}

/// CSV and Parquet files directly inside `dir`, sorted by name.
pub fn list_table_files(dir: &Path) -> Result<Vec<PathBuf>, DataError> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| p.is_file())
        .filter(|p| {
            extension(p).is_some_and(|ext| TABLE_EXTENSIONS.contains(&ext.as_str()))
        })
        .collect();
    files.sort();
    Ok(files)
}

/// True for `[A-Za-z_][A-Za-z0-9_]*`.
pub fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

fn open_read_only(db_path: &Path) -> Result<Connection, DataError> {
    Connection::open_with_flags(db_path, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .map_err(|e| DataError::Local(format!("{}: {e}", db_path.display())))
}

/// Names of the user tables in a SQLite database, sorted.
pub fn list_sqlite_tables(db_path: &Path) -> Result<Vec<String>, DataError> {
    let conn = open_read_only(db_path)?;
    let sqlite = |e: rusqlite::Error| DataError::Local(e.to_string());
    let mut stmt = conn
        .prepare("SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name")
        .map_err(sqlite)?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .map_err(sqlite)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(sqlite)?;
    Ok(names)
}

enum Cell {
    Null,
    Number(f64),
    Text(String),
}

/// `SELECT *` from one SQLite table. Columns holding only integers and
/// reals become Number columns, the rest Text.
pub fn read_sqlite_table(db_path: &Path, table: &str) -> Result<Table, DataError> {
    if !is_plain_identifier(table) {
        return Err(DataError::InvalidIdentifier(table.to_string()));
    }

    let conn = open_read_only(db_path)?;
    let sqlite = |e: rusqlite::Error| DataError::Local(e.to_string());
    let mut stmt = conn
        .prepare(&format!("SELECT * FROM \"{table}\""))
        .map_err(sqlite)?;
    let names: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();
    let width = names.len();

    let mut cells: Vec<Vec<Cell>> = (0..width).map(|_| Vec::new()).collect();
    let mut rows = stmt.query([]).map_err(sqlite)?;
    while let Some(row) = rows.next().map_err(sqlite)? {
        for (i, column) in cells.iter_mut().enumerate() {
            let cell = match row.get_ref(i).map_err(sqlite)? {
                ValueRef::Null => Cell::Null,
                ValueRef::Integer(v) => Cell::Number(v as f64),
                ValueRef::Real(v) => Cell::Number(v),
                ValueRef::Text(t) => Cell::Text(String::from_utf8_lossy(t).into_owned()),
                ValueRef::Blob(b) => Cell::Text(format!("<{} bytes>", b.len())),
            };
            column.push(cell);
        }
    }

    let mut out = Table::new();
    for (name, column) in names.into_iter().zip(cells) {
        let numeric = column.iter().all(|c| !matches!(c, Cell::Text(_)));
        let data = if numeric {
            ColumnData::Number(
                column
                    .into_iter()
                    .map(|c| match c {
                        Cell::Number(v) => Some(v),
                        _ => None,
                    })
                    .collect(),
            )
        } else {
            ColumnData::Text(
                column
                    .into_iter()
                    .map(|c| match c {
                        Cell::Null => None,
                        Cell::Number(v) => Some(v.to_string()),
                        Cell::Text(s) => Some(s),
                    })
                    .collect(),
            )
        };
        out.push_column(name, data)
            .map_err(|e| DataError::Local(e.to_string()))?;
    }

    out.parse_timestamp_column(DATE_COLUMN);
    tracing::info!(db = %db_path.display(), table, rows = out.height(), "read sqlite table");
    Ok(out)
}
