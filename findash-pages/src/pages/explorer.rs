//! Data explorer: local CSV/Parquet files and SQLite tables, with derived
//! change columns, filters, a chart and summary metrics.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use chrono::NaiveDate;
use findash_core::chart::{build_chart, ChartKind, ChartRequest};
use findash_core::data::local::DATE_COLUMN;
use findash_core::data::{
    list_sqlite_tables, list_table_files, read_sqlite_table, read_table_file, DataError,
};
use findash_core::domain::{ColumnData, Table};

use super::{fmt_dp, pct_change};
use crate::session::RequestContext;
use crate::view::{Metric, PageView};

pub const CHANGE_COLUMN: &str = "% Change";
pub const VS_AVERAGE_COLUMN: &str = "% Change vs Average";
const AVERAGE_WINDOW: usize = 20;
const SQLITE_EXTENSIONS: [&str; 3] = ["db", "sqlite", "sqlite3"];

/// Where an explorer table comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExplorerSource {
    /// File name inside the configured data folder.
    File(String),
    Sqlite { db: PathBuf, table: String },
}

impl ExplorerSource {
    /// Session cache key: `internal::<file>` or `db::<path>::<table>`.
    pub fn key(&self) -> String {
        self.to_string()
    }

    fn load(&self, data_folder: &Path) -> Result<Table, DataError> {
        match self {
            ExplorerSource::File(name) => {
                if Path::new(name).components().count() != 1 {
                    return Err(DataError::InvalidIdentifier(name.clone()));
                }
                read_table_file(&data_folder.join(name))
            }
            ExplorerSource::Sqlite { db, table } => read_sqlite_table(db, table),
        }
    }
}

impl fmt::Display for ExplorerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExplorerSource::File(name) => write!(f, "internal::{name}"),
            ExplorerSource::Sqlite { db, table } => write!(f, "db::{}::{table}", db.display()),
        }
    }
}

impl FromStr for ExplorerSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(name) = s.strip_prefix("internal::") {
            return Ok(ExplorerSource::File(name.to_string()));
        }
        if let Some(rest) = s.strip_prefix("db::") {
            if let Some((db, table)) = rest.rsplit_once("::") {
                return Ok(ExplorerSource::Sqlite {
                    db: PathBuf::from(db),
                    table: table.to_string(),
                });
            }
        }
        Err(format!(
            "source '{s}' is neither internal::<file> nor db::<path>::<table>"
        ))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExplorerParams {
    pub source: ExplorerSource,
    /// Keep rows whose column displays exactly as the value.
    pub filter: Option<(String, String)>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub chart: ChartKind,
    /// Columns to plot and summarise; empty means every numeric column.
    pub columns: Vec<String>,
}

impl ExplorerParams {
    pub fn new(source: ExplorerSource) -> Self {
        Self {
            source,
            filter: None,
            from: None,
            to: None,
            chart: ChartKind::Line,
            columns: Vec::new(),
        }
    }
}

/// Files in the data folder plus the tables of any SQLite file there.
pub fn available_sources(ctx: &RequestContext<'_>) -> Result<Vec<ExplorerSource>, DataError> {
    let folder = &ctx.settings.paths.data_folder;
    let mut sources: Vec<ExplorerSource> = list_table_files(folder)?
        .into_iter()
        .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .map(ExplorerSource::File)
        .collect();

    let mut dbs: Vec<PathBuf> = std::fs::read_dir(folder)?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| SQLITE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        })
        .collect();
    dbs.sort();
    for db in dbs {
        match list_sqlite_tables(&db) {
            Ok(tables) => sources.extend(tables.into_iter().map(|table| ExplorerSource::Sqlite {
                db: db.clone(),
                table,
            })),
            Err(e) => tracing::warn!(db = %db.display(), error = %e, "skipping database"),
        }
    }
    Ok(sources)
}

fn parse_grouped(s: &str) -> Option<f64> {
    s.replace(',', "").trim().parse().ok()
}

/// Sort by date, make `Volume` numeric and add the change columns.
pub fn prepare(table: &Table) -> Table {
    let mut table = match table.sort_by_timestamp(DATE_COLUMN) {
        Ok(sorted) => sorted,
        Err(_) => table.clone(),
    };

    if let Some(texts) = table.texts("Volume") {
        let numbers = texts
            .iter()
            .map(|t| t.as_deref().and_then(parse_grouped))
            .collect();
        table.drop_column("Volume");
        let _ = table.push_column("Volume", ColumnData::Number(numbers));
    }

    if let Some(close) = table.numbers("Close").map(<[Option<f64>]>::to_vec) {
        if table.column(CHANGE_COLUMN).is_none() {
            let _ = table.push_column(CHANGE_COLUMN, ColumnData::Number(pct_change(&close)));
        }
        let avg = full_window_mean(&close, AVERAGE_WINDOW);
        let vs_avg = close
            .iter()
            .zip(avg)
            .map(|(c, m)| match (c, m) {
                (Some(c), Some(m)) if m != 0.0 => Some((c - m) / m * 100.0),
                _ => None,
            })
            .collect();
        if table.column(VS_AVERAGE_COLUMN).is_none() {
            let _ = table.push_column(VS_AVERAGE_COLUMN, ColumnData::Number(vs_avg));
        }
    }
    table
}

/// Rolling mean that needs `window` defined values; rows before the first
/// full window, or whose window holds a gap, stay empty.
fn full_window_mean(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| {
            if window == 0 || i + 1 < window {
                return None;
            }
            let rows = &values[i + 1 - window..=i];
            let sum = rows.iter().copied().sum::<Option<f64>>()?;
            Some(sum / window as f64)
        })
        .collect()
}

/// Min, max and average of a numeric column, two decimals. `None` when the
/// column holds no values.
pub fn summary(table: &Table, column: &str) -> Option<Vec<Metric>> {
    let values: Vec<f64> = table.numbers(column)?.iter().flatten().copied().collect();
    if values.is_empty() {
        return None;
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let avg = values.iter().sum::<f64>() / values.len() as f64;
    Some(vec![
        Metric::new(format!("{column} Min"), fmt_dp(min, 2)),
        Metric::new(format!("{column} Max"), fmt_dp(max, 2)),
        Metric::new(format!("{column} Avg"), fmt_dp(avg, 2)),
    ])
}

fn load(ctx: &RequestContext<'_>, source: &ExplorerSource) -> Result<Arc<Table>, DataError> {
    let key = source.key();
    let folder = &ctx.settings.paths.data_folder;
    let result = ctx
        .explorer
        .get_or_insert_with(key.clone(), || source.load(folder).map(Arc::new));
    if result.is_err() {
        ctx.explorer.invalidate(&key);
    }
    result
}

pub fn render_explorer(ctx: &RequestContext<'_>, params: &ExplorerParams) -> PageView {
    let mut page = PageView::new("Data Explorer");
    let source = &params.source;

    let raw = match load(ctx, source) {
        Ok(t) => t,
        Err(e) => {
            page.error(source.key(), &e);
            return page;
        }
    };
    if raw.is_empty() {
        page.info(source.key(), "The selected source has no rows.");
        return page;
    }

    let mut table = prepare(&raw);

    if let Some((column, value)) = &params.filter {
        match table.filter_eq(column, value) {
            Ok(t) => table = t,
            Err(e) => page.warning("Filter", e.to_string()),
        }
    }
    if params.from.is_some() || params.to.is_some() {
        match table.filter_date_range(DATE_COLUMN, params.from, params.to) {
            Ok(t) => table = t,
            Err(e) => page.warning("Date Range", e.to_string()),
        }
    }

    let columns: Vec<String> = if params.columns.is_empty() {
        table
            .numeric_column_names()
            .into_iter()
            .map(str::to_string)
            .collect()
    } else {
        params.columns.clone()
    };

    let mut request = ChartRequest::new(params.chart, source.key());
    if table.column(DATE_COLUMN).is_some() {
        request = request.x(DATE_COLUMN);
    }
    if params.chart != ChartKind::Candlestick {
        for c in &columns {
            request = request.y(c.clone());
        }
    }
    page.chart("Chart", build_chart(&table, &request));

    let metrics: Vec<Metric> = columns
        .iter()
        .filter_map(|c| summary(&table, c))
        .flatten()
        .collect();
    if !metrics.is_empty() {
        page.metrics("Summary", metrics);
    }

    page.table("Data", table);
    page
}

#[cfg(test)]
mod tests {
    use super::*;
    use findash_core::domain::parse_timestamp;

    #[test]
    fn source_keys_round_trip() {
        let file = ExplorerSource::File("prices.csv".into());
        assert_eq!(file.key(), "internal::prices.csv");
        assert_eq!(file.key().parse::<ExplorerSource>(), Ok(file));

        let db = ExplorerSource::Sqlite {
            db: PathBuf::from("data/local.db"),
            table: "quotes".into(),
        };
        assert_eq!(db.key(), "db::data/local.db::quotes");
        assert_eq!(db.key().parse::<ExplorerSource>(), Ok(db));

        assert!("prices.csv".parse::<ExplorerSource>().is_err());
    }

    #[test]
    fn file_sources_stay_inside_the_folder() {
        let src = ExplorerSource::File("../secret.csv".into());
        assert!(matches!(
            src.load(Path::new("data")),
            Err(DataError::InvalidIdentifier(_))
        ));
    }

    fn sample() -> Table {
        let dates = ["2024-01-03", "2024-01-02"]
            .iter()
            .map(|d| parse_timestamp(d))
            .collect();
        Table::new()
            .with_column("Date", ColumnData::Timestamp(dates))
            .unwrap()
            .with_column("Close", ColumnData::Number(vec![Some(12.0), Some(10.0)]))
            .unwrap()
            .with_column(
                "Volume",
                ColumnData::Text(vec![Some("1,500".into()), Some("1,000".into())]),
            )
            .unwrap()
    }

    #[test]
    fn prepare_sorts_cleans_and_derives() {
        let t = prepare(&sample());
        assert_eq!(t.numbers("Close").unwrap(), &[Some(10.0), Some(12.0)]);
        assert_eq!(t.numbers("Volume").unwrap(), &[Some(1000.0), Some(1500.0)]);

        let change = t.numbers(CHANGE_COLUMN).unwrap();
        assert_eq!(change[0], None);
        assert!((change[1].unwrap() - 20.0).abs() < 1e-9);

        // Fewer rows than the average window.
        let vs = t.numbers(VS_AVERAGE_COLUMN).unwrap();
        assert_eq!(vs.len(), 2);
        assert!(vs.iter().all(Option::is_none));
    }

    #[test]
    fn vs_average_starts_at_first_full_window() {
        let close: Vec<Option<f64>> = (1..=21).map(|v| Some(v as f64)).collect();
        let t = Table::new()
            .with_column("Close", ColumnData::Number(close))
            .unwrap();
        let vs = prepare(&t).numbers(VS_AVERAGE_COLUMN).unwrap().to_vec();
        assert!(vs[..19].iter().all(Option::is_none));
        // Rows 0..=19 average 10.5; rows 1..=20 average 11.5.
        assert!((vs[19].unwrap() - (20.0 - 10.5) / 10.5 * 100.0).abs() < 1e-9);
        assert!((vs[20].unwrap() - (21.0 - 11.5) / 11.5 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn vs_average_skips_windows_with_gaps() {
        let mut close: Vec<Option<f64>> = (1..=22).map(|v| Some(v as f64)).collect();
        close[1] = None;
        let t = Table::new()
            .with_column("Close", ColumnData::Number(close))
            .unwrap();
        let vs = prepare(&t).numbers(VS_AVERAGE_COLUMN).unwrap().to_vec();
        assert_eq!(vs[19], None);
        assert_eq!(vs[20], None);
        assert!(vs[21].is_some());
    }

    #[test]
    fn summary_metrics_two_decimals() {
        let t = prepare(&sample());
        let m = summary(&t, "Close").unwrap();
        assert_eq!(m[0], Metric::new("Close Min", "10.00"));
        assert_eq!(m[1], Metric::new("Close Max", "12.00"));
        assert_eq!(m[2], Metric::new("Close Avg", "11.00"));
        assert!(summary(&t, "Date").is_none());
    }
}
