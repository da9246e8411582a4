//! Table-to-chart builders.

use serde::{Deserialize, Serialize};

use super::spec::{AxisData, ChartKind, ChartOutcome, ChartSpec, Ohlc, ShapeError, Trace};
use crate::domain::{ColumnData, Table};
use crate::indicators::MacdLine;

const OHLC_COLUMNS: [&str; 4] = ["Open", "High", "Low", "Close"];

/// What to draw from a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartRequest {
    pub kind: ChartKind,
    pub title: String,
    /// X column; defaults to the first timestamp column, else row position.
    pub x: Option<String>,
    /// Y columns for line, bar and scatter charts.
    pub y: Vec<String>,
}

impl ChartRequest {
    pub fn new(kind: ChartKind, title: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            x: None,
            y: Vec::new(),
        }
    }

    pub fn x(mut self, column: impl Into<String>) -> Self {
        self.x = Some(column.into());
        self
    }

    pub fn y(mut self, column: impl Into<String>) -> Self {
        self.y.push(column.into());
        self
    }
}

fn x_axis(table: &Table, x: Option<&str>) -> Result<AxisData, ShapeError> {
    match x {
        Some(name) => table
            .column(name)
            .map(|c| AxisData::from_column(&c.data))
            .ok_or_else(|| ShapeError::MissingColumn(name.to_string())),
        None => Ok(table
            .columns()
            .iter()
            .find(|c| matches!(c.data, ColumnData::Timestamp(_)))
            .map(|c| AxisData::from_column(&c.data))
            .unwrap_or_else(|| AxisData::index(table.height()))),
    }
}

fn numeric(table: &Table, name: &str) -> Result<Vec<Option<f64>>, ShapeError> {
    let column = table
        .column(name)
        .ok_or_else(|| ShapeError::MissingColumn(name.to_string()))?;
    match &column.data {
        ColumnData::Number(v) => Ok(v.clone()),
        _ => Err(ShapeError::NonNumeric(name.to_string())),
    }
}

fn ohlc(table: &Table) -> Result<Ohlc, ShapeError> {
    let missing: Vec<String> = OHLC_COLUMNS
        .iter()
        .filter(|c| table.column(c).is_none())
        .map(|c| c.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(ShapeError::MissingOhlc(missing));
    }
    Ok(Ohlc {
        open: numeric(table, "Open")?,
        high: numeric(table, "High")?,
        low: numeric(table, "Low")?,
        close: numeric(table, "Close")?,
    })
}

fn try_build(table: &Table, request: &ChartRequest) -> Result<ChartSpec, ShapeError> {
    if table.is_empty() {
        return Err(ShapeError::EmptyTable);
    }
    let x = x_axis(table, request.x.as_deref())?;

    if request.kind == ChartKind::Candlestick {
        let trace = Trace::candles(request.title.clone(), 0, x, ohlc(table)?);
        return Ok(ChartSpec::stacked(
            request.title.clone(),
            &[("Price", 1.0)],
            vec![trace],
        ));
    }

    if request.y.is_empty() {
        return Err(ShapeError::NoSeries);
    }
    let traces = request
        .y
        .iter()
        .map(|name| {
            numeric(table, name)
                .map(|y| Trace::series(name.clone(), request.kind, 0, x.clone(), y))
        })
        .collect::<Result<Vec<_>, _>>()?;
    let y_title = if request.y.len() == 1 {
        request.y[0].as_str()
    } else {
        "Value"
    };
    Ok(ChartSpec::stacked(
        request.title.clone(),
        &[(y_title, 1.0)],
        traces,
    ))
}

/// Build a single-pane chart from `table`.
///
/// Never fails: a table that cannot be drawn as requested yields
/// [`ChartOutcome::NotRenderable`] with the reason.
pub fn build_chart(table: &Table, request: &ChartRequest) -> ChartOutcome {
    match try_build(table, request) {
        Ok(spec) => ChartOutcome::Renderable(spec),
        Err(reason) => {
            tracing::debug!(%reason, kind = ?request.kind, "chart not renderable");
            ChartOutcome::not_renderable(reason)
        }
    }
}

fn is_overlay(name: &str) -> bool {
    name.starts_with("SMA_") || name.starts_with("EMA_")
}

/// Candlestick price pane with indicator studies.
///
/// SMA/EMA columns overlay the candles. Volume, MACD (with signal and
/// histogram), RSI and ATR each get their own pane below, in that order,
/// when the table carries them.
pub fn candlestick_with_studies(table: &Table, title: &str, currency: &str) -> ChartOutcome {
    let build = || -> Result<ChartSpec, ShapeError> {
        if table.is_empty() {
            return Err(ShapeError::EmptyTable);
        }
        let x = x_axis(table, None)?;
        let price_title = if currency.is_empty() {
            "Price".to_string()
        } else {
            format!("Price ({currency})")
        };

        let mut panes: Vec<(String, f64)> = vec![(price_title, 3.0)];
        let mut traces = vec![Trace::candles(title, 0, x.clone(), ohlc(table)?)];

        for name in table.numeric_column_names() {
            if is_overlay(name) {
                traces.push(Trace::series(
                    name,
                    ChartKind::Line,
                    0,
                    x.clone(),
                    numeric(table, name)?,
                ));
            }
        }

        if let Ok(volume) = numeric(table, "Volume") {
            panes.push(("Volume".to_string(), 1.0));
            traces.push(Trace::series("Volume", ChartKind::Bar, panes.len() - 1, x.clone(), volume));
        }

        let macd_lines: Vec<(MacdLine, Vec<Option<f64>>)> = MacdLine::ALL
            .iter()
            .filter_map(|line| numeric(table, line.column_name()).ok().map(|v| (*line, v)))
            .collect();
        if !macd_lines.is_empty() {
            panes.push(("MACD".to_string(), 1.0));
            let pane = panes.len() - 1;
            for (line, values) in macd_lines {
                let kind = match line {
                    MacdLine::Histogram => ChartKind::Bar,
                    _ => ChartKind::Line,
                };
                traces.push(Trace::series(line.column_name(), kind, pane, x.clone(), values));
            }
        }

        for study in ["RSI", "ATR"] {
            if let Ok(values) = numeric(table, study) {
                panes.push((study.to_string(), 1.0));
                traces.push(Trace::series(study, ChartKind::Line, panes.len() - 1, x.clone(), values));
            }
        }

        let weights: Vec<(&str, f64)> = panes.iter().map(|(t, w)| (t.as_str(), *w)).collect();
        Ok(ChartSpec::stacked(title, &weights, traces))
    };

    match build() {
        Ok(spec) => ChartOutcome::Renderable(spec),
        Err(reason) => ChartOutcome::not_renderable(reason),
    }
}

/// How `multi_line` rescales each series against its first value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Normalization {
    #[default]
    None,
    /// `v / first - 1`.
    PercentChange,
    /// `v / first * 100`.
    Rebase100,
}

/// One named line for [`multi_line`].
#[derive(Debug, Clone, PartialEq)]
pub struct LineSeries {
    pub name: String,
    pub x: AxisData,
    pub y: Vec<Option<f64>>,
}

impl LineSeries {
    pub fn new(name: impl Into<String>, x: AxisData, y: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            x,
            y,
        }
    }
}

fn normalize(y: &[Option<f64>], normalization: Normalization) -> Option<Vec<Option<f64>>> {
    if normalization == Normalization::None {
        return Some(y.to_vec());
    }
    // Leading gaps are allowed; the base is the first defined value.
    let base = y.iter().flatten().copied().find(|v| v.is_finite())?;
    if base == 0.0 {
        return None;
    }
    Some(
        y.iter()
            .map(|v| {
                v.map(|v| match normalization {
                    Normalization::PercentChange => v / base - 1.0,
                    Normalization::Rebase100 => v / base * 100.0,
                    Normalization::None => v,
                })
            })
            .collect(),
    )
}

/// Overlay several lines in one pane.
///
/// Under a normalization, a series whose base value is missing or zero is
/// skipped. If nothing is left the chart is not renderable.
pub fn multi_line(title: &str, series: &[LineSeries], normalization: Normalization) -> ChartOutcome {
    let traces: Vec<Trace> = series
        .iter()
        .filter_map(|s| match normalize(&s.y, normalization) {
            Some(y) => Some(Trace::series(s.name.clone(), ChartKind::Line, 0, s.x.clone(), y)),
            None => {
                tracing::warn!(series = %s.name, "skipping series without a usable base value");
                None
            }
        })
        .collect();

    if traces.is_empty() {
        return ChartOutcome::not_renderable(ShapeError::NoSeries);
    }
    let y_title = match normalization {
        Normalization::None => "Value",
        Normalization::PercentChange => "Change",
        Normalization::Rebase100 => "Rebased (100)",
    };
    ChartOutcome::Renderable(ChartSpec::stacked(title, &[(y_title, 1.0)], traces))
}
