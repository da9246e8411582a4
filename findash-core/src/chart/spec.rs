//! Serializable chart description consumed by front-ends.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{format_timestamp, ColumnData};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Line,
    Bar,
    Scatter,
    Candlestick,
}

impl std::str::FromStr for ChartKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "line" => Ok(ChartKind::Line),
            "bar" => Ok(ChartKind::Bar),
            "scatter" => Ok(ChartKind::Scatter),
            "candlestick" | "candle" => Ok(ChartKind::Candlestick),
            other => Err(format!("unknown chart kind '{other}'")),
        }
    }
}

/// X-axis values: numbers, or display labels (dates and text).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AxisData {
    Numbers(Vec<Option<f64>>),
    Labels(Vec<Option<String>>),
}

impl AxisData {
    pub fn len(&self) -> usize {
        match self {
            AxisData::Numbers(v) => v.len(),
            AxisData::Labels(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Row positions 0..n.
    pub fn index(n: usize) -> Self {
        AxisData::Numbers((0..n).map(|i| Some(i as f64)).collect())
    }

    pub fn from_column(data: &ColumnData) -> Self {
        match data {
            ColumnData::Number(v) => AxisData::Numbers(v.clone()),
            ColumnData::Text(v) => AxisData::Labels(v.clone()),
            ColumnData::Timestamp(v) => {
                AxisData::Labels(v.iter().map(|t| t.map(format_timestamp)).collect())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ohlc {
    pub open: Vec<Option<f64>>,
    pub high: Vec<Option<f64>>,
    pub low: Vec<Option<f64>>,
    pub close: Vec<Option<f64>>,
}

/// One drawn series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    pub name: String,
    pub kind: ChartKind,
    /// Index into [`ChartSpec::panes`].
    pub pane: usize,
    pub x: AxisData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<Vec<Option<f64>>>,
    #[serde(flatten)]
    pub ohlc: Option<Ohlc>,
}

impl Trace {
    pub fn series(
        name: impl Into<String>,
        kind: ChartKind,
        pane: usize,
        x: AxisData,
        y: Vec<Option<f64>>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            pane,
            x,
            y: Some(y),
            ohlc: None,
        }
    }

    pub fn candles(name: impl Into<String>, pane: usize, x: AxisData, ohlc: Ohlc) -> Self {
        Self {
            name: name.into(),
            kind: ChartKind::Candlestick,
            pane,
            x,
            y: None,
            ohlc: Some(ohlc),
        }
    }
}

/// A stacked sub-plot sharing the x axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pane {
    pub y_title: String,
    /// Fraction of the total height; all panes sum to 1.
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub title: String,
    pub panes: Vec<Pane>,
    pub traces: Vec<Trace>,
}

impl ChartSpec {
    /// Build a spec from pane titles with relative weights.
    pub fn stacked(title: impl Into<String>, panes: &[(&str, f64)], traces: Vec<Trace>) -> Self {
        let total: f64 = panes.iter().map(|(_, w)| w).sum();
        Self {
            title: title.into(),
            panes: panes
                .iter()
                .map(|(t, w)| Pane {
                    y_title: t.to_string(),
                    height: if total > 0.0 { w / total } else { 0.0 },
                })
                .collect(),
            traces,
        }
    }

    pub fn trace(&self, name: &str) -> Option<&Trace> {
        self.traces.iter().find(|t| t.name == name)
    }

    pub fn trace_names(&self) -> Vec<&str> {
        self.traces.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Why a table cannot be drawn as requested.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("no rows to plot")]
    EmptyTable,

    #[error("column '{0}' not found")]
    MissingColumn(String),

    #[error("column '{0}' is not numeric")]
    NonNumeric(String),

    #[error("candlestick needs Open, High, Low and Close; missing {}", .0.join(", "))]
    MissingOhlc(Vec<String>),

    #[error("no series selected")]
    NoSeries,
}

/// Result of a chart build. Shape problems are an outcome, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartOutcome {
    Renderable(ChartSpec),
    NotRenderable { reason: ShapeError },
}

impl ChartOutcome {
    pub fn not_renderable(reason: ShapeError) -> Self {
        ChartOutcome::NotRenderable { reason }
    }

    pub fn spec(&self) -> Option<&ChartSpec> {
        match self {
            ChartOutcome::Renderable(spec) => Some(spec),
            ChartOutcome::NotRenderable { .. } => None,
        }
    }

    pub fn into_spec(self) -> Option<ChartSpec> {
        match self {
            ChartOutcome::Renderable(spec) => Some(spec),
            ChartOutcome::NotRenderable { .. } => None,
        }
    }

    pub fn is_renderable(&self) -> bool {
        matches!(self, ChartOutcome::Renderable(_))
    }
}
