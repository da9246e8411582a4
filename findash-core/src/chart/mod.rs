//! Chart specifications: what to draw, independent of any plotting front-end.

pub mod build;
pub mod spec;

pub use build::{
    build_chart, candlestick_with_studies, multi_line, ChartRequest, LineSeries, Normalization,
};
pub use spec::{AxisData, ChartKind, ChartOutcome, ChartSpec, Ohlc, Pane, ShapeError, Trace};
