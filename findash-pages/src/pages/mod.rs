//! Page controllers. Each renders one dashboard view into a
//! [`PageView`](crate::view::PageView).
//!
//! A failed fetch becomes an Error notice in the affected section and its
//! memo entry is evicted, so the next render asks upstream again. The rest
//! of the page still renders.

pub mod commodities;
pub mod explorer;
pub mod financials;
pub mod forex;
pub mod macros;
pub mod overview;
pub mod portfolio;
pub mod security;

pub use commodities::{render_commodities, CommodityParams};
pub use explorer::{available_sources, render_explorer, ExplorerParams, ExplorerSource};
pub use financials::render_financials;
pub use forex::{pair_ticker, render_forex, ForexParams};
pub use macros::{render_macro, MacroCategory, MacroParams};
pub use overview::render_overview;
pub use portfolio::render_portfolio;
pub use security::render_security;

use std::sync::Arc;

use findash_core::chart::{AxisData, LineSeries};
use findash_core::data::{DataError, FetchKey, Fetched};
use findash_core::domain::{OhlcvSeries, Table};

use crate::session::RequestContext;

/// Evict `key` when `result` failed, so the failure is not served again.
pub(crate) fn settle<T>(ctx: &RequestContext<'_>, key: FetchKey, result: Fetched<T>) -> Fetched<T> {
    if let Err(e) = &result {
        ctx.data.evict(&key);
        tracing::warn!(key = %key, error = %e, "fetch failed, entry evicted");
    }
    result
}

/// History at the session's period and interval.
pub(crate) fn history(ctx: &RequestContext<'_>, symbol: &str) -> Result<Arc<OhlcvSeries>, DataError> {
    let (period, interval) = (ctx.selections.period, ctx.selections.interval);
    let key = FetchKey::History {
        symbol: symbol.trim().to_string(),
        period,
        interval,
    };
    settle(ctx, key, ctx.data.fetch_history(symbol, period, interval))
}

/// Series plus the session's selected indicators, as a table.
pub(crate) fn studies_table(ctx: &RequestContext<'_>, series: &OhlcvSeries) -> Table {
    let codes = ctx.selections.indicator_codes();
    ctx.indicators.compute(series, &codes).to_table()
}

/// Closing prices of a series as one chart line.
pub(crate) fn close_line(name: &str, series: &OhlcvSeries) -> LineSeries {
    let table = series.to_table();
    let x = table
        .column("Timestamp")
        .map(|c| AxisData::from_column(&c.data))
        .unwrap_or_else(|| AxisData::index(series.len()));
    LineSeries::new(name, x, series.closes().into_iter().map(Some).collect())
}

/// Percent change between consecutive values, first row missing.
pub(crate) fn pct_change(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(values.len());
    for i in 0..values.len() {
        let v = match (i.checked_sub(1).and_then(|p| values[p]), values[i]) {
            (Some(prev), Some(cur)) if prev != 0.0 => Some((cur / prev - 1.0) * 100.0),
            _ => None,
        };
        out.push(v);
    }
    out
}

pub(crate) fn fmt_dp(value: f64, dp: usize) -> String {
    format!("{value:.dp$}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pct_change_skips_gaps_and_zero() {
        let out = pct_change(&[Some(100.0), Some(150.0), None, Some(5.0), Some(0.0), Some(1.0)]);
        assert_eq!(out, vec![None, Some(50.0), None, None, Some(-100.0), None]);
    }

    #[test]
    fn formatting() {
        assert_eq!(fmt_dp(1.23456, 4), "1.2346");
        assert_eq!(fmt_dp(2.0, 2), "2.00");
    }
}
