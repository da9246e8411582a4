//! Portfolio: several tickers compared on one percent-change chart.

use findash_core::chart::{multi_line, LineSeries, Normalization};
use findash_core::domain::{ColumnData, OhlcvSeries, Table};

use super::{close_line, history};
use crate::session::RequestContext;
use crate::view::PageView;

/// First, last, change, % change, high and low per ticker.
pub fn performance_table(rows: &[(String, &OhlcvSeries)]) -> Table {
    let mut tickers = Vec::new();
    let mut cols: [Vec<Option<f64>>; 6] = Default::default();

    for (ticker, series) in rows {
        let (Some(first), Some(last)) = (series.first(), series.last()) else {
            continue;
        };
        let high = series.highs().into_iter().fold(f64::NEG_INFINITY, f64::max);
        let low = series.lows().into_iter().fold(f64::INFINITY, f64::min);
        let change = last.close - first.close;
        let pct = if first.close != 0.0 {
            Some(change / first.close * 100.0)
        } else {
            None
        };

        tickers.push(Some(ticker.clone()));
        for (col, v) in cols.iter_mut().zip([
            Some(first.close),
            Some(last.close),
            Some(change),
            pct,
            Some(high),
            Some(low),
        ]) {
            col.push(v);
        }
    }

    let mut table = Table::new();
    let _ = table.push_column("Ticker", ColumnData::Text(tickers));
    for (name, values) in ["First", "Last", "Change", "% Change", "High", "Low"]
        .into_iter()
        .zip(cols)
    {
        let _ = table.push_column(name, ColumnData::Number(values));
    }
    table
}

pub fn render_portfolio(ctx: &RequestContext<'_>) -> PageView {
    let mut page = PageView::new("Portfolio Overview");
    let tickers = ctx.selections.ticker_list();
    if tickers.is_empty() {
        page.warning("Tickers", "Enter one or more comma-separated tickers.");
        return page;
    }

    let mut loaded = Vec::new();
    for ticker in &tickers {
        match history(ctx, ticker) {
            Ok(series) if series.is_empty() => {
                page.warning(ticker.as_str(), format!("No price history for {ticker}."))
            }
            Ok(series) => loaded.push((ticker.clone(), series)),
            Err(e) => page.error(ticker.as_str(), &e),
        }
    }
    if loaded.is_empty() {
        return page;
    }

    let lines: Vec<LineSeries> = loaded.iter().map(|(t, s)| close_line(t, s)).collect();
    page.chart(
        "Portfolio Performance",
        multi_line("Portfolio Performance", &lines, Normalization::PercentChange),
    );

    let rows: Vec<(String, &OhlcvSeries)> =
        loaded.iter().map(|(t, s)| (t.clone(), s.as_ref())).collect();
    page.table("Performance", performance_table(&rows));
    page
}
