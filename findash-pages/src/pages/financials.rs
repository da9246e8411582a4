//! Financials: company header plus balance sheet, income statement and
//! cash flow, each as a table and a bar chart.

use findash_core::chart::{build_chart, ChartKind, ChartRequest};
use findash_core::data::FetchKey;
use findash_core::domain::{StatementKind, Table};

use super::settle;
use crate::session::RequestContext;
use crate::view::{Metric, PageView};

/// Bar chart of every date column against line items, oldest date first.
pub fn statement_chart_request(table: &Table, title: &str) -> ChartRequest {
    let mut request = ChartRequest::new(ChartKind::Bar, title).x("Line Item");
    for name in table.numeric_column_names().into_iter().rev() {
        request = request.y(name);
    }
    request
}

pub fn render_financials(ctx: &RequestContext<'_>) -> PageView {
    let tickers = ctx.selections.ticker_list();
    let [ticker] = tickers.as_slice() else {
        let mut page = PageView::new("Financials");
        page.warning("Ticker", "Financials only work for a single ticker.");
        return page;
    };
    let ticker = ticker.to_ascii_uppercase();
    let period = ctx.selections.statement_period;
    let mut page = PageView::new(format!("Financials: {ticker}"));

    let key = FetchKey::Info {
        symbol: ticker.clone(),
    };
    let currency = match settle(ctx, key, ctx.data.fetch_info(&ticker)) {
        Ok(info) => {
            let currency = info
                .text("financialCurrency")
                .or_else(|| info.text("currency"))
                .unwrap_or("???")
                .to_string();
            page.metrics(
                "Company",
                vec![
                    Metric::new("Name", info.text("shortName").unwrap_or_default()),
                    Metric::new("Currency", currency.clone()),
                    Metric::new("Period", period.to_string()),
                ],
            );
            currency
        }
        Err(e) => {
            // Statements still render; the header is what failed.
            page.error("Company", &e);
            "???".to_string()
        }
    };

    for kind in StatementKind::ALL {
        let heading = kind.title();
        let key = FetchKey::Statement {
            symbol: ticker.clone(),
            kind,
            period,
        };
        match settle(ctx, key, ctx.data.fetch_statement(&ticker, kind, period)) {
            Ok(table) => {
                let title = format!("{ticker} {heading} ({currency})");
                page.chart(heading, build_chart(&table, &statement_chart_request(&table, &title)));
                page.table(format!("{heading} Data"), (*table).clone());
            }
            Err(e) => page.error(heading, &e),
        }
    }
    page
}

#[cfg(test)]
mod tests {
    use super::*;
    use findash_core::domain::ColumnData;

    #[test]
    fn statement_chart_uses_oldest_date_first() {
        let table = Table::new()
            .with_column("Line Item", ColumnData::Text(vec![Some("Total Assets".into())]))
            .unwrap()
            .with_column("2024-12-31", ColumnData::Number(vec![Some(2.0)]))
            .unwrap()
            .with_column("2023-12-31", ColumnData::Number(vec![Some(1.0)]))
            .unwrap();
        let req = statement_chart_request(&table, "BS");
        assert_eq!(req.x.as_deref(), Some("Line Item"));
        assert_eq!(req.y, vec!["2023-12-31", "2024-12-31"]);
        assert!(build_chart(&table, &req).is_renderable());
    }
}
