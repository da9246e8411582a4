//! Securities analysis: quote info, candlestick with studies and raw data
//! for exactly one ticker.

use findash_core::chart::candlestick_with_studies;
use findash_core::data::FetchKey;

use super::{history, settle, studies_table};
use crate::session::RequestContext;
use crate::view::PageView;

const DEFAULT_CURRENCY: &str = "USD";

pub fn render_security(ctx: &RequestContext<'_>) -> PageView {
    let mut page = PageView::new("Securities Analysis");
    let tickers = ctx.selections.ticker_list();
    let [ticker] = tickers.as_slice() else {
        page.warning("Ticker", "Securities Analysis only works for a single ticker.");
        return page;
    };

    let key = FetchKey::Info {
        symbol: ticker.clone(),
    };
    let currency = match settle(ctx, key, ctx.data.fetch_info(ticker)) {
        Ok(info) => {
            page.table(format!("{ticker} Info"), info.to_table());
            info.text("currency").unwrap_or(DEFAULT_CURRENCY).to_string()
        }
        Err(e) => {
            page.error(format!("{ticker} Info"), &e);
            DEFAULT_CURRENCY.to_string()
        }
    };

    match history(ctx, ticker) {
        Ok(series) => {
            let table = studies_table(ctx, &series);
            page.chart(
                format!("{ticker} Candlestick"),
                candlestick_with_studies(&table, &format!("{ticker} Candlestick"), &currency),
            );
            page.table("Data", table);
        }
        Err(e) => page.error(format!("{ticker} History"), &e),
    }

    page
}
