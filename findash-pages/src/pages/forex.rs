//! Forex: currency pairs against a quote currency, plus top currency and
//! crypto tiles.

use findash_core::chart::{candlestick_with_studies, multi_line, LineSeries, Normalization};
use findash_core::data::scraper::{CRYPTO_URL, CURRENCIES_URL};
use findash_core::data::FetchKey;
use findash_core::domain::Table;

use super::overview::{price_tiles, TILE_COUNT};
use super::{close_line, fmt_dp, history, settle, studies_table};
use crate::config::AppRefs;
use crate::session::RequestContext;
use crate::view::{Metric, PageView};

/// Pair symbols looked up on the currencies page for the tiles.
pub const TOP_CURRENCIES: [&str; 9] = [
    "EURUSD=X", "JPY=X", "GBPUSD=X", "AUDUSD=X", "CNY=X", "MXN=X", "INR=X", "SGD=X", "ZAR=X",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForexParams {
    pub bases: Vec<String>,
    pub quote: String,
}

impl Default for ForexParams {
    fn default() -> Self {
        Self {
            bases: vec!["EUR".into()],
            quote: "USD".into(),
        }
    }
}

/// Provider symbol of a pair: `BASE-QUOTE` for crypto bases, else `BASEQUOTE=X`.
pub fn pair_ticker(refs: &AppRefs, base: &str, quote: &str) -> String {
    let base = base.trim().to_ascii_uppercase();
    let quote = quote.trim().to_ascii_uppercase();
    if refs.forex.cryptos.iter().any(|c| c.eq_ignore_ascii_case(&base)) {
        format!("{base}-{quote}")
    } else {
        format!("{base}{quote}=X")
    }
}

fn rows_with_symbols(table: &Table, symbols: &[&str]) -> Vec<usize> {
    symbols
        .iter()
        .filter_map(|sym| (0..table.height()).find(|&r| table.cell_text("Symbol", r).as_deref() == Some(*sym)))
        .collect()
}

fn top_tiles(ctx: &RequestContext<'_>, page: &mut PageView) {
    let url = CURRENCIES_URL;
    match settle(ctx, FetchKey::Table { url: url.into() }, ctx.data.fetch_table(url)) {
        Ok(t) => {
            let rows = rows_with_symbols(&t, &TOP_CURRENCIES[..TILE_COUNT]);
            page.metrics("Top Currencies", price_tiles(&t, rows));
        }
        Err(e) => page.error("Top Currencies", &e),
    }

    let url = CRYPTO_URL;
    match settle(ctx, FetchKey::Table { url: url.into() }, ctx.data.fetch_table(url)) {
        Ok(t) => page.metrics("Top Cryptos", price_tiles(&t, 0..t.height().min(TILE_COUNT))),
        Err(e) => page.error("Top Cryptos", &e),
    }
}

fn single_pair(ctx: &RequestContext<'_>, page: &mut PageView, base: &str, quote: &str) {
    let ticker = pair_ticker(ctx.refs, base, quote);
    let label = format!("{base}/{quote}");

    let key = FetchKey::Info {
        symbol: ticker.clone(),
    };
    match settle(ctx, key, ctx.data.fetch_info(&ticker)) {
        Ok(info) => {
            let field = |name: &str| fmt_dp(info.number(name).unwrap_or(0.0), 4);
            page.metrics(
                label.clone(),
                vec![
                    Metric::new("Exchange Rate", field("previousClose")),
                    Metric::new("Bid Price", field("dayLow")),
                    Metric::new("Ask Price", field("dayHigh")),
                ],
            );
        }
        Err(e) => page.error(label.clone(), &e),
    }

    match history(ctx, &ticker) {
        Ok(series) => {
            let mut table = studies_table(ctx, &series);
            table.drop_column("Volume");
            let title = format!("{label} Candlestick Chart");
            page.chart(title.clone(), candlestick_with_studies(&table, &title, quote));
            page.table("Data", table);
        }
        Err(e) => page.error(format!("{label} History"), &e),
    }
}

fn compare_pairs(ctx: &RequestContext<'_>, page: &mut PageView, bases: &[String], quote: &str) {
    let mut lines: Vec<LineSeries> = Vec::new();
    for base in bases {
        let ticker = pair_ticker(ctx.refs, base, quote);
        match history(ctx, &ticker) {
            Ok(series) => lines.push(close_line(base, &series)),
            Err(e) => page.error(base.as_str(), &e),
        }
    }
    if !lines.is_empty() {
        let title = format!("Performance against {quote}");
        page.chart(title.clone(), multi_line(&title, &lines, Normalization::PercentChange));
    }
}

pub fn render_forex(ctx: &RequestContext<'_>, params: &ForexParams) -> PageView {
    let quote = params.quote.trim().to_ascii_uppercase();
    let mut bases: Vec<String> = Vec::new();
    for b in &params.bases {
        let b = b.trim().to_ascii_uppercase();
        if !b.is_empty() && b != quote && !bases.contains(&b) {
            bases.push(b);
        }
    }

    let mut page = PageView::new(match bases.as_slice() {
        [base] => format!("Forex: {base}/{quote}"),
        _ => format!("Forex: {quote}"),
    });
    top_tiles(ctx, &mut page);

    match bases.as_slice() {
        [] => page.warning("Pairs", "Select at least one base currency different from the quote."),
        [base] => single_pair(ctx, &mut page, base, &quote),
        many => compare_pairs(ctx, &mut page, many, &quote),
    }
    page
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crypto_bases_use_dash() {
        let refs = AppRefs::default();
        assert_eq!(pair_ticker(&refs, "eur", "usd"), "EURUSD=X");
        assert_eq!(pair_ticker(&refs, "BTC", "EUR"), "BTC-EUR");
        assert_eq!(pair_ticker(&refs, "usdt", "USD"), "USDT-USD");
    }
}
