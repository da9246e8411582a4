//! Market overview: world indices, top gainers and top losers.

use findash_core::data::scraper::{GAINERS_URL, LOSERS_URL, WORLD_INDICES_URL};
use findash_core::data::{FetchKey, PriceTriple};
use findash_core::domain::Table;

use super::settle;
use crate::session::RequestContext;
use crate::view::{Metric, PageView};

/// Tiles shown above each overview table.
pub const TILE_COUNT: usize = 6;

/// Metric tiles from a scraped table: label from `Name`, value and change
/// from the `Price` cell. Rows whose price cell does not split are skipped.
pub fn price_tiles(table: &Table, rows: impl IntoIterator<Item = usize>) -> Vec<Metric> {
    rows.into_iter()
        .filter_map(|row| {
            let label = table
                .cell_text("Name", row)
                .or_else(|| table.cell_text("Symbol", row))?;
            let price = PriceTriple::parse(&table.cell_text("Price", row)?).ok()?;
            Some(
                Metric::new(label, price.value)
                    .with_delta(format!("{} {}", price.change, price.change_pct)),
            )
        })
        .collect()
}

pub fn render_overview(ctx: &RequestContext<'_>) -> PageView {
    let mut page = PageView::new("Market Overview");

    for (title, url) in [
        ("Indices", WORLD_INDICES_URL),
        ("Gainers", GAINERS_URL),
        ("Losers", LOSERS_URL),
    ] {
        let key = FetchKey::Table { url: url.to_string() };
        match settle(ctx, key, ctx.data.fetch_table(url)) {
            Ok(table) => {
                let tiles = price_tiles(&table, 0..table.height().min(TILE_COUNT));
                if !tiles.is_empty() {
                    page.metrics(format!("Top {title}"), tiles);
                }
                page.table(title, (*table).clone());
            }
            Err(e) => page.error(title, &e),
        }
    }

    page
}
