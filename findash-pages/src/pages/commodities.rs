//! Commodities: one instrument picked by category and label from app refs.

use findash_core::chart::candlestick_with_studies;
use findash_core::domain::{ColumnData, Table};

use super::{history, pct_change, studies_table};
use crate::session::RequestContext;
use crate::view::PageView;

/// Column added when volume is shown.
pub const VOLUME_CHANGE_COLUMN: &str = "ΔVolume%";

/// Category and label within app refs; `None` picks the first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommodityParams {
    pub category: Option<String>,
    pub label: Option<String>,
}

/// Volume on: add percent change of volume. Volume off: drop it.
pub fn apply_volume_toggle(table: &mut Table, volume: bool) {
    if !volume {
        table.drop_column("Volume");
        return;
    }
    if let Some(v) = table.numbers("Volume") {
        let change = pct_change(v);
        let _ = table.push_column(VOLUME_CHANGE_COLUMN, ColumnData::Number(change));
    }
}

pub fn render_commodities(ctx: &RequestContext<'_>, params: &CommodityParams) -> PageView {
    let refs = ctx.refs;
    let category = params
        .category
        .clone()
        .or_else(|| refs.commodities.keys().next().cloned());
    let Some(category) = category else {
        let mut page = PageView::new("Commodity Market");
        page.warning("Category", "No commodity categories are configured.");
        return page;
    };
    let Some(labels) = refs.commodities.get(&category) else {
        let mut page = PageView::new("Commodity Market");
        page.warning("Category", format!("Unknown commodity category '{category}'."));
        return page;
    };

    let picked = match &params.label {
        Some(label) => labels.get_key_value(label),
        None => labels.iter().next(),
    };
    let Some((label, ticker)) = picked else {
        let mut page = PageView::new(format!("Commodity Market: {category}"));
        page.warning("Commodity", format!("No such commodity in '{category}'."));
        return page;
    };

    let mut page = PageView::new(format!("Commodity Market: {label}"));
    match history(ctx, ticker) {
        Ok(series) => {
            let mut table = studies_table(ctx, &series);
            apply_volume_toggle(&mut table, ctx.selections.volume);
            page.chart(
                "Candlestick Chart",
                candlestick_with_studies(&table, &format!("{label} ({ticker})"), ""),
            );
            page.table("Data", table);
        }
        Err(e) => page.error(format!("{label} History"), &e),
    }
    page
}
