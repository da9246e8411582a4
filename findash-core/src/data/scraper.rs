//! HTML table scraper for market summary pages.
//!
//! Best effort: the first `<table>` with a header row and at least one
//! matching body row wins. Cells keep their display text.

use scraper::{ElementRef, Html, Selector};

use super::provider::DataError;
use super::yahoo::{build_client, check_status, transport_error, YahooConfig};
use crate::domain::{ColumnData, Table};

pub const WORLD_INDICES_URL: &str = "https://finance.yahoo.com/markets/world-indices/";
pub const GAINERS_URL: &str = "https://finance.yahoo.com/markets/stocks/gainers/";
pub const LOSERS_URL: &str = "https://finance.yahoo.com/markets/stocks/losers/";
pub const CURRENCIES_URL: &str = "https://finance.yahoo.com/markets/currencies/";
pub const CRYPTO_URL: &str = "https://finance.yahoo.com/markets/crypto/all/";

/// Columns every scraped market table must carry.
pub const REQUIRED_COLUMNS: [&str; 3] = ["Symbol", "Name", "Price"];

/// Source of scraped tables, keyed by page URL.
pub trait TableSource: Send + Sync {
    fn fetch_table(&self, url: &str) -> Result<Table, DataError>;
}

/// Fetches pages over HTTP and parses their first table.
pub struct HttpTableSource {
    client: reqwest::blocking::Client,
}

impl HttpTableSource {
    pub fn new(config: &YahooConfig) -> Result<Self, DataError> {
        Ok(Self {
            client: build_client(config)?,
        })
    }
}

impl TableSource for HttpTableSource {
    fn fetch_table(&self, url: &str) -> Result<Table, DataError> {
        let resp = self.client.get(url).send().map_err(transport_error)?;
        check_status(resp.status(), resp.headers(), url)?;
        let html = resp.text().map_err(transport_error)?;
        let table = parse_first_table(&html)?;
        tracing::info!(url, rows = table.height(), "scraped table");
        Ok(table)
    }
}

fn selector(css: &str) -> Result<Selector, DataError> {
    Selector::parse(css).map_err(|e| DataError::Parse(format!("bad selector '{css}': {e}")))
}

/// Whitespace-normalised text of every descendant text node.
fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn header_names(cells: Vec<String>) -> Vec<String> {
    let mut names: Vec<String> = Vec::with_capacity(cells.len());
    for (i, cell) in cells.into_iter().enumerate() {
        let base = if cell.is_empty() {
            format!("Column{i}")
        } else {
            cell
        };
        let mut name = base.clone();
        let mut n = 1;
        while names.contains(&name) {
            name = format!("{base}_{n}");
            n += 1;
        }
        names.push(name);
    }
    names
}

/// Parse the first usable table of an HTML document.
///
/// Errors with `DataError::Parse` when no table qualifies or the chosen
/// table lacks `Symbol`, `Name` or `Price`.
pub fn parse_first_table(html: &str) -> Result<Table, DataError> {
    let doc = Html::parse_document(html);
    let table_sel = selector("table")?;
    let row_sel = selector("tr")?;
    let th_sel = selector("th")?;
    let td_sel = selector("td")?;

    for table in doc.select(&table_sel) {
        let mut rows = table.select(&row_sel);
        let Some(header_row) = rows.by_ref().find(|r| r.select(&th_sel).next().is_some()) else {
            continue;
        };
        let header = header_names(header_row.select(&th_sel).map(cell_text).collect());

        let body: Vec<Vec<String>> = rows
            .map(|r| r.select(&td_sel).map(cell_text).collect::<Vec<_>>())
            .filter(|cells| cells.len() == header.len())
            .collect();
        if body.is_empty() {
            continue;
        }

        let missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|c| !header.iter().any(|h| h == c))
            .collect();
        if !missing.is_empty() {
            return Err(DataError::Parse(format!(
                "table is missing columns: {}",
                missing.join(", ")
            )));
        }

        let mut out = Table::new();
        for (i, name) in header.into_iter().enumerate() {
            let values = body
                .iter()
                .map(|r| Some(r[i].clone()).filter(|s| !s.is_empty()))
                .collect();
            out.push_column(name, ColumnData::Text(values))
                .map_err(|e| DataError::Parse(e.to_string()))?;
        }
        return Ok(out);
    }

    Err(DataError::Parse("no table with a header and body rows".into()))
}

/// A scraped `Price` cell: `"<value> <abs change> <pct change>"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceTriple {
    pub value: String,
    pub change: String,
    pub change_pct: String,
}

impl PriceTriple {
    pub fn parse(cell: &str) -> Result<Self, DataError> {
        let mut parts = cell.split_whitespace();
        match (parts.next(), parts.next(), parts.next()) {
            (Some(value), Some(change), Some(change_pct)) => Ok(Self {
                value: value.to_string(),
                change: change.to_string(),
                change_pct: change_pct.to_string(),
            }),
            _ => Err(DataError::Parse(format!(
                "price cell '{cell}' does not hold value, change and percent change"
            ))),
        }
    }
}
