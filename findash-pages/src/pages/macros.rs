//! Macro dashboard: instruments from one category and region, rebased to
//! 100 on a shared date axis.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use findash_core::chart::{multi_line, AxisData, LineSeries, Normalization};
use findash_core::data::FetchKey;
use findash_core::domain::{ColumnData, OhlcvSeries, Period, Table};

use super::settle;
use crate::config::{AppRefs, InstrumentTree};
use crate::session::RequestContext;
use crate::view::PageView;

/// Region of categories that are not split by region.
pub const GLOBAL_REGION: &str = "Global";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MacroCategory {
    InterestRates,
    Inflation,
    FxRates,
    Commodities,
    EconomicIndicators,
    Indices,
    Debt,
}

impl MacroCategory {
    pub const ALL: [MacroCategory; 7] = [
        MacroCategory::InterestRates,
        MacroCategory::Inflation,
        MacroCategory::FxRates,
        MacroCategory::Commodities,
        MacroCategory::EconomicIndicators,
        MacroCategory::Indices,
        MacroCategory::Debt,
    ];

    /// Key of the category in the app refs `macros` map.
    pub fn key(&self) -> &'static str {
        match self {
            MacroCategory::InterestRates => "interest_rates",
            MacroCategory::Inflation => "inflation",
            MacroCategory::FxRates => "fx_rates",
            MacroCategory::Commodities => "commodities",
            MacroCategory::EconomicIndicators => "economic_indicators",
            MacroCategory::Indices => "indices",
            MacroCategory::Debt => "debt",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MacroCategory::InterestRates => "Interest Rates",
            MacroCategory::Inflation => "Inflation",
            MacroCategory::FxRates => "FX Rates",
            MacroCategory::Commodities => "Commodities",
            MacroCategory::EconomicIndicators => "Economic Indicators",
            MacroCategory::Indices => "Indices",
            MacroCategory::Debt => "Debt",
        }
    }

    fn by_region(&self) -> bool {
        matches!(
            self,
            MacroCategory::InterestRates
                | MacroCategory::EconomicIndicators
                | MacroCategory::Indices
                | MacroCategory::Debt
        )
    }

    /// Regions offered for this category, sorted.
    pub fn regions(&self, refs: &AppRefs) -> Vec<String> {
        let group = refs.macro_tree(self.key()).and_then(InstrumentTree::as_group);
        match (self, group) {
            (c, Some(g)) if c.by_region() => g.keys().cloned().collect(),
            // Inflation entries are keyed "<region> CPI".
            (MacroCategory::Inflation, Some(g)) => g
                .keys()
                .filter_map(|k| k.strip_suffix(" CPI"))
                .map(str::to_string)
                .collect(),
            _ => vec![GLOBAL_REGION.to_string()],
        }
    }

    /// `(label, ticker)` pairs for a region, nested groups flattened.
    pub fn instruments(&self, refs: &AppRefs, region: &str) -> Vec<(String, String)> {
        let Some(tree) = refs.macro_tree(self.key()) else {
            return Vec::new();
        };
        let Some(group) = tree.as_group() else {
            return tree.flatten(self.label());
        };
        if self.by_region() {
            return group
                .get(region)
                .map(|t| t.flatten(region))
                .unwrap_or_default();
        }
        if *self == MacroCategory::Inflation {
            let key = format!("{region} CPI");
            return group.get(&key).map(|t| t.flatten(&key)).unwrap_or_default();
        }
        tree.flatten(self.label())
    }
}

impl fmt::Display for MacroCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for MacroCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        MacroCategory::ALL
            .into_iter()
            .find(|c| c.key() == wanted)
            .ok_or_else(|| format!("unknown macro category '{s}'"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroParams {
    pub category: MacroCategory,
    /// `None` picks `US` when offered, else the first region.
    pub region: Option<String>,
    /// Instrument labels; empty picks the first instrument.
    pub instruments: Vec<String>,
    pub period: Period,
}

impl Default for MacroParams {
    fn default() -> Self {
        Self {
            category: MacroCategory::InterestRates,
            region: None,
            instruments: Vec::new(),
            period: Period::OneMonth,
        }
    }
}

/// Outer join of closing prices on timestamp: `Date` plus one column per name.
pub fn join_closes(named: &[(String, &OhlcvSeries)]) -> Table {
    let mut rows: BTreeMap<NaiveDateTime, Vec<Option<f64>>> = BTreeMap::new();
    for (i, (_, series)) in named.iter().enumerate() {
        for bar in series.bars() {
            let row = rows
                .entry(bar.timestamp)
                .or_insert_with(|| vec![None; named.len()]);
            row[i] = Some(bar.close);
        }
    }

    let mut table = Table::new();
    let _ = table.push_column(
        "Date",
        ColumnData::Timestamp(rows.keys().map(|t| Some(*t)).collect()),
    );
    for (i, (name, _)) in named.iter().enumerate() {
        let values = rows.values().map(|r| r[i]).collect();
        if let Err(e) = table.push_column(name.clone(), ColumnData::Number(values)) {
            tracing::warn!(instrument = %name, error = %e, "skipping column");
        }
    }
    table
}

fn pick_region(params: &MacroParams, regions: &[String]) -> Option<String> {
    match &params.region {
        Some(r) => Some(r.clone()),
        None => regions
            .iter()
            .find(|r| r.as_str() == "US")
            .or_else(|| regions.first())
            .cloned(),
    }
}

pub fn render_macro(ctx: &RequestContext<'_>, params: &MacroParams) -> PageView {
    let category = params.category;
    let mut page = PageView::new(format!("Macro Dashboard: {category}"));

    if params.period == Period::OneDay {
        page.warning("Period", "Pick a period longer than one day.");
        return page;
    }

    let regions = category.regions(ctx.refs);
    let region = pick_region(params, &regions).unwrap_or_else(|| GLOBAL_REGION.to_string());
    let available = category.instruments(ctx.refs, &region);
    let selected: Vec<&(String, String)> = if params.instruments.is_empty() {
        available.iter().take(1).collect()
    } else {
        available
            .iter()
            .filter(|(label, _)| params.instruments.iter().any(|w| w == label))
            .collect()
    };
    if selected.is_empty() {
        page.info("Instruments", format!("No data available for {category} ({region})"));
        return page;
    }

    let mut loaded = Vec::new();
    for (label, ticker) in selected {
        let key = FetchKey::OverviewCloses {
            symbol: ticker.trim().to_string(),
            period: params.period,
        };
        match settle(ctx, key, ctx.data.fetch_overview_closes(ticker, params.period)) {
            Ok(series) if !series.is_empty() => loaded.push((label.clone(), series)),
            Ok(_) => page.warning(label.as_str(), format!("No closes for {label} ({ticker}).")),
            Err(e) => page.error(label.as_str(), &e),
        }
    }
    if loaded.is_empty() {
        return page;
    }

    let named: Vec<(String, &OhlcvSeries)> =
        loaded.iter().map(|(l, s)| (l.clone(), s.as_ref())).collect();
    let table = join_closes(&named);

    let x = table
        .column("Date")
        .map(|c| AxisData::from_column(&c.data))
        .unwrap_or_else(|| AxisData::index(table.height()));
    let lines: Vec<LineSeries> = named
        .iter()
        .filter_map(|(name, _)| {
            table
                .numbers(name)
                .map(|v| LineSeries::new(name.clone(), x.clone(), v.to_vec()))
        })
        .collect();

    page.table(format!("{category} Data Table"), table);
    page.chart(
        format!("{category} (normalized to 100)"),
        multi_line(&format!("{category} ({region})"), &lines, Normalization::Rebase100),
    );
    page
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use findash_core::domain::Bar;

    fn refs() -> AppRefs {
        AppRefs::from_json(
            r#"{"macros": {
                "interest_rates": {"US": {"10Y": "^TNX"}, "EU": {"Bund": "DE10Y"}},
                "inflation": {"US CPI": "CPI", "EU CPI": "HICP"},
                "fx_rates": {"EUR/USD": "EURUSD=X", "Majors": {"USD/JPY": "JPY=X"}}
            }}"#,
        )
        .unwrap()
    }

    #[test]
    fn category_names_parse() {
        assert_eq!("Interest Rates".parse::<MacroCategory>(), Ok(MacroCategory::InterestRates));
        assert_eq!("fx-rates".parse::<MacroCategory>(), Ok(MacroCategory::FxRates));
        assert!("weather".parse::<MacroCategory>().is_err());
    }

    #[test]
    fn regions_and_instruments() {
        let refs = refs();
        assert_eq!(MacroCategory::InterestRates.regions(&refs), vec!["EU", "US"]);
        assert_eq!(MacroCategory::Inflation.regions(&refs), vec!["EU", "US"]);
        assert_eq!(MacroCategory::FxRates.regions(&refs), vec![GLOBAL_REGION]);
        assert_eq!(
            MacroCategory::Inflation.instruments(&refs, "US"),
            vec![("US CPI".to_string(), "CPI".to_string())]
        );
        assert_eq!(
            MacroCategory::FxRates.instruments(&refs, GLOBAL_REGION),
            vec![
                ("EUR/USD".to_string(), "EURUSD=X".to_string()),
                ("USD/JPY".to_string(), "JPY=X".to_string()),
            ]
        );
        assert!(MacroCategory::Debt.instruments(&refs, "US").is_empty());
    }

    fn series(days: &[u32], closes: &[f64]) -> OhlcvSeries {
        let bars = days
            .iter()
            .zip(closes)
            .map(|(&d, &c)| Bar {
                timestamp: NaiveDate::from_ymd_opt(2024, 1, d)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap(),
                open: c,
                high: c,
                low: c,
                close: c,
                volume: 0,
            })
            .collect();
        OhlcvSeries::new("X", bars)
    }

    #[test]
    fn closes_outer_join_on_date() {
        let a = series(&[2, 3], &[1.0, 2.0]);
        let b = series(&[3, 4], &[10.0, 20.0]);
        let table = join_closes(&[("A".into(), &a), ("B".into(), &b)]);
        assert_eq!(table.height(), 3);
        assert_eq!(table.numbers("A").unwrap(), &[Some(1.0), Some(2.0), None]);
        assert_eq!(table.numbers("B").unwrap(), &[None, Some(10.0), Some(20.0)]);
    }
}
