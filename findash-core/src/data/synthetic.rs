//! Deterministic offline provider.
//!
//! Bars are a seeded random walk (seed = BLAKE3 of the symbol), so the same
//! symbol always produces the same history for a given anchor time.

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Utc, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::json;

use super::provider::{validate_history_request, validate_symbol, DataError, MarketDataProvider};
use crate::domain::{
    Bar, ColumnData, Interval, OhlcvSeries, Period, QuoteSnapshot, StatementKind,
    StatementPeriod, Table,
};

/// Upper bound on generated bars per request.
const MAX_BARS: u64 = 5_000;

/// Span generated for `Period::Max`.
const MAX_PERIOD_DAYS: i64 = 20 * 365;

pub struct SyntheticProvider {
    anchor: NaiveDateTime,
}

impl SyntheticProvider {
    /// Histories end at the start of the current UTC day.
    pub fn new() -> Self {
        let today = Utc::now().date_naive();
        Self::anchored(today.and_time(chrono::NaiveTime::MIN))
    }

    /// Histories end at `anchor`.
    pub fn anchored(anchor: NaiveDateTime) -> Self {
        Self { anchor }
    }

    fn rng(symbol: &str) -> StdRng {
        let seed: [u8; 32] = *blake3::hash(symbol.as_bytes()).as_bytes();
        StdRng::from_seed(seed)
    }

    fn span(&self, period: Period) -> Duration {
        match period {
            Period::Max => Duration::days(MAX_PERIOD_DAYS),
            Period::YearToDate => {
                let jan1 = NaiveDate::from_ymd_opt(self.anchor.year(), 1, 1)
                    .map(|d| d.and_time(chrono::NaiveTime::MIN))
                    .unwrap_or(self.anchor);
                (self.anchor - jan1).max(Duration::days(1))
            }
            other => Duration::minutes(other.span_minutes().unwrap_or(0) as i64),
        }
    }

    fn timestamps(&self, period: Period, interval: Interval) -> Vec<NaiveDateTime> {
        let step = interval.minutes();
        let steps = (self.span(period).num_minutes().max(0) as u64 / step).min(MAX_BARS);
        (0..steps)
            .rev()
            .map(|k| self.anchor - Duration::minutes((k * step) as i64))
            .filter(|t| {
                interval.minutes() > 24 * 60 || !matches!(t.weekday(), Weekday::Sat | Weekday::Sun)
            })
            .collect()
    }
}

impl Default for SyntheticProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn random_walk(symbol: &str, timestamps: Vec<NaiveDateTime>, volatility: f64) -> Vec<Bar> {
    let mut rng = SyntheticProvider::rng(symbol);
    let mut price: f64 = rng.gen_range(20.0..400.0);

    timestamps
        .into_iter()
        .map(|timestamp| {
            let ret: f64 = rng.gen_range(-volatility..volatility);
            let open = price;
            let close = price * (1.0 + ret);
            let high = open.max(close) * (1.0 + rng.gen_range(0.0..volatility / 3.0));
            let low = open.min(close) * (1.0 - rng.gen_range(0.0..volatility / 3.0));
            let volume = rng.gen_range(500_000..5_000_000u64);
            price = close;
            Bar {
                timestamp,
                open,
                high,
                low,
                close,
                volume,
            }
        })
        .collect()
}

/// Quote currency implied by a symbol (`EURUSD=X` → USD, `BTC-EUR` → EUR).
fn implied_currency(symbol: &str) -> &str {
    if let Some(pair) = symbol.strip_suffix("=X") {
        if pair.len() == 6 && pair.is_ascii() {
            return &pair[3..];
        }
    }
    if let Some((_, quote)) = symbol.split_once('-') {
        if quote.len() == 3 {
            return quote;
        }
    }
    "USD"
}

impl MarketDataProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch_history(
        &self,
        symbol: &str,
        period: Period,
        interval: Interval,
    ) -> Result<OhlcvSeries, DataError> {
        let symbol = validate_history_request(symbol, period, interval)?;
        // Intraday moves are smaller than daily ones.
        let volatility = if interval.is_intraday() { 0.004 } else { 0.03 };
        let bars = random_walk(symbol, self.timestamps(period, interval), volatility);
        if bars.is_empty() {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }
        tracing::info!(symbol, %period, %interval, rows = bars.len(), "generated history");
        Ok(OhlcvSeries::new(symbol, bars))
    }

    fn fetch_info(&self, symbol: &str) -> Result<QuoteSnapshot, DataError> {
        let symbol = validate_symbol(symbol)?;
        let recent = self.fetch_history(symbol, Period::FiveDays, Interval::OneDay)?;
        let bars = recent.bars();
        let (Some(last), prev) = (bars.last(), bars.len().checked_sub(2).map(|i| &bars[i]))
        else {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        };
        let year = self.fetch_history(symbol, Period::OneYear, Interval::OneDay)?;
        let high52 = year.highs().into_iter().fold(f64::NAN, f64::max);
        let low52 = year.lows().into_iter().fold(f64::NAN, f64::min);

        let mut fields = BTreeMap::new();
        fields.insert("symbol".into(), json!(symbol));
        fields.insert("shortName".into(), json!(symbol));
        fields.insert("longName".into(), json!(format!("{symbol} (synthetic)")));
        fields.insert("currency".into(), json!(implied_currency(symbol)));
        fields.insert("financialCurrency".into(), json!(implied_currency(symbol)));
        fields.insert("exchangeName".into(), json!("SYN"));
        fields.insert("instrumentType".into(), json!("EQUITY"));
        fields.insert("regularMarketPrice".into(), json!(last.close));
        fields.insert(
            "previousClose".into(),
            json!(prev.map_or(last.open, |b| b.close)),
        );
        fields.insert("dayHigh".into(), json!(last.high));
        fields.insert("dayLow".into(), json!(last.low));
        fields.insert("regularMarketVolume".into(), json!(last.volume));
        fields.insert("fiftyTwoWeekHigh".into(), json!(high52));
        fields.insert("fiftyTwoWeekLow".into(), json!(low52));

        Ok(QuoteSnapshot::new(symbol, Utc::now().naive_utc(), fields))
    }

    fn fetch_statement(
        &self,
        symbol: &str,
        kind: StatementKind,
        period: StatementPeriod,
    ) -> Result<Table, DataError> {
        let symbol = validate_symbol(symbol)?;
        let mut rng = Self::rng(&format!("{symbol}/{kind}/{period}"));

        let anchor = self.anchor.date();
        let dates: Vec<NaiveDate> = (1..=4)
            .filter_map(|k| match period {
                StatementPeriod::Annual => NaiveDate::from_ymd_opt(anchor.year() - k, 12, 31),
                StatementPeriod::Quarterly => {
                    let quarter_end_month = ((anchor.month0() / 3) * 3) as i32;
                    let months_back = quarter_end_month - 3 * (k - 1);
                    let (y, m) = (
                        anchor.year() + (months_back - 1).div_euclid(12),
                        (months_back - 1).rem_euclid(12) as u32 + 1,
                    );
                    NaiveDate::from_ymd_opt(y, m, 1)
                        .and_then(|d| d.checked_add_months(chrono::Months::new(1)))
                        .and_then(|d| d.pred_opt())
                }
            })
            .collect();

        let items = kind.line_items();
        let mut table = Table::new();
        table
            .push_column(
                "Line Item",
                ColumnData::Text(items.iter().map(|i| Some(i.to_string())).collect()),
            )
            .map_err(|e| DataError::Local(e.to_string()))?;
        for date in dates {
            let values = items
                .iter()
                .map(|_| Some((rng.gen_range(-5.0e9..5.0e10_f64)).round()))
                .collect();
            table
                .push_column(date.format("%Y-%m-%d").to_string(), ColumnData::Number(values))
                .map_err(|e| DataError::Local(e.to_string()))?;
        }
        Ok(table)
    }
}
