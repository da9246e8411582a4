//! Yahoo Finance data provider.
//!
//! History and quote fields come from the v8 chart API; statements from the
//! fundamentals-timeseries API. Yahoo has no official API and is subject to
//! unannounced format changes, which surface as `ResponseFormatChanged`.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};

use super::provider::{validate_history_request, validate_symbol, DataError, MarketDataProvider};
use crate::domain::{
    Bar, ColumnData, Interval, OhlcvSeries, Period, QuoteSnapshot, StatementKind,
    StatementPeriod, Table,
};

const CHART_BASE: &str = "https://query2.finance.yahoo.com/v8/finance/chart";
const FUNDAMENTALS_BASE: &str =
    "https://query2.finance.yahoo.com/ws/fundamentals-timeseries/v1/finance/timeseries";

/// Chart-meta field → quote snapshot field.
const META_FIELDS: &[(&str, &str)] = &[
    ("currency", "currency"),
    ("symbol", "symbol"),
    ("shortName", "shortName"),
    ("longName", "longName"),
    ("exchangeName", "exchangeName"),
    ("fullExchangeName", "fullExchangeName"),
    ("instrumentType", "instrumentType"),
    ("regularMarketPrice", "regularMarketPrice"),
    ("regularMarketDayHigh", "dayHigh"),
    ("regularMarketDayLow", "dayLow"),
    ("regularMarketVolume", "regularMarketVolume"),
    ("fiftyTwoWeekHigh", "fiftyTwoWeekHigh"),
    ("fiftyTwoWeekLow", "fiftyTwoWeekLow"),
    ("timezone", "timezone"),
];

/// Yahoo Finance v8 chart API response.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    #[serde(default)]
    meta: Map<String, Value>,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct QuoteData {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<u64>>,
}

/// Fundamentals-timeseries API response.
#[derive(Debug, Deserialize)]
struct TimeseriesResponse {
    timeseries: TimeseriesResult,
}

#[derive(Debug, Deserialize)]
struct TimeseriesResult {
    result: Option<Vec<Map<String, Value>>>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ReportedPoint {
    #[serde(rename = "asOfDate")]
    as_of_date: NaiveDate,
    #[serde(rename = "reportedValue")]
    reported_value: Option<ReportedValue>,
}

#[derive(Debug, Deserialize)]
struct ReportedValue {
    raw: Option<f64>,
}

/// HTTP settings for [`YahooProvider`].
#[derive(Debug, Clone)]
pub struct YahooConfig {
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for YahooConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".into(),
        }
    }
}

/// Yahoo Finance data provider.
pub struct YahooProvider {
    client: reqwest::blocking::Client,
}

impl YahooProvider {
    pub fn new(config: &YahooConfig) -> Result<Self, DataError> {
        let client = build_client(config)?;
        Ok(Self { client })
    }

    fn chart_url(symbol: &str, period: Period, interval: Interval) -> String {
        format!("{CHART_BASE}/{symbol}?range={period}&interval={interval}&includePrePost=false")
    }

    fn fundamentals_url(symbol: &str, kind: StatementKind, period: StatementPeriod) -> String {
        let types: Vec<String> = kind
            .line_items()
            .iter()
            .map(|item| format!("{}{item}", period.type_prefix()))
            .collect();
        let now = Utc::now().timestamp();
        format!(
            "{FUNDAMENTALS_BASE}/{symbol}?symbol={symbol}&type={}&period1=493590046&period2={now}",
            types.join(",")
        )
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str, symbol: &str) -> Result<T, DataError> {
        let resp = self.client.get(url).send().map_err(transport_error)?;
        check_status(resp.status(), resp.headers(), symbol)?;
        resp.json().map_err(|e| {
            DataError::ResponseFormatChanged(format!("failed to parse response for {symbol}: {e}"))
        })
    }

    fn fetch_chart(
        &self,
        symbol: &str,
        period: Period,
        interval: Interval,
    ) -> Result<ChartData, DataError> {
        let url = Self::chart_url(symbol, period, interval);
        let resp: ChartResponse = self.get_json(&url, symbol)?;
        first_chart(symbol, resp)
    }
}

/// Build the blocking HTTP client shared by the provider and the table scraper.
pub fn build_client(config: &YahooConfig) -> Result<reqwest::blocking::Client, DataError> {
    reqwest::blocking::Client::builder()
        .timeout(config.timeout)
        .user_agent(config.user_agent.clone())
        .build()
        .map_err(|e| DataError::Provider(format!("failed to build HTTP client: {e}")))
}

/// Map a reqwest transport failure to a [`DataError`].
pub fn transport_error(e: reqwest::Error) -> DataError {
    if e.is_connect() || e.is_timeout() {
        DataError::NetworkUnreachable(e.to_string())
    } else {
        DataError::Provider(e.to_string())
    }
}

/// Map a non-success HTTP status to a [`DataError`].
pub fn check_status(
    status: reqwest::StatusCode,
    headers: &reqwest::header::HeaderMap,
    subject: &str,
) -> Result<(), DataError> {
    use reqwest::StatusCode;

    if status.is_success() {
        return Ok(());
    }
    Err(match status {
        StatusCode::NOT_FOUND => DataError::SymbolNotFound {
            symbol: subject.to_string(),
        },
        StatusCode::TOO_MANY_REQUESTS => {
            let retry_after = headers
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(60);
            DataError::RateLimited {
                retry_after_secs: retry_after,
            }
        }
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            DataError::Provider(format!("HTTP {status}: access refused for {subject}"))
        }
        _ => DataError::Provider(format!("HTTP {status} for {subject}")),
    })
}

fn first_chart(symbol: &str, resp: ChartResponse) -> Result<ChartData, DataError> {
    let result = resp.chart.result.ok_or_else(|| match resp.chart.error {
        Some(err) if err.code == "Not Found" => DataError::SymbolNotFound {
            symbol: symbol.to_string(),
        },
        Some(err) => DataError::ResponseFormatChanged(format!("{}: {}", err.code, err.description)),
        None => DataError::ResponseFormatChanged("empty result with no error".into()),
    })?;

    result
        .into_iter()
        .next()
        .ok_or_else(|| DataError::ResponseFormatChanged("result array is empty".into()))
}

/// Convert a chart payload into bars. Rows whose OHLCV fields are all null
/// (holidays, halted sessions) are skipped.
fn chart_bars(symbol: &str, data: ChartData) -> Result<OhlcvSeries, DataError> {
    let Some(timestamps) = data.timestamp else {
        return Err(DataError::SymbolNotFound {
            symbol: symbol.to_string(),
        });
    };

    let quote = data
        .indicators
        .quote
        .into_iter()
        .next()
        .ok_or_else(|| DataError::ResponseFormatChanged("no quote data".into()))?;

    let mut bars = Vec::with_capacity(timestamps.len());
    for (i, &ts) in timestamps.iter().enumerate() {
        let timestamp = chrono::DateTime::from_timestamp(ts, 0)
            .map(|dt| dt.naive_utc())
            .ok_or_else(|| DataError::ResponseFormatChanged(format!("invalid timestamp: {ts}")))?;

        let field = |v: &[Option<f64>]| v.get(i).copied().flatten();
        bars.extend(Bar::from_nullable(
            timestamp,
            field(&quote.open),
            field(&quote.high),
            field(&quote.low),
            field(&quote.close),
            quote.volume.get(i).copied().flatten(),
        ));
    }

    if bars.is_empty() {
        return Err(DataError::SymbolNotFound {
            symbol: symbol.to_string(),
        });
    }

    Ok(OhlcvSeries::new(symbol, bars))
}

/// Map the chart `meta` block onto quote snapshot field names.
fn meta_snapshot(symbol: &str, meta: &Map<String, Value>) -> Result<QuoteSnapshot, DataError> {
    if meta.is_empty() {
        return Err(DataError::ResponseFormatChanged(format!(
            "no meta block for {symbol}"
        )));
    }

    let mut fields = BTreeMap::new();
    for (source, target) in META_FIELDS {
        if let Some(v) = meta.get(*source) {
            fields.insert((*target).to_string(), v.clone());
        }
    }
    let previous = meta
        .get("previousClose")
        .filter(|v| !v.is_null())
        .or_else(|| meta.get("chartPreviousClose"));
    if let Some(v) = previous {
        fields.insert("previousClose".to_string(), v.clone());
    }

    Ok(QuoteSnapshot::new(symbol, Utc::now().naive_utc(), fields))
}

/// Pivot a fundamentals payload into `Line Item` × as-of-date (newest first).
fn statement_table(
    symbol: &str,
    kind: StatementKind,
    period: StatementPeriod,
    resp: TimeseriesResponse,
) -> Result<Table, DataError> {
    let results = resp.timeseries.result.ok_or_else(|| match resp.timeseries.error {
        Some(err) => DataError::ResponseFormatChanged(format!("{}: {}", err.code, err.description)),
        None => DataError::ResponseFormatChanged("empty timeseries result".into()),
    })?;

    let prefix = period.type_prefix();
    let mut by_item: BTreeMap<&str, BTreeMap<NaiveDate, f64>> = BTreeMap::new();
    for entry in &results {
        for item in kind.line_items() {
            let key = format!("{prefix}{item}");
            let Some(points) = entry.get(&key).and_then(Value::as_array) else {
                continue;
            };
            for point in points.iter().filter(|p| !p.is_null()) {
                let point: ReportedPoint = serde_json::from_value(point.clone()).map_err(|e| {
                    DataError::ResponseFormatChanged(format!("bad {key} entry: {e}"))
                })?;
                if let Some(raw) = point.reported_value.and_then(|v| v.raw) {
                    by_item.entry(*item).or_default().insert(point.as_of_date, raw);
                }
            }
        }
    }

    if by_item.is_empty() {
        return Err(DataError::SymbolNotFound {
            symbol: symbol.to_string(),
        });
    }

    let mut dates: Vec<NaiveDate> = by_item.values().flat_map(|m| m.keys().copied()).collect();
    dates.sort_unstable_by(|a, b| b.cmp(a));
    dates.dedup();

    let items: Vec<&str> = kind
        .line_items()
        .iter()
        .copied()
        .filter(|i| by_item.contains_key(i))
        .collect();

    let mut table = Table::new();
    table
        .push_column(
            "Line Item",
            ColumnData::Text(items.iter().map(|i| Some(i.to_string())).collect()),
        )
        .map_err(|e| DataError::Parse(e.to_string()))?;
    for date in dates {
        let values = items
            .iter()
            .map(|i| by_item.get(i).and_then(|m| m.get(&date)).copied())
            .collect();
        table
            .push_column(date.format("%Y-%m-%d").to_string(), ColumnData::Number(values))
            .map_err(|e| DataError::Parse(e.to_string()))?;
    }
    Ok(table)
}

impl MarketDataProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn fetch_history(
        &self,
        symbol: &str,
        period: Period,
        interval: Interval,
    ) -> Result<OhlcvSeries, DataError> {
        let symbol = validate_history_request(symbol, period, interval)?;
        let data = self.fetch_chart(symbol, period, interval)?;
        let series = chart_bars(symbol, data)?;
        tracing::info!(symbol, %period, %interval, rows = series.len(), "fetched history");
        Ok(series)
    }

    fn fetch_info(&self, symbol: &str) -> Result<QuoteSnapshot, DataError> {
        let symbol = validate_symbol(symbol)?;
        let data = self.fetch_chart(symbol, Period::FiveDays, Interval::OneDay)?;
        let snapshot = meta_snapshot(symbol, &data.meta)?;
        tracing::info!(symbol, fields = snapshot.fields().len(), "fetched info");
        Ok(snapshot)
    }

    fn fetch_statement(
        &self,
        symbol: &str,
        kind: StatementKind,
        period: StatementPeriod,
    ) -> Result<Table, DataError> {
        let symbol = validate_symbol(symbol)?;
        let url = Self::fundamentals_url(symbol, kind, period);
        let resp: TimeseriesResponse = self.get_json(&url, symbol)?;
        let table = statement_table(symbol, kind, period, resp)?;
        tracing::info!(symbol, statement = %kind, %period, rows = table.height(), "fetched statement");
        Ok(table)
    }
}
