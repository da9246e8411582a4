//! Cached market data access.
//!
//! `MarketData` wraps a provider and a table source with one memo per
//! operation. Results are shared as `Arc`s, so repeating a call returns the
//! very same value without touching the upstream.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::memo::MemoCache;
use super::provider::{DataError, MarketDataProvider};
use super::scraper::TableSource;
use crate::domain::{
    IndicatorFrame, Interval, OhlcvSeries, Period, QuoteSnapshot, StatementKind,
    StatementPeriod, Table,
};
use crate::indicators::{compute_indicators, IndicatorCode};

/// Default lifetime of macro overview closes.
pub const OVERVIEW_TTL: Duration = Duration::from_secs(600);

/// Identifies one upstream request. Every parameter that changes the
/// result is part of the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FetchKey {
    History {
        symbol: String,
        period: Period,
        interval: Interval,
    },
    Info {
        symbol: String,
    },
    Statement {
        symbol: String,
        kind: StatementKind,
        period: StatementPeriod,
    },
    Table {
        url: String,
    },
    OverviewCloses {
        symbol: String,
        period: Period,
    },
}

impl FetchKey {
    pub fn symbol(&self) -> Option<&str> {
        match self {
            FetchKey::History { symbol, .. }
            | FetchKey::Info { symbol }
            | FetchKey::Statement { symbol, .. }
            | FetchKey::OverviewCloses { symbol, .. } => Some(symbol),
            FetchKey::Table { .. } => None,
        }
    }

    pub fn url(&self) -> Option<&str> {
        match self {
            FetchKey::Table { url } => Some(url),
            _ => None,
        }
    }
}

impl fmt::Display for FetchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchKey::History {
                symbol,
                period,
                interval,
            } => write!(f, "history {symbol} {period}/{interval}"),
            FetchKey::Info { symbol } => write!(f, "info {symbol}"),
            FetchKey::Statement {
                symbol,
                kind,
                period,
            } => write!(f, "{kind} {symbol} ({period})"),
            FetchKey::Table { url } => write!(f, "table {url}"),
            FetchKey::OverviewCloses { symbol, period } => write!(f, "closes {symbol} {period}"),
        }
    }
}

/// What a refresh clears.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshScope {
    All,
    Symbol(String),
    Url(String),
    Exact(FetchKey),
}

/// Shared result of a memoized fetch.
pub type Fetched<T> = Result<Arc<T>, DataError>;

type Memo<T> = MemoCache<FetchKey, Fetched<T>>;

fn memoize<T>(memo: &Memo<T>, key: FetchKey, fetch: impl FnOnce() -> Result<T, DataError>) -> Fetched<T> {
    let result = memo.get_or_insert_with(key.clone(), || fetch().map(Arc::new));
    if let Err(e) = &result {
        tracing::warn!(key = %key, error = %e, "returning captured fetch error");
    }
    result
}

fn clear_scoped<T>(memo: &Memo<T>, symbol: Option<&str>) -> usize {
    match symbol {
        Some(s) => {
            let s = s.trim();
            memo.invalidate_where(|k| k.symbol() == Some(s))
        }
        None => {
            let n = memo.len();
            memo.clear();
            n
        }
    }
}

/// Cached fetcher: one memo per operation over a provider and a table source.
pub struct MarketData {
    provider: Box<dyn MarketDataProvider>,
    tables: Box<dyn TableSource>,
    history: Memo<OhlcvSeries>,
    info: Memo<QuoteSnapshot>,
    statements: Memo<Table>,
    scraped: Memo<Table>,
    overview: Memo<OhlcvSeries>,
}

impl MarketData {
    pub fn new(provider: Box<dyn MarketDataProvider>, tables: Box<dyn TableSource>) -> Self {
        Self::with_overview_ttl(provider, tables, OVERVIEW_TTL)
    }

    pub fn with_overview_ttl(
        provider: Box<dyn MarketDataProvider>,
        tables: Box<dyn TableSource>,
        overview_ttl: Duration,
    ) -> Self {
        Self {
            provider,
            tables,
            history: MemoCache::new(),
            info: MemoCache::new(),
            statements: MemoCache::new(),
            scraped: MemoCache::new(),
            overview: MemoCache::with_ttl(overview_ttl),
        }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn fetch_history(&self, symbol: &str, period: Period, interval: Interval) -> Fetched<OhlcvSeries> {
        let key = FetchKey::History {
            symbol: symbol.trim().to_string(),
            period,
            interval,
        };
        memoize(&self.history, key, || {
            self.provider.fetch_history(symbol, period, interval)
        })
    }

    pub fn fetch_info(&self, symbol: &str) -> Fetched<QuoteSnapshot> {
        let key = FetchKey::Info {
            symbol: symbol.trim().to_string(),
        };
        memoize(&self.info, key, || self.provider.fetch_info(symbol))
    }

    pub fn fetch_statement(
        &self,
        symbol: &str,
        kind: StatementKind,
        period: StatementPeriod,
    ) -> Fetched<Table> {
        let key = FetchKey::Statement {
            symbol: symbol.trim().to_string(),
            kind,
            period,
        };
        memoize(&self.statements, key, || {
            self.provider.fetch_statement(symbol, kind, period)
        })
    }

    pub fn fetch_balance(&self, symbol: &str, period: StatementPeriod) -> Fetched<Table> {
        self.fetch_statement(symbol, StatementKind::Balance, period)
    }

    pub fn fetch_income(&self, symbol: &str, period: StatementPeriod) -> Fetched<Table> {
        self.fetch_statement(symbol, StatementKind::Income, period)
    }

    pub fn fetch_cash(&self, symbol: &str, period: StatementPeriod) -> Fetched<Table> {
        self.fetch_statement(symbol, StatementKind::CashFlow, period)
    }

    pub fn fetch_table(&self, url: &str) -> Fetched<Table> {
        let key = FetchKey::Table {
            url: url.to_string(),
        };
        memoize(&self.scraped, key, || self.tables.fetch_table(url))
    }

    /// Daily closes for the macro overview, memoized with a TTL.
    ///
    /// When the period yields fewer than two rows, one year is fetched instead.
    pub fn fetch_overview_closes(&self, symbol: &str, period: Period) -> Fetched<OhlcvSeries> {
        let key = FetchKey::OverviewCloses {
            symbol: symbol.trim().to_string(),
            period,
        };
        memoize(&self.overview, key, || {
            let series = self.provider.fetch_history(symbol, period, Interval::OneDay)?;
            if series.len() >= 2 || period == Period::OneYear {
                return Ok(series);
            }
            tracing::debug!(symbol, %period, rows = series.len(), "short history, falling back to 1y");
            self.provider
                .fetch_history(symbol, Period::OneYear, Interval::OneDay)
        })
    }

    pub fn clear_history(&self, symbol: Option<&str>) -> usize {
        clear_scoped(&self.history, symbol)
    }

    pub fn clear_info(&self, symbol: Option<&str>) -> usize {
        clear_scoped(&self.info, symbol)
    }

    pub fn clear_statements(&self, symbol: Option<&str>) -> usize {
        clear_scoped(&self.statements, symbol)
    }

    pub fn clear_overview(&self, symbol: Option<&str>) -> usize {
        clear_scoped(&self.overview, symbol)
    }

    pub fn clear_tables(&self, url: Option<&str>) -> usize {
        match url {
            Some(u) => self.scraped.invalidate_where(|k| k.url() == Some(u)),
            None => {
                let n = self.scraped.len();
                self.scraped.clear();
                n
            }
        }
    }

    /// Drop exactly one memoized result.
    pub fn evict(&self, key: &FetchKey) -> bool {
        let removed = match key {
            FetchKey::History { .. } => self.history.invalidate(key),
            FetchKey::Info { .. } => self.info.invalidate(key),
            FetchKey::Statement { .. } => self.statements.invalidate(key),
            FetchKey::Table { .. } => self.scraped.invalidate(key),
            FetchKey::OverviewCloses { .. } => self.overview.invalidate(key),
        };
        if removed {
            tracing::debug!(key = %key, "evicted cache entry");
        }
        removed
    }

    /// Clear memoized results in `scope`. Returns how many entries were dropped.
    pub fn refresh(&self, scope: &RefreshScope) -> usize {
        let removed = match scope {
            RefreshScope::All => {
                self.clear_history(None)
                    + self.clear_info(None)
                    + self.clear_statements(None)
                    + self.clear_overview(None)
                    + self.clear_tables(None)
            }
            RefreshScope::Symbol(s) => {
                let s = Some(s.as_str());
                self.clear_history(s)
                    + self.clear_info(s)
                    + self.clear_statements(s)
                    + self.clear_overview(s)
            }
            RefreshScope::Url(u) => self.clear_tables(Some(u)),
            RefreshScope::Exact(key) => usize::from(self.evict(key)),
        };
        tracing::debug!(?scope, removed, "refreshed market data");
        removed
    }
}

/// Cache key for derived indicator frames.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IndicatorKey {
    symbol: String,
    fingerprint: String,
    codes: Vec<IndicatorCode>,
}

impl IndicatorKey {
    /// Codes are sorted and de-duplicated so selection order does not matter.
    pub fn new(series: &OhlcvSeries, codes: &[IndicatorCode]) -> Self {
        let mut codes = codes.to_vec();
        codes.sort();
        codes.dedup();
        Self {
            symbol: series.symbol().to_string(),
            fingerprint: series.fingerprint(),
            codes,
        }
    }
}

/// Memo of indicator frames keyed by series content and code set.
#[derive(Default)]
pub struct IndicatorCache {
    memo: MemoCache<IndicatorKey, Arc<IndicatorFrame>>,
}

impl IndicatorCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Indicator frame for `series` and `codes`. Columns follow the
    /// canonical code order.
    pub fn compute(&self, series: &OhlcvSeries, codes: &[IndicatorCode]) -> Arc<IndicatorFrame> {
        let key = IndicatorKey::new(series, codes);
        let canonical = key.codes.clone();
        self.memo
            .get_or_insert_with(key, || Arc::new(compute_indicators(series, &canonical)))
    }

    pub fn clear(&self) {
        self.memo.clear();
    }

    /// Drops every frame computed for `symbol`. Returns the number removed.
    pub fn clear_symbol(&self, symbol: &str) -> usize {
        let symbol = symbol.trim();
        self.memo.invalidate_where(|k| k.symbol == symbol)
    }

    pub fn len(&self) -> usize {
        self.memo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memo.is_empty()
    }
}
