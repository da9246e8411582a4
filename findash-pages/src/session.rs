//! Per-session state and the per-request context handed to page controllers.

use chrono::NaiveDateTime;
use std::sync::Arc;

use findash_core::data::{
    DataError, IndicatorCache, MarketData, MemoCache, RefreshScope,
};
use findash_core::domain::{Interval, Period, StatementPeriod, Table};
use findash_core::indicators::{parse_codes, IndicatorCode};

use crate::config::{AppRefs, Settings};

/// User selections that persist across page renders.
#[derive(Debug, Clone, PartialEq)]
pub struct Selections {
    /// Raw ticker input, comma separated.
    pub tickers: String,
    pub period: Period,
    pub interval: Interval,
    /// Menu codes as chosen (`SMA_X` resolved with `span`).
    pub indicators: Vec<String>,
    pub span: usize,
    pub statement_period: StatementPeriod,
    pub volume: bool,
    pub dark_mode: bool,
}

impl Selections {
    pub fn from_settings(settings: &Settings) -> Self {
        let d = &settings.defaults;
        Self {
            tickers: d.ticker.clone(),
            period: d.period,
            interval: d.interval,
            indicators: Vec::new(),
            span: d.span,
            statement_period: d.statement_period,
            volume: d.volume,
            dark_mode: false,
        }
    }

    /// Indicator codes with custom spans resolved; unknown codes dropped.
    pub fn indicator_codes(&self) -> Vec<IndicatorCode> {
        parse_codes(&self.indicators, self.span)
    }

    /// Distinct, non-empty tickers in input order.
    pub fn ticker_list(&self) -> Vec<String> {
        dedup_tickers(&self.tickers)
    }
}

/// Split comma-separated input, trim, drop blanks and repeats (first wins).
pub fn dedup_tickers(input: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for t in input.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if !out.iter().any(|seen| seen == t) {
            out.push(t.to_string());
        }
    }
    out
}

/// Tables loaded by the data explorer, keyed by source key.
pub type ExplorerCache = MemoCache<String, Result<Arc<Table>, DataError>>;

/// State of one dashboard session.
pub struct Session {
    pub selections: Selections,
    last_update: NaiveDateTime,
    settings: Arc<Settings>,
    refs: Arc<AppRefs>,
    data: Arc<MarketData>,
    indicators: IndicatorCache,
    explorer: ExplorerCache,
}

impl Session {
    /// Session owning a private market-data cache.
    pub fn new(settings: Arc<Settings>, refs: Arc<AppRefs>, data: MarketData) -> Self {
        Self::with_shared_data(settings, refs, Arc::new(data))
    }

    /// Session reading through a cache shared with other sessions.
    pub fn with_shared_data(
        settings: Arc<Settings>,
        refs: Arc<AppRefs>,
        data: Arc<MarketData>,
    ) -> Self {
        Self {
            selections: Selections::from_settings(&settings),
            last_update: now(),
            settings,
            refs,
            data,
            indicators: IndicatorCache::new(),
            explorer: ExplorerCache::new(),
        }
    }

    pub fn last_update(&self) -> NaiveDateTime {
        self.last_update
    }

    pub fn data(&self) -> &Arc<MarketData> {
        &self.data
    }

    /// Clear cached results in `scope` and stamp `last_update`.
    ///
    /// A full refresh also drops derived indicator frames and explorer
    /// tables; a symbol refresh drops that symbol's indicator frames. Returns how many market-data entries were dropped.
    pub fn refresh(&mut self, scope: &RefreshScope) -> usize {
        let removed = self.data.refresh(scope);
        match scope {
            RefreshScope::All => {
                self.indicators.clear();
                self.explorer.clear();
            }
            RefreshScope::Symbol(symbol) => {
                self.indicators.clear_symbol(symbol);
            }
            RefreshScope::Url(_) | RefreshScope::Exact(_) => {}
        }
        self.last_update = now();
        tracing::info!(?scope, removed, at = %self.last_update, "session refreshed");
        removed
    }

    pub fn context(&self) -> RequestContext<'_> {
        RequestContext {
            data: &self.data,
            indicators: &self.indicators,
            explorer: &self.explorer,
            selections: &self.selections,
            settings: &self.settings,
            refs: &self.refs,
        }
    }
}

fn now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

/// Borrowed view of a session for one page render.
#[derive(Clone, Copy)]
pub struct RequestContext<'a> {
    pub data: &'a MarketData,
    pub indicators: &'a IndicatorCache,
    pub explorer: &'a ExplorerCache,
    pub selections: &'a Selections,
    pub settings: &'a Settings,
    pub refs: &'a AppRefs,
}
