//! Page controllers end to end over a deterministic provider.
//!
//! Checks:
//! 1. A failed fetch renders as an Error notice and is retried next render
//! 2. Single-ticker pages refuse ticker lists
//! 3. Scraped tables become metric tiles
//! 4. The explorer reads CSV files and SQLite tables from the data folder
//! 5. Macro closes are joined on date

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use findash_core::data::{DataError, MarketData, MarketDataProvider, SyntheticProvider, TableSource};
use findash_core::domain::{
    ColumnData, Interval, OhlcvSeries, Period, QuoteSnapshot, StatementKind, StatementPeriod, Table,
};
use findash_pages::pages::explorer::{CHANGE_COLUMN, VS_AVERAGE_COLUMN};
use findash_pages::{
    available_sources, render_explorer, render_financials, render_macro, render_overview,
    render_portfolio, render_security, AppRefs, ExplorerParams, ExplorerSource, MacroCategory,
    MacroParams, NoticeLevel, SectionBody, Session, Settings,
};

// ── Helpers ──────────────────────────────────────────────────────────

/// Synthetic data with a switch that makes every call fail.
struct FlakyProvider {
    inner: SyntheticProvider,
    failing: Arc<AtomicBool>,
    history_calls: Arc<AtomicUsize>,
}

impl FlakyProvider {
    fn check(&self) -> Result<(), DataError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(DataError::NetworkUnreachable("connection refused".into()))
        } else {
            Ok(())
        }
    }
}

impl MarketDataProvider for FlakyProvider {
    fn name(&self) -> &str {
        "flaky"
    }

    fn fetch_history(
        &self,
        symbol: &str,
        period: Period,
        interval: Interval,
    ) -> Result<OhlcvSeries, DataError> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.inner.fetch_history(symbol, period, interval)
    }

    fn fetch_info(&self, symbol: &str) -> Result<QuoteSnapshot, DataError> {
        self.check()?;
        self.inner.fetch_info(symbol)
    }

    fn fetch_statement(
        &self,
        symbol: &str,
        kind: StatementKind,
        period: StatementPeriod,
    ) -> Result<Table, DataError> {
        self.check()?;
        self.inner.fetch_statement(symbol, kind, period)
    }
}

/// Every URL serves the same two-row market table.
struct StubTables;

impl TableSource for StubTables {
    fn fetch_table(&self, _url: &str) -> Result<Table, DataError> {
        let text = |v: &[&str]| ColumnData::Text(v.iter().map(|s| Some(s.to_string())).collect());
        Table::new()
            .with_column("Symbol", text(&["^GSPC", "^IXIC"]))
            .and_then(|t| t.with_column("Name", text(&["S&P 500", "NASDAQ Composite"])))
            .and_then(|t| {
                t.with_column(
                    "Price",
                    text(&["5,431.60 +10.12 (+0.19%)", "17,688.88 -21.32 (-0.12%)"]),
                )
            })
            .map_err(|e| DataError::Parse(e.to_string()))
    }
}

struct Harness {
    session: Session,
    failing: Arc<AtomicBool>,
    history_calls: Arc<AtomicUsize>,
}

fn harness(settings: Settings, refs: AppRefs) -> Harness {
    let failing = Arc::new(AtomicBool::new(false));
    let history_calls = Arc::new(AtomicUsize::new(0));
    let anchor = NaiveDate::from_ymd_opt(2024, 6, 28)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let provider = FlakyProvider {
        inner: SyntheticProvider::anchored(anchor),
        failing: failing.clone(),
        history_calls: history_calls.clone(),
    };
    let data = MarketData::new(Box::new(provider), Box::new(StubTables));
    Harness {
        session: Session::new(Arc::new(settings), Arc::new(refs), data),
        failing,
        history_calls,
    }
}

fn default_harness() -> Harness {
    harness(Settings::default(), AppRefs::default())
}

// ── Failures and retry ───────────────────────────────────────────────

#[test]
fn failed_fetch_is_reported_and_retried() {
    let mut h = default_harness();
    h.session.selections.tickers = "AAPL".into();
    h.failing.store(true, Ordering::SeqCst);

    let page = render_security(&h.session.context());
    assert!(page.has_errors());
    assert!(page
        .notices()
        .any(|n| n.level == NoticeLevel::Error && n.message.contains("connection refused")));
    assert_eq!(h.history_calls.load(Ordering::SeqCst), 1);

    h.failing.store(false, Ordering::SeqCst);
    let page = render_security(&h.session.context());
    assert!(!page.has_errors());
    assert_eq!(h.history_calls.load(Ordering::SeqCst), 2);
    assert!(page.section("AAPL Info").is_some());
    assert!(page.section("Data").is_some());
    assert_eq!(page.charts().count(), 1);

    // Successes are memoized.
    render_security(&h.session.context());
    assert_eq!(h.history_calls.load(Ordering::SeqCst), 2);
}

#[test]
fn refresh_forces_a_new_fetch() {
    let mut h = default_harness();
    h.session.selections.tickers = "MSFT, AAPL".into();
    render_portfolio(&h.session.context());
    assert_eq!(h.history_calls.load(Ordering::SeqCst), 2);

    let before = h.session.last_update();
    let removed = h.session.refresh(&findash_core::data::RefreshScope::All);
    assert_eq!(removed, 2);
    assert!(h.session.last_update() >= before);

    render_portfolio(&h.session.context());
    assert_eq!(h.history_calls.load(Ordering::SeqCst), 4);
}

#[test]
fn symbol_refresh_drops_its_indicator_frames() {
    let mut h = default_harness();
    h.session.selections.indicators = vec!["RSI".into()];
    for ticker in ["AAPL", "MSFT"] {
        h.session.selections.tickers = ticker.into();
        assert!(!render_security(&h.session.context()).has_errors());
    }
    assert_eq!(h.session.context().indicators.len(), 2);

    h.session
        .refresh(&findash_core::data::RefreshScope::Symbol("AAPL".into()));
    assert_eq!(h.session.context().indicators.len(), 1);

    // Re-rendering recomputes rather than growing the cache.
    h.session.selections.tickers = "MSFT".into();
    render_security(&h.session.context());
    assert_eq!(h.session.context().indicators.len(), 1);
}

// ── Single-ticker pages ──────────────────────────────────────────────

#[test]
fn security_page_rejects_ticker_lists() {
    let mut h = default_harness();
    h.session.selections.tickers = "AAPL, MSFT".into();
    let page = render_security(&h.session.context());
    assert_eq!(page.sections.len(), 1);
    let notice = page.notices().next().unwrap();
    assert_eq!(notice.level, NoticeLevel::Warning);
    assert_eq!(notice.message, "Securities Analysis only works for a single ticker.");
    assert_eq!(h.history_calls.load(Ordering::SeqCst), 0);
}

#[test]
fn financials_render_three_statements() {
    let mut h = default_harness();
    h.session.selections.tickers = "msft".into();
    let page = render_financials(&h.session.context());
    assert_eq!(page.title, "Financials: MSFT");
    assert!(!page.has_errors());
    for kind in StatementKind::ALL {
        assert!(page.section(&format!("{} Data", kind.title())).is_some());
    }
}

// ── Overview ─────────────────────────────────────────────────────────

#[test]
fn overview_tiles_come_from_price_cells() {
    let h = default_harness();
    let page = render_overview(&h.session.context());
    assert!(!page.has_errors());
    assert_eq!(page.tables().count(), 3);

    let Some(SectionBody::Metrics(tiles)) = page.section("Top Indices").map(|s| &s.body) else {
        panic!("missing index tiles");
    };
    assert_eq!(tiles.len(), 2);
    assert_eq!(tiles[0].label, "S&P 500");
    assert_eq!(tiles[0].value, "5,431.60");
    assert_eq!(tiles[1].delta.as_deref(), Some("-21.32 (-0.12%)"));
}

// ── Explorer ─────────────────────────────────────────────────────────

fn explorer_harness(dir: &std::path::Path) -> Harness {
    let mut settings = Settings::default();
    settings.paths.data_folder = dir.to_path_buf();
    harness(settings, AppRefs::default())
}

fn write_prices(dir: &std::path::Path) {
    std::fs::write(
        dir.join("prices.csv"),
        "Date,Close,Volume\n\
         2024-01-03,12,\"1,500\"\n\
         2024-01-02,10,\"1,000\"\n\
         2024-01-04,15,\"2,000\"\n",
    )
    .unwrap();
}

#[test]
fn explorer_reads_csv_with_date_range() {
    let dir = tempfile::tempdir().unwrap();
    write_prices(dir.path());
    let h = explorer_harness(dir.path());

    let mut params = ExplorerParams::new(ExplorerSource::File("prices.csv".into()));
    params.from = NaiveDate::from_ymd_opt(2024, 1, 3);
    params.columns = vec!["Close".into()];
    let page = render_explorer(&h.session.context(), &params);
    assert!(!page.has_errors());

    let (_, data) = page.tables().next().unwrap();
    assert_eq!(data.height(), 2);
    assert_eq!(data.numbers("Close").unwrap(), &[Some(12.0), Some(15.0)]);
    assert_eq!(data.numbers("Volume").unwrap(), &[Some(1500.0), Some(2000.0)]);
    assert!(data.column(CHANGE_COLUMN).is_some());
    assert!(data.column(VS_AVERAGE_COLUMN).is_some());

    let Some(SectionBody::Metrics(summary)) = page.section("Summary").map(|s| &s.body) else {
        panic!("missing summary");
    };
    assert_eq!(summary[0].value, "12.00");
    assert_eq!(summary[1].value, "15.00");
    assert_eq!(summary[2].value, "13.50");
    assert_eq!(page.charts().count(), 1);
}

#[test]
fn explorer_missing_file_is_not_cached() {
    let dir = tempfile::tempdir().unwrap();
    let h = explorer_harness(dir.path());
    let params = ExplorerParams::new(ExplorerSource::File("prices.csv".into()));

    assert!(render_explorer(&h.session.context(), &params).has_errors());

    write_prices(dir.path());
    let page = render_explorer(&h.session.context(), &params);
    assert!(!page.has_errors());
    assert_eq!(page.tables().next().unwrap().1.height(), 3);
}

#[test]
fn explorer_lists_and_filters_sqlite_tables() {
    let dir = tempfile::tempdir().unwrap();
    write_prices(dir.path());
    let db = dir.path().join("local.db");
    {
        let conn = rusqlite::Connection::open(&db).unwrap();
        conn.execute_batch(
            "CREATE TABLE quotes (Date TEXT, Ticker TEXT, Close REAL);
             INSERT INTO quotes VALUES ('2024-01-02', 'AAA', 10.0);
             INSERT INTO quotes VALUES ('2024-01-02', 'BBB', 20.0);
             INSERT INTO quotes VALUES ('2024-01-03', 'AAA', 11.0);",
        )
        .unwrap();
    }
    let h = explorer_harness(dir.path());

    let sources = available_sources(&h.session.context()).unwrap();
    assert_eq!(
        sources,
        vec![
            ExplorerSource::File("prices.csv".into()),
            ExplorerSource::Sqlite {
                db: db.clone(),
                table: "quotes".into()
            },
        ]
    );

    let mut params = ExplorerParams::new(sources[1].clone());
    params.filter = Some(("Ticker".into(), "AAA".into()));
    let page = render_explorer(&h.session.context(), &params);
    assert!(!page.has_errors());
    let (_, data) = page.tables().next().unwrap();
    assert_eq!(data.numbers("Close").unwrap(), &[Some(10.0), Some(11.0)]);
}

#[test]
fn explorer_bad_filter_column_warns() {
    let dir = tempfile::tempdir().unwrap();
    write_prices(dir.path());
    let h = explorer_harness(dir.path());
    let mut params = ExplorerParams::new(ExplorerSource::File("prices.csv".into()));
    params.filter = Some(("Sector".into(), "Tech".into()));

    let page = render_explorer(&h.session.context(), &params);
    assert!(page.notices().any(|n| n.level == NoticeLevel::Warning));
    assert_eq!(page.tables().next().unwrap().1.height(), 3);
}

// ── Macro ────────────────────────────────────────────────────────────

#[test]
fn macro_page_joins_closes() {
    let refs = AppRefs::from_json(
        r#"{"macros": {"fx_rates": {"EUR/USD": "EURUSD=X", "GBP/USD": "GBPUSD=X"}}}"#,
    )
    .unwrap();
    let h = harness(Settings::default(), refs);
    let params = MacroParams {
        category: MacroCategory::FxRates,
        instruments: vec!["EUR/USD".into(), "GBP/USD".into()],
        period: Period::ThreeMonths,
        ..MacroParams::default()
    };

    let page = render_macro(&h.session.context(), &params);
    assert!(!page.has_errors());
    let (heading, table) = page.tables().next().unwrap();
    assert_eq!(heading, "FX Rates Data Table");
    assert_eq!(table.column_names(), vec!["Date", "EUR/USD", "GBP/USD"]);
    assert_eq!(page.charts().count(), 1);
}

#[test]
fn macro_page_refuses_one_day() {
    let h = default_harness();
    let params = MacroParams {
        period: Period::OneDay,
        ..MacroParams::default()
    };
    let page = render_macro(&h.session.context(), &params);
    assert_eq!(page.notices().next().unwrap().level, NoticeLevel::Warning);
    assert_eq!(h.history_calls.load(Ordering::SeqCst), 0);
}
