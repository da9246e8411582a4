//! FinDash CLI — render dashboard pages headlessly.
//!
//! Commands, one per page:
//! - `overview` — world indices, top gainers and losers
//! - `security` — quote info, candlestick with studies and raw data
//! - `portfolio` — relative performance of several tickers
//! - `forex` — currency pairs against one quote currency
//! - `commodities` — one commodity from the app refs
//! - `macro` — macro instruments rebased to 100
//! - `financials` — balance sheet, income statement and cash flow
//! - `explorer` — local CSV/Parquet files and SQLite tables

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use findash_core::chart::ChartKind;
use findash_core::data::{
    DataError, HttpTableSource, MarketData, MarketDataProvider, SyntheticProvider, TableSource,
    YahooProvider,
};
use findash_core::domain::{Interval, Period, StatementPeriod, Table};
use findash_pages::{
    available_sources, render_commodities, render_explorer, render_financials, render_forex,
    render_macro, render_overview, render_portfolio, render_security, AppRefs, CommodityParams,
    ExplorerParams, ExplorerSource, ForexParams, MacroCategory, MacroParams, PageView, Session,
    Settings,
};

/// Rows shown per table in text output.
const TEXT_ROWS: usize = 20;

#[derive(Parser)]
#[command(name = "findash", about = "FinDash CLI — financial dashboard pages in the terminal")]
struct Cli {
    /// Settings TOML. Defaults apply to missing keys.
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// App refs JSON. Overrides the path in the settings.
    #[arg(long, global = true)]
    refs: Option<PathBuf>,

    /// Offline mode: synthetic market data, no scraped tables.
    #[arg(long, global = true, default_value_t = false)]
    offline: bool,

    #[arg(long, global = true, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Also write the first table of the page to this CSV file.
    #[arg(long, global = true)]
    csv: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

/// Options shared by the pages that chart price history.
#[derive(Args)]
struct Range {
    /// History period (1d, 5d, 1mo, 3mo, 6mo, 1y, 2y, 5y, 10y, ytd, max).
    #[arg(long)]
    period: Option<Period>,

    /// Bar interval (1m … 3mo).
    #[arg(long)]
    interval: Option<Interval>,

    /// Indicators: SMA_20, EMA_50, SMA_X, EMA_X, MACD, RSI, ATR.
    #[arg(long = "indicator")]
    indicators: Vec<String>,

    /// Window substituted for SMA_X / EMA_X.
    #[arg(long)]
    span: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// World indices, top gainers and top losers.
    Overview,
    /// Quote info, candlestick with studies and raw data for one ticker.
    Security {
        ticker: String,
        #[command(flatten)]
        range: Range,
    },
    /// Relative performance of comma-separated tickers.
    Portfolio {
        tickers: String,
        #[command(flatten)]
        range: Range,
    },
    /// Currency pairs against one quote currency.
    Forex {
        /// Base currencies (repeatable).
        #[arg(long = "base")]
        bases: Vec<String>,
        #[arg(long, default_value = "USD")]
        quote: String,
        #[command(flatten)]
        range: Range,
    },
    /// One commodity from the app refs.
    Commodities {
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        label: Option<String>,
        /// Drop the volume column.
        #[arg(long, default_value_t = false)]
        no_volume: bool,
        #[command(flatten)]
        range: Range,
    },
    /// Macro instruments of one category, rebased to 100.
    Macro {
        /// interest_rates, inflation, fx_rates, commodities,
        /// economic_indicators, indices or debt.
        category: MacroCategory,
        #[arg(long)]
        region: Option<String>,
        /// Instrument labels (repeatable). Defaults to the first one.
        #[arg(long = "instrument")]
        instruments: Vec<String>,
        #[arg(long, default_value = "1mo")]
        period: Period,
    },
    /// Balance sheet, income statement and cash flow.
    Financials {
        ticker: String,
        #[arg(long)]
        statement_period: Option<StatementPeriod>,
    },
    /// Local CSV/Parquet files and SQLite tables.
    Explorer {
        /// Source key: internal::<file> or db::<path>::<table>. Omit to list sources.
        source: Option<ExplorerSource>,
        /// Keep rows where COLUMN equals VALUE.
        #[arg(long, value_name = "COLUMN=VALUE")]
        filter: Option<String>,
        /// First date (YYYY-MM-DD), inclusive.
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Last date (YYYY-MM-DD), inclusive.
        #[arg(long)]
        to: Option<NaiveDate>,
        #[arg(long, default_value = "line")]
        chart: ChartKind,
        /// Columns to chart and summarise (repeatable).
        #[arg(long = "column")]
        columns: Vec<String>,
    },
}

/// Scraped tables are unavailable offline.
struct OfflineTables;

impl TableSource for OfflineTables {
    fn fetch_table(&self, url: &str) -> Result<Table, DataError> {
        Err(DataError::Unsupported(format!(
            "{url}: scraped tables need network access"
        )))
    }
}

fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let settings = Settings::load(cli.settings.as_deref())
        .with_context(|| "failed to load settings")?;
    let refs_path = cli.refs.clone().unwrap_or_else(|| settings.paths.refs.clone());
    let refs = AppRefs::load_or_default(&refs_path)
        .with_context(|| format!("failed to load app refs from {}", refs_path.display()))?;

    let data = build_market_data(&settings, cli.offline)?;
    let mut session = Session::new(Arc::new(settings), Arc::new(refs), data);

    let Some(page) = render(&mut session, cli.command)? else {
        return Ok(());
    };
    print_page(&page, cli.format)?;

    if let Some(path) = &cli.csv {
        let file = File::create(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        if !page.write_first_table_csv(BufWriter::new(file))? {
            eprintln!("No table on this page; {} left empty.", path.display());
        }
    }

    if page.has_errors() {
        std::process::exit(1);
    }
    Ok(())
}

fn build_market_data(settings: &Settings, offline: bool) -> Result<MarketData> {
    let (provider, tables): (Box<dyn MarketDataProvider>, Box<dyn TableSource>) = if offline {
        (Box::new(SyntheticProvider::new()), Box::new(OfflineTables))
    } else {
        let config = settings.yahoo_config();
        (
            Box::new(YahooProvider::new(&config)?),
            Box::new(HttpTableSource::new(&config)?),
        )
    };
    Ok(MarketData::with_overview_ttl(
        provider,
        tables,
        settings.overview_ttl(),
    ))
}

fn apply_range(session: &mut Session, range: Range) -> Result<()> {
    let s = &mut session.selections;
    if let Some(p) = range.period {
        s.period = p;
    }
    if let Some(i) = range.interval {
        s.interval = i;
    }
    if let Some(span) = range.span {
        if span == 0 {
            bail!("--span must be at least 1");
        }
        s.span = span;
    }
    s.indicators = range.indicators;
    findash_core::domain::validate_range(s.period, s.interval)?;
    Ok(())
}

/// Render the page for `command`, or `None` when the command only listed something.
fn render(session: &mut Session, command: Commands) -> Result<Option<PageView>> {
    let page = match command {
        Commands::Overview => render_overview(&session.context()),
        Commands::Security { ticker, range } => {
            session.selections.tickers = ticker;
            apply_range(session, range)?;
            render_security(&session.context())
        }
        Commands::Portfolio { tickers, range } => {
            session.selections.tickers = tickers;
            apply_range(session, range)?;
            render_portfolio(&session.context())
        }
        Commands::Forex {
            bases,
            quote,
            range,
        } => {
            apply_range(session, range)?;
            let mut params = ForexParams {
                quote,
                ..ForexParams::default()
            };
            if !bases.is_empty() {
                params.bases = bases;
            }
            render_forex(&session.context(), &params)
        }
        Commands::Commodities {
            category,
            label,
            no_volume,
            range,
        } => {
            apply_range(session, range)?;
            session.selections.volume = !no_volume;
            render_commodities(&session.context(), &CommodityParams { category, label })
        }
        Commands::Macro {
            category,
            region,
            instruments,
            period,
        } => {
            let params = MacroParams {
                category,
                region,
                instruments,
                period,
            };
            render_macro(&session.context(), &params)
        }
        Commands::Financials {
            ticker,
            statement_period,
        } => {
            session.selections.tickers = ticker;
            if let Some(p) = statement_period {
                session.selections.statement_period = p;
            }
            render_financials(&session.context())
        }
        Commands::Explorer {
            source,
            filter,
            from,
            to,
            chart,
            columns,
        } => {
            let Some(source) = source else {
                for s in available_sources(&session.context())? {
                    println!("{s}");
                }
                return Ok(None);
            };
            let filter = match filter {
                Some(f) => match f.split_once('=') {
                    Some((c, v)) => Some((c.trim().to_string(), v.trim().to_string())),
                    None => bail!("--filter expects COLUMN=VALUE, got '{f}'"),
                },
                None => None,
            };
            let params = ExplorerParams {
                filter,
                from,
                to,
                chart,
                columns,
                ..ExplorerParams::new(source)
            };
            render_explorer(&session.context(), &params)
        }
    };
    Ok(Some(page))
}

fn print_page(page: &PageView, format: Format) -> Result<()> {
    match format {
        Format::Text => print!("{}", page.to_text(TEXT_ROWS)),
        Format::Json => println!("{}", serde_json::to_string_pretty(page)?),
    }
    Ok(())
}
