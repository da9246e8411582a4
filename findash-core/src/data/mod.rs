//! Market data access: providers, scraping, memoization and local sources.

pub mod cached;
pub mod local;
pub mod memo;
pub mod provider;
pub mod scraper;
pub mod synthetic;
pub mod yahoo;

pub use cached::{FetchKey, Fetched, IndicatorCache, MarketData, RefreshScope, OVERVIEW_TTL};
pub use local::{list_sqlite_tables, list_table_files, read_sqlite_table, read_table_file};
pub use memo::MemoCache;
pub use provider::{validate_symbol, DataError, MarketDataProvider};
pub use scraper::{parse_first_table, HttpTableSource, PriceTriple, TableSource};
pub use synthetic::SyntheticProvider;
pub use yahoo::{YahooConfig, YahooProvider};
