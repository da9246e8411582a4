//! FinDash Core — market data, memo caching, indicators and chart specs.
//!
//! This crate contains everything the dashboard pages compute on:
//! - Domain types (bars, OHLCV series, tables, quote snapshots, statements)
//! - Market data providers (Yahoo Finance, synthetic) and the HTML table scraper
//! - Memoized fetching with explicit refresh
//! - Indicator engine (SMA, EMA, ATR, MACD, RSI)
//! - Chart specifications for price, study and comparison plots
//! - Local sources for the data explorer (CSV, Parquet, SQLite)

pub mod chart;
pub mod data;
pub mod domain;
pub mod indicators;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: shared types are Send + Sync.
    ///
    /// Pages hand cached values across threads; if any of these stops being
    /// thread-safe the build breaks here.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        // Domain types
        require_send::<domain::Bar>();
        require_sync::<domain::Bar>();
        require_send::<domain::OhlcvSeries>();
        require_sync::<domain::OhlcvSeries>();
        require_send::<domain::IndicatorFrame>();
        require_sync::<domain::IndicatorFrame>();
        require_send::<domain::Table>();
        require_sync::<domain::Table>();
        require_send::<domain::QuoteSnapshot>();
        require_sync::<domain::QuoteSnapshot>();

        // Data layer
        require_send::<data::DataError>();
        require_sync::<data::DataError>();
        require_send::<data::MarketData>();
        require_sync::<data::MarketData>();
        require_send::<data::IndicatorCache>();
        require_sync::<data::IndicatorCache>();
        require_send::<data::YahooProvider>();
        require_sync::<data::YahooProvider>();
        require_send::<data::SyntheticProvider>();
        require_sync::<data::SyntheticProvider>();
        require_send::<data::HttpTableSource>();
        require_sync::<data::HttpTableSource>();

        // Charts
        require_send::<chart::ChartSpec>();
        require_sync::<chart::ChartSpec>();
        require_send::<chart::ChartOutcome>();
        require_sync::<chart::ChartOutcome>();
    }

    /// Indicators are shared as trait objects between the engine and caches.
    #[test]
    fn indicator_trait_is_object_safe() {
        fn _check(ind: &dyn indicators::Indicator, series: &domain::OhlcvSeries) -> Vec<f64> {
            ind.compute(series)
        }
        let boxed: Box<dyn indicators::Indicator> = Box::new(indicators::Sma::new(3));
        assert_eq!(boxed.name(), "SMA_3");
    }
}
