//! Market data provider trait and structured error types.
//!
//! The MarketDataProvider trait abstracts over data sources (Yahoo Finance,
//! the synthetic offline provider) so pages can swap implementations and
//! tests can count calls.

use thiserror::Error;

use crate::domain::{
    validate_range, Interval, OhlcvSeries, Period, QuoteSnapshot, RangeError, StatementKind,
    StatementPeriod, Table,
};

/// Structured error types for data operations.
///
/// `Clone` so a failed fetch can be memoized like a successful one.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("provider error: {0}")]
    Provider(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("invalid symbol: '{0}'")]
    InvalidSymbol(String),

    #[error(transparent)]
    InvalidRange(#[from] RangeError),

    #[error("invalid identifier: '{0}'")]
    InvalidIdentifier(String),

    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("local data error: {0}")]
    Local(String),
}

impl DataError {
    /// True for errors caused by the caller's input rather than the source.
    pub fn is_user_input(&self) -> bool {
        matches!(
            self,
            DataError::InvalidSymbol(_)
                | DataError::InvalidRange(_)
                | DataError::InvalidIdentifier(_)
                | DataError::Unsupported(_)
        )
    }
}

impl From<std::io::Error> for DataError {
    fn from(e: std::io::Error) -> Self {
        DataError::Io(e.to_string())
    }
}

/// Reject empty symbols and symbols containing whitespace.
pub fn validate_symbol(symbol: &str) -> Result<&str, DataError> {
    let trimmed = symbol.trim();
    if trimmed.is_empty() || trimmed.chars().any(char::is_whitespace) {
        return Err(DataError::InvalidSymbol(symbol.to_string()));
    }
    Ok(trimmed)
}

/// Validate a history request before it reaches any provider.
pub fn validate_history_request<'a>(
    symbol: &'a str,
    period: Period,
    interval: Interval,
) -> Result<&'a str, DataError> {
    let symbol = validate_symbol(symbol)?;
    validate_range(period, interval)?;
    Ok(symbol)
}

/// Trait for market data providers.
///
/// Implementations handle the specifics of one upstream. The memo layer sits
/// above this trait, so providers don't know about caching.
pub trait MarketDataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// OHLCV history for a symbol over a lookback period at an interval.
    fn fetch_history(
        &self,
        symbol: &str,
        period: Period,
        interval: Interval,
    ) -> Result<OhlcvSeries, DataError>;

    /// Descriptive quote fields for a symbol.
    fn fetch_info(&self, symbol: &str) -> Result<QuoteSnapshot, DataError>;

    /// One financial statement: a `Line Item` column plus one column per as-of date.
    fn fetch_statement(
        &self,
        symbol: &str,
        kind: StatementKind,
        period: StatementPeriod,
    ) -> Result<Table, DataError>;

    fn fetch_balance(&self, symbol: &str, period: StatementPeriod) -> Result<Table, DataError> {
        self.fetch_statement(symbol, StatementKind::Balance, period)
    }

    fn fetch_income(&self, symbol: &str, period: StatementPeriod) -> Result<Table, DataError> {
        self.fetch_statement(symbol, StatementKind::Income, period)
    }

    fn fetch_cash(&self, symbol: &str, period: StatementPeriod) -> Result<Table, DataError> {
        self.fetch_statement(symbol, StatementKind::CashFlow, period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_validation() {
        assert_eq!(validate_symbol(" AAPL ").unwrap(), "AAPL");
        assert_eq!(validate_symbol("EURUSD=X").unwrap(), "EURUSD=X");
        assert!(matches!(validate_symbol(""), Err(DataError::InvalidSymbol(_))));
        assert!(matches!(validate_symbol("   "), Err(DataError::InvalidSymbol(_))));
        assert!(matches!(validate_symbol("BRK B"), Err(DataError::InvalidSymbol(_))));
    }

    #[test]
    fn range_errors_convert() {
        let err = validate_history_request("AAPL", Period::Max, Interval::OneMinute).unwrap_err();
        assert!(matches!(err, DataError::InvalidRange(_)));
        assert!(err.is_user_input());
    }

    #[test]
    fn valid_request_passes() {
        assert_eq!(
            validate_history_request("MSFT", Period::OneYear, Interval::OneDay).unwrap(),
            "MSFT"
        );
    }

    #[test]
    fn transport_errors_are_not_user_input() {
        assert!(!DataError::NetworkUnreachable("down".into()).is_user_input());
        assert!(!DataError::SymbolNotFound { symbol: "X".into() }.is_user_input());
    }
}
