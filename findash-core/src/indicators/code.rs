//! Indicator codes as selected by the user (`SMA_20`, `EMA_50`, `ATR`, ...).

use std::fmt;

use serde::{Deserialize, Serialize};

/// One selectable indicator study.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IndicatorCode {
    Sma(usize),
    Ema(usize),
    Atr,
    Macd,
    Rsi,
}

impl IndicatorCode {
    /// Codes offered by the analysis pages, in display order.
    /// `SMA_X`/`EMA_X` take the user's custom span.
    pub const MENU: [&'static str; 13] = [
        "SMA_X", "SMA_20", "SMA_45", "SMA_100", "SMA_200", "EMA_X", "EMA_20", "EMA_45",
        "EMA_100", "EMA_200", "ATR", "MACD", "RSI",
    ];

    /// Parse a code, case-insensitive. Unknown or malformed codes (including
    /// a zero window) give `None`.
    pub fn parse(code: &str) -> Option<Self> {
        let code = code.trim().to_ascii_uppercase();
        match code.as_str() {
            "ATR" => return Some(IndicatorCode::Atr),
            "MACD" => return Some(IndicatorCode::Macd),
            "RSI" => return Some(IndicatorCode::Rsi),
            _ => {}
        }

        let (prefix, window) = code.split_once('_')?;
        let window: usize = window.parse().ok()?;
        if window == 0 {
            return None;
        }
        match prefix {
            "SMA" => Some(IndicatorCode::Sma(window)),
            "EMA" => Some(IndicatorCode::Ema(window)),
            _ => None,
        }
    }

    /// Like [`parse`](Self::parse), but resolves the `SMA_X`/`EMA_X`
    /// placeholders with `span`.
    pub fn parse_with_span(code: &str, span: usize) -> Option<Self> {
        let upper = code.trim().to_ascii_uppercase();
        match upper.as_str() {
            "SMA_X" if span > 0 => Some(IndicatorCode::Sma(span)),
            "EMA_X" if span > 0 => Some(IndicatorCode::Ema(span)),
            _ => Self::parse(&upper),
        }
    }

    /// Output column names, in insertion order.
    pub fn column_names(&self) -> Vec<String> {
        match self {
            IndicatorCode::Sma(n) => vec![format!("SMA_{n}")],
            IndicatorCode::Ema(n) => vec![format!("EMA_{n}")],
            IndicatorCode::Atr => vec!["ATR".to_string()],
            IndicatorCode::Macd => vec![
                "MACD".to_string(),
                "Signal".to_string(),
                "MACD_Hist".to_string(),
            ],
            IndicatorCode::Rsi => vec!["RSI".to_string()],
        }
    }
}

impl fmt::Display for IndicatorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorCode::Sma(n) => write!(f, "SMA_{n}"),
            IndicatorCode::Ema(n) => write!(f, "EMA_{n}"),
            IndicatorCode::Atr => f.write_str("ATR"),
            IndicatorCode::Macd => f.write_str("MACD"),
            IndicatorCode::Rsi => f.write_str("RSI"),
        }
    }
}

/// Parse a list of codes, dropping unknown ones.
pub fn parse_codes<S: AsRef<str>>(codes: &[S], span: usize) -> Vec<IndicatorCode> {
    codes
        .iter()
        .filter_map(|c| IndicatorCode::parse_with_span(c.as_ref(), span))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_codes() {
        assert_eq!(IndicatorCode::parse("SMA_20"), Some(IndicatorCode::Sma(20)));
        assert_eq!(IndicatorCode::parse("ema_45"), Some(IndicatorCode::Ema(45)));
        assert_eq!(IndicatorCode::parse("atr"), Some(IndicatorCode::Atr));
        assert_eq!(IndicatorCode::parse(" MACD "), Some(IndicatorCode::Macd));
        assert_eq!(IndicatorCode::parse("Rsi"), Some(IndicatorCode::Rsi));
    }

    #[test]
    fn rejects_malformed_codes() {
        assert_eq!(IndicatorCode::parse("FOO"), None);
        assert_eq!(IndicatorCode::parse("SMA_"), None);
        assert_eq!(IndicatorCode::parse("SMA_0"), None);
        assert_eq!(IndicatorCode::parse("SMA_X"), None);
        assert_eq!(IndicatorCode::parse("WMA_10"), None);
        assert_eq!(IndicatorCode::parse("SMA_-3"), None);
    }

    #[test]
    fn placeholder_uses_span() {
        assert_eq!(
            IndicatorCode::parse_with_span("SMA_X", 7),
            Some(IndicatorCode::Sma(7))
        );
        assert_eq!(
            IndicatorCode::parse_with_span("ema_x", 300),
            Some(IndicatorCode::Ema(300))
        );
        assert_eq!(IndicatorCode::parse_with_span("SMA_X", 0), None);
        assert_eq!(
            IndicatorCode::parse_with_span("RSI", 7),
            Some(IndicatorCode::Rsi)
        );
    }

    #[test]
    fn display_matches_column_name() {
        for code in [IndicatorCode::Sma(5), IndicatorCode::Ema(9), IndicatorCode::Atr, IndicatorCode::Rsi] {
            assert_eq!(code.column_names(), vec![code.to_string()]);
        }
        assert_eq!(
            IndicatorCode::Macd.column_names(),
            vec!["MACD", "Signal", "MACD_Hist"]
        );
    }

    #[test]
    fn menu_codes_all_parse_with_span() {
        let parsed = parse_codes(&IndicatorCode::MENU, 10);
        assert_eq!(parsed.len(), IndicatorCode::MENU.len());
    }

    #[test]
    fn parse_codes_drops_unknown() {
        let parsed = parse_codes(&["SMA_5", "nope", "RSI"], 20);
        assert_eq!(parsed, vec![IndicatorCode::Sma(5), IndicatorCode::Rsi]);
    }
}
