//! Settings (TOML) and app references (JSON).
//!
//! Settings tune the provider, cache and page defaults; every key is
//! optional. App refs map display categories to labels and tickers for the
//! commodities, forex and macro pages. Both are read once per process.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use findash_core::data::YahooConfig;
use findash_core::domain::{Interval, Period, StatementPeriod};

/// Errors from loading settings or app refs.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("parse settings TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("parse app refs JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid setting: {0}")]
    Invalid(String),
}

fn read(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })
}

// ── Settings ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        let yahoo = YahooConfig::default();
        Self {
            timeout_secs: yahoo.timeout.as_secs(),
            user_agent: yahoo.user_agent,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Lifetime of macro overview closes.
    pub overview_ttl_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            overview_ttl_secs: findash_core::data::OVERVIEW_TTL.as_secs(),
        }
    }
}

/// Initial selections of a new session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultSettings {
    pub ticker: String,
    pub period: Period,
    pub interval: Interval,
    /// Window substituted for `SMA_X` / `EMA_X`.
    pub span: usize,
    pub statement_period: StatementPeriod,
    pub volume: bool,
}

impl Default for DefaultSettings {
    fn default() -> Self {
        Self {
            ticker: "MSFT".into(),
            period: Period::ThreeMonths,
            interval: Interval::OneDay,
            span: 30,
            statement_period: StatementPeriod::Annual,
            volume: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathSettings {
    /// Folder scanned by the data explorer.
    pub data_folder: PathBuf,
    pub refs: PathBuf,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            data_folder: PathBuf::from("data"),
            refs: PathBuf::from("app_refs.json"),
        }
    }
}

/// Process-wide settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub provider: ProviderSettings,
    pub cache: CacheSettings,
    pub defaults: DefaultSettings,
    pub paths: PathSettings,
}

impl Settings {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        Self::from_toml(&read(path)?)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Settings from `path` when given, else defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::from_file(p),
            None => Ok(Self::default()),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.provider.timeout_secs == 0 {
            return Err(ConfigError::Invalid("provider.timeout_secs must be > 0".into()));
        }
        if self.defaults.span == 0 {
            return Err(ConfigError::Invalid("defaults.span must be > 0".into()));
        }
        findash_core::domain::validate_range(self.defaults.period, self.defaults.interval)
            .map_err(|e| ConfigError::Invalid(format!("defaults: {e}")))
    }

    pub fn yahoo_config(&self) -> YahooConfig {
        YahooConfig {
            timeout: Duration::from_secs(self.provider.timeout_secs),
            user_agent: self.provider.user_agent.clone(),
        }
    }

    pub fn overview_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.overview_ttl_secs)
    }
}

// ── App refs ─────────────────────────────────────────────────────────

/// A ticker, or a named group of further trees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InstrumentTree {
    Ticker(String),
    Group(BTreeMap<String, InstrumentTree>),
}

impl InstrumentTree {
    /// `(label, ticker)` leaves, depth first. Nested labels are kept as-is.
    pub fn flatten(&self, label: &str) -> Vec<(String, String)> {
        let mut out = Vec::new();
        self.collect(label, &mut out);
        out
    }

    fn collect(&self, label: &str, out: &mut Vec<(String, String)>) {
        match self {
            InstrumentTree::Ticker(t) => out.push((label.to_string(), t.clone())),
            InstrumentTree::Group(children) => {
                for (name, child) in children {
                    child.collect(name, out);
                }
            }
        }
    }

    pub fn as_group(&self) -> Option<&BTreeMap<String, InstrumentTree>> {
        match self {
            InstrumentTree::Group(g) => Some(g),
            InstrumentTree::Ticker(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForexRefs {
    pub currencies: Vec<String>,
    pub quotes: Vec<String>,
    pub cryptos: Vec<String>,
}

impl Default for ForexRefs {
    fn default() -> Self {
        let owned = |v: &[&str]| v.iter().map(|s| s.to_string()).collect();
        Self {
            currencies: owned(&["USD", "EUR", "GBP", "JPY", "CHF", "AUD", "CAD", "CNY"]),
            quotes: owned(&["USD", "EUR", "GBP", "JPY"]),
            cryptos: owned(&["BTC", "ETH", "USDT"]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChoiceRefs {
    pub periods: Vec<Period>,
    pub intervals: Vec<Interval>,
}

impl Default for ChoiceRefs {
    fn default() -> Self {
        Self {
            periods: Period::ALL.to_vec(),
            intervals: Interval::ALL.to_vec(),
        }
    }
}

/// Category/label/ticker references for the pages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppRefs {
    /// category → label → ticker.
    pub commodities: BTreeMap<String, BTreeMap<String, String>>,
    /// macro category key → tree of instruments.
    pub macros: BTreeMap<String, InstrumentTree>,
    pub forex: ForexRefs,
    pub defaults: ChoiceRefs,
}

impl AppRefs {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        Self::from_json(&read(path)?)
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Refs from `path` if it exists, else empty refs.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            tracing::warn!(path = %path.display(), "app refs not found, using empty refs");
            Ok(Self::default())
        }
    }

    pub fn commodity_categories(&self) -> Vec<&str> {
        self.commodities.keys().map(String::as_str).collect()
    }

    /// Ticker for a commodity label within a category.
    pub fn commodity_ticker(&self, category: &str, label: &str) -> Option<&str> {
        self.commodities
            .get(category)
            .and_then(|m| m.get(label))
            .map(String::as_str)
    }

    pub fn macro_tree(&self, key: &str) -> Option<&InstrumentTree> {
        self.macros.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_settings_take_defaults() {
        let s = Settings::from_toml("").unwrap();
        assert_eq!(s, Settings::default());
        assert_eq!(s.defaults.ticker, "MSFT");
        assert_eq!(s.overview_ttl(), Duration::from_secs(600));
    }

    #[test]
    fn partial_settings_override() {
        let s = Settings::from_toml(
            r#"
            [provider]
            timeout_secs = 5

            [defaults]
            ticker = "AAPL"
            period = "1y"
            interval = "1wk"
            statement_period = "Quarterly"
            "#,
        )
        .unwrap();
        assert_eq!(s.yahoo_config().timeout, Duration::from_secs(5));
        assert_eq!(s.defaults.ticker, "AAPL");
        assert_eq!(s.defaults.period, Period::OneYear);
        assert_eq!(s.defaults.interval, Interval::OneWeek);
        assert_eq!(s.defaults.statement_period, StatementPeriod::Quarterly);
        assert_eq!(s.defaults.span, 30);
    }

    #[test]
    fn invalid_settings_rejected() {
        assert!(matches!(
            Settings::from_toml("[defaults]\nspan = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            Settings::from_toml("[defaults]\nperiod = \"forever\""),
            Err(ConfigError::Toml(_))
        ));
        assert!(matches!(
            Settings::from_toml("[defaults]\nperiod = \"max\"\ninterval = \"1m\""),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn refs_parse_nested_trees() {
        let refs = AppRefs::from_json(
            r#"{
                "commodities": {"Energy": {"Crude Oil": "CL=F"}},
                "macros": {
                    "fx_rates": {"EUR/USD": "EURUSD=X"},
                    "interest_rates": {
                        "US": {"Treasuries": {"10Y": "^TNX", "30Y": "^TYX"}, "Fed": "^IRX"}
                    }
                }
            }"#,
        )
        .unwrap();
        assert_eq!(refs.commodity_ticker("Energy", "Crude Oil"), Some("CL=F"));
        assert_eq!(refs.commodity_categories(), vec!["Energy"]);

        let us = &refs.macro_tree("interest_rates").unwrap().as_group().unwrap()["US"];
        assert_eq!(
            us.flatten("US"),
            vec![
                ("Fed".to_string(), "^IRX".to_string()),
                ("10Y".to_string(), "^TNX".to_string()),
                ("30Y".to_string(), "^TYX".to_string()),
            ]
        );
        assert_eq!(refs.forex, ForexRefs::default());
    }

    #[test]
    fn missing_refs_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let refs = AppRefs::load_or_default(&dir.path().join("none.json")).unwrap();
        assert!(refs.commodities.is_empty());
    }
}
