//! Quote snapshot — named fields for one symbol at fetch time.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::table::Table;

/// Immutable map of quote fields (`previousClose`, `dayLow`, `dayHigh`,
/// `currency`, `shortName`, ...). Re-fetched wholesale, never patched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteSnapshot {
    symbol: String,
    fetched_at: NaiveDateTime,
    fields: BTreeMap<String, Value>,
}

impl QuoteSnapshot {
    pub fn new(
        symbol: impl Into<String>,
        fetched_at: NaiveDateTime,
        fields: BTreeMap<String, Value>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            fetched_at,
            fields,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn fetched_at(&self) -> NaiveDateTime {
        self.fetched_at
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn number(&self, field: &str) -> Option<f64> {
        self.fields.get(field).and_then(Value::as_f64)
    }

    pub fn text(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }

    pub fn fields(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }

    /// Field/Value table of every non-null field.
    pub fn to_table(&self) -> Table {
        Table::key_value(self.fields.iter().filter(|(_, v)| !v.is_null()).map(|(k, v)| {
            let shown = match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (k.clone(), shown)
        }))
    }
}
