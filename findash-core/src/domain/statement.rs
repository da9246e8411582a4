//! Financial statement selectors.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StatementKind {
    Balance,
    Income,
    CashFlow,
}

impl StatementKind {
    pub const ALL: [StatementKind; 3] = [
        StatementKind::Balance,
        StatementKind::Income,
        StatementKind::CashFlow,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            StatementKind::Balance => "Balance Sheet",
            StatementKind::Income => "Income Statement",
            StatementKind::CashFlow => "Cash Flow",
        }
    }

    /// Line items requested from the fundamentals endpoint, in display order.
    pub fn line_items(&self) -> &'static [&'static str] {
        match self {
            StatementKind::Balance => &[
                "TotalAssets",
                "CurrentAssets",
                "CashAndCashEquivalents",
                "Receivables",
                "Inventory",
                "TotalNonCurrentAssets",
                "NetPPE",
                "Goodwill",
                "TotalLiabilitiesNetMinorityInterest",
                "CurrentLiabilities",
                "CurrentDebt",
                "LongTermDebt",
                "TotalDebt",
                "StockholdersEquity",
                "RetainedEarnings",
                "CommonStock",
            ],
            StatementKind::Income => &[
                "TotalRevenue",
                "CostOfRevenue",
                "GrossProfit",
                "OperatingExpense",
                "OperatingIncome",
                "InterestExpense",
                "PretaxIncome",
                "TaxProvision",
                "NetIncome",
                "BasicEPS",
                "DilutedEPS",
                "EBITDA",
            ],
            StatementKind::CashFlow => &[
                "OperatingCashFlow",
                "InvestingCashFlow",
                "FinancingCashFlow",
                "CapitalExpenditure",
                "FreeCashFlow",
                "RepurchaseOfCapitalStock",
                "CashDividendsPaid",
                "EndCashPosition",
            ],
        }
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Reporting frequency of a statement.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum StatementPeriod {
    #[default]
    Annual,
    Quarterly,
}

impl StatementPeriod {
    /// Prefix used by the fundamentals endpoint (`annualTotalAssets`).
    pub fn type_prefix(&self) -> &'static str {
        match self {
            StatementPeriod::Annual => "annual",
            StatementPeriod::Quarterly => "quarterly",
        }
    }
}

impl fmt::Display for StatementPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StatementPeriod::Annual => "Annual",
            StatementPeriod::Quarterly => "Quarterly",
        })
    }
}

impl FromStr for StatementPeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "annual" | "yearly" => Ok(StatementPeriod::Annual),
            "quarterly" => Ok(StatementPeriod::Quarterly),
            other => Err(format!("unknown statement period '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statement_period_parses_case_insensitively() {
        assert_eq!("Quarterly".parse::<StatementPeriod>(), Ok(StatementPeriod::Quarterly));
        assert_eq!("annual".parse::<StatementPeriod>(), Ok(StatementPeriod::Annual));
        assert!("monthly".parse::<StatementPeriod>().is_err());
    }

    #[test]
    fn every_statement_has_line_items() {
        for kind in StatementKind::ALL {
            assert!(!kind.line_items().is_empty());
        }
    }
}
