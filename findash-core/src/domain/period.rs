//! History range (`Period`) and bar size (`Interval`) as accepted by the provider.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Rejected period/interval input.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RangeError {
    #[error("unknown period '{0}'")]
    UnknownPeriod(String),

    #[error("unknown interval '{0}'")]
    UnknownInterval(String),

    #[error("interval {interval} is not available for period {period}: {reason}")]
    Incompatible {
        period: Period,
        interval: Interval,
        reason: &'static str,
    },
}

macro_rules! string_enum {
    ($name:ident, $err:ident, { $($variant:ident => $s:literal),+ $(,)? }) => {
        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $s),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = RangeError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim() {
                    $($s => Ok($name::$variant),)+
                    other => Err(RangeError::$err(other.to_string())),
                }
            }
        }
    };
}

/// How far back a history request reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Period {
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "5d")]
    FiveDays,
    #[serde(rename = "1mo")]
    OneMonth,
    #[serde(rename = "3mo")]
    ThreeMonths,
    #[serde(rename = "6mo")]
    SixMonths,
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "2y")]
    TwoYears,
    #[serde(rename = "5y")]
    FiveYears,
    #[serde(rename = "10y")]
    TenYears,
    #[serde(rename = "ytd")]
    YearToDate,
    #[serde(rename = "max")]
    Max,
}

string_enum!(Period, UnknownPeriod, {
    OneDay => "1d",
    FiveDays => "5d",
    OneMonth => "1mo",
    ThreeMonths => "3mo",
    SixMonths => "6mo",
    OneYear => "1y",
    TwoYears => "2y",
    FiveYears => "5y",
    TenYears => "10y",
    YearToDate => "ytd",
    Max => "max",
});

impl Period {
    /// Upper bound of the covered span in minutes; `None` for `max`.
    /// Year-to-date is bounded by one year.
    pub fn span_minutes(&self) -> Option<u64> {
        const DAY: u64 = 24 * 60;
        let days = match self {
            Period::OneDay => 1,
            Period::FiveDays => 5,
            Period::OneMonth => 31,
            Period::ThreeMonths => 92,
            Period::SixMonths => 183,
            Period::OneYear | Period::YearToDate => 366,
            Period::TwoYears => 731,
            Period::FiveYears => 1827,
            Period::TenYears => 3653,
            Period::Max => return None,
        };
        Some(days * DAY)
    }
}

/// Bar size of a history request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Interval {
    #[serde(rename = "1m")]
    OneMinute,
    #[serde(rename = "2m")]
    TwoMinutes,
    #[serde(rename = "5m")]
    FiveMinutes,
    #[serde(rename = "15m")]
    FifteenMinutes,
    #[serde(rename = "30m")]
    ThirtyMinutes,
    #[serde(rename = "60m")]
    SixtyMinutes,
    #[serde(rename = "90m")]
    NinetyMinutes,
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "5d")]
    FiveDays,
    #[serde(rename = "1wk")]
    OneWeek,
    #[serde(rename = "1mo")]
    OneMonth,
    #[serde(rename = "3mo")]
    ThreeMonths,
}

string_enum!(Interval, UnknownInterval, {
    OneMinute => "1m",
    TwoMinutes => "2m",
    FiveMinutes => "5m",
    FifteenMinutes => "15m",
    ThirtyMinutes => "30m",
    SixtyMinutes => "60m",
    NinetyMinutes => "90m",
    OneHour => "1h",
    OneDay => "1d",
    FiveDays => "5d",
    OneWeek => "1wk",
    OneMonth => "1mo",
    ThreeMonths => "3mo",
});

impl Interval {
    /// Nominal bar length in minutes.
    pub fn minutes(&self) -> u64 {
        const DAY: u64 = 24 * 60;
        match self {
            Interval::OneMinute => 1,
            Interval::TwoMinutes => 2,
            Interval::FiveMinutes => 5,
            Interval::FifteenMinutes => 15,
            Interval::ThirtyMinutes => 30,
            Interval::SixtyMinutes | Interval::OneHour => 60,
            Interval::NinetyMinutes => 90,
            Interval::OneDay => DAY,
            Interval::FiveDays => 5 * DAY,
            Interval::OneWeek => 7 * DAY,
            Interval::OneMonth => 31 * DAY,
            Interval::ThreeMonths => 92 * DAY,
        }
    }

    pub fn is_intraday(&self) -> bool {
        self.minutes() < 24 * 60
    }

    /// Intervals offered for a period: every interval listed before the
    /// period's own spelling when the period is also an interval name,
    /// otherwise all of them.
    pub fn choices_for(period: Period) -> Vec<Interval> {
        match Interval::ALL.iter().position(|i| i.as_str() == period.as_str()) {
            Some(idx) => Interval::ALL[..idx].to_vec(),
            None => Interval::ALL.to_vec(),
        }
    }
}

/// Check that the provider serves `interval` bars over `period`.
pub fn validate_range(period: Period, interval: Interval) -> Result<(), RangeError> {
    let reject = |reason| {
        Err(RangeError::Incompatible {
            period,
            interval,
            reason,
        })
    };

    if let Some(span) = period.span_minutes() {
        if interval.minutes() > span {
            return reject("interval is coarser than the period");
        }
    }

    match interval {
        Interval::OneMinute if !matches!(period, Period::OneDay | Period::FiveDays) => {
            reject("1-minute bars only cover the last few days")
        }
        Interval::TwoMinutes
        | Interval::FiveMinutes
        | Interval::FifteenMinutes
        | Interval::ThirtyMinutes
        | Interval::NinetyMinutes
            if !matches!(period, Period::OneDay | Period::FiveDays | Period::OneMonth) =>
        {
            reject("sub-hour bars only cover the last 60 days")
        }
        Interval::SixtyMinutes | Interval::OneHour
            if matches!(
                period,
                Period::FiveYears | Period::TenYears | Period::Max
            ) =>
        {
            reject("hourly bars only cover the last two years")
        }
        _ => Ok(()),
    }
}
