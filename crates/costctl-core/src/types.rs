//! Shared type definitions used across costctl crates.

use std::str::FromStr;

use chrono::{DateTime, Duration, Months, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CostctlError;

/// Reporting period selected by the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    /// Since local midnight today
    Today,
    /// The previous local calendar day
    Yesterday,
    /// The last seven days
    Week,
    /// The last calendar month
    Month,
    /// No time restriction
    #[default]
    All,
}

/// Time window resolved from a [`Period`] at a given instant.
///
/// Both bounds are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodBounds {
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
}

impl PeriodBounds {
    /// Returns true if `timestamp` falls strictly inside the window.
    ///
    /// A session without a timestamp never matches.
    pub fn contains(&self, timestamp: Option<DateTime<Utc>>) -> bool {
        match timestamp {
            Some(ts) => ts > self.start && self.end.is_none_or(|end| ts < end),
            None => false,
        }
    }
}

impl Period {
    pub const ACCEPTED: &'static str = "today, yesterday, week, month, all";

    /// Resolve the window for this period relative to `now`.
    ///
    /// Day boundaries are computed in `now`'s time zone. Returns `None` for
    /// [`Period::All`].
    pub fn bounds_at<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Option<PeriodBounds> {
        let today = now.date_naive();
        match self {
            Self::Today => Some(PeriodBounds {
                start: midnight(&now.timezone(), today),
                end: None,
            }),
            Self::Yesterday => {
                let yesterday = today.pred_opt()?;
                Some(PeriodBounds {
                    start: midnight(&now.timezone(), yesterday),
                    end: Some(midnight(&now.timezone(), today)),
                })
            }
            Self::Week => Some(PeriodBounds {
                start: (now.clone() - Duration::days(7)).with_timezone(&Utc),
                end: None,
            }),
            Self::Month => {
                let start = now.clone().checked_sub_months(Months::new(1))?;
                Some(PeriodBounds {
                    start: start.with_timezone(&Utc),
                    end: None,
                })
            }
            Self::All => None,
        }
    }

    /// Lower bound of the window, usable as a file modification pre-filter.
    pub fn not_before<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Option<DateTime<Utc>> {
        self.bounds_at(now).map(|b| b.start)
    }
}

/// Local midnight of `date` in `tz`, as UTC.
fn midnight<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Utc> {
    let naive = date.and_time(chrono::NaiveTime::MIN);
    match tz.from_local_datetime(&naive).earliest() {
        Some(local) => local.with_timezone(&Utc),
        // Midnight skipped by a DST transition
        None => Utc.from_utc_datetime(&naive),
    }
}

impl FromStr for Period {
    type Err = CostctlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "today" => Ok(Self::Today),
            "yesterday" => Ok(Self::Yesterday),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "all" => Ok(Self::All),
            _ => Err(CostctlError::invalid_argument("period", s, Self::ACCEPTED)),
        }
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Today => write!(f, "today"),
            Self::Yesterday => write!(f, "yesterday"),
            Self::Week => write!(f, "week"),
            Self::Month => write!(f, "month"),
            Self::All => write!(f, "all"),
        }
    }
}

/// Output encoding for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Human-readable tables
    #[default]
    Text,
    /// Pretty-printed JSON
    Json,
}

impl OutputFormat {
    pub const ACCEPTED: &'static str = "text, json";
}

impl FromStr for OutputFormat {
    type Err = CostctlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(CostctlError::invalid_argument("format", s, Self::ACCEPTED)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}
