use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::ConfigError;

/// How the recency cutoff is rounded.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecencyRule {
    /// Keep papers published on or after the same calendar date `years` ago.
    #[default]
    Elapsed,
    /// Keep papers whose publication year is at least `current_year - years`.
    CalendarYear,
}

impl FromStr for RecencyRule {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "elapsed" => Ok(RecencyRule::Elapsed),
            "calendar-year" | "calendar_year" | "year" => Ok(RecencyRule::CalendarYear),
            _ => Err(ConfigError::new("RECENCY_RULE", s)),
        }
    }
}

/// Rolling window anchored at a fixed instant. Built once per fetch so every
/// entry of a response is judged against the same "now".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecencyWindow {
    now: DateTime<Utc>,
    years: u32,
    rule: RecencyRule,
}

impl RecencyWindow {
    pub fn new(now: DateTime<Utc>, years: u32, rule: RecencyRule) -> Self {
        RecencyWindow {
            now,
            years,
            rule
        }
    }

    /// First calendar date inside the window.
    pub fn cutoff_date(&self) -> NaiveDate {
        let today = self.now.date_naive();
        match self.rule {
            // checked_sub_months clamps Feb 29 to Feb 28.
            RecencyRule::Elapsed => today
                .checked_sub_months(Months::new(self.years.saturating_mul(12)))
                .unwrap_or(NaiveDate::MIN),
            RecencyRule::CalendarYear => i32::try_from(self.years).ok()
                .and_then(|years| today.year().checked_sub(years))
                .and_then(|year| NaiveDate::from_ymd_opt(year, 1, 1))
                .unwrap_or(NaiveDate::MIN),
        }
    }

    pub fn contains(&self, published: &DateTime<Utc>) -> bool {
        published.date_naive() >= self.cutoff_date()
    }
}
