//! History window and bar interval requested from the market-data source.

use chrono::{Datelike, Months, NaiveDate};
use std::fmt;
use std::str::FromStr;

/// Lookback measured back from the most recent available bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryPeriod {
    Days(u32),
    Months(u32),
    Years(u32),
    YearToDate,
    Max,
}

impl HistoryPeriod {
    /// Earliest date kept when the latest bar is on `last`; `None` keeps everything.
    ///
    /// A lookback reaching past the calendar's range also yields `None`.
    pub fn start_date(self, last: NaiveDate) -> Option<NaiveDate> {
        match self {
            HistoryPeriod::Days(n) => last.checked_sub_days(chrono::Days::new(n as u64)),
            HistoryPeriod::Months(n) => last.checked_sub_months(Months::new(n)),
            HistoryPeriod::Years(n) => n
                .checked_mul(12)
                .and_then(|months| last.checked_sub_months(Months::new(months))),
            HistoryPeriod::YearToDate => NaiveDate::from_ymd_opt(last.year(), 1, 1),
            HistoryPeriod::Max => None,
        }
    }
}

impl Default for HistoryPeriod {
    fn default() -> Self {
        HistoryPeriod::Years(1)
    }
}

impl FromStr for HistoryPeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        match s.as_str() {
            "ytd" => return Ok(HistoryPeriod::YearToDate),
            "max" => return Ok(HistoryPeriod::Max),
            _ => {}
        }

        let split = s
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| format!("invalid period '{}': missing unit", s))?;
        let (count, unit) = s.split_at(split);
        let count: u32 = count
            .parse()
            .map_err(|_| format!("invalid period '{}': missing count", s))?;
        if count == 0 {
            return Err(format!("invalid period '{}': count must be positive", s));
        }

        match unit {
            "d" => Ok(HistoryPeriod::Days(count)),
            "mo" => Ok(HistoryPeriod::Months(count)),
            "y" => Ok(HistoryPeriod::Years(count)),
            _ => Err(format!(
                "invalid period '{}': unit must be d, mo or y (or ytd, max)",
                s
            )),
        }
    }
}

impl fmt::Display for HistoryPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryPeriod::Days(n) => write!(f, "{}d", n),
            HistoryPeriod::Months(n) => write!(f, "{}mo", n),
            HistoryPeriod::Years(n) => write!(f, "{}y", n),
            HistoryPeriod::YearToDate => write!(f, "ytd"),
            HistoryPeriod::Max => write!(f, "max"),
        }
    }
}

/// Bar interval. Only daily bars are supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interval {
    #[default]
    Daily,
}

impl FromStr for Interval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1d" => Ok(Interval::Daily),
            other => Err(format!(
                "unsupported interval '{}': only daily (1d) bars are supported",
                other
            )),
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Interval::Daily => write!(f, "1d"),
        }
    }
}
