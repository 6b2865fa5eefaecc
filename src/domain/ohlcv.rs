//! OHLCV bar and price series representation.

use crate::domain::error::TickerError;
use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

/// Check that a ticker is safe to use as a file name stem.
///
/// Letters, digits and `.-_^=&` are accepted, which covers index (`^GSPC`),
/// currency (`EURUSD=X`) and class-share (`BRK.B`) symbols. Path separators
/// and dot-only names are not.
pub fn validate_ticker(ticker: &str) -> Result<&str, TickerError> {
    let invalid = |reason: &str| TickerError::InvalidTicker {
        ticker: ticker.to_string(),
        reason: reason.to_string(),
    };
    if ticker.is_empty() {
        return Err(invalid("empty"));
    }
    if ticker.chars().all(|c| c == '.') {
        return Err(invalid("not a file name"));
    }
    if let Some(c) = ticker
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || ".-_^=&".contains(*c)))
    {
        return Err(invalid(&format!("character {c:?} not allowed")));
    }
    Ok(ticker)
}

/// Daily bars for one ticker, strictly ascending by date.
#[derive(Debug, Clone)]
pub struct PriceSeries {
    ticker: String,
    bars: Vec<OhlcvBar>,
}

impl PriceSeries {
    /// Build a series, rejecting empty input and out-of-order or duplicate dates.
    pub fn new(ticker: impl Into<String>, bars: Vec<OhlcvBar>) -> Result<Self, TickerError> {
        let ticker = ticker.into();
        if bars.is_empty() {
            return Err(TickerError::NoData { ticker });
        }
        if let Some(w) = bars.windows(2).find(|w| w[1].date <= w[0].date) {
            return Err(TickerError::InvalidSeries {
                reason: format!("date {} does not follow {}", w[1].date, w[0].date),
                ticker,
            });
        }
        Ok(Self { ticker, bars })
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn bars(&self) -> &[OhlcvBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }
}
