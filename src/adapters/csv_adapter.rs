//! CSV file market-data adapter.
//!
//! Reads `<base_path>/<TICKER>.csv`. Columns are located by header name
//! (case-insensitive), so exports with extra columns such as `Adj Close`
//! load unchanged.

use crate::domain::error::TickerError;
use crate::domain::ohlcv::{validate_ticker, OhlcvBar};
use crate::domain::period::{HistoryPeriod, Interval};
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

const REQUIRED: [&str; 6] = ["date", "open", "high", "low", "close", "volume"];

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, ticker: &str) -> Result<PathBuf, TickerError> {
        Ok(self.base_path.join(format!("{}.csv", validate_ticker(ticker)?)))
    }
}

impl DataPort for CsvAdapter {
    fn fetch_ohlcv(
        &self,
        ticker: &str,
        period: HistoryPeriod,
        _interval: Interval,
    ) -> Result<Vec<OhlcvBar>, TickerError> {
        let fail = |reason: String| TickerError::UpstreamFetch {
            ticker: ticker.to_string(),
            reason,
        };

        let path = self.csv_path(ticker)?;
        let content = fs::read_to_string(&path)
            .map_err(|e| fail(format!("failed to read {}: {}", path.display(), e)))?;

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());

        let headers = rdr
            .headers()
            .map_err(|e| fail(format!("CSV header error: {}", e)))?
            .clone();
        let mut index = [0usize; 6];
        for (slot, name) in index.iter_mut().zip(REQUIRED) {
            *slot = headers
                .iter()
                .position(|h| h.eq_ignore_ascii_case(name))
                .ok_or_else(|| fail(format!("missing {} column", name)))?;
        }
        let [date_i, open_i, high_i, low_i, close_i, volume_i] = index;

        let mut bars = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| fail(format!("CSV parse error: {}", e)))?;
            let get = |i: usize, name: &str| {
                record
                    .get(i)
                    .filter(|v| !v.is_empty())
                    .ok_or_else(|| fail(format!("missing {} value", name)))
            };
            let number = |i: usize, name: &str| -> Result<f64, TickerError> {
                get(i, name)?
                    .parse()
                    .map_err(|e| fail(format!("invalid {} value: {}", name, e)))
            };

            let date_str = get(date_i, "date")?;
            let date = parse_date(date_str)
                .ok_or_else(|| fail(format!("invalid date format: {}", date_str)))?;

            bars.push(OhlcvBar {
                date,
                open: number(open_i, "open")?,
                high: number(high_i, "high")?,
                low: number(low_i, "low")?,
                close: number(close_i, "close")?,
                volume: parse_volume(get(volume_i, "volume")?)
                    .ok_or_else(|| fail("invalid volume value".into()))?,
            });
        }

        bars.sort_by_key(|b| b.date);
        Ok(filter_period(bars, period))
    }
}

/// Accepts `YYYY-MM-DD`, optionally followed by a time component.
fn parse_date(value: &str) -> Option<NaiveDate> {
    let day = value.get(..10).unwrap_or(value);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

/// Volume may be exported as a float (`1234.0`).
fn parse_volume(value: &str) -> Option<i64> {
    value
        .parse::<i64>()
        .ok()
        .or_else(|| value.parse::<f64>().ok().filter(|v| v.is_finite()).map(|v| v.round() as i64))
}

/// Keep the bars inside `period`, measured back from the last bar.
pub fn filter_period(bars: Vec<OhlcvBar>, period: HistoryPeriod) -> Vec<OhlcvBar> {
    let Some(last) = bars.last().map(|b| b.date) else {
        return bars;
    };
    match period.start_date(last) {
        Some(start) => bars.into_iter().filter(|b| b.date >= start).collect(),
        None => bars,
    }
}
