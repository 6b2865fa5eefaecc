#![allow(dead_code)]

use chrono::NaiveDate;
use pricelens::domain::backend::{BackendChoice, ResolveBackend};
use pricelens::domain::error::TickerError;
pub use pricelens::domain::ohlcv::OhlcvBar;
use pricelens::domain::ohlcv::PriceSeries;
use pricelens::domain::period::{HistoryPeriod, Interval};
use pricelens::ports::data_port::DataPort;
use std::cell::Cell;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::Path;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub errors: HashMap<String, String>,
    pub fetches: Cell<usize>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
            fetches: Cell::new(0),
        }
    }

    pub fn with_bars(mut self, ticker: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(ticker.to_string(), bars);
        self
    }

    pub fn with_error(mut self, ticker: &str, reason: &str) -> Self {
        self.errors.insert(ticker.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_ohlcv(
        &self,
        ticker: &str,
        _period: HistoryPeriod,
        _interval: Interval,
    ) -> Result<Vec<OhlcvBar>, TickerError> {
        self.fetches.set(self.fetches.get() + 1);
        if let Some(reason) = self.errors.get(ticker) {
            return Err(TickerError::UpstreamFetch {
                ticker: ticker.to_string(),
                reason: reason.clone(),
            });
        }
        Ok(self.data.get(ticker).cloned().unwrap_or_default())
    }
}

/// A resolver that counts how often it is asked and always answers `choice`.
pub struct CountingResolver {
    pub choice: BackendChoice,
    pub calls: Cell<usize>,
}

impl CountingResolver {
    pub fn new(choice: BackendChoice) -> Self {
        Self {
            choice,
            calls: Cell::new(0),
        }
    }
}

impl ResolveBackend for CountingResolver {
    fn resolve(&self) -> BackendChoice {
        self.calls.set(self.calls.get() + 1);
        self.choice
    }
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub fn make_bar(date_str: &str, close: f64) -> OhlcvBar {
    OhlcvBar {
        date: NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap(),
        open: close,
        high: close + 1.0,
        low: close - 1.0,
        close,
        volume: 1000,
    }
}

/// One bar per calendar day from 2024-01-01 with the given closes.
pub fn bars_from_closes(closes: &[f64]) -> Vec<OhlcvBar> {
    let start = date(2024, 1, 1);
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| OhlcvBar {
            date: start + chrono::Duration::days(i as i64),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1000 + i as i64,
        })
        .collect()
}

pub fn series_from_closes(ticker: &str, closes: &[f64]) -> PriceSeries {
    PriceSeries::new(ticker, bars_from_closes(closes)).unwrap()
}

/// 100, 101, ..., 100 + n - 1.
pub fn linear_closes(n: usize) -> Vec<f64> {
    (0..n).map(|i| 100.0 + i as f64).collect()
}

/// Deterministic wavy series that moves in both directions.
pub fn wave_closes(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| {
            let t = i as f64;
            50.0 + 0.1 * t + 3.0 * (t * 0.4).sin() + 1.5 * (t * 1.3).cos()
        })
        .collect()
}

/// Write `<dir>/<ticker>.csv` in the input layout the CSV data adapter reads.
pub fn write_price_csv(dir: &Path, ticker: &str, bars: &[OhlcvBar]) {
    let mut out = String::from("Date,Open,High,Low,Close,Volume\n");
    for b in bars {
        writeln!(
            out,
            "{},{},{},{},{},{}",
            b.date, b.open, b.high, b.low, b.close, b.volume
        )
        .unwrap();
    }
    std::fs::write(dir.join(format!("{}.csv", ticker)), out).unwrap();
}
