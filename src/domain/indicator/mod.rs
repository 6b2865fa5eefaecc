//! Technical indicator computation.
//!
//! Every computed cell is an `Option<f64>`: `None` marks a row that sits inside
//! the indicator's warm-up window (or whose value would not be finite). The
//! two interchangeable engines behind [`IndicatorEngine`] produce the same
//! columns with the same names, so callers never branch on the backend.
//!
//! - [`formula::FormulaEngine`]: whole-series reference formulas (fallback).
//! - `streaming::StreamingEngine`: bar-by-bar incremental state machines
//!   (primary, behind the `yata` feature).

pub mod ema;
pub mod formula;
pub mod macd;
pub mod returns;
pub mod rsi;
pub mod sma;
#[cfg(feature = "yata")]
pub mod streaming;

use crate::domain::backend::BackendChoice;
use crate::domain::ohlcv::PriceSeries;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, warn};

pub use returns::{compute_returns, ReturnSeries};

pub const SMA_WINDOW: usize = 20;
pub const RSI_WINDOW: usize = 14;
pub const MACD_FAST: usize = 12;
pub const MACD_SLOW: usize = 26;
pub const MACD_SIGNAL: usize = 9;

/// Output columns produced by the engine, in report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IndicatorColumn {
    Sma20,
    Rsi14,
    Macd,
    MacdSignal,
    MacdHist,
}

impl IndicatorColumn {
    pub const ALL: [IndicatorColumn; 5] = [
        IndicatorColumn::Sma20,
        IndicatorColumn::Rsi14,
        IndicatorColumn::Macd,
        IndicatorColumn::MacdSignal,
        IndicatorColumn::MacdHist,
    ];

    pub fn name(self) -> &'static str {
        match self {
            IndicatorColumn::Sma20 => "sma_20",
            IndicatorColumn::Rsi14 => "rsi_14",
            IndicatorColumn::Macd => "macd",
            IndicatorColumn::MacdSignal => "macd_signal",
            IndicatorColumn::MacdHist => "macd_hist",
        }
    }
}

impl fmt::Display for IndicatorColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// MACD line, signal line and histogram, aligned to the input closes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MacdColumns {
    pub line: Vec<Option<f64>>,
    pub signal: Vec<Option<f64>>,
    pub histogram: Vec<Option<f64>>,
}

impl MacdColumns {
    /// Assemble the three columns, deriving the histogram from line and signal.
    pub fn from_line_and_signal(line: Vec<Option<f64>>, signal: Vec<Option<f64>>) -> Self {
        let histogram = line
            .iter()
            .zip(&signal)
            .map(|(l, s)| match (l, s) {
                (Some(l), Some(s)) => finite(l - s),
                _ => None,
            })
            .collect();
        Self {
            line,
            signal,
            histogram,
        }
    }
}

/// Uniform interface over the primary and fallback indicator backends.
pub trait IndicatorEngine: Sync {
    fn name(&self) -> &'static str;

    fn sma(&self, closes: &[f64], window: usize) -> Vec<Option<f64>>;

    fn rsi(&self, closes: &[f64], window: usize) -> Vec<Option<f64>>;

    fn macd(&self, closes: &[f64], fast: usize, slow: usize, signal: usize) -> MacdColumns;
}

static FORMULA: formula::FormulaEngine = formula::FormulaEngine;
#[cfg(feature = "yata")]
static STREAMING: streaming::StreamingEngine = streaming::StreamingEngine;

/// Map a resolved backend choice onto its engine.
///
/// Without the `yata` feature there is no primary engine to hand out, so
/// `Primary` degrades to the formula engine.
pub fn engine(choice: BackendChoice) -> &'static dyn IndicatorEngine {
    match choice {
        #[cfg(feature = "yata")]
        BackendChoice::Primary => &STREAMING,
        #[cfg(not(feature = "yata"))]
        BackendChoice::Primary => &FORMULA,
        BackendChoice::Fallback => &FORMULA,
    }
}

/// Indicator columns keyed by [`IndicatorColumn`], each the length of the price series.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndicatorSet {
    columns: BTreeMap<IndicatorColumn, Vec<Option<f64>>>,
}

impl IndicatorSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, column: IndicatorColumn, values: Vec<Option<f64>>) {
        self.columns.insert(column, values);
    }

    pub fn get(&self, column: IndicatorColumn) -> Option<&[Option<f64>]> {
        self.columns.get(&column).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (IndicatorColumn, &[Option<f64>])> {
        self.columns.iter().map(|(c, v)| (*c, v.as_slice()))
    }

    /// Columns with no defined value at all.
    pub fn undefined_columns(&self) -> Vec<IndicatorColumn> {
        self.columns
            .iter()
            .filter(|(_, v)| v.iter().all(Option::is_none))
            .map(|(c, _)| *c)
            .collect()
    }
}

/// Compute SMA-20, RSI-14 and MACD(12,26,9) for a price series.
///
/// Series too short for a warm-up window yield all-undefined columns; this is
/// logged and never reported as an error.
pub fn compute_indicators(prices: &PriceSeries, backend: BackendChoice) -> IndicatorSet {
    let engine = engine(backend);
    let closes = prices.closes();
    debug!(
        ticker = prices.ticker(),
        engine = engine.name(),
        rows = closes.len(),
        "computing indicators"
    );

    let macd = engine.macd(&closes, MACD_FAST, MACD_SLOW, MACD_SIGNAL);

    let mut set = IndicatorSet::new();
    set.insert(IndicatorColumn::Sma20, engine.sma(&closes, SMA_WINDOW));
    set.insert(IndicatorColumn::Rsi14, engine.rsi(&closes, RSI_WINDOW));
    set.insert(IndicatorColumn::Macd, macd.line);
    set.insert(IndicatorColumn::MacdSignal, macd.signal);
    set.insert(IndicatorColumn::MacdHist, macd.histogram);

    let undefined = set.undefined_columns();
    if !undefined.is_empty() {
        let names: Vec<&str> = undefined.iter().map(|c| c.name()).collect();
        warn!(
            ticker = prices.ticker(),
            rows = closes.len(),
            columns = %names.join(","),
            "insufficient data: columns entirely undefined"
        );
    }

    set
}

/// Map a non-finite value onto the undefined marker.
pub(crate) fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ohlcv::OhlcvBar;
    use chrono::NaiveDate;

    fn series(closes: &[f64]) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| OhlcvBar {
                date: start + chrono::Duration::days(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1000,
            })
            .collect();
        PriceSeries::new("TEST", bars).unwrap()
    }

    #[test]
    fn column_names() {
        let names: Vec<&str> = IndicatorColumn::ALL.iter().map(|c| c.name()).collect();
        assert_eq!(
            names,
            vec!["sma_20", "rsi_14", "macd", "macd_signal", "macd_hist"]
        );
        assert_eq!(IndicatorColumn::MacdHist.to_string(), "macd_hist");
    }

    #[test]
    fn all_columns_aligned_to_series() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();
        let set = compute_indicators(&series(&closes), BackendChoice::Fallback);
        for column in IndicatorColumn::ALL {
            assert_eq!(set.get(column).unwrap().len(), 40, "{column}");
        }
    }

    #[test]
    fn short_series_is_all_undefined() {
        let set = compute_indicators(
            &series(&[100.0, 101.0, 102.0, 103.0, 104.0]),
            BackendChoice::Fallback,
        );
        assert_eq!(set.undefined_columns().len(), 5);
    }

    #[test]
    fn histogram_derivation_requires_both_sides() {
        let macd = MacdColumns::from_line_and_signal(
            vec![None, Some(2.0), Some(3.0)],
            vec![None, None, Some(1.0)],
        );
        assert_eq!(macd.histogram, vec![None, None, Some(2.0)]);
    }

    #[test]
    fn finite_filters_nan_and_infinity() {
        assert_eq!(finite(1.5), Some(1.5));
        assert_eq!(finite(f64::NAN), None);
        assert_eq!(finite(f64::INFINITY), None);
    }

    #[test]
    fn primary_engine_name() {
        #[cfg(feature = "yata")]
        assert_eq!(engine(BackendChoice::Primary).name(), "streaming");
        #[cfg(not(feature = "yata"))]
        assert_eq!(engine(BackendChoice::Primary).name(), "formula");
        assert_eq!(engine(BackendChoice::Fallback).name(), "formula");
    }
}
