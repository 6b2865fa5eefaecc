//! Per-ticker report assembly.

use crate::domain::error::TickerError;
use crate::domain::indicator::{IndicatorColumn, IndicatorSet};
use crate::domain::ohlcv::PriceSeries;
use crate::domain::risk::RiskMetric;
use chrono::NaiveDate;

/// Output column headers, in file order.
pub const REPORT_COLUMNS: [&str; 13] = [
    "date",
    "open",
    "high",
    "low",
    "close",
    "volume",
    "sma_20",
    "rsi_14",
    "macd",
    "macd_signal",
    "macd_hist",
    "return_1d",
    "sharpe_like_metric",
];

#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
    pub sma_20: Option<f64>,
    pub rsi_14: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub macd_hist: Option<f64>,
    pub return_1d: Option<f64>,
}

impl ReportRow {
    pub fn indicator(&self, column: IndicatorColumn) -> Option<f64> {
        match column {
            IndicatorColumn::Sma20 => self.sma_20,
            IndicatorColumn::Rsi14 => self.rsi_14,
            IndicatorColumn::Macd => self.macd,
            IndicatorColumn::MacdSignal => self.macd_signal,
            IndicatorColumn::MacdHist => self.macd_hist,
        }
    }
}

/// One row per trading day plus the ticker-wide risk metric, stored once.
#[derive(Debug, Clone, PartialEq)]
pub struct TickerReport {
    pub ticker: String,
    pub rows: Vec<ReportRow>,
    pub risk_metric: RiskMetric,
}

impl TickerReport {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// One indicator column across all rows.
    pub fn column(&self, column: IndicatorColumn) -> Vec<Option<f64>> {
        self.rows.iter().map(|r| r.indicator(column)).collect()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.close).collect()
    }
}

/// Merge prices, indicators, returns and the risk metric row by row.
///
/// No value is recomputed. Every indicator column and the return series must
/// have exactly one entry per price bar.
pub fn build_report(
    prices: &PriceSeries,
    indicators: &IndicatorSet,
    returns: &[Option<f64>],
    risk_metric: RiskMetric,
) -> Result<TickerReport, TickerError> {
    let expected = prices.len();

    let mut columns = Vec::with_capacity(IndicatorColumn::ALL.len());
    for column in IndicatorColumn::ALL {
        let values = indicators
            .get(column)
            .ok_or_else(|| TickerError::SchemaMismatch {
                column: column.name().to_string(),
                expected,
                actual: 0,
            })?;
        check_len(column.name(), expected, values.len())?;
        columns.push(values);
    }
    check_len("return_1d", expected, returns.len())?;

    let rows = prices
        .bars()
        .iter()
        .enumerate()
        .map(|(i, bar)| ReportRow {
            date: bar.date,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
            sma_20: columns[0][i],
            rsi_14: columns[1][i],
            macd: columns[2][i],
            macd_signal: columns[3][i],
            macd_hist: columns[4][i],
            return_1d: returns[i],
        })
        .collect();

    Ok(TickerReport {
        ticker: prices.ticker().to_string(),
        rows,
        risk_metric,
    })
}

fn check_len(column: &str, expected: usize, actual: usize) -> Result<(), TickerError> {
    if expected == actual {
        Ok(())
    } else {
        Err(TickerError::SchemaMismatch {
            column: column.to_string(),
            expected,
            actual,
        })
    }
}
