//! CSV indicator table writer.

use crate::domain::error::TickerError;
use crate::domain::ohlcv::validate_ticker;
use crate::domain::report::{REPORT_COLUMNS, TickerReport};
use crate::ports::report_port::ReportPort;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

/// Writes `<TICKER>_indicators.csv`; undefined cells are left blank and the
/// ticker-wide risk metric is repeated on every row.
pub struct CsvReportAdapter {
    output_dir: PathBuf,
    decimals: Option<usize>,
}

impl CsvReportAdapter {
    pub fn new(output_dir: PathBuf, decimals: Option<usize>) -> Self {
        Self {
            output_dir,
            decimals,
        }
    }

    fn number(&self, value: f64) -> String {
        match self.decimals {
            Some(d) => format!("{:.*}", d, value),
            None => value.to_string(),
        }
    }

    fn cell(&self, value: Option<f64>) -> String {
        value.map(|v| self.number(v)).unwrap_or_default()
    }
}

impl ReportPort for CsvReportAdapter {
    fn name(&self) -> &'static str {
        "csv"
    }

    fn write(&self, report: &TickerReport) -> Result<PathBuf, TickerError> {
        let stem = validate_ticker(&report.ticker)?;
        fs::create_dir_all(&self.output_dir)?;
        let path = self.output_dir.join(format!("{}_indicators.csv", stem));

        let mut wtr = csv::Writer::from_path(&path)?;
        wtr.write_record(REPORT_COLUMNS)?;

        let risk = self.cell(report.risk_metric);
        for row in &report.rows {
            wtr.write_record([
                row.date.format("%Y-%m-%d").to_string(),
                self.number(row.open),
                self.number(row.high),
                self.number(row.low),
                self.number(row.close),
                row.volume.to_string(),
                self.cell(row.sma_20),
                self.cell(row.rsi_14),
                self.cell(row.macd),
                self.cell(row.macd_signal),
                self.cell(row.macd_hist),
                self.cell(row.return_1d),
                risk.clone(),
            ])?;
        }
        wtr.flush()?;

        debug!(ticker = %report.ticker, rows = report.len(), path = %path.display(), "table written");
        Ok(path)
    }
}
