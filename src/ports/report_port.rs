//! Report output port.

use crate::domain::error::TickerError;
use crate::domain::report::TickerReport;
use std::path::PathBuf;

/// A sink that persists one ticker's report and returns the written path.
pub trait ReportPort {
    fn name(&self) -> &'static str;

    fn write(&self, report: &TickerReport) -> Result<PathBuf, TickerError>;
}
