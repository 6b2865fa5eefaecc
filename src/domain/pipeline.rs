//! Per-ticker pipeline and batch runner.
//!
//! Backends are resolved once before the ticker loop. Each ticker then moves
//! through `Fetched → IndicatorsComputed → Assembled → Reported` on its own;
//! a failure stops that ticker only.

use crate::domain::backend::{Backends, ResolveBackend};
use crate::domain::error::TickerError;
use crate::domain::indicator::{compute_indicators, compute_returns};
use crate::domain::ohlcv::{validate_ticker, PriceSeries};
use crate::domain::period::{HistoryPeriod, Interval};
use crate::domain::report::{build_report, TickerReport};
use crate::domain::risk::compute_risk_metric;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

/// Last stage a ticker completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Pending,
    Fetched,
    IndicatorsComputed,
    Assembled,
    Reported,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Pending => "pending",
            Stage::Fetched => "fetched",
            Stage::IndicatorsComputed => "indicators-computed",
            Stage::Assembled => "assembled",
            Stage::Reported => "reported",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
pub struct TickerFailure {
    pub ticker: String,
    pub stage: Stage,
    pub error: TickerError,
}

#[derive(Debug, Default)]
pub struct BatchSummary {
    pub reports: Vec<TickerReport>,
    /// Every file a sink wrote, including those left behind by a ticker whose
    /// later sink failed.
    pub written: Vec<PathBuf>,
    pub failures: Vec<TickerFailure>,
}

impl BatchSummary {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn report(&self, ticker: &str) -> Option<&TickerReport> {
        self.reports.iter().find(|r| r.ticker == ticker)
    }
}

/// What to fetch for every ticker in a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchRequest {
    pub period: HistoryPeriod,
    pub interval: Interval,
}

/// Split a comma-separated ticker list: trimmed, upper-cased, empties dropped.
pub fn normalize_tickers(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Fetch, compute and assemble one ticker's report.
pub fn analyze_ticker(
    data_port: &dyn DataPort,
    ticker: &str,
    request: FetchRequest,
    backends: Backends,
) -> Result<TickerReport, (Stage, TickerError)> {
    validate_ticker(ticker).map_err(|e| (Stage::Pending, e))?;
    let bars = data_port
        .fetch_ohlcv(ticker, request.period, request.interval)
        .map_err(|e| (Stage::Pending, upstream(ticker, e)))?;
    let prices = PriceSeries::new(ticker, bars).map_err(|e| (Stage::Pending, e))?;
    debug!(ticker, rows = prices.len(), stage = %Stage::Fetched, "stage complete");

    let indicators = compute_indicators(&prices, backends.indicator);
    let returns = compute_returns(&prices);
    let risk_metric = compute_risk_metric(&returns, backends.risk);
    debug!(ticker, stage = %Stage::IndicatorsComputed, "stage complete");

    let report = build_report(&prices, &indicators, &returns, risk_metric)
        .map_err(|e| (Stage::IndicatorsComputed, e))?;
    debug!(ticker, stage = %Stage::Assembled, "stage complete");

    Ok(report)
}

fn upstream(ticker: &str, err: TickerError) -> TickerError {
    match err {
        e @ (TickerError::UpstreamFetch { .. }
        | TickerError::NoData { .. }
        | TickerError::InvalidTicker { .. }) => e,
        other => TickerError::UpstreamFetch {
            ticker: ticker.to_string(),
            reason: other.to_string(),
        },
    }
}

/// Run every ticker through the pipeline with already-resolved backends.
pub fn run_batch(
    data_port: &dyn DataPort,
    tickers: &[String],
    request: FetchRequest,
    backends: Backends,
    sinks: &[&dyn ReportPort],
) -> BatchSummary {
    let mut summary = BatchSummary::default();

    for ticker in tickers {
        let report = match analyze_ticker(data_port, ticker, request, backends) {
            Ok(r) => r,
            Err((stage, e)) => {
                error!(ticker = %ticker, stage = %stage, error = %e, "skipping ticker");
                summary.failures.push(TickerFailure {
                    ticker: ticker.clone(),
                    stage,
                    error: e,
                });
                continue;
            }
        };

        let mut written = Vec::with_capacity(sinks.len());
        let mut sink_error = None;
        for sink in sinks {
            match sink.write(&report) {
                Ok(path) => written.push(path),
                Err(e) => {
                    error!(ticker = %ticker, sink = sink.name(), error = %e, "report write failed");
                    sink_error = Some(e);
                    break;
                }
            }
        }

        if let Some(e) = sink_error {
            for path in &written {
                warn!(ticker = %ticker, path = %path.display(), "partial output left on disk");
            }
            summary.written.extend(written);
            summary.failures.push(TickerFailure {
                ticker: ticker.clone(),
                stage: Stage::Assembled,
                error: e,
            });
            continue;
        }

        info!(
            ticker = %ticker,
            rows = report.len(),
            risk_metric = ?report.risk_metric,
            stage = %Stage::Reported,
            "ticker complete"
        );
        summary.written.extend(written);
        summary.reports.push(report);
    }

    summary
}

/// Resolve backends once, then run the batch.
///
/// The resolvers are consulted exactly once per call regardless of how many
/// tickers follow.
pub fn analyze_tickers(
    data_port: &dyn DataPort,
    tickers: &[String],
    request: FetchRequest,
    indicator: &dyn ResolveBackend,
    risk: &dyn ResolveBackend,
    sinks: &[&dyn ReportPort],
) -> BatchSummary {
    let backends = Backends::resolve_with(indicator, risk);
    info!(
        indicator = %backends.indicator,
        risk = %backends.risk,
        tickers = tickers.len(),
        "backends resolved"
    );
    run_batch(data_port, tickers, request, backends, sinks)
}
