//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};

use crate::adapters::chart_svg::SvgChartAdapter;
use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backend::{indicator_resolver, risk_resolver, BackendPreference, Backends};
use crate::domain::error::TickerError;
use crate::domain::period::{HistoryPeriod, Interval};
use crate::domain::pipeline::{analyze_tickers, normalize_tickers, BatchSummary, FetchRequest};
use crate::ports::config_port::ConfigPort;
use crate::ports::report_port::ReportPort;

const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_OUTPUT_DIR: &str = "outputs/indicators";
const MAX_DECIMALS: usize = 17;

#[derive(Parser, Debug)]
#[command(name = "pricelens", about = "Technical indicators and risk metric per ticker")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compute indicators for a comma-separated list of tickers
    Run {
        #[arg(short, long)]
        tickers: String,
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
        #[arg(long)]
        period: Option<String>,
        #[arg(long)]
        interval: Option<String>,
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
        #[arg(long)]
        no_chart: bool,
    },
    /// Resolve and print the indicator and risk backends
    Backends {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Default, Clone)]
pub struct RunOverrides {
    pub data_dir: Option<PathBuf>,
    pub period: Option<String>,
    pub interval: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub no_chart: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub data_dir: PathBuf,
    pub output_dir: PathBuf,
    pub request: FetchRequest,
    pub chart: bool,
    pub decimals: Option<usize>,
    pub indicator_backend: BackendPreference,
    pub risk_backend: BackendPreference,
}

fn invalid(section: &str, key: &str, reason: String) -> TickerError {
    TickerError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason,
    }
}

fn backend_preference(config: &dyn ConfigPort, key: &str) -> Result<BackendPreference, TickerError> {
    match config.get_string("backends", key) {
        Some(v) => v.parse().map_err(|e| invalid("backends", key, e)),
        None => Ok(BackendPreference::Auto),
    }
}

/// Merge the config file with command-line overrides and validate the result.
pub fn build_run_config(
    config: &dyn ConfigPort,
    overrides: RunOverrides,
) -> Result<RunConfig, TickerError> {
    let period = match overrides.period.or_else(|| config.get_string("data", "period")) {
        Some(p) => p
            .parse::<HistoryPeriod>()
            .map_err(|e| invalid("data", "period", e))?,
        None => HistoryPeriod::default(),
    };
    let interval = match overrides
        .interval
        .or_else(|| config.get_string("data", "interval"))
    {
        Some(i) => i.parse::<Interval>().map_err(|e| invalid("data", "interval", e))?,
        None => Interval::default(),
    };

    let decimals = match config.get_string("output", "decimals") {
        Some(d) => {
            let n: usize = d
                .trim()
                .parse()
                .map_err(|_| invalid("output", "decimals", format!("'{}' is not a count", d)))?;
            if n > MAX_DECIMALS {
                return Err(invalid(
                    "output",
                    "decimals",
                    format!("must be at most {}", MAX_DECIMALS),
                ));
            }
            Some(n)
        }
        None => None,
    };

    let data_dir = overrides.data_dir.unwrap_or_else(|| {
        config
            .get_string("data", "dir")
            .unwrap_or_else(|| DEFAULT_DATA_DIR.to_string())
            .into()
    });
    let output_dir = overrides.output_dir.unwrap_or_else(|| {
        config
            .get_string("output", "dir")
            .unwrap_or_else(|| DEFAULT_OUTPUT_DIR.to_string())
            .into()
    });

    Ok(RunConfig {
        data_dir,
        output_dir,
        request: FetchRequest { period, interval },
        chart: !overrides.no_chart && config.get_bool("output", "chart", true),
        decimals,
        indicator_backend: backend_preference(config, "indicator")?,
        risk_backend: backend_preference(config, "risk")?,
    })
}

pub fn load_config(path: Option<&Path>) -> Result<FileConfigAdapter, TickerError> {
    match path {
        Some(p) => {
            info!(path = %p.display(), "loading config");
            FileConfigAdapter::from_file(p)
        }
        None => Ok(FileConfigAdapter::empty()),
    }
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Run {
            tickers,
            config,
            data_dir,
            period,
            interval,
            output_dir,
            no_chart,
        } => {
            let overrides = RunOverrides {
                data_dir,
                period,
                interval,
                output_dir,
                no_chart,
            };
            run_indicators(&tickers, config.as_deref(), overrides)
        }
        Command::Backends { config } => run_backends(config.as_deref()),
    }
}

fn fail(err: &TickerError) -> ExitCode {
    error!(error = %err, "run aborted");
    eprintln!("error: {err}");
    err.into()
}

fn run_indicators(raw_tickers: &str, config_path: Option<&Path>, overrides: RunOverrides) -> ExitCode {
    let run_config = match load_config(config_path).and_then(|c| build_run_config(&c, overrides)) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };

    let tickers = normalize_tickers(raw_tickers);
    if tickers.is_empty() {
        return fail(&TickerError::ConfigMissing {
            section: "run".into(),
            key: "tickers".into(),
        });
    }

    let summary = run_with_config(&tickers, &run_config);
    for path in &summary.written {
        println!("{}", path.display());
    }
    info!(
        succeeded = summary.reports.len(),
        failed = summary.failures.len(),
        "run complete"
    );

    match summary.failures.first() {
        None => ExitCode::SUCCESS,
        Some(first) => {
            for f in &summary.failures {
                eprintln!("error: {} failed after stage {}: {}", f.ticker, f.stage, f.error);
            }
            (&first.error).into()
        }
    }
}

/// Run the batch against the CSV data directory with the configured sinks.
pub fn run_with_config(tickers: &[String], config: &RunConfig) -> BatchSummary {
    let data_port = CsvAdapter::new(config.data_dir.clone());
    let table = CsvReportAdapter::new(config.output_dir.clone(), config.decimals);
    let chart = SvgChartAdapter::new(config.output_dir.clone());

    let mut sinks: Vec<&dyn ReportPort> = vec![&table];
    if config.chart {
        sinks.push(&chart);
    }

    analyze_tickers(
        &data_port,
        tickers,
        config.request,
        indicator_resolver(config.indicator_backend),
        risk_resolver(config.risk_backend),
        &sinks,
    )
}

fn run_backends(config_path: Option<&Path>) -> ExitCode {
    let run_config = match load_config(config_path)
        .and_then(|c| build_run_config(&c, RunOverrides::default()))
    {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };
    let backends = Backends::resolve(run_config.indicator_backend, run_config.risk_backend);
    println!("indicator: {}", backends.indicator);
    println!("risk: {}", backends.risk);
    ExitCode::SUCCESS
}
