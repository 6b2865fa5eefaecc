//! Sharpe-like risk metric.
//!
//! mean / sample standard deviation (ddof = 1) of the defined daily returns.
//! No annualisation and no risk-free adjustment. Undefined when fewer than
//! two returns exist or the deviation is zero.

use crate::domain::backend::BackendChoice;
use crate::domain::error::TickerError;

/// `None` is the sentinel for an undefined ratio.
pub type RiskMetric = Option<f64>;

pub trait RiskEstimator: Sync {
    fn name(&self) -> &'static str;

    fn sharpe_like(&self, returns: &[f64]) -> RiskMetric;
}

/// Hand-written mean / sample-std ratio (fallback).
#[derive(Debug, Clone, Copy, Default)]
pub struct ManualRatio;

impl RiskEstimator for ManualRatio {
    fn name(&self) -> &'static str {
        "manual"
    }

    fn sharpe_like(&self, returns: &[f64]) -> RiskMetric {
        if returns.len() < 2 {
            return None;
        }
        let n = returns.len() as f64;
        let mean = returns.iter().sum::<f64>() / n;
        let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
        ratio(mean, variance.sqrt())
    }
}

/// Ratio computed with the `statrs` statistics library (primary).
#[cfg(feature = "statrs")]
#[derive(Debug, Clone, Copy, Default)]
pub struct StatrsRatio;

#[cfg(feature = "statrs")]
impl RiskEstimator for StatrsRatio {
    fn name(&self) -> &'static str {
        "statrs"
    }

    fn sharpe_like(&self, returns: &[f64]) -> RiskMetric {
        use statrs::statistics::Statistics;

        if returns.len() < 2 {
            return None;
        }
        let mean = returns.iter().copied().mean();
        let std_dev = returns.iter().copied().std_dev();
        ratio(mean, std_dev)
    }
}

fn ratio(mean: f64, std_dev: f64) -> RiskMetric {
    if !std_dev.is_finite() || std_dev <= 0.0 {
        return None;
    }
    let value = mean / std_dev;
    value.is_finite().then_some(value)
}

static MANUAL: ManualRatio = ManualRatio;
#[cfg(feature = "statrs")]
static STATRS: StatrsRatio = StatrsRatio;

/// Map a resolved backend choice onto its estimator.
pub fn estimator(choice: BackendChoice) -> &'static dyn RiskEstimator {
    match choice {
        #[cfg(feature = "statrs")]
        BackendChoice::Primary => &STATRS,
        #[cfg(not(feature = "statrs"))]
        BackendChoice::Primary => &MANUAL,
        BackendChoice::Fallback => &MANUAL,
    }
}

/// Risk metric over the defined entries of a return series.
pub fn compute_risk_metric(returns: &[Option<f64>], backend: BackendChoice) -> RiskMetric {
    let defined: Vec<f64> = returns.iter().flatten().copied().collect();
    estimator(backend).sharpe_like(&defined)
}

/// Initialise the statrs estimator: compiled in and agreeing with a known answer.
pub fn probe_primary() -> Result<(), TickerError> {
    #[cfg(feature = "statrs")]
    {
        // mean 0.02, sample std 0.01
        let known = [0.01, 0.02, 0.03];
        match StatrsRatio.sharpe_like(&known) {
            Some(v) if (v - 2.0).abs() < 1e-9 => Ok(()),
            other => Err(TickerError::BackendUnavailable {
                backend: "statrs",
                reason: format!("self-check returned {:?}, expected 2.0", other),
            }),
        }
    }

    #[cfg(not(feature = "statrs"))]
    {
        Err(TickerError::BackendUnavailable {
            backend: "statrs",
            reason: "built without the `statrs` feature".into(),
        })
    }
}
