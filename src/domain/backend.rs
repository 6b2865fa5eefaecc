//! Backend resolution.
//!
//! Two independent decisions are made once per process: which engine computes
//! the trend/momentum indicators, and which estimator computes the risk
//! metric. Each decision probes the primary backend at most once; a failed
//! probe is logged and the fallback is used. The cached choice never changes
//! for the rest of the run.

use crate::domain::error::TickerError;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendChoice {
    Primary,
    Fallback,
}

impl fmt::Display for BackendChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendChoice::Primary => write!(f, "primary"),
            BackendChoice::Fallback => write!(f, "fallback"),
        }
    }
}

/// What the configuration asks for before any probing happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendPreference {
    /// Probe the primary; fall back quietly.
    #[default]
    Auto,
    /// Probe the primary; fall back with a warning.
    Primary,
    /// Skip the probe entirely.
    Fallback,
}

impl FromStr for BackendPreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(BackendPreference::Auto),
            "primary" => Ok(BackendPreference::Primary),
            "fallback" => Ok(BackendPreference::Fallback),
            other => Err(format!(
                "unknown backend '{}' (expected auto, primary or fallback)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Indicator,
    Risk,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Indicator => write!(f, "indicator"),
            BackendKind::Risk => write!(f, "risk"),
        }
    }
}

/// Anything that can hand out a cached backend decision.
pub trait ResolveBackend {
    fn resolve(&self) -> BackendChoice;
}

/// Once-only backend decision around an injectable probe.
pub struct BackendResolver<P> {
    kind: BackendKind,
    preference: BackendPreference,
    probe: P,
    choice: OnceLock<BackendChoice>,
}

impl<P> BackendResolver<P>
where
    P: Fn() -> Result<(), TickerError>,
{
    pub fn new(kind: BackendKind, preference: BackendPreference, probe: P) -> Self {
        Self {
            kind,
            preference,
            probe,
            choice: OnceLock::new(),
        }
    }

    fn decide(&self) -> BackendChoice {
        if self.preference == BackendPreference::Fallback {
            info!(kind = %self.kind, "fallback backend selected by configuration");
            return BackendChoice::Fallback;
        }

        match (self.probe)() {
            Ok(()) => {
                info!(kind = %self.kind, "primary backend available");
                BackendChoice::Primary
            }
            Err(e) if self.preference == BackendPreference::Primary => {
                warn!(
                    kind = %self.kind,
                    error = %e,
                    "primary backend requested but unavailable, using fallback"
                );
                BackendChoice::Fallback
            }
            Err(e) => {
                info!(kind = %self.kind, error = %e, "using fallback backend");
                BackendChoice::Fallback
            }
        }
    }
}

impl<P> ResolveBackend for BackendResolver<P>
where
    P: Fn() -> Result<(), TickerError>,
{
    fn resolve(&self) -> BackendChoice {
        *self.choice.get_or_init(|| self.decide())
    }
}

/// The pair of decisions a run is configured with, passed by value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backends {
    pub indicator: BackendChoice,
    pub risk: BackendChoice,
}

impl Backends {
    pub fn resolve_with(indicator: &dyn ResolveBackend, risk: &dyn ResolveBackend) -> Self {
        Self {
            indicator: indicator.resolve(),
            risk: risk.resolve(),
        }
    }

    /// Resolve both process-wide decisions.
    ///
    /// Preferences only take effect for whichever caller initialises a
    /// resolver first.
    pub fn resolve(indicator: BackendPreference, risk: BackendPreference) -> Self {
        Self::resolve_with(indicator_resolver(indicator), risk_resolver(risk))
    }
}

pub type Probe = fn() -> Result<(), TickerError>;

static INDICATOR: OnceLock<BackendResolver<Probe>> = OnceLock::new();
static RISK: OnceLock<BackendResolver<Probe>> = OnceLock::new();

/// The process-wide indicator resolver; `preference` applies only on first call.
pub fn indicator_resolver(preference: BackendPreference) -> &'static BackendResolver<Probe> {
    let resolver = INDICATOR.get_or_init(|| {
        BackendResolver::new(
            BackendKind::Indicator,
            preference,
            probe_indicator_primary as Probe,
        )
    });
    if resolver.preference != preference {
        debug!(
            requested = ?preference,
            active = ?resolver.preference,
            "indicator resolver already initialised"
        );
    }
    resolver
}

/// The process-wide risk resolver; `preference` applies only on first call.
pub fn risk_resolver(preference: BackendPreference) -> &'static BackendResolver<Probe> {
    let resolver = RISK.get_or_init(|| {
        BackendResolver::new(
            BackendKind::Risk,
            preference,
            crate::domain::risk::probe_primary as Probe,
        )
    });
    if resolver.preference != preference {
        debug!(
            requested = ?preference,
            active = ?resolver.preference,
            "risk resolver already initialised"
        );
    }
    resolver
}

/// Process-wide indicator backend, probed on first use.
pub fn resolve_indicator_backend() -> BackendChoice {
    indicator_resolver(BackendPreference::Auto).resolve()
}

/// Process-wide risk backend, probed on first use.
pub fn resolve_risk_backend() -> BackendChoice {
    risk_resolver(BackendPreference::Auto).resolve()
}

/// Initialise the streaming engine: it must be compiled in and pass its self-check.
pub fn probe_indicator_primary() -> Result<(), TickerError> {
    #[cfg(feature = "yata")]
    {
        crate::domain::indicator::streaming::StreamingEngine::self_check()
    }

    #[cfg(not(feature = "yata"))]
    {
        Err(TickerError::BackendUnavailable {
            backend: "streaming",
            reason: "built without the `yata` feature".into(),
        })
    }
}
