//! Domain error types.

/// Top-level error type for pricelens.
#[derive(Debug, thiserror::Error)]
pub enum TickerError {
    #[error("{backend} backend unavailable: {reason}")]
    BackendUnavailable {
        backend: &'static str,
        reason: String,
    },

    #[error("schema mismatch in column {column}: expected {expected} rows, got {actual}")]
    SchemaMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("upstream fetch failed for {ticker}: {reason}")]
    UpstreamFetch { ticker: String, reason: String },

    #[error("no data returned for {ticker}")]
    NoData { ticker: String },

    #[error("invalid ticker {ticker:?}: {reason}")]
    InvalidTicker { ticker: String, reason: String },

    #[error("invalid price series for {ticker}: {reason}")]
    InvalidSeries { ticker: String, reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&TickerError> for std::process::ExitCode {
    fn from(err: &TickerError) -> Self {
        let code: u8 = match err {
            TickerError::Io(_) | TickerError::Csv(_) => 1,
            TickerError::ConfigParse { .. }
            | TickerError::ConfigMissing { .. }
            | TickerError::ConfigInvalid { .. } => 2,
            TickerError::BackendUnavailable { .. } => 3,
            TickerError::SchemaMismatch { .. }
            | TickerError::InvalidSeries { .. }
            | TickerError::InvalidTicker { .. } => 4,
            TickerError::UpstreamFetch { .. } | TickerError::NoData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_mismatch_message_names_column() {
        let err = TickerError::SchemaMismatch {
            column: "rsi_14".into(),
            expected: 30,
            actual: 29,
        };
        assert_eq!(
            err.to_string(),
            "schema mismatch in column rsi_14: expected 30 rows, got 29"
        );
    }

    #[test]
    fn backend_unavailable_message() {
        let err = TickerError::BackendUnavailable {
            backend: "streaming",
            reason: "not compiled in".into(),
        };
        assert_eq!(
            err.to_string(),
            "streaming backend unavailable: not compiled in"
        );
    }

    #[test]
    fn config_missing_names_section_and_key() {
        let err = TickerError::ConfigMissing {
            section: "run".into(),
            key: "tickers".into(),
        };
        assert_eq!(err.to_string(), "missing config key [run] tickers");
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: TickerError = io.into();
        assert!(matches!(err, TickerError::Io(_)));
    }
}
