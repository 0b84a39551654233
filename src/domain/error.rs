//! Domain error types.

/// Top-level error type for stratbench.
///
/// The computation stages (pipeline, evaluator, simulator, summarizer) only
/// surface [`StratbenchError::MissingIndicatorColumn`]; everything else comes
/// from configuration, request parsing or data access.
#[derive(Debug, thiserror::Error)]
pub enum StratbenchError {
    #[error("invalid strategy for {symbol}: {reason}")]
    InvalidStrategy { symbol: String, reason: String },

    #[error("rule `{rule}` needs column {column}, which was never computed")]
    MissingIndicatorColumn { rule: String, column: String },

    #[error("invalid bar series: {reason}")]
    InvalidBarSeries { reason: String },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("no data for {symbol} ({timeframe})")]
    NoData { symbol: String, timeframe: String },

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

    #[error("invalid request: {reason}")]
    Request { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl From<&StratbenchError> for std::process::ExitCode {
    fn from(err: &StratbenchError) -> Self {
        let code: u8 = match err {
            StratbenchError::Io(_) | StratbenchError::Json(_) => 1,
            StratbenchError::ConfigParse { .. }
            | StratbenchError::ConfigMissing { .. }
            | StratbenchError::ConfigInvalid { .. } => 2,
            StratbenchError::Data { .. }
            | StratbenchError::NoData { .. }
            | StratbenchError::InvalidBarSeries { .. } => 3,
            StratbenchError::InvalidStrategy { .. }
            | StratbenchError::MissingIndicatorColumn { .. }
            | StratbenchError::Request { .. } => 4,
        };
        std::process::ExitCode::from(code)
    }
}
