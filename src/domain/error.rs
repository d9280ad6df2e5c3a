//! Domain error types.

/// Top-level error type for fundwatch.
#[derive(Debug, thiserror::Error)]
pub enum FundwatchError {
    /// Network failure, timeout or malformed remote payload. Retryable.
    #[error("transient fetch failure for {code}: {reason}")]
    TransientFetch { code: String, reason: String },

    /// Structural defect in a series. Never retried; the offending
    /// update is discarded and the last known-good data kept.
    #[error("invalid series for {code}: {reason}")]
    Validation { code: String, reason: String },

    /// Series shorter than the required window. A recognized terminal
    /// state, not a failure: the instrument yields an unavailable signal.
    #[error("insufficient data for {code}: have {rows} rows, need {minimum}")]
    InsufficientData {
        code: String,
        rows: usize,
        minimum: usize,
    },

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

    /// Failure to construct the HTTP client itself, as opposed to a
    /// failed request.
    #[error("http client error: {reason}")]
    Http { reason: String },

    #[error("store error: {reason}")]
    Store { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl FundwatchError {
    /// Whether a retry policy may re-attempt the failed operation.
    pub fn is_transient(&self) -> bool {
        matches!(self, FundwatchError::TransientFetch { .. })
    }
}

impl From<&FundwatchError> for std::process::ExitCode {
    fn from(err: &FundwatchError) -> Self {
        let code: u8 = match err {
            FundwatchError::Io(_) => 1,
            FundwatchError::ConfigParse { .. }
            | FundwatchError::ConfigMissing { .. }
            | FundwatchError::ConfigInvalid { .. } => 2,
            FundwatchError::Store { .. } => 3,
            FundwatchError::TransientFetch { .. } | FundwatchError::Http { .. } => 4,
            FundwatchError::Validation { .. } => 5,
            FundwatchError::InsufficientData { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}
