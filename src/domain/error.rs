//! Domain error types.

/// Top-level error type for ratchet.
#[derive(Debug, thiserror::Error)]
pub enum RatchetError {
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

    #[error("failed to fetch candles for {symbol}: {reason}")]
    Fetch { symbol: String, reason: String },

    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("insufficient data for {symbol}: have {bars} candles, need {minimum}")]
    InsufficientData {
        symbol: String,
        bars: usize,
        minimum: usize,
    },

    #[error("decimal overflow in {context}")]
    Overflow { context: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl RatchetError {
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            RatchetError::ConfigParse { .. }
                | RatchetError::ConfigMissing { .. }
                | RatchetError::ConfigInvalid { .. }
        )
    }

    pub(crate) fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        RatchetError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&RatchetError> for std::process::ExitCode {
    fn from(err: &RatchetError) -> Self {
        let code: u8 = match err {
            RatchetError::Io(_) => 1,
            RatchetError::ConfigParse { .. }
            | RatchetError::ConfigMissing { .. }
            | RatchetError::ConfigInvalid { .. } => 2,
            RatchetError::Fetch { .. } | RatchetError::Database { .. } => 3,
            RatchetError::InsufficientData { .. } | RatchetError::Overflow { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
