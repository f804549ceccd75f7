use thiserror::Error;

/// Failure of the remote model call. Never retried automatically.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("authentication failed: {0}")]
    Unauthorized(String),
    #[error("quota or rate limit exceeded: {0}")]
    QuotaExceeded(String),
    #[error("service unavailable: {0}")]
    Unavailable(String),
    #[error("{0}")]
    Other(String),
}

impl BackendError {
    /// Short hint printed under the error so the user knows what to fix.
    pub fn hint(&self) -> &'static str {
        match self {
            BackendError::Unauthorized(_) => {
                "Check the API key (GEMINI_API_KEY, --api-key, or the config file)."
            }
            BackendError::QuotaExceeded(_) => "Wait a moment or check your plan's quota.",
            BackendError::Unavailable(_) => "Check your network connection and try again.",
            BackendError::Other(_) => "Try rephrasing the request.",
        }
    }
}

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("API key setup cancelled")]
    SetupCancelled,
    #[error("no API key available after setup")]
    Missing,
}

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("history I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("history serialisation failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("clipboard unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("query is empty")]
    Empty,
}
