use thiserror::Error;

/// Errors surfaced by the orchestration adapters.
#[derive(Debug, Error)]
pub enum Error {
    /// The backend rejected an operation: non-zero exit code from the CLI or
    /// an unexpected HTTP status from the engine. Carries the backend's raw
    /// diagnostic text.
    #[error("{operation} failed: {detail}")]
    Backend { operation: String, detail: String },

    /// An `execute` call ran past its advisory timeout.
    #[error("command timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    /// Backend output that cannot be decoded into the expected shape.
    #[error("parse error: {0}")]
    Parse(String),

    /// The backend process could not be launched at all.
    #[error("failed to launch backend process: {0}")]
    Spawn(#[from] std::io::Error),

    /// Transport-level failure talking to the engine API.
    #[error("engine request failed: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    pub(crate) fn backend(operation: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Backend {
            operation: operation.into(),
            detail: detail.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error_carries_diagnostic() {
        let err = Error::backend("run", "No such image: ghost:latest");
        assert_eq!(err.to_string(), "run failed: No such image: ghost:latest");
    }

    #[test]
    fn test_timeout_display() {
        let err = Error::Timeout { seconds: 30 };
        assert!(err.to_string().contains("30"));
    }
}
