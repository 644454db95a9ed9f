use std::error::Error as StdError;

use thiserror::Error;

/// Mixdown's crate-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Mixdown's crate-wide error type.
///
/// Every public entry point returns its failure as one of these variants rather than
/// panicking. An `Err` never carries a partial buffer, so callers either get a complete
/// result or an error and nothing else.
///
/// This is intentionally decoupled from `anyhow` so downstream libraries aren't forced to
/// adopt `anyhow` in their own public APIs.
#[derive(Debug, Error)]
pub enum Error {
    /// Two inputs that must share a sample rate do not.
    #[error("sample rate mismatch: {left} Hz vs {right} Hz")]
    SampleRateMismatch { left: u32, right: u32 },

    /// A required sample array was absent.
    #[error("missing sample data: {0}")]
    MissingData(&'static str),

    /// A configuration value that cannot produce a meaningful result.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// An unexpected internal numeric failure (FFT planning, buffer sizing, ...).
    #[error("numeric failure: {0}")]
    Numeric(String),

    #[error(transparent)]
    Other(#[from] Box<dyn StdError + Send + Sync>),
}

impl Error {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    pub(crate) fn numeric(message: impl Into<String>) -> Self {
        Self::Numeric(message.into())
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Numeric(format!("{err:#}"))
    }
}

impl From<realfft::FftError> for Error {
    fn from(err: realfft::FftError) -> Self {
        Self::Numeric(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Other(Box::new(err))
    }
}
