use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a single provider could not deliver audio.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request timed out")]
    Timeout,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("unexpected status {0}")]
    Status(u16),

    #[error("non-audio content type: {0}")]
    NotAudio(String),

    #[error("invalid response: {0}")]
    Parse(String),

    #[error("no audio-only stream available")]
    NoStreams,

    #[error("downloaded file is empty or missing")]
    EmptyFile,

    #[error("filesystem error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProviderError {
    /// Whether a fresh attempt against the same provider can help.
    ///
    /// Timeouts and local disk errors move straight on to the next provider.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ProviderError::Timeout | ProviderError::Io(_))
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ProviderError::Timeout
        } else if e.is_decode() {
            ProviderError::Parse(e.to_string())
        } else if let Some(status) = e.status() {
            ProviderError::Status(status.as_u16())
        } else {
            ProviderError::Connection(e.to_string())
        }
    }
}

/// One provider's failure, kept for the aggregate report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderFailure {
    pub provider: String,
    pub reason: String,
}

/// Every provider was tried and none produced audio.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct AudioDownloadFailed {
    pub source_id: String,
    pub reasons: Vec<ProviderFailure>,
}

impl fmt::Display for AudioDownloadFailed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.reasons.is_empty() {
            return write!(f, "No audio providers configured for {}", self.source_id);
        }
        write!(f, "All audio providers failed for {}: ", self.source_id)?;
        for (i, failure) in self.reasons.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", failure.provider, failure.reason)?;
        }
        Ok(())
    }
}
