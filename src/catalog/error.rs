use thiserror::Error;

/// Errors that can occur when talking to the metadata catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Catalog request failed (status {status}): {message}")]
    Status { status: u16, message: String },

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Invalid response: {0}")]
    Parse(String),
}

impl CatalogError {
    /// HTTP status carried by the error, if the catalog answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            CatalogError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for CatalogError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            CatalogError::Timeout
        } else if e.is_decode() {
            CatalogError::Parse(e.to_string())
        } else {
            CatalogError::Connection(e.to_string())
        }
    }
}
