use std::path::PathBuf;
use thiserror::Error;

/// Failures talking to the scoring service. No variant is retried.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid scoring service URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("Failed to read {}: {source}", path.display())]
    Upload {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not reach the scoring service: {0}")]
    Network(#[from] reqwest::Error),

    #[error("{message}")]
    Service { status: u16, message: String },

    #[error("Customer {customer_id} not found")]
    NotFound { customer_id: String },

    #[error("Unexpected response from the scoring service: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// HTTP status for service-side failures
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Service { status, .. } => Some(*status),
            ApiError::NotFound { .. } => Some(404),
            _ => None,
        }
    }

    pub fn is_network(&self) -> bool {
        matches!(self, ApiError::Network(_))
    }
}
