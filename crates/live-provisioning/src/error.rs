//! Error types for provisioning.

use thiserror::Error;

/// Errors that can occur while provisioning a stream key.
#[derive(Debug, Error)]
pub enum ProvisioningError {
    /// A credential was not found in the environment.
    #[error("Missing credential: set {0}")]
    MissingCredentials(&'static str),

    /// The request could not be sent or the body could not be read.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("Provisioning rejected with HTTP status {status}")]
    Rejected { status: u16 },

    /// The response body was not the expected JSON.
    #[error("Invalid provisioning response: {0}")]
    InvalidResponse(#[from] serde_json::Error),

    /// The response parsed but carried no stream key.
    #[error("Provisioning response did not include a stream key")]
    MissingStreamKey,
}
