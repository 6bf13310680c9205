//! Error types for local controller operations.

use thiserror::Error;

use live_ipc::ConfigError;
use live_transport::TransportError;

/// Errors returned synchronously by [`Live`](crate::Live) commands.
///
/// Failures of the stream itself are not reported here; they reach the
/// observer as [`LiveError`](live_ipc::LiveError) values.
#[derive(Debug, Error)]
pub enum LiveControlError {
    /// The transport session could not be created.
    #[error("Transport session setup failed: {0}")]
    Transport(#[from] TransportError),

    /// The configuration was rejected under strict validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigError),
}
