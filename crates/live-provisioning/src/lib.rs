//! Stream key provisioning.
//!
//! Creates a public live stream through the provider's REST API and
//! returns its stream key, which a live session controller can publish to.

mod client;
mod config;
mod error;

pub use client::{ProvisioningClient, StreamKey, LIVE_STREAMS_PATH};
pub use config::{
    ProvisioningConfig, DEFAULT_API_BASE, ENV_LEGACY_TOKEN_ID, ENV_LEGACY_TOKEN_SECRET,
    ENV_TOKEN_ID, ENV_TOKEN_SECRET,
};
pub use error::ProvisioningError;

/// Result type for provisioning operations.
pub type ProvisioningResult<T> = Result<T, ProvisioningError>;
