//! JSON settings file.

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use live_engine::LiveOptions;
use live_ipc::{AudioConfiguration, Orientation, VideoConfiguration};
use live_transport::ReconnectPolicy;

/// Everything the CLI can be told besides the stream key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub audio: AudioConfiguration,
    pub video: VideoConfiguration,
    pub orientation: Orientation,

    /// Refuse to start with an invalid configuration.
    pub strict_config: bool,

    /// Report a timeout if the session has not settled after this long.
    pub start_timeout_secs: Option<u64>,

    /// Reconnect attempts before the session fails.
    pub reconnect_attempts: Option<u32>,

    /// Override of the provisioning API base URL.
    pub api_base: Option<String>,

    /// Probe the API host for reachability in the background.
    pub probe_reachability: bool,
}

impl Settings {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        Self::from_json(&json)
            .with_context(|| format!("Failed to parse settings in {}", path.display()))
    }

    pub fn live_options(&self) -> LiveOptions {
        LiveOptions {
            strict_config: self.strict_config,
            start_timeout: self.start_timeout_secs.map(Duration::from_secs),
            ..Default::default()
        }
    }

    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        let mut policy = ReconnectPolicy::default();
        if let Some(attempts) = self.reconnect_attempts {
            policy.max_attempts = attempts;
        }
        policy
    }
}
