//! HTTP client for the live streams endpoint.

use std::fmt;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::config::ProvisioningConfig;
use crate::error::ProvisioningError;
use crate::ProvisioningResult;

/// Path of the create-live-stream endpoint under the API base.
pub const LIVE_STREAMS_PATH: &str = "/video/v1/live-streams";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

const PUBLIC_POLICY: &str = "public";

#[derive(Debug, Serialize)]
struct NewAssetSettings {
    playback_policy: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
struct CreateLiveStreamRequest {
    playback_policy: Vec<&'static str>,
    new_asset_settings: NewAssetSettings,
}

impl CreateLiveStreamRequest {
    fn public() -> Self {
        Self {
            playback_policy: vec![PUBLIC_POLICY],
            new_asset_settings: NewAssetSettings {
                playback_policy: vec![PUBLIC_POLICY],
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct LiveStreamData {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    stream_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LiveStreamResponse {
    #[serde(default)]
    data: Option<LiveStreamData>,
}

/// A provisioned stream key. Redacted from `Debug` output.
pub struct StreamKey {
    key: SecretString,
    stream_id: Option<String>,
}

impl StreamKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: SecretString::from(key.into()),
            stream_id: None,
        }
    }

    /// The key to pass to `Live::start`.
    pub fn expose(&self) -> &str {
        self.key.expose_secret()
    }

    /// Provider id of the live stream the key belongs to, if reported.
    pub fn stream_id(&self) -> Option<&str> {
        self.stream_id.as_deref()
    }
}

impl fmt::Debug for StreamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamKey")
            .field("key", &"[REDACTED]")
            .field("stream_id", &self.stream_id)
            .finish()
    }
}

/// Creates live streams and hands back their keys.
pub struct ProvisioningClient {
    client: Client,
    config: ProvisioningConfig,
}

impl ProvisioningClient {
    /// Create a client.
    ///
    /// # Errors
    ///
    /// Returns `ProvisioningError::Http` if the HTTP client cannot be built.
    pub fn new(config: ProvisioningConfig) -> ProvisioningResult<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ProvisioningConfig {
        &self.config
    }

    fn authorization(&self) -> String {
        let credentials = format!(
            "{}:{}",
            self.config.token_id,
            self.config.token_secret.expose_secret()
        );
        format!("Basic {}", STANDARD.encode(credentials))
    }

    /// Create a public live stream and return its stream key.
    #[instrument(skip(self), fields(api_base = %self.config.api_base))]
    pub async fn create_stream_key(&self) -> ProvisioningResult<StreamKey> {
        let url = format!(
            "{}{}",
            self.config.api_base.trim_end_matches('/'),
            LIVE_STREAMS_PATH
        );
        debug!(%url, "Requesting live stream");

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, self.authorization())
            .json(&CreateLiveStreamRequest::public())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "Live stream request rejected");
            return Err(ProvisioningError::Rejected {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let parsed: LiveStreamResponse = serde_json::from_str(&body)?;

        let data = parsed.data.ok_or(ProvisioningError::MissingStreamKey)?;
        let key = data
            .stream_key
            .filter(|key| !key.is_empty())
            .ok_or(ProvisioningError::MissingStreamKey)?;

        info!(stream_id = ?data.id, "Live stream provisioned");
        Ok(StreamKey {
            key: SecretString::from(key),
            stream_id: data.id,
        })
    }
}
