//! Provisioning credentials and endpoint.

use std::fmt;

use secrecy::SecretString;

use crate::error::ProvisioningError;
use crate::ProvisioningResult;

/// Production API base URL.
pub const DEFAULT_API_BASE: &str = "https://api.mux.com";

/// Access token id variable.
pub const ENV_TOKEN_ID: &str = "MUX_TOKEN_ID";

/// Access token secret variable.
pub const ENV_TOKEN_SECRET: &str = "MUX_TOKEN_SECRET";

/// Older variable names, read when the primary ones are unset.
pub const ENV_LEGACY_TOKEN_ID: &str = "stream_id";
pub const ENV_LEGACY_TOKEN_SECRET: &str = "stream_key_secret";

/// Where and as whom to provision.
pub struct ProvisioningConfig {
    pub api_base: String,
    pub token_id: String,
    pub token_secret: SecretString,
}

impl ProvisioningConfig {
    pub fn new(token_id: impl Into<String>, token_secret: impl Into<String>) -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            token_id: token_id.into(),
            token_secret: SecretString::from(token_secret.into()),
        }
    }

    /// Point at a different API base, e.g. a local mock.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Load credentials from the process environment.
    pub fn from_env() -> ProvisioningResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load credentials through `lookup`, preferring the primary variable
    /// names over the legacy ones. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> ProvisioningResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |primary: &'static str, legacy: &'static str| {
            lookup(primary)
                .filter(|v| !v.is_empty())
                .or_else(|| lookup(legacy).filter(|v| !v.is_empty()))
                .ok_or(ProvisioningError::MissingCredentials(primary))
        };

        let token_id = read(ENV_TOKEN_ID, ENV_LEGACY_TOKEN_ID)?;
        let token_secret = read(ENV_TOKEN_SECRET, ENV_LEGACY_TOKEN_SECRET)?;
        Ok(Self::new(token_id, token_secret))
    }
}

impl fmt::Debug for ProvisioningConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProvisioningConfig")
            .field("api_base", &self.api_base)
            .field("token_id", &self.token_id)
            .field("token_secret", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_primary_variables() {
        let config =
            ProvisioningConfig::from_lookup(lookup(&[("MUX_TOKEN_ID", "id"), ("MUX_TOKEN_SECRET", "s3cret")]))
                .unwrap();
        assert_eq!(config.token_id, "id");
        assert_eq!(config.token_secret.expose_secret(), "s3cret");
        assert_eq!(config.api_base, DEFAULT_API_BASE);
    }

    #[test]
    fn test_legacy_fallback() {
        let config = ProvisioningConfig::from_lookup(lookup(&[
            ("stream_id", "old-id"),
            ("stream_key_secret", "old-secret"),
            ("MUX_TOKEN_ID", ""),
        ]))
        .unwrap();
        assert_eq!(config.token_id, "old-id");
        assert_eq!(config.token_secret.expose_secret(), "old-secret");
    }

    #[test]
    fn test_missing_secret() {
        let result = ProvisioningConfig::from_lookup(lookup(&[("MUX_TOKEN_ID", "id")]));
        assert!(matches!(
            result,
            Err(ProvisioningError::MissingCredentials("MUX_TOKEN_SECRET"))
        ));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = ProvisioningConfig::new("id", "s3cret");
        let debug = format!("{:?}", config);
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains("s3cret"));
    }
}
