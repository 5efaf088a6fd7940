//! Client configuration.

use serde::Deserialize;

/// Where and how to reach a lunchlab backend.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the REST API, e.g. `http://localhost:3000/api`.
    pub base_url: String,
    /// Sent as `Authorization: Bearer` unless a request carries its own token.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Upper bound for a single request.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

const fn default_timeout_secs() -> u64 {
    30
}

impl ClientConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }

    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Load from `LUNCHLAB_CLIENT__*` environment variables (and `.env`).
    pub fn from_env() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        config::Config::builder()
            .add_source(
                config::Environment::with_prefix("LUNCHLAB_CLIENT")
                    .prefix_separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
