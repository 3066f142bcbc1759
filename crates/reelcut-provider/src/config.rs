//! Provider configuration from environment.

use std::time::Duration;

use crate::error::{ProviderError, ProviderResult};

pub const DEFAULT_API_URL: &str = "https://api.twelvelabs.io/v1.3";
/// Upper bound on `PROVIDER_MAX_RETRIES`.
pub const MAX_RETRIES_LIMIT: u32 = 10;

/// Configuration for the provider client.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Base URL of the provider API
    pub base_url: String,
    pub api_key: String,
    /// Index that submitted videos are added to
    pub index_id: Option<String>,
    pub submit_timeout: Duration,
    pub poll_timeout: Duration,
    pub fetch_timeout: Duration,
    /// Max retries for idempotent reads
    pub max_retries: u32,
}

impl ProviderConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            api_key: api_key.into(),
            index_id: None,
            submit_timeout: Duration::from_secs(30),
            poll_timeout: Duration::from_secs(10),
            fetch_timeout: Duration::from_secs(10),
            max_retries: 2,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_index_id(mut self, index_id: impl Into<String>) -> Self {
        self.index_id = Some(index_id.into());
        self
    }

    /// Create config from environment variables.
    ///
    /// `PROVIDER_API_KEY` (or `TL_API_KEY`) is required.
    pub fn from_env() -> ProviderResult<Self> {
        let api_key = env_with_alias("PROVIDER_API_KEY", "TL_API_KEY").ok_or_else(|| {
            ProviderError::not_configured("PROVIDER_API_KEY (or TL_API_KEY) must be set")
        })?;

        let mut config = Self::new(api_key);
        if let Some(url) = env_with_alias("PROVIDER_API_URL", "TL_API_URL") {
            config = config.with_base_url(url);
        }
        config.index_id = env_with_alias("PROVIDER_INDEX_ID", "TL_INDEX_ID");

        if let Some(secs) = env_secs("PROVIDER_SUBMIT_TIMEOUT_SECS") {
            config.submit_timeout = secs;
        }
        if let Some(secs) = env_secs("PROVIDER_POLL_TIMEOUT_SECS") {
            config.poll_timeout = secs;
        }
        if let Some(secs) = env_secs("PROVIDER_FETCH_TIMEOUT_SECS") {
            config.fetch_timeout = secs;
        }
        config.max_retries = std::env::var("PROVIDER_MAX_RETRIES")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .map(|n| n.min(MAX_RETRIES_LIMIT))
            .unwrap_or(config.max_retries);

        Ok(config)
    }

    /// Both a key and an index are needed to accept submissions.
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty() && self.index_id.as_deref().is_some_and(|id| !id.is_empty())
    }
}

fn env_with_alias(primary: &str, alias: &str) -> Option<String> {
    std::env::var(primary)
        .or_else(|_| std::env::var(alias))
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_secs(key: &str) -> Option<Duration> {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .map(Duration::from_secs)
}
