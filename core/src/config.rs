//! Client configuration.
//!
//! Defaults target the production API. `from_env` lets deployments point
//! at the test environment without code changes.

use std::time::Duration;

use crate::error::{Error, Result};

pub const DEFAULT_BASE_URL: &str = "https://api.quinyx.com/v2/";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const ENV_BASE_URL: &str = "QUINYX_BASE_URL";
const ENV_USER_AGENT: &str = "QUINYX_USER_AGENT";
const ENV_TIMEOUT_SECS: &str = "QUINYX_TIMEOUT_SECS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Must end with `/`.
    pub base_url: String,
    pub user_agent: String,
    /// Upper bound for a single round trip, applied by `UreqTransport`.
    pub timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: format!("quinyx-core/{}", env!("CARGO_PKG_VERSION")),
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }
}

impl ClientConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Defaults overridden by `QUINYX_BASE_URL`, `QUINYX_USER_AGENT` and
    /// `QUINYX_TIMEOUT_SECS` (`0` disables the timeout).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(base_url) = lookup(ENV_BASE_URL) {
            config.base_url = base_url;
        }
        if let Some(user_agent) = lookup(ENV_USER_AGENT) {
            config.user_agent = user_agent;
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            let secs: u64 = raw.trim().parse().map_err(|e| Error::Config {
                key: ENV_TIMEOUT_SECS,
                reason: format!("{raw:?}: {e}"),
            })?;
            config.timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }
        Ok(config)
    }
}
