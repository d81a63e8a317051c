//! Platform connection and polling configuration.

use std::time::Duration;

use clap::Args;

use crate::error::{Error, Result};
use crate::status::PollPolicy;

/// Platform connection settings, read from flags or the environment.
#[derive(Args, Debug, Clone)]
pub struct PlatformConfig {
    /// Base URL of the platform API.
    #[arg(long, env = "PLATFORM_API_URL")]
    pub api_url: String,

    /// Workspace that owns the managed resources.
    #[arg(long, env = "PLATFORM_WORKSPACE")]
    pub workspace: String,

    /// API key sent as a bearer token.
    #[arg(long, env = "PLATFORM_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Per-request HTTP timeout in seconds.
    #[arg(long, env = "PLATFORM_REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    pub request_timeout_secs: u64,

    /// Maximum status checks while waiting for a resource to settle.
    #[arg(long, env = "PLATFORM_POLL_MAX_ATTEMPTS", default_value_t = PollPolicy::DEFAULT_MAX_ATTEMPTS)]
    pub poll_max_attempts: u32,

    /// Seconds between status checks.
    #[arg(long, env = "PLATFORM_POLL_INTERVAL_SECS", default_value_t = 2)]
    pub poll_interval_secs: u64,
}

impl PlatformConfig {
    /// Reject settings that cannot produce a working client.
    pub fn validate(&self) -> Result<()> {
        if self.api_url.trim().is_empty() {
            return Err(Error::Config("api url must not be empty".into()));
        }
        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            return Err(Error::Config(format!(
                "api url must start with http:// or https://, got '{}'",
                self.api_url
            )));
        }
        if self.workspace.trim().is_empty() {
            return Err(Error::Config("workspace must not be empty".into()));
        }
        if self.poll_max_attempts == 0 {
            return Err(Error::Config("poll max attempts must be at least 1".into()));
        }
        if self.request_timeout_secs == 0 {
            return Err(Error::Config("request timeout must be at least 1 second".into()));
        }
        Ok(())
    }

    /// Polling policy derived from these settings.
    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy::new(
            self.poll_max_attempts,
            Duration::from_secs(self.poll_interval_secs),
        )
    }
}
