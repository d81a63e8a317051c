//! Lifecycle status vocabulary and polling policy.

use std::fmt;
use std::time::Duration;

/// Status reported by the platform for a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleStatus {
    Created,
    Updated,
    Uploading,
    Building,
    Deploying,
    Deactivating,
    Deployed,
    Failed,
    Terminated,
    Deactivated,
    Deleting,
    Deleted,
    /// Any status string outside the known vocabulary.
    Unknown(String),
}

impl LifecycleStatus {
    /// Parse a raw status string. Matching ignores ASCII case.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "CREATED" => Self::Created,
            "UPDATED" => Self::Updated,
            "UPLOADING" => Self::Uploading,
            "BUILDING" => Self::Building,
            "DEPLOYING" => Self::Deploying,
            "DEACTIVATING" => Self::Deactivating,
            "DEPLOYED" => Self::Deployed,
            "FAILED" => Self::Failed,
            "TERMINATED" => Self::Terminated,
            "DEACTIVATED" => Self::Deactivated,
            "DELETING" => Self::Deleting,
            "DELETED" => Self::Deleted,
            _ => Self::Unknown(raw.to_string()),
        }
    }

    /// Transient state; creation polling continues.
    pub fn is_building(&self) -> bool {
        matches!(
            self,
            Self::Created
                | Self::Updated
                | Self::Uploading
                | Self::Building
                | Self::Deploying
                | Self::Deactivating
        )
    }

    /// State after which creation will not progress further.
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            Self::Deployed | Self::Failed | Self::Terminated | Self::Deactivated | Self::Deleting
        )
    }

    /// Whether this is the only successful final state.
    pub fn is_deployed(&self) -> bool {
        matches!(self, Self::Deployed)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown(_))
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Created => "CREATED",
            Self::Updated => "UPDATED",
            Self::Uploading => "UPLOADING",
            Self::Building => "BUILDING",
            Self::Deploying => "DEPLOYING",
            Self::Deactivating => "DEACTIVATING",
            Self::Deployed => "DEPLOYED",
            Self::Failed => "FAILED",
            Self::Terminated => "TERMINATED",
            Self::Deactivated => "DEACTIVATED",
            Self::Deleting => "DELETING",
            Self::Deleted => "DELETED",
            Self::Unknown(raw) => raw,
        }
    }
}

impl fmt::Display for LifecycleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bounded fixed-interval retry budget for status polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Maximum number of status fetches. Never zero.
    pub max_attempts: u32,
    /// Delay between fetches.
    pub interval: Duration,
}

impl PollPolicy {
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 60;
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(2);

    /// Create a policy; `max_attempts` is raised to at least one.
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            interval,
        }
    }

    /// Upper bound on time spent sleeping between attempts.
    pub fn budget(&self) -> Duration {
        self.interval * self.max_attempts
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_ATTEMPTS, Self::DEFAULT_INTERVAL)
    }
}
