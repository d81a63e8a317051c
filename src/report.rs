//! Progress reporting for lifecycle operations.
//!
//! The poller, resolver and orchestrator report through a [`Reporter`]
//! handed to them at construction. [`TracingReporter`] forwards to
//! `tracing`; tests substitute a recorder.

use tracing::{debug, info, warn};

use crate::platform::PlatformError;
use crate::resource::ResourceKind;

/// What a single status fetch observed.
#[derive(Debug)]
pub enum Observation<'a> {
    /// Platform reported this status string.
    Status(&'a str),
    /// Platform reported no resource.
    Missing,
    /// Fetch failed.
    FetchFailed(&'a PlatformError),
}

/// One poll attempt, for progress reporting.
#[derive(Debug)]
pub struct Attempt<'a> {
    pub kind: ResourceKind,
    pub name: &'a str,
    /// One-based attempt number.
    pub number: u32,
    pub max_attempts: u32,
    pub observation: Observation<'a>,
}

/// Sink for lifecycle progress events.
pub trait Reporter: Send + Sync {
    /// A status fetch completed.
    fn attempt(&self, attempt: &Attempt<'_>);

    /// A lifecycle milestone, e.g. a resource was created.
    fn milestone(&self, message: &str);

    /// Something went wrong but the operation continues.
    fn warning(&self, message: &str);
}

/// Reporter that emits `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn attempt(&self, attempt: &Attempt<'_>) {
        let kind = attempt.kind;
        let name = attempt.name;
        let number = attempt.number;
        let max = attempt.max_attempts;
        match &attempt.observation {
            Observation::Status(status) => {
                debug!(%kind, name, number, max, status, "status check");
            }
            Observation::Missing => {
                debug!(%kind, name, number, max, "resource not visible yet");
            }
            Observation::FetchFailed(error) => {
                debug!(%kind, name, number, max, %error, "status check failed");
            }
        }
    }

    fn milestone(&self, message: &str) {
        info!("{}", message);
    }

    fn warning(&self, message: &str) {
        warn!("{}", message);
    }
}
