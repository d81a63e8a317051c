//! Lifecycle polling until a resource settles.
//!
//! [`LifecyclePoller`] drives a [`StatusChecker`] at a fixed interval for at
//! most `max_attempts` fetches. Creation polling stops at the first final
//! status; deletion polling stops when the resource disappears. Both are
//! interrupted by the [`WaitContext`] cancellation token or deadline.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, sleep_until, Instant};
use tokio_util::sync::CancellationToken;

use crate::checker::StatusChecker;
use crate::error::{Error, Result};
use crate::report::{Attempt, Observation, Reporter};
use crate::resource::ResourceKind;
use crate::status::{LifecycleStatus, PollPolicy};

/// Caller-controlled limits on how long an operation may wait.
#[derive(Debug, Clone, Default)]
pub struct WaitContext {
    /// Cancelled when the caller stops waiting.
    pub cancel: CancellationToken,
    /// Absolute deadline, if any.
    pub deadline: Option<Instant>,
}

impl WaitContext {
    pub fn new(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            deadline: None,
        }
    }

    /// Set a deadline relative to now. A timeout too large to represent
    /// leaves the context without a deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Instant::now().checked_add(timeout);
        self
    }

    /// Run `fut` unless cancellation or the deadline fires first.
    pub async fn guard<F: Future>(&self, fut: F, what: impl FnOnce() -> String) -> Result<F::Output> {
        let deadline = async {
            match self.deadline {
                Some(at) => sleep_until(at).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(Error::Cancelled(what())),
            _ = deadline => Err(Error::DeadlineExceeded(what())),
            output = fut => Ok(output),
        }
    }
}

/// What the most recent creation attempt saw, for the exhaustion message.
enum LastSeen {
    FetchFailed(String),
    Missing,
    Building(LifecycleStatus),
    Unknown(String),
}

/// What the most recent deletion attempt saw.
enum LastDeletionSeen {
    FetchFailed(String),
    Deleting,
}

/// Polls a resource until it reaches a final state or disappears.
#[derive(Clone)]
pub struct LifecyclePoller {
    policy: PollPolicy,
    reporter: Arc<dyn Reporter>,
}

impl LifecyclePoller {
    pub fn new(policy: PollPolicy, reporter: Arc<dyn Reporter>) -> Self {
        Self { policy, reporter }
    }

    /// Wait until a newly created resource reaches a final status.
    ///
    /// Succeeds only on DEPLOYED. Any other final status fails at once;
    /// building, unknown, missing and fetch-error observations are retried
    /// until the attempt budget runs out.
    pub async fn wait_until_ready(
        &self,
        checker: &dyn StatusChecker,
        name: &str,
        ctx: &WaitContext,
    ) -> Result<()> {
        let kind = checker.kind();
        let max = self.policy.max_attempts;
        let mut last = LastSeen::Missing;

        for number in 1..=max {
            let fetched = ctx
                .guard(checker.fetch_status(name), || waiting(kind, name, "to deploy"))
                .await?;

            match fetched {
                Err(error) => {
                    self.report(kind, name, number, Observation::FetchFailed(&error));
                    last = LastSeen::FetchFailed(error.to_string());
                }
                Ok(None) => {
                    self.report(kind, name, number, Observation::Missing);
                    last = LastSeen::Missing;
                }
                Ok(Some(raw)) => {
                    self.report(kind, name, number, Observation::Status(&raw));
                    let status = LifecycleStatus::parse(&raw);
                    if status.is_final() {
                        return if status.is_deployed() {
                            Ok(())
                        } else {
                            Err(Error::NotDeployed {
                                kind,
                                name: name.to_string(),
                                status: status.to_string(),
                            })
                        };
                    }
                    last = if status.is_building() {
                        LastSeen::Building(status)
                    } else {
                        LastSeen::Unknown(raw)
                    };
                }
            }

            if number < max {
                self.pause(ctx, kind, name, "to deploy").await?;
            }
        }

        Err(match last {
            LastSeen::FetchFailed(error) => Error::StatusUnavailable(format!(
                "failed to get status of {} '{}' after {} attempts: {}",
                kind, name, max, error
            )),
            LastSeen::Missing => Error::StatusUnavailable(format!(
                "{} '{}' not found after {} attempts",
                kind, name, max
            )),
            LastSeen::Building(status) => Error::Timeout(format!(
                "{} '{}' did not reach final status within timeout, last status: {}",
                kind, name, status
            )),
            LastSeen::Unknown(raw) => Error::Timeout(format!(
                "{} '{}' did not reach final status within timeout, last status: {} (unknown status)",
                kind, name, raw
            )),
        })
    }

    /// Wait until a resource whose deletion was requested is gone.
    ///
    /// Absence, a not-found error or DELETED end the wait successfully.
    /// DELETING and transient fetch errors are retried. Any other status
    /// fails immediately.
    pub async fn wait_until_deleted(
        &self,
        checker: &dyn StatusChecker,
        name: &str,
        ctx: &WaitContext,
    ) -> Result<()> {
        let kind = checker.kind();
        let max = self.policy.max_attempts;
        let mut last = LastDeletionSeen::Deleting;

        for number in 1..=max {
            let fetched = ctx
                .guard(checker.fetch_status(name), || waiting(kind, name, "to be deleted"))
                .await?;

            match fetched {
                Err(error) if error.is_not_found() => {
                    self.report(kind, name, number, Observation::FetchFailed(&error));
                    return Ok(());
                }
                Err(error) => {
                    self.report(kind, name, number, Observation::FetchFailed(&error));
                    last = LastDeletionSeen::FetchFailed(error.to_string());
                }
                Ok(None) => {
                    self.report(kind, name, number, Observation::Missing);
                    return Ok(());
                }
                Ok(Some(raw)) => {
                    self.report(kind, name, number, Observation::Status(&raw));
                    match LifecycleStatus::parse(&raw) {
                        LifecycleStatus::Deleted => return Ok(()),
                        LifecycleStatus::Deleting => last = LastDeletionSeen::Deleting,
                        other => {
                            return Err(Error::UnexpectedDeletionState {
                                kind,
                                name: name.to_string(),
                                status: other.to_string(),
                            })
                        }
                    }
                }
            }

            if number < max {
                self.pause(ctx, kind, name, "to be deleted").await?;
            }
        }

        Err(match last {
            LastDeletionSeen::FetchFailed(error) => Error::StatusUnavailable(format!(
                "failed to get status during deletion of {} '{}' after {} attempts: {}",
                kind, name, max, error
            )),
            LastDeletionSeen::Deleting => Error::Timeout(format!(
                "{} '{}' still in deleting state after {} attempts",
                kind, name, max
            )),
        })
    }

    async fn pause(&self, ctx: &WaitContext, kind: ResourceKind, name: &str, target: &str) -> Result<()> {
        ctx.guard(sleep(self.policy.interval), || waiting(kind, name, target))
            .await
    }

    fn report(&self, kind: ResourceKind, name: &str, number: u32, observation: Observation<'_>) {
        self.reporter.attempt(&Attempt {
            kind,
            name,
            number,
            max_attempts: self.policy.max_attempts,
            observation,
        });
    }
}

fn waiting(kind: ResourceKind, name: &str, target: &str) -> String {
    format!("stopped waiting for {} '{}' {}", kind, name, target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::checker_for;
    use crate::platform::PlatformError;
    use crate::testing::{server_error, FakePlatform, RecordingReporter};
    use proptest::prelude::*;
    use tokio_test::{assert_err, assert_ok};

    fn poller(max_attempts: u32) -> LifecyclePoller {
        LifecyclePoller::new(
            PollPolicy::new(max_attempts, Duration::from_secs(2)),
            Arc::new(RecordingReporter::default()),
        )
    }

    fn setup(kind: ResourceKind) -> (Arc<FakePlatform>, Box<dyn StatusChecker>) {
        let platform = Arc::new(FakePlatform::new());
        let checker = checker_for(kind, platform.clone());
        (platform, checker)
    }

    #[tokio::test(start_paused = true)]
    async fn test_ready_after_building_sequence() {
        let (platform, checker) = setup(ResourceKind::Agent);
        for status in ["CREATED", "BUILDING", "DEPLOYED"] {
            platform.push_status("agent-x", status);
        }

        let start = Instant::now();
        assert_ok!(poller(60).wait_until_ready(checker.as_ref(), "agent-x", &WaitContext::default()).await);
        assert_eq!(platform.get_calls().len(), 3);
        assert_eq!(start.elapsed(), Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_final_status_is_not_a_timeout() {
        let (platform, checker) = setup(ResourceKind::Job);
        platform.push_status("job-b", "BUILDING");
        platform.push_status("job-b", "FAILED");

        let err = poller(60)
            .wait_until_ready(checker.as_ref(), "job-b", &WaitContext::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotDeployed { ref status, .. } if status == "FAILED"));
        assert!(err.to_string().contains("reached final status 'FAILED' (not deployed)"));
        assert_eq!(platform.get_calls().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deleting_counts_as_final_during_creation() {
        let (platform, checker) = setup(ResourceKind::Sandbox);
        platform.push_status("sb", "DELETING");

        let err = assert_err!(
            poller(10)
                .wait_until_ready(checker.as_ref(), "sb", &WaitContext::default())
                .await
        );
        assert!(err.to_string().contains("'DELETING'"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_building_exhausts_budget_with_exact_fetch_count() {
        let (platform, checker) = setup(ResourceKind::ModelApi);
        for _ in 0..10 {
            platform.push_status("model-y", "DEPLOYING");
        }

        let start = Instant::now();
        let err = poller(5)
            .wait_until_ready(checker.as_ref(), "model-y", &WaitContext::default())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Timeout(_)));
        assert!(err
            .to_string()
            .contains("did not reach final status within timeout, last status: DEPLOYING"));
        assert_eq!(platform.get_calls().len(), 5);
        assert_eq!(start.elapsed(), Duration::from_secs(8));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_status_is_flagged() {
        let (platform, checker) = setup(ResourceKind::Agent);
        for _ in 0..3 {
            platform.push_status("agent-x", "HIBERNATING");
        }

        let err = poller(3)
            .wait_until_ready(checker.as_ref(), "agent-x", &WaitContext::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("last status: HIBERNATING (unknown status)"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_errors_then_recovery() {
        let (platform, checker) = setup(ResourceKind::ToolServer);
        platform.push_get(Err(server_error()));
        platform.push_get(Ok(None));
        platform.push_status("mcp-z", "DEPLOYED");

        let reporter = Arc::new(RecordingReporter::default());
        let poller = LifecyclePoller::new(
            PollPolicy::new(5, Duration::from_secs(2)),
            reporter.clone(),
        );
        assert_ok!(poller.wait_until_ready(checker.as_ref(), "mcp-z", &WaitContext::default()).await);

        let events = reporter.events();
        assert_eq!(events.len(), 3);
        assert!(events[0].starts_with("attempt 1/5 tool server mcp-z: error:"));
        assert_eq!(events[1], "attempt 2/5 tool server mcp-z: missing");
        assert_eq!(events[2], "attempt 3/5 tool server mcp-z: DEPLOYED");
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_errors_exhaust_budget() {
        let (platform, checker) = setup(ResourceKind::Job);
        for _ in 0..3 {
            platform.push_get(Err(server_error()));
        }

        let err = poller(3)
            .wait_until_ready(checker.as_ref(), "job-b", &WaitContext::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::StatusUnavailable(_)));
        assert!(err.to_string().contains("failed to get status of job 'job-b' after 3 attempts"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_resource_exhausts_budget() {
        let (platform, checker) = setup(ResourceKind::Job);
        for _ in 0..2 {
            platform.push_get(Ok(None));
        }

        let err = poller(2)
            .wait_until_ready(checker.as_ref(), "job-b", &WaitContext::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not found after 2 attempts"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_interrupts_sleep() {
        let (platform, checker) = setup(ResourceKind::Agent);
        for _ in 0..60 {
            platform.push_status("agent-x", "BUILDING");
        }

        let ctx = WaitContext::default();
        let cancel = ctx.cancel.clone();
        tokio::spawn(async move {
            sleep(Duration::from_secs(3)).await;
            cancel.cancel();
        });

        let err = poller(60)
            .wait_until_ready(checker.as_ref(), "agent-x", &ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Cancelled(_)));
        assert_eq!(platform.get_calls().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_fires_before_budget() {
        let (platform, checker) = setup(ResourceKind::Agent);
        for _ in 0..60 {
            platform.push_status("agent-x", "BUILDING");
        }

        let ctx = WaitContext::default().with_timeout(Duration::from_secs(5));
        let start = Instant::now();
        let err = poller(60)
            .wait_until_ready(checker.as_ref(), "agent-x", &ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::DeadlineExceeded(_)));
        assert_eq!(start.elapsed(), Duration::from_secs(5));
        assert_eq!(platform.get_calls().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unrepresentable_timeout_means_no_deadline() {
        let ctx = WaitContext::default().with_timeout(Duration::MAX);
        assert!(ctx.deadline.is_none());

        let ctx = WaitContext::default().with_timeout(Duration::from_secs(5));
        assert_eq!(ctx.deadline, Some(Instant::now() + Duration::from_secs(5)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deleted_on_not_found_error_with_one_fetch() {
        let (platform, checker) = setup(ResourceKind::Sandbox);
        platform.push_get(Err(PlatformError::from_status(404, "sandbox not found")));

        assert_ok!(poller(60).wait_until_deleted(checker.as_ref(), "sandbox-a", &WaitContext::default()).await);
        assert_eq!(platform.get_calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deleted_on_absent_resource_with_one_fetch() {
        let (platform, checker) = setup(ResourceKind::Sandbox);
        platform.push_get(Ok(None));

        assert_ok!(poller(60).wait_until_deleted(checker.as_ref(), "sandbox-a", &WaitContext::default()).await);
        assert_eq!(platform.get_calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deleting_then_deleted() {
        let (platform, checker) = setup(ResourceKind::Agent);
        platform.push_status("agent-c", "DELETING");
        platform.push_get(Err(server_error()));
        platform.push_status("agent-c", "DELETED");

        assert_ok!(poller(60).wait_until_deleted(checker.as_ref(), "agent-c", &WaitContext::default()).await);
        assert_eq!(platform.get_calls().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unexpected_state_during_deletion_fails_immediately() {
        let (platform, checker) = setup(ResourceKind::Agent);
        platform.push_status("agent-c", "DEPLOYED");

        let err = poller(60)
            .wait_until_deleted(checker.as_ref(), "agent-c", &WaitContext::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("unexpected state 'DEPLOYED' during deletion"));
        assert_eq!(platform.get_calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stuck_in_deleting() {
        let (platform, checker) = setup(ResourceKind::Job);
        for _ in 0..4 {
            platform.push_status("job-b", "DELETING");
        }

        let err = poller(4)
            .wait_until_deleted(checker.as_ref(), "job-b", &WaitContext::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("still in deleting state after 4 attempts"));
        assert_eq!(platform.get_calls().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deletion_fetch_errors_exhaust_budget() {
        let (platform, checker) = setup(ResourceKind::Job);
        for _ in 0..2 {
            platform.push_get(Err(server_error()));
        }

        let err = poller(2)
            .wait_until_deleted(checker.as_ref(), "job-b", &WaitContext::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("failed to get status during deletion"));
    }

    const BUILDING: [&str; 6] = ["CREATED", "UPDATED", "UPLOADING", "BUILDING", "DEPLOYING", "DEACTIVATING"];
    const FINAL: [&str; 5] = ["DEPLOYED", "FAILED", "TERMINATED", "DEACTIVATED", "DELETING"];

    fn run_paused<F: Future>(fut: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .start_paused(true)
            .build()
            .unwrap()
            .block_on(fut)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_ready_iff_final_status_is_deployed(
            building in proptest::collection::vec(0..BUILDING.len(), 0..8),
            final_index in 0..FINAL.len(),
        ) {
            let (platform, checker) = setup(ResourceKind::Agent);
            for i in &building {
                platform.push_status("agent-x", BUILDING[*i]);
            }
            platform.push_status("agent-x", FINAL[final_index]);

            let result = run_paused(
                poller(10).wait_until_ready(checker.as_ref(), "agent-x", &WaitContext::default()),
            );

            prop_assert_eq!(platform.get_calls().len(), building.len() + 1);
            if FINAL[final_index] == "DEPLOYED" {
                prop_assert!(result.is_ok());
            } else {
                let message = result.unwrap_err().to_string();
                let expected = format!("'{}'", FINAL[final_index]);
                prop_assert!(message.contains(&expected));
            }
        }

        #[test]
        fn prop_building_forever_times_out_after_max_attempts(
            building in proptest::collection::vec(0..BUILDING.len(), 7..20),
            max_attempts in 1u32..7,
        ) {
            let (platform, checker) = setup(ResourceKind::Job);
            for i in &building {
                platform.push_status("job-b", BUILDING[*i]);
            }

            let result = run_paused(
                poller(max_attempts).wait_until_ready(checker.as_ref(), "job-b", &WaitContext::default()),
            );

            prop_assert!(matches!(result, Err(Error::Timeout(_))));
            prop_assert_eq!(platform.get_calls().len(), max_attempts as usize);
        }
    }
}
