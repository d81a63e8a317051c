//! Resource lifecycle orchestration.
//!
//! One generic flow serves every resource kind: resolve the integration,
//! issue the platform call, then optionally poll until the resource settles.
//! Per-kind differences live in [`KindDescriptor`](crate::resource::KindDescriptor)
//! and the typed models behind each [`StatusChecker`](crate::checker::StatusChecker).

use std::sync::Arc;

use serde::Serialize;

use crate::checker::checker_for;
use crate::config::PlatformConfig;
use crate::error::{Error, Result};
use crate::platform::types::summarize;
use crate::platform::{IntegrationClient, PlatformClient, ResourceClient, ResourceSummary};
use crate::poller::{LifecyclePoller, WaitContext};
use crate::report::{Reporter, TracingReporter};
use crate::resolver::IntegrationResolver;
use crate::resource::{validate_name, ResourceKind, ResourceSpec};
use crate::status::PollPolicy;

/// Result of a lifecycle operation returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outcome {
    /// Always true; failures are returned as errors.
    pub success: bool,
    /// Human-readable summary.
    pub message: String,
    /// Set when the primary call succeeded but verification did not.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    /// Resource affected by the operation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<ResourceSummary>,
}

impl Outcome {
    fn success(message: String, resource: ResourceSummary) -> Self {
        Self {
            success: true,
            message,
            warning: None,
            resource: Some(resource),
        }
    }

    fn with_warning(message: String, warning: String, resource: ResourceSummary) -> Self {
        Self {
            success: true,
            message,
            warning: Some(warning),
            resource: Some(resource),
        }
    }
}

/// Creates, reads and deletes platform resources.
#[derive(Clone)]
pub struct ResourceOrchestrator {
    resources: Arc<dyn ResourceClient>,
    resolver: Arc<IntegrationResolver>,
    poller: LifecyclePoller,
    reporter: Arc<dyn Reporter>,
}

impl ResourceOrchestrator {
    /// Create an orchestrator over explicit clients.
    pub fn new(
        resources: Arc<dyn ResourceClient>,
        integrations: Arc<dyn IntegrationClient>,
        policy: PollPolicy,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        Self {
            resources,
            resolver: Arc::new(IntegrationResolver::new(integrations, reporter.clone())),
            poller: LifecyclePoller::new(policy, reporter.clone()),
            reporter,
        }
    }

    /// Create an orchestrator talking to the configured platform over HTTP.
    pub fn from_config(config: &PlatformConfig) -> Result<Self> {
        let client = Arc::new(
            PlatformClient::new(config).map_err(|e| Error::platform("build platform client", e))?,
        );
        Ok(Self::new(
            client.clone(),
            client,
            config.poll_policy(),
            Arc::new(TracingReporter),
        ))
    }

    /// Create a resource, optionally waiting for it to deploy.
    ///
    /// Once the create call succeeds the operation succeeds: a failed or
    /// timed-out status check is reported as a warning on the outcome.
    pub async fn create(
        &self,
        spec: &ResourceSpec,
        wait_for_completion: bool,
        ctx: &WaitContext,
    ) -> Result<Outcome> {
        let kind = spec.kind;
        let descriptor = kind.descriptor();
        spec.validate_name()?;

        let integration = self.resolver.resolve(spec).await?;
        let body = descriptor.create_body(spec, integration.as_deref());

        let created = match self.resources.create(kind, &body).await {
            Ok(value) => value,
            Err(e) if e.is_conflict() => {
                return Err(Error::AlreadyExists {
                    kind,
                    name: spec.name.clone(),
                });
            }
            Err(e) => {
                return Err(Error::platform(format!("create {} '{}'", kind, spec.name), e));
            }
        };

        let mut resource = self.summary_or_name(kind, &spec.name, created);
        if resource.integrations.is_empty() {
            resource.integrations.extend(integration);
        }
        self.reporter
            .milestone(&format!("{} '{}' created", kind, spec.name));

        if !wait_for_completion {
            return Ok(Outcome::success(
                format!("{} '{}' created successfully", kind, spec.name),
                resource,
            ));
        }

        let checker = checker_for(kind, self.resources.clone());
        match self
            .poller
            .wait_until_ready(checker.as_ref(), &spec.name, ctx)
            .await
        {
            Ok(()) => {
                resource.status = Some("DEPLOYED".into());
                Ok(Outcome::success(
                    format!("{} '{}' created and deployed successfully", kind, spec.name),
                    resource,
                ))
            }
            Err(e) => {
                let reason = e.to_string();
                self.reporter.warning(&format!(
                    "{} '{}' was created but its status check failed: {}",
                    kind, spec.name, reason
                ));
                Ok(Outcome::with_warning(
                    format!(
                        "{} '{}' created successfully (status check failed: {})",
                        kind, spec.name, reason
                    ),
                    reason,
                    resource,
                ))
            }
        }
    }

    /// Delete a resource, optionally waiting until it is gone.
    ///
    /// A resource the platform no longer knows about counts as deleted.
    pub async fn delete(
        &self,
        kind: ResourceKind,
        name: &str,
        wait_for_completion: bool,
        ctx: &WaitContext,
    ) -> Result<Outcome> {
        validate_name(kind, name)?;
        let resource = ResourceSummary::named(kind, name);

        match self.resources.delete(kind, name).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                return Ok(Outcome::success(
                    format!("{} '{}' was already deleted", kind, name),
                    resource,
                ));
            }
            Err(e) => return Err(Error::platform(format!("delete {} '{}'", kind, name), e)),
        }
        self.reporter
            .milestone(&format!("deletion of {} '{}' initiated", kind, name));

        if !wait_for_completion {
            return Ok(Outcome::success(
                format!("{} '{}' deletion initiated", kind, name),
                resource,
            ));
        }

        let checker = checker_for(kind, self.resources.clone());
        match self.poller.wait_until_deleted(checker.as_ref(), name, ctx).await {
            Ok(()) => Ok(Outcome::success(
                format!("{} '{}' deleted successfully", kind, name),
                resource,
            )),
            Err(e) => {
                let reason = e.to_string();
                self.reporter.warning(&format!(
                    "deletion of {} '{}' was initiated but its status check failed: {}",
                    kind, name, reason
                ));
                Ok(Outcome::with_warning(
                    format!(
                        "{} '{}' deletion initiated (status check failed: {})",
                        kind, name, reason
                    ),
                    reason,
                    resource,
                ))
            }
        }
    }

    /// Fetch one resource.
    pub async fn get(&self, kind: ResourceKind, name: &str) -> Result<ResourceSummary> {
        validate_name(kind, name)?;
        let not_found = || Error::NotFound {
            kind,
            name: name.to_string(),
        };

        match self.resources.get(kind, name).await {
            Ok(Some(value)) => summarize(kind, value)
                .map_err(|e| Error::platform(format!("read {} '{}'", kind, name), e)),
            Ok(None) => Err(not_found()),
            Err(e) if e.is_not_found() => Err(not_found()),
            Err(e) => Err(Error::platform(format!("get {} '{}'", kind, name), e)),
        }
    }

    /// List every resource of a kind.
    pub async fn list(&self, kind: ResourceKind) -> Result<Vec<ResourceSummary>> {
        let items = self
            .resources
            .list(kind)
            .await
            .map_err(|e| Error::platform(format!("list {} resources", kind), e))?;

        items
            .into_iter()
            .map(|value| {
                summarize(kind, value)
                    .map_err(|e| Error::platform(format!("read {} list", kind), e))
            })
            .collect()
    }

    /// Summarize a create response, falling back to the requested name when
    /// the platform returns no usable body.
    fn summary_or_name(&self, kind: ResourceKind, name: &str, value: serde_json::Value) -> ResourceSummary {
        if value.is_null() {
            return ResourceSummary::named(kind, name);
        }
        summarize(kind, value).unwrap_or_else(|e| {
            self.reporter.warning(&format!(
                "could not read create response for {} '{}': {}",
                kind, name, e
            ));
            ResourceSummary::named(kind, name)
        })
    }
}
