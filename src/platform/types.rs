//! Typed resource shapes returned by the platform API.
//!
//! Each resource kind has its own model; the [`PlatformResource`] trait
//! exposes the pieces the lifecycle code needs (name and status) and a
//! kind-specific [`ResourceSummary`] for tool responses.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::{PlatformError, Result};
use crate::resource::ResourceKind;

/// Resource metadata common to every kind.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub name: String,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Runtime settings shared by container-backed kinds.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Runtime {
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub memory: Option<u64>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default, rename = "type")]
    pub runtime_type: Option<String>,
}

/// Agent as returned by the platform.
#[derive(Debug, Clone, Deserialize)]
pub struct Agent {
    pub metadata: Metadata,
    #[serde(default)]
    pub spec: AgentSpec,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentSpec {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub integration_connections: Vec<String>,
}

/// Batch job as returned by the platform.
#[derive(Debug, Clone, Deserialize)]
pub struct Job {
    pub metadata: Metadata,
    #[serde(default)]
    pub spec: JobSpec,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSpec {
    #[serde(default)]
    pub runtime: Option<Runtime>,
    #[serde(default)]
    pub max_concurrent_tasks: Option<u32>,
}

/// Model endpoint as returned by the platform.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelApi {
    pub metadata: Metadata,
    #[serde(default)]
    pub spec: ModelApiSpec,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelApiSpec {
    #[serde(default)]
    pub runtime: Option<Runtime>,
    #[serde(default)]
    pub integration_connections: Vec<String>,
}

/// Tool server as returned by the platform.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolServer {
    pub metadata: Metadata,
    #[serde(default)]
    pub spec: ToolServerSpec,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolServerSpec {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub runtime: Option<Runtime>,
    #[serde(default)]
    pub integration_connections: Vec<String>,
}

/// Sandbox as returned by the platform.
#[derive(Debug, Clone, Deserialize)]
pub struct Sandbox {
    pub metadata: Metadata,
    #[serde(default)]
    pub spec: SandboxSpec,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SandboxSpec {
    #[serde(default)]
    pub runtime: Option<Runtime>,
    #[serde(default)]
    pub region: Option<String>,
}

/// Compact view of a resource returned to tool callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSummary {
    pub name: String,
    pub kind: ResourceKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub integrations: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub details: BTreeMap<String, Value>,
}

impl ResourceSummary {
    /// Summary carrying only a name, for responses with no usable body.
    pub fn named(kind: ResourceKind, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            status: None,
            integrations: Vec::new(),
            labels: BTreeMap::new(),
            created_at: None,
            details: BTreeMap::new(),
        }
    }

    fn from_parts(kind: ResourceKind, metadata: &Metadata, status: Option<&str>) -> Self {
        Self {
            status: status.map(String::from),
            labels: metadata.labels.clone(),
            created_at: metadata.created_at,
            ..Self::named(kind, metadata.name.clone())
        }
    }

    fn detail(mut self, key: &str, value: Option<impl Into<Value>>) -> Self {
        if let Some(value) = value {
            self.details.insert(key.to_string(), value.into());
        }
        self
    }
}

/// A typed resource model for one kind.
pub trait PlatformResource: DeserializeOwned + Send + 'static {
    /// Kind this model represents.
    const KIND: ResourceKind;

    /// Current lifecycle status, if the platform reported one.
    fn status(&self) -> Option<&str>;

    fn summary(&self) -> ResourceSummary;

    /// Decode a raw platform body into this model.
    fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| {
            PlatformError::Parse(format!("invalid {} response: {}", Self::KIND, e))
        })
    }
}

impl PlatformResource for Agent {
    const KIND: ResourceKind = ResourceKind::Agent;

    fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    fn summary(&self) -> ResourceSummary {
        let mut summary = ResourceSummary::from_parts(Self::KIND, &self.metadata, self.status());
        summary.integrations = self.spec.integration_connections.clone();
        summary
            .detail("model", self.spec.model.clone())
            .detail("description", self.spec.description.clone())
            .detail("enabled", self.spec.enabled)
    }
}

impl PlatformResource for Job {
    const KIND: ResourceKind = ResourceKind::Job;

    fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    fn summary(&self) -> ResourceSummary {
        let runtime = self.spec.runtime.clone().unwrap_or_default();
        ResourceSummary::from_parts(Self::KIND, &self.metadata, self.status())
            .detail("image", runtime.image)
            .detail("memory", runtime.memory)
            .detail("maxConcurrentTasks", self.spec.max_concurrent_tasks)
    }
}

impl PlatformResource for ModelApi {
    const KIND: ResourceKind = ResourceKind::ModelApi;

    fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    fn summary(&self) -> ResourceSummary {
        let runtime = self.spec.runtime.clone().unwrap_or_default();
        let mut summary = ResourceSummary::from_parts(Self::KIND, &self.metadata, self.status());
        summary.integrations = self.spec.integration_connections.clone();
        summary
            .detail("model", runtime.model)
            .detail("provider", runtime.runtime_type)
    }
}

impl PlatformResource for ToolServer {
    const KIND: ResourceKind = ResourceKind::ToolServer;

    fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    fn summary(&self) -> ResourceSummary {
        let runtime = self.spec.runtime.clone().unwrap_or_default();
        let mut summary = ResourceSummary::from_parts(Self::KIND, &self.metadata, self.status());
        summary.integrations = self.spec.integration_connections.clone();
        summary
            .detail("description", self.spec.description.clone())
            .detail("type", runtime.runtime_type)
    }
}

impl PlatformResource for Sandbox {
    const KIND: ResourceKind = ResourceKind::Sandbox;

    fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    fn summary(&self) -> ResourceSummary {
        let runtime = self.spec.runtime.clone().unwrap_or_default();
        ResourceSummary::from_parts(Self::KIND, &self.metadata, self.status())
            .detail("image", runtime.image)
            .detail("memory", runtime.memory)
            .detail("region", self.spec.region.clone())
    }
}

/// Decode a raw body of the given kind into its summary.
pub fn summarize(kind: ResourceKind, value: Value) -> Result<ResourceSummary> {
    Ok(match kind {
        ResourceKind::Agent => Agent::from_value(value)?.summary(),
        ResourceKind::Job => Job::from_value(value)?.summary(),
        ResourceKind::ModelApi => ModelApi::from_value(value)?.summary(),
        ResourceKind::ToolServer => ToolServer::from_value(value)?.summary(),
        ResourceKind::Sandbox => Sandbox::from_value(value)?.summary(),
    })
}

/// Error body returned by the platform on failure.
#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ApiErrorResponse {
    /// Best available error text.
    pub fn get_message(&self) -> Option<String> {
        self.message.clone().or_else(|| self.error.clone())
    }
}
