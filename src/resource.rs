//! Resource kinds and creation requests.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::{Error, Result};

/// Kind of platform-managed resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Hosted agent.
    Agent,
    /// Batch job.
    Job,
    /// Model endpoint backed by an upstream provider.
    ModelApi,
    /// Tool server (MCP function).
    ToolServer,
    /// Sandbox environment.
    Sandbox,
}

impl ResourceKind {
    /// All resource kinds.
    pub fn all() -> [ResourceKind; 5] {
        [
            ResourceKind::Agent,
            ResourceKind::Job,
            ResourceKind::ModelApi,
            ResourceKind::ToolServer,
            ResourceKind::Sandbox,
        ]
    }

    /// Static description of how this kind is created and addressed.
    pub fn descriptor(self) -> &'static KindDescriptor {
        match self {
            ResourceKind::Agent => &AGENT,
            ResourceKind::Job => &JOB,
            ResourceKind::ModelApi => &MODEL_API,
            ResourceKind::ToolServer => &TOOL_SERVER,
            ResourceKind::Sandbox => &SANDBOX,
        }
    }

    /// Identifier used in tool names (`create_<slug>`).
    pub fn slug(self) -> &'static str {
        self.descriptor().slug
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.descriptor().label)
    }
}

/// Whether a kind takes an integration when it is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrationRequirement {
    /// The kind has no integration concept.
    Unsupported,
    /// An integration may be attached.
    Optional,
    /// An integration must be attached.
    Required,
}

/// Per-kind parameters for the generic create/delete flow.
#[derive(Debug)]
pub struct KindDescriptor {
    /// Kind this descriptor belongs to.
    pub kind: ResourceKind,
    /// Human-readable label used in messages.
    pub label: &'static str,
    /// Identifier used in tool names.
    pub slug: &'static str,
    /// Plural identifier used in list tool names.
    pub plural_slug: &'static str,
    /// Collection path segment on the platform API.
    pub api_path: &'static str,
    /// Integration requirement.
    pub integration: IntegrationRequirement,
    /// Secret key an inline integration must carry, if any.
    pub required_secret: Option<&'static str>,
}

static AGENT: KindDescriptor = KindDescriptor {
    kind: ResourceKind::Agent,
    label: "agent",
    slug: "agent",
    plural_slug: "agents",
    api_path: "agents",
    integration: IntegrationRequirement::Optional,
    required_secret: None,
};

static JOB: KindDescriptor = KindDescriptor {
    kind: ResourceKind::Job,
    label: "job",
    slug: "job",
    plural_slug: "jobs",
    api_path: "jobs",
    integration: IntegrationRequirement::Unsupported,
    required_secret: None,
};

static MODEL_API: KindDescriptor = KindDescriptor {
    kind: ResourceKind::ModelApi,
    label: "model API",
    slug: "model_api",
    plural_slug: "model_apis",
    api_path: "models",
    integration: IntegrationRequirement::Required,
    required_secret: Some("apiKey"),
};

static TOOL_SERVER: KindDescriptor = KindDescriptor {
    kind: ResourceKind::ToolServer,
    label: "tool server",
    slug: "tool_server",
    plural_slug: "tool_servers",
    api_path: "functions",
    integration: IntegrationRequirement::Required,
    required_secret: None,
};

static SANDBOX: KindDescriptor = KindDescriptor {
    kind: ResourceKind::Sandbox,
    label: "sandbox",
    slug: "sandbox",
    plural_slug: "sandboxes",
    api_path: "sandboxes",
    integration: IntegrationRequirement::Unsupported,
    required_secret: None,
};

impl KindDescriptor {
    /// Build the platform create body for a spec.
    ///
    /// Caller-supplied settings are forwarded into `spec`; the resolved
    /// integration is attached as a connection reference.
    pub fn create_body(&self, spec: &ResourceSpec, integration: Option<&str>) -> Value {
        let mut inner: Map<String, Value> = spec.settings.clone();
        if let Some(name) = integration {
            inner.insert("integrationConnections".into(), json!([name]));
        }

        json!({
            "metadata": {
                "name": spec.name,
                "labels": spec.labels,
            },
            "spec": inner,
        })
    }
}

/// Credentials and configuration supplied inline with a creation request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InlineIntegration {
    /// Integration type (provider), e.g. `openai`.
    #[serde(rename = "type")]
    pub integration_type: String,
    /// Secret values keyed by name.
    #[serde(default)]
    pub secrets: HashMap<String, String>,
    /// Non-secret configuration.
    #[serde(default)]
    pub config: HashMap<String, String>,
}

/// Request to create a resource.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceSpec {
    /// Resource name, unique within workspace and kind.
    pub name: String,
    /// Resource kind.
    pub kind: ResourceKind,
    /// Name of an existing integration to attach.
    pub integration_ref: Option<String>,
    /// Integration to create alongside the resource.
    pub inline_integration: Option<InlineIntegration>,
    /// Labels attached to the resource metadata.
    pub labels: BTreeMap<String, String>,
    /// Kind-specific settings forwarded to the platform.
    pub settings: Map<String, Value>,
}

impl ResourceSpec {
    /// Create a spec with no integration or settings.
    pub fn new(kind: ResourceKind, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            integration_ref: None,
            inline_integration: None,
            labels: BTreeMap::new(),
            settings: Map::new(),
        }
    }

    /// Reference an existing integration by name.
    pub fn with_integration_ref(mut self, name: impl Into<String>) -> Self {
        self.integration_ref = Some(name.into());
        self
    }

    /// Create an integration inline.
    pub fn with_inline_integration(mut self, integration: InlineIntegration) -> Self {
        self.inline_integration = Some(integration);
        self
    }

    /// Add a kind-specific setting.
    pub fn with_setting(mut self, key: impl Into<String>, value: Value) -> Self {
        self.settings.insert(key.into(), value);
        self
    }

    /// Check the name.
    pub fn validate_name(&self) -> Result<()> {
        validate_name(self.kind, &self.name)
    }
}

/// Check a resource name before it is used in a request path.
pub fn validate_name(kind: ResourceKind, name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::Validation(format!("{} name is required", kind)));
    }
    if name.contains('/') {
        return Err(Error::Validation(format!(
            "{} name '{}' must not contain '/'",
            kind, name
        )));
    }
    Ok(())
}

/// Integration created on the platform and referenced by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrationSpec {
    /// Integration name.
    pub name: String,
    /// Integration type.
    #[serde(rename = "type")]
    pub integration_type: String,
    /// Secret values.
    pub secrets: HashMap<String, String>,
    /// Non-secret configuration.
    pub config: HashMap<String, String>,
}

impl IntegrationSpec {
    /// Name given to an integration created inline for a resource.
    pub fn synthesized_name(resource_name: &str, integration_type: &str) -> String {
        format!("{}-{}-integration", resource_name, integration_type)
    }
}
