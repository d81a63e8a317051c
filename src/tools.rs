//! Tool definitions for platform-mcp.
//!
//! Every resource kind gets `create_<kind>`, `get_<kind>`, `list_<kinds>`
//! and `delete_<kind>` tools backed by the shared [`ResourceOrchestrator`].

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::orchestrator::ResourceOrchestrator;
use crate::poller::WaitContext;
use crate::protocol::{ContentItem, ToolCallResult, ToolDefinition};
use crate::resource::{InlineIntegration, IntegrationRequirement, ResourceKind, ResourceSpec};

/// Tool trait for implementing MCP tools.
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool definition.
    fn definition(&self) -> ToolDefinition;

    /// Execute the tool with the given arguments.
    async fn execute(&self, arguments: Value, context: &ToolContext) -> Result<ToolCallResult>;
}

/// Context passed to tools during execution.
pub struct ToolContext {
    /// Resource orchestrator.
    pub orchestrator: Arc<ResourceOrchestrator>,
    /// Cancelled when the server shuts down.
    pub shutdown: CancellationToken,
}

impl ToolContext {
    /// Create a new tool context.
    pub fn new(orchestrator: ResourceOrchestrator, shutdown: CancellationToken) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            shutdown,
        }
    }

    /// Wait limits for one tool call.
    fn wait_context(&self, timeout_seconds: Option<u64>) -> WaitContext {
        let ctx = WaitContext::new(self.shutdown.child_token());
        match timeout_seconds {
            Some(secs) if secs > 0 => ctx.with_timeout(Duration::from_secs(secs)),
            _ => ctx,
        }
    }
}

/// Registry of available tools.
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
    context: Arc<ToolContext>,
}

impl ToolRegistry {
    /// Create a registry with the lifecycle tools for every resource kind.
    pub fn new(context: ToolContext) -> Self {
        let mut registry = Self {
            tools: BTreeMap::new(),
            context: Arc::new(context),
        };
        for kind in ResourceKind::all() {
            registry.register(Arc::new(CreateResourceTool { kind }));
            registry.register(Arc::new(GetResourceTool { kind }));
            registry.register(Arc::new(ListResourcesTool { kind }));
            registry.register(Arc::new(DeleteResourceTool { kind }));
        }
        registry
    }

    /// Register a tool.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.definition().name;
        self.tools.insert(name, tool);
    }

    /// Get all tool definitions, ordered by name.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|t| t.definition()).collect()
    }

    /// Execute a tool by name.
    pub async fn execute(&self, name: &str, arguments: Value) -> Result<ToolCallResult> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| Error::InvalidParams(format!("unknown tool: {}", name)))?;

        tool.execute(arguments, &self.context).await
    }
}

/// Parse the string-typed `waitForCompletion` flag.
///
/// Absent or empty means `true`; anything other than the literal `"true"`
/// means `false`.
pub fn parse_wait_flag(raw: Option<&str>) -> bool {
    match raw {
        None | Some("") => true,
        Some(value) => value == "true",
    }
}

fn parse_args<T: for<'de> Deserialize<'de>>(arguments: Value) -> Result<T> {
    serde_json::from_value(arguments).map_err(|e| Error::InvalidParams(e.to_string()))
}

fn json_result<T: Serialize>(value: &T) -> Result<ToolCallResult> {
    Ok(ToolCallResult {
        content: vec![ContentItem::text(serde_json::to_string_pretty(value)?)],
        is_error: false,
    })
}

fn wait_properties() -> Map<String, Value> {
    let mut properties = Map::new();
    properties.insert(
        "waitForCompletion".into(),
        json!({
            "type": "string",
            "enum": ["true", "false"],
            "default": "true",
            "description": "Wait until the platform reports the operation settled"
        }),
    );
    properties.insert(
        "timeoutSeconds".into(),
        json!({
            "type": "integer",
            "minimum": 1,
            "description": "Optional: stop waiting after this many seconds"
        }),
    );
    properties
}

// =============================================================================
// Tool Implementations
// =============================================================================

/// Tool creating a resource of one kind.
pub struct CreateResourceTool {
    kind: ResourceKind,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateArgs {
    name: String,
    #[serde(default)]
    integration_ref: Option<String>,
    #[serde(default, alias = "provider")]
    integration_type: Option<String>,
    #[serde(default, alias = "apiKey")]
    integration_secret: Option<String>,
    #[serde(default)]
    integration_secrets: HashMap<String, String>,
    #[serde(default)]
    integration_config: HashMap<String, String>,
    #[serde(default)]
    labels: BTreeMap<String, String>,
    #[serde(default)]
    settings: Map<String, Value>,
    #[serde(default)]
    wait_for_completion: Option<String>,
    #[serde(default)]
    timeout_seconds: Option<u64>,
}

impl CreateArgs {
    fn into_spec(self, kind: ResourceKind) -> ResourceSpec {
        let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        let integration_type = non_empty(self.integration_type);
        let secret = non_empty(self.integration_secret);

        let mut secrets = self.integration_secrets;
        if let Some(secret) = secret {
            let key = kind.descriptor().required_secret.unwrap_or("apiKey");
            secrets.insert(key.to_string(), secret);
        }

        let wants_inline =
            integration_type.is_some() || !secrets.is_empty() || !self.integration_config.is_empty();
        let inline_integration = wants_inline.then(|| InlineIntegration {
            integration_type: integration_type.unwrap_or_default(),
            secrets,
            config: self.integration_config,
        });

        ResourceSpec {
            name: self.name,
            kind,
            integration_ref: non_empty(self.integration_ref),
            inline_integration,
            labels: self.labels,
            settings: self.settings,
        }
    }
}

#[async_trait::async_trait]
impl Tool for CreateResourceTool {
    fn definition(&self) -> ToolDefinition {
        let descriptor = self.kind.descriptor();
        let mut properties = Map::new();
        properties.insert(
            "name".into(),
            json!({"type": "string", "description": format!("Name of the {}", self.kind)}),
        );

        if descriptor.integration != IntegrationRequirement::Unsupported {
            properties.insert(
                "integrationRef".into(),
                json!({"type": "string", "description": "Name of an existing integration to attach"}),
            );
            properties.insert(
                "integrationType".into(),
                json!({"type": "string", "description": "Type of integration to create inline, e.g. a provider name"}),
            );
            properties.insert(
                "integrationSecret".into(),
                json!({"type": "string", "description": "API key for the inline integration"}),
            );
            properties.insert(
                "integrationSecrets".into(),
                json!({"type": "object", "additionalProperties": {"type": "string"}}),
            );
            properties.insert(
                "integrationConfig".into(),
                json!({"type": "object", "additionalProperties": {"type": "string"}}),
            );
        }
        properties.insert(
            "labels".into(),
            json!({"type": "object", "additionalProperties": {"type": "string"}}),
        );
        properties.insert(
            "settings".into(),
            json!({"type": "object", "description": format!("Additional {} settings passed to the platform", self.kind)}),
        );
        properties.extend(wait_properties());

        let integration_note = match descriptor.integration {
            IntegrationRequirement::Required => {
                " Requires either integrationRef or integrationType, not both."
            }
            IntegrationRequirement::Optional => {
                " Optionally attach an integration with integrationRef or integrationType."
            }
            IntegrationRequirement::Unsupported => "",
        };

        ToolDefinition {
            name: format!("create_{}", self.kind.slug()),
            description: format!(
                "Create a {} and optionally wait until it is deployed.{}",
                self.kind, integration_note
            ),
            input_schema: json!({
                "type": "object",
                "properties": properties,
                "required": ["name"]
            }),
        }
    }

    async fn execute(&self, arguments: Value, context: &ToolContext) -> Result<ToolCallResult> {
        let args: CreateArgs = parse_args(arguments)?;
        let wait = parse_wait_flag(args.wait_for_completion.as_deref());
        let ctx = context.wait_context(args.timeout_seconds);
        let spec = args.into_spec(self.kind);

        let outcome = context.orchestrator.create(&spec, wait, &ctx).await?;
        json_result(&outcome)
    }
}

/// Tool deleting a resource of one kind.
pub struct DeleteResourceTool {
    kind: ResourceKind,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteArgs {
    name: String,
    #[serde(default)]
    wait_for_completion: Option<String>,
    #[serde(default)]
    timeout_seconds: Option<u64>,
}

#[async_trait::async_trait]
impl Tool for DeleteResourceTool {
    fn definition(&self) -> ToolDefinition {
        let mut properties = Map::new();
        properties.insert(
            "name".into(),
            json!({"type": "string", "description": format!("Name of the {} to delete", self.kind)}),
        );
        properties.extend(wait_properties());

        ToolDefinition {
            name: format!("delete_{}", self.kind.slug()),
            description: format!(
                "Delete a {} and optionally wait until it is gone.",
                self.kind
            ),
            input_schema: json!({
                "type": "object",
                "properties": properties,
                "required": ["name"]
            }),
        }
    }

    async fn execute(&self, arguments: Value, context: &ToolContext) -> Result<ToolCallResult> {
        let args: DeleteArgs = parse_args(arguments)?;
        let wait = parse_wait_flag(args.wait_for_completion.as_deref());
        let ctx = context.wait_context(args.timeout_seconds);

        let outcome = context
            .orchestrator
            .delete(self.kind, &args.name, wait, &ctx)
            .await?;
        json_result(&outcome)
    }
}

/// Tool fetching one resource.
pub struct GetResourceTool {
    kind: ResourceKind,
}

#[derive(Debug, Deserialize)]
struct GetArgs {
    name: String,
}

#[async_trait::async_trait]
impl Tool for GetResourceTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: format!("get_{}", self.kind.slug()),
            description: format!("Get a {} and its current status.", self.kind),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "name": {
                        "type": "string",
                        "description": format!("Name of the {}", self.kind)
                    }
                },
                "required": ["name"]
            }),
        }
    }

    async fn execute(&self, arguments: Value, context: &ToolContext) -> Result<ToolCallResult> {
        let args: GetArgs = parse_args(arguments)?;
        let summary = context.orchestrator.get(self.kind, &args.name).await?;
        json_result(&summary)
    }
}

/// Tool listing resources of one kind.
pub struct ListResourcesTool {
    kind: ResourceKind,
}

#[async_trait::async_trait]
impl Tool for ListResourcesTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: format!("list_{}", self.kind.descriptor().plural_slug),
            description: format!("List every {} in the workspace.", self.kind),
            input_schema: json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
        }
    }

    async fn execute(&self, _arguments: Value, context: &ToolContext) -> Result<ToolCallResult> {
        let summaries = context.orchestrator.list(self.kind).await?;
        json_result(&summaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::PlatformError;
    use crate::status::PollPolicy;
    use crate::testing::{FakePlatform, RecordingReporter};

    fn registry() -> (Arc<FakePlatform>, ToolRegistry) {
        let platform = Arc::new(FakePlatform::new());
        let orchestrator = ResourceOrchestrator::new(
            platform.clone(),
            platform.clone(),
            PollPolicy::new(3, Duration::from_secs(2)),
            Arc::new(RecordingReporter::default()),
        );
        let registry = ToolRegistry::new(ToolContext::new(orchestrator, CancellationToken::new()));
        (platform, registry)
    }

    fn text(result: &ToolCallResult) -> Value {
        match &result.content[0] {
            ContentItem::Text { text } => serde_json::from_str(text).unwrap(),
        }
    }

    #[test]
    fn test_wait_flag_parsing() {
        assert!(parse_wait_flag(None));
        assert!(parse_wait_flag(Some("")));
        assert!(parse_wait_flag(Some("true")));
        assert!(!parse_wait_flag(Some("false")));
        assert!(!parse_wait_flag(Some("TRUE")));
        assert!(!parse_wait_flag(Some("yes")));
    }

    #[test]
    fn test_registry_has_tools_for_every_kind() {
        let (_, registry) = registry();
        let names: Vec<_> = registry.definitions().into_iter().map(|d| d.name).collect();
        assert_eq!(names.len(), 20);
        for name in ["create_model_api", "delete_tool_server", "get_sandbox", "list_sandboxes"] {
            assert!(names.iter().any(|n| n == name), "missing {}", name);
        }
    }

    #[test]
    fn test_integration_fields_only_for_kinds_that_take_them() {
        let job = CreateResourceTool { kind: ResourceKind::Job }.definition();
        assert!(job.input_schema["properties"].get("integrationRef").is_none());

        let model = CreateResourceTool { kind: ResourceKind::ModelApi }.definition();
        assert!(model.input_schema["properties"].get("integrationType").is_some());
        assert!(model.description.contains("not both"));
    }

    #[test]
    fn test_create_args_map_to_inline_integration() {
        let args: CreateArgs = parse_args(json!({
            "name": "model-y",
            "provider": "openai",
            "apiKey": "sk-test",
            "integrationConfig": {"endpoint": "https://example.test"}
        }))
        .unwrap();
        let spec = args.into_spec(ResourceKind::ModelApi);

        let inline = spec.inline_integration.unwrap();
        assert_eq!(inline.integration_type, "openai");
        assert_eq!(inline.secrets["apiKey"], "sk-test");
        assert_eq!(inline.config["endpoint"], "https://example.test");
        assert_eq!(spec.integration_ref, None);
    }

    #[tokio::test]
    async fn test_create_tool_without_wait() {
        let (platform, registry) = registry();
        let result = registry
            .execute(
                "create_agent",
                json!({"name": "agent-x", "integrationRef": "github-conn", "waitForCompletion": "false"}),
            )
            .await
            .unwrap();

        let outcome = text(&result);
        assert_eq!(outcome["success"], true);
        assert_eq!(outcome["message"], "agent 'agent-x' created successfully");
        assert_eq!(outcome["resource"]["integrations"], json!(["github-conn"]));
        assert!(platform.get_calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_tool_waits_by_default() {
        let (platform, registry) = registry();
        let result = registry
            .execute("create_sandbox", json!({"name": "sandbox-a"}))
            .await
            .unwrap();

        assert!(text(&result)["message"]
            .as_str()
            .unwrap()
            .ends_with("created and deployed successfully"));
        assert_eq!(platform.get_calls().len(), 1);
    }

    #[tokio::test]
    async fn test_create_tool_rejects_both_integration_modes() {
        let (platform, registry) = registry();
        let err = registry
            .execute(
                "create_tool_server",
                json!({"name": "mcp-z", "integrationRef": "gh", "integrationType": "github"}),
            )
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not both"));
        assert_eq!(platform.call_count(), 0);
    }

    #[tokio::test]
    async fn test_delete_tool_surfaces_platform_failure() {
        let (platform, registry) = registry();
        platform.push_delete(Err(PlatformError::from_status(500, "boom")));

        let err = registry
            .execute("delete_job", json!({"name": "job-b", "waitForCompletion": "nope"}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("failed to delete job 'job-b'"));
    }

    #[tokio::test]
    async fn test_huge_timeout_waits_without_deadline() {
        let (platform, registry) = registry();
        platform.push_get(Ok(None));

        let result = registry
            .execute(
                "delete_job",
                json!({"name": "job-b", "timeoutSeconds": u64::MAX}),
            )
            .await
            .unwrap();
        let outcome = text(&result);
        assert_eq!(outcome["message"], "job 'job-b' deleted successfully");
        assert!(outcome.get("warning").is_none());
        assert_eq!(platform.get_calls().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_tool_and_bad_arguments() {
        let (_, registry) = registry();
        assert!(matches!(
            registry.execute("create_cluster", json!({})).await,
            Err(Error::InvalidParams(_))
        ));
        assert!(matches!(
            registry.execute("get_agent", json!({"nom": "x"})).await,
            Err(Error::InvalidParams(_))
        ));
    }

    #[tokio::test]
    async fn test_cancelled_shutdown_turns_wait_into_warning() {
        let platform = Arc::new(FakePlatform::new());
        platform.push_status("agent-x", "BUILDING");
        let orchestrator = ResourceOrchestrator::new(
            platform.clone(),
            platform.clone(),
            PollPolicy::default(),
            Arc::new(RecordingReporter::default()),
        );
        let shutdown = CancellationToken::new();
        shutdown.cancel();
        let registry = ToolRegistry::new(ToolContext::new(orchestrator, shutdown));

        let result = registry
            .execute("create_agent", json!({"name": "agent-x"}))
            .await
            .unwrap();
        let outcome = text(&result);
        assert!(outcome["warning"].as_str().unwrap().starts_with("cancelled:"));
        assert_eq!(platform.create_calls().len(), 1);
    }
}
