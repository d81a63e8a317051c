//! Platform API client.
//!
//! The orchestration layer talks to the platform through the
//! [`ResourceClient`] and [`IntegrationClient`] traits; [`PlatformClient`]
//! implements both over HTTP.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use super::error::{PlatformError, Result};
use super::types::ApiErrorResponse;
use crate::config::PlatformConfig;
use crate::resource::{IntegrationSpec, ResourceKind};

/// User agent for API requests.
const USER_AGENT: &str = concat!("platform-mcp/", env!("CARGO_PKG_VERSION"));

/// Header carrying the target workspace.
const WORKSPACE_HEADER: &str = "X-Workspace";

/// Header carrying a per-request correlation id.
const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// Create, read and delete operations for platform resources.
#[async_trait]
pub trait ResourceClient: Send + Sync {
    /// Create a resource from a platform request body.
    async fn create(&self, kind: ResourceKind, body: &Value) -> Result<Value>;

    /// Fetch a resource. `Ok(None)` means the platform reported no resource.
    async fn get(&self, kind: ResourceKind, name: &str) -> Result<Option<Value>>;

    /// List all resources of a kind.
    async fn list(&self, kind: ResourceKind) -> Result<Vec<Value>>;

    /// Request deletion of a resource.
    async fn delete(&self, kind: ResourceKind, name: &str) -> Result<()>;
}

/// Integration management on the platform.
#[async_trait]
pub trait IntegrationClient: Send + Sync {
    /// Create a named integration.
    async fn create_integration(&self, integration: &IntegrationSpec) -> Result<()>;
}

/// HTTP client for the platform API.
pub struct PlatformClient {
    /// HTTP client with configured timeout and headers.
    http_client: Client,
    /// Base API URL, without trailing slash.
    api_url: String,
    /// Workspace every request targets.
    workspace: String,
    /// Bearer token, if configured.
    api_key: Option<String>,
}

impl PlatformClient {
    /// Create a client from configuration.
    pub fn new(config: &PlatformConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            http_client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            workspace: config.workspace.clone(),
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
        })
    }

    /// Get the configured API URL.
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn collection_url(&self, kind: ResourceKind) -> String {
        format!("{}/{}", self.api_url, kind.descriptor().api_path)
    }

    fn resource_url(&self, kind: ResourceKind, name: &str) -> String {
        format!("{}/{}", self.collection_url(kind), name)
    }

    /// Start a request with workspace, auth and request id applied.
    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let request_id = Uuid::new_v4().to_string();
        debug!(%method, url, %request_id, "platform request");

        let builder = self
            .http_client
            .request(method, url)
            .header(WORKSPACE_HEADER, &self.workspace)
            .header(REQUEST_ID_HEADER, request_id);

        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    /// Parse a success body, or classify the failure.
    async fn handle_response(response: Response) -> Result<Value> {
        let status = response.status();
        if !status.is_success() {
            return Err(Self::error_from(response).await);
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body).map_err(|e| PlatformError::Parse(e.to_string()))
    }

    /// Turn a non-success response into a classified error.
    async fn error_from(response: Response) -> PlatformError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        PlatformError::from_status(status, error_message(status, &body))
    }
}

/// Extract the most useful error text from a failure body.
fn error_message(status: u16, body: &str) -> String {
    let parsed = serde_json::from_str::<ApiErrorResponse>(body)
        .ok()
        .and_then(|e| e.get_message());

    match parsed {
        Some(message) => message,
        None if body.trim().is_empty() => format!("status code {}", status),
        None => body.trim().to_string(),
    }
}

#[async_trait]
impl ResourceClient for PlatformClient {
    async fn create(&self, kind: ResourceKind, body: &Value) -> Result<Value> {
        let response = self
            .request(Method::POST, &self.collection_url(kind))
            .json(body)
            .send()
            .await?;

        Self::handle_response(response).await
    }

    async fn get(&self, kind: ResourceKind, name: &str) -> Result<Option<Value>> {
        let response = self
            .request(Method::GET, &self.resource_url(kind, name))
            .send()
            .await?;

        if response.status().as_u16() == 404 {
            return Ok(None);
        }

        match Self::handle_response(response).await? {
            Value::Null => Ok(None),
            value => Ok(Some(value)),
        }
    }

    async fn list(&self, kind: ResourceKind) -> Result<Vec<Value>> {
        let response = self
            .request(Method::GET, &self.collection_url(kind))
            .send()
            .await?;

        match Self::handle_response(response).await? {
            Value::Null => Ok(Vec::new()),
            Value::Array(items) => Ok(items),
            other => Err(PlatformError::Parse(format!(
                "expected a list of {} resources, got {}",
                kind, other
            ))),
        }
    }

    async fn delete(&self, kind: ResourceKind, name: &str) -> Result<()> {
        let response = self
            .request(Method::DELETE, &self.resource_url(kind, name))
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::error_from(response).await)
        }
    }
}

#[async_trait]
impl IntegrationClient for PlatformClient {
    async fn create_integration(&self, integration: &IntegrationSpec) -> Result<()> {
        let url = format!("{}/integrations/connections", self.api_url);
        let body = serde_json::json!({
            "metadata": { "name": integration.name },
            "spec": {
                "integration": integration.integration_type,
                "secret": integration.secrets,
                "config": integration.config,
            }
        });

        let response = self.request(Method::POST, &url).json(&body).send().await?;
        Self::handle_response(response).await.map(|_| ())
    }
}
