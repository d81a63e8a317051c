//! MCP server exposing the platform lifecycle tools.

use std::sync::Arc;

use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::error::{Error, Result};
use crate::orchestrator::ResourceOrchestrator;
use crate::protocol::{
    error_codes, McpRequest, McpResponse, ServerCapabilities, ServerInfo, ToolCapabilities,
    PROTOCOL_VERSION,
};
use crate::tools::{ToolContext, ToolRegistry};

/// Platform MCP Server.
pub struct PlatformMcpServer {
    /// Tool registry, shared with in-flight tool calls.
    registry: Arc<ToolRegistry>,
    /// Server info.
    server_info: ServerInfo,
    /// Whether the client sent `notifications/initialized`.
    initialized: bool,
    /// Cancelled on shutdown; in-flight waits observe it.
    shutdown: CancellationToken,
}

impl PlatformMcpServer {
    /// Create a new MCP server.
    pub fn new(orchestrator: ResourceOrchestrator, shutdown: CancellationToken) -> Self {
        Self {
            registry: Arc::new(ToolRegistry::new(ToolContext::new(
                orchestrator,
                shutdown.clone(),
            ))),
            server_info: ServerInfo::default(),
            initialized: false,
            shutdown,
        }
    }

    /// Run the server on stdio until stdin closes or shutdown is requested.
    pub async fn run_stdio(&mut self) -> Result<()> {
        info!("Starting Platform MCP Server on stdio");
        let stdin = BufReader::new(tokio::io::stdin());
        let stdout = tokio::io::stdout();
        self.serve(stdin, stdout).await
    }

    /// Serve line-delimited JSON-RPC from `reader`, answering on `writer`.
    ///
    /// Tool calls run as separate tasks, so other requests are answered
    /// while a call waits on the platform. Responses to calls still running
    /// when input ends or shutdown is requested are written before returning.
    pub async fn serve<R, W>(&mut self, reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        let (completed, mut finished) = unbounded_channel::<McpResponse>();
        let shutdown = self.shutdown.clone();

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Shutdown requested, stopping server");
                    break;
                }
                Some(response) = finished.recv() => {
                    write_response(&mut writer, &response).await?;
                }
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        info!("Input closed, stopping server");
                        break;
                    };
                    if line.trim().is_empty() {
                        continue;
                    }

                    debug!("Received: {}", line);

                    if let Some(response) = self.handle_message(&line, &completed) {
                        write_response(&mut writer, &response).await?;
                    }
                }
            }
        }

        drop(completed);
        while let Some(response) = finished.recv().await {
            write_response(&mut writer, &response).await?;
        }

        Ok(())
    }

    /// Handle a single message. Notifications and tool calls produce no
    /// immediate response; tool call results arrive on `completed`.
    fn handle_message(
        &mut self,
        message: &str,
        completed: &UnboundedSender<McpResponse>,
    ) -> Option<McpResponse> {
        let request: McpRequest = match serde_json::from_str(message) {
            Ok(req) => req,
            Err(e) => {
                error!("Failed to parse request: {}", e);
                return Some(McpResponse::error(None, error_codes::PARSE_ERROR, e.to_string()));
            }
        };

        if request.is_notification() {
            self.handle_notification(&request);
            return None;
        }

        if request.jsonrpc != "2.0" {
            return Some(McpResponse::error(
                request.id,
                error_codes::INVALID_REQUEST,
                format!("unsupported jsonrpc version: {}", request.jsonrpc),
            ));
        }

        match request.method.as_str() {
            "initialize" => Some(self.handle_initialize(&request)),
            "tools/list" => Some(self.handle_tools_list(&request)),
            "tools/call" => {
                self.spawn_tool_call(request, completed.clone());
                None
            }
            "ping" => Some(McpResponse::success(request.id, json!({}))),
            _ => Some(McpResponse::error(
                request.id,
                error_codes::METHOD_NOT_FOUND,
                format!("unknown method: {}", request.method),
            )),
        }
    }

    fn handle_notification(&mut self, request: &McpRequest) {
        match request.method.as_str() {
            "notifications/initialized" | "initialized" => {
                self.initialized = true;
                info!("MCP client initialized");
            }
            "notifications/cancelled" => {
                debug!("Ignoring cancellation notice");
            }
            other => debug!("Ignoring notification: {}", other),
        }
    }

    fn handle_initialize(&self, request: &McpRequest) -> McpResponse {
        info!("Initializing MCP server");

        let capabilities = ServerCapabilities {
            tools: Some(ToolCapabilities { list_changed: false }),
        };

        McpResponse::success(
            request.id.clone(),
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": capabilities,
                "serverInfo": self.server_info
            }),
        )
    }

    fn handle_tools_list(&self, request: &McpRequest) -> McpResponse {
        McpResponse::success(
            request.id.clone(),
            json!({ "tools": self.registry.definitions() }),
        )
    }

    fn spawn_tool_call(&self, request: McpRequest, completed: UnboundedSender<McpResponse>) {
        let registry = self.registry.clone();
        tokio::spawn(async move {
            let response = call_tool(&registry, request.id, request.params).await;
            if completed.send(response).is_err() {
                debug!("Dropping tool response, server already stopped");
            }
        });
    }

    /// Whether the client completed the initialization handshake.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }
}

async fn call_tool(registry: &ToolRegistry, id: Option<Value>, params: Value) -> McpResponse {
    let Some(name) = params.get("name").and_then(|v| v.as_str()) else {
        return McpResponse::error(id, error_codes::INVALID_PARAMS, "missing tool name");
    };
    let arguments = params.get("arguments").cloned().unwrap_or(json!({}));

    info!("Calling tool: {}", name);

    let result = registry
        .execute(name, arguments)
        .await
        .and_then(|result| serde_json::to_value(result).map_err(Error::from));

    match result {
        Ok(value) => McpResponse::success(id, value),
        Err(e) => {
            error!("Tool execution failed: {}", e);
            let code = match e {
                Error::InvalidParams(_) | Error::Validation(_) => error_codes::INVALID_PARAMS,
                _ => error_codes::INTERNAL_ERROR,
            };
            McpResponse::error(id, code, e.to_string())
        }
    }
}

async fn write_response<W: AsyncWrite + Unpin>(writer: &mut W, response: &McpResponse) -> Result<()> {
    let response_json = serde_json::to_string(response)?;

    debug!("Sending: {}", response_json);

    writer.write_all(response_json.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}
