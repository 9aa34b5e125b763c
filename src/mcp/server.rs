//! MCP server session for the Eolink catalog.
//!
//! This module implements the MCP server lifecycle:
//!
//! 1. **Initialisation**: Capability negotiation and version agreement
//! 2. **Operation**: Handling tool calls and resource reads
//! 3. **Shutdown**: Graceful connection termination
//!
//! One [`McpServer`] is one session. The stdio transport runs a single
//! session for the life of the process; the SSE transport creates one per
//! connected stream. Sessions share a [`ToolHandler`] and therefore one
//! catalog cache.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::ToolError;
use crate::mcp::handler::ToolHandler;
use crate::mcp::protocol::{
    parse_message, ErrorCode, IncomingMessage, JsonRpcError, JsonRpcErrorData,
    JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, Outgoing, RequestId,
    MCP_PROTOCOL_VERSION, SERVER_NAME,
};
use crate::mcp::tools::{tool_definitions, ToolCallParams};
use crate::mcp::transport::StdioTransport;

/// Server state in the MCP lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    /// Waiting for initialize request.
    AwaitingInit,
    /// Initialize received, waiting for initialized notification.
    Initialising,
    /// Ready for normal operation.
    Running,
    /// Shutdown in progress.
    ShuttingDown,
}

/// Server capabilities advertised during initialisation.
#[derive(Debug, Clone, Serialize)]
pub struct ServerCapabilities {
    /// Tool-related capabilities.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<ListCapabilities>,
    /// Resource-related capabilities.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<ListCapabilities>,
}

impl Default for ServerCapabilities {
    fn default() -> Self {
        Self {
            tools: Some(ListCapabilities::default()),
            resources: Some(ListCapabilities::default()),
        }
    }
}

/// Capabilities of a listable feature (tools, resources).
#[derive(Debug, Clone, Default, Serialize)]
pub struct ListCapabilities {
    /// Whether the list can change during the session.
    #[serde(rename = "listChanged", skip_serializing_if = "is_false")]
    pub list_changed: bool,
}

#[allow(clippy::trivially_copy_pass_by_ref)] // serde's skip_serializing_if requires fn(&T) -> bool
const fn is_false(b: &bool) -> bool {
    !*b
}

/// Server information for initialisation response.
#[derive(Debug, Clone, Serialize)]
pub struct ServerInfo {
    /// Server name.
    pub name: String,
    /// Server version.
    pub version: String,
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self {
            name: SERVER_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Client information received during initialisation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientInfo {
    /// Client name.
    pub name: String,
    /// Client version.
    #[serde(default)]
    pub version: Option<String>,
}

/// Parameters for the initialize request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    /// Protocol version requested by client.
    pub protocol_version: String,
    /// Client capabilities.
    #[serde(default)]
    pub capabilities: Value,
    /// Client information.
    #[serde(default)]
    pub client_info: Option<ClientInfo>,
}

/// Parameters for resources/read request.
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceReadParams {
    /// URI of the resource to read.
    pub uri: String,
}

/// One MCP session over the shared tool handler.
pub struct McpServer {
    /// Current server state.
    state: ServerState,
    /// Negotiated protocol version (set after initialisation).
    protocol_version: Option<String>,
    /// Tool and resource dispatch.
    handler: Arc<ToolHandler>,
}

impl McpServer {
    /// Creates a new session awaiting `initialize`.
    #[must_use]
    pub const fn new(handler: Arc<ToolHandler>) -> Self {
        Self {
            state: ServerState::AwaitingInit,
            protocol_version: None,
            handler,
        }
    }

    /// Returns the current server state.
    #[must_use]
    pub const fn state(&self) -> ServerState {
        self.state
    }

    /// Returns the negotiated protocol version, once initialised.
    #[must_use]
    pub fn protocol_version(&self) -> Option<&str> {
        self.protocol_version.as_deref()
    }

    /// Runs the session over stdio with graceful shutdown handling.
    ///
    /// # Errors
    ///
    /// Returns an error if transport I/O fails.
    pub async fn run_stdio(&mut self) -> std::io::Result<()> {
        let mut transport = StdioTransport::new();
        self.run_with_shutdown(&mut transport).await
    }

    /// Runs the main loop and handles shutdown.
    #[cfg(unix)]
    async fn run_with_shutdown(&mut self, transport: &mut StdioTransport) -> std::io::Result<()> {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigint = signal(SignalKind::interrupt()).map_err(std::io::Error::other)?;
        let mut sigterm = signal(SignalKind::terminate()).map_err(std::io::Error::other)?;

        loop {
            tokio::select! {
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT, initiating graceful shutdown");
                    self.state = ServerState::ShuttingDown;
                    return Ok(());
                }

                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM, initiating graceful shutdown");
                    self.state = ServerState::ShuttingDown;
                    return Ok(());
                }

                line_result = transport.read_line() => {
                    if self.handle_transport_result(transport, line_result).await? {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Runs the main loop and handles shutdown.
    #[cfg(windows)]
    async fn run_with_shutdown(&mut self, transport: &mut StdioTransport) -> std::io::Result<()> {
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                _ = &mut ctrl_c => {
                    tracing::info!("Received Ctrl+C, initiating graceful shutdown");
                    self.state = ServerState::ShuttingDown;
                    return Ok(());
                }

                line_result = transport.read_line() => {
                    if self.handle_transport_result(transport, line_result).await? {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Handles the result from transport read.
    ///
    /// Returns `true` if the server should shut down.
    async fn handle_transport_result(
        &mut self,
        transport: &mut StdioTransport,
        line_result: std::io::Result<Option<String>>,
    ) -> std::io::Result<bool> {
        let Some(line) = line_result? else {
            tracing::info!("stdin closed, shutting down");
            self.state = ServerState::ShuttingDown;
            return Ok(true);
        };

        if let Some(message) = self.handle_line(&line).await {
            transport.write_message(&message).await?;
        }

        Ok(self.state == ServerState::ShuttingDown)
    }

    /// Handles a single line of input.
    ///
    /// Returns the message to send back, or `None` for notifications and
    /// blank lines.
    pub async fn handle_line(&mut self, line: &str) -> Option<Outgoing> {
        if line.trim().is_empty() {
            return None;
        }

        match parse_message(line) {
            Ok(msg) => self.handle_message(msg).await,
            Err(error) => {
                tracing::warn!(code = error.error.code, "Rejected malformed message");
                Some(Outgoing::Error(error))
            }
        }
    }

    /// Handles a parsed incoming message.
    async fn handle_message(&mut self, msg: IncomingMessage) -> Option<Outgoing> {
        tracing::debug!(method = msg.method(), id = ?msg.id(), "Received message");

        match msg {
            IncomingMessage::Request(req) => Some(self.handle_request(req).await.into()),
            IncomingMessage::Notification(ref notif) => {
                self.handle_notification(notif);
                None
            }
        }
    }

    /// Handles an incoming request.
    async fn handle_request(&mut self, req: JsonRpcRequest) -> Result<JsonRpcResponse, JsonRpcError> {
        match req.method.as_str() {
            "initialize" => self.handle_initialize(&req),
            "ping" => Ok(Self::handle_ping(&req)),
            "tools/list" => self.handle_tools_list(&req),
            "tools/call" => self.handle_tools_call(&req).await,
            "resources/list" => self.handle_resources_list(&req),
            "resources/templates/list" => self.handle_resource_templates_list(&req),
            "resources/read" => self.handle_resources_read(&req).await,
            _ => Err(JsonRpcError::method_not_found(req.id.clone(), &req.method)),
        }
    }

    /// Handles an incoming notification.
    fn handle_notification(&mut self, notif: &JsonRpcNotification) {
        if notif.method == "notifications/initialized" && self.state == ServerState::Initialising {
            tracing::info!("Session initialised");
            self.state = ServerState::Running;
        }
    }

    /// Handles the initialize request.
    fn handle_initialize(&mut self, req: &JsonRpcRequest) -> Result<JsonRpcResponse, JsonRpcError> {
        if self.state != ServerState::AwaitingInit {
            return Err(JsonRpcError::new(
                Some(req.id.clone()),
                JsonRpcErrorData::with_message(
                    ErrorCode::InvalidRequest,
                    "Server already initialised",
                ),
            ));
        }

        let params: InitializeParams = parse_params(req, "initialize")?;

        tracing::info!(
            client = params.client_info.as_ref().map(|c| c.name.as_str()),
            requested_version = %params.protocol_version,
            "Initialising session"
        );

        let negotiated_version = MCP_PROTOCOL_VERSION.to_string();

        self.protocol_version = Some(negotiated_version.clone());
        self.state = ServerState::Initialising;

        let result = json!({
            "protocolVersion": negotiated_version,
            "capabilities": ServerCapabilities::default(),
            "serverInfo": ServerInfo::default(),
        });

        Ok(JsonRpcResponse::success(req.id.clone(), result))
    }

    /// Handles the tools/list request.
    fn handle_tools_list(&self, req: &JsonRpcRequest) -> Result<JsonRpcResponse, JsonRpcError> {
        self.require_running(&req.id)?;

        let result = json!({
            "tools": tool_definitions(),
        });

        Ok(JsonRpcResponse::success(req.id.clone(), result))
    }

    /// Handles the tools/call request.
    async fn handle_tools_call(&self, req: &JsonRpcRequest) -> Result<JsonRpcResponse, JsonRpcError> {
        self.require_running(&req.id)?;

        let params: ToolCallParams = parse_params(req, "tool call")?;

        let result = self
            .handler
            .call_tool(&params.name, &params.arguments)
            .await
            .map_err(|e| tool_error_to_rpc(req.id.clone(), e))?;

        let result_value = serde_json::to_value(&result).map_err(|e| {
            tracing::error!(error = %e, "Failed to serialise tool call result");
            JsonRpcError::internal_error(
                req.id.clone(),
                "Internal error: failed to serialise result",
            )
        })?;

        Ok(JsonRpcResponse::success(req.id.clone(), result_value))
    }

    /// Handles the resources/list request. Only templated resources exist.
    fn handle_resources_list(&self, req: &JsonRpcRequest) -> Result<JsonRpcResponse, JsonRpcError> {
        self.require_running(&req.id)?;
        Ok(JsonRpcResponse::success(
            req.id.clone(),
            json!({ "resources": [] }),
        ))
    }

    /// Handles the resources/templates/list request.
    fn handle_resource_templates_list(
        &self,
        req: &JsonRpcRequest,
    ) -> Result<JsonRpcResponse, JsonRpcError> {
        self.require_running(&req.id)?;
        Ok(JsonRpcResponse::success(
            req.id.clone(),
            ToolHandler::resource_templates(),
        ))
    }

    /// Handles the resources/read request.
    async fn handle_resources_read(
        &self,
        req: &JsonRpcRequest,
    ) -> Result<JsonRpcResponse, JsonRpcError> {
        self.require_running(&req.id)?;

        let params: ResourceReadParams = parse_params(req, "resource read")?;

        let result = self
            .handler
            .read_resource(&params.uri)
            .await
            .map_err(|e| tool_error_to_rpc(req.id.clone(), e))?;

        Ok(JsonRpcResponse::success(req.id.clone(), result))
    }

    /// Handles the ping request.
    fn handle_ping(req: &JsonRpcRequest) -> JsonRpcResponse {
        JsonRpcResponse::success(req.id.clone(), json!({}))
    }

    /// Ensures the server is in the Running state.
    fn require_running(&self, id: &RequestId) -> Result<(), JsonRpcError> {
        if self.state != ServerState::Running {
            return Err(JsonRpcError::new(
                Some(id.clone()),
                JsonRpcErrorData::with_message(ErrorCode::InvalidRequest, "Server not initialised"),
            ));
        }
        Ok(())
    }
}

/// Deserialises required request params.
fn parse_params<T: serde::de::DeserializeOwned>(
    req: &JsonRpcRequest,
    what: &str,
) -> Result<T, JsonRpcError> {
    req.params
        .as_ref()
        .map(|p| serde_json::from_value(p.clone()))
        .transpose()
        .map_err(|e| JsonRpcError::invalid_params(req.id.clone(), format!("Invalid {what} params: {e}")))?
        .ok_or_else(|| JsonRpcError::invalid_params(req.id.clone(), format!("Missing {what} params")))
}

/// Maps a handler error to its JSON-RPC error.
fn tool_error_to_rpc(id: RequestId, error: ToolError) -> JsonRpcError {
    match &error {
        ToolError::InvalidParams { .. } => {
            tracing::debug!(error = %error, "Rejected invalid parameters");
            JsonRpcError::invalid_params(id, error.to_string())
        }
        ToolError::NotFound { .. } => JsonRpcError::resource_not_found(id, error.to_string()),
        ToolError::Upstream { .. } => {
            tracing::error!(error = %error, "Tool call failed upstream");
            JsonRpcError::internal_error(id, error.to_string())
        }
    }
}
