//! MCP server handler
//!
//! Advertises the registry's catalog and turns dispatch results into MCP tool
//! results. Tool failures are reported as `is_error` results carrying an
//! [`ErrorSignal`](desktop_mcp_protocol::ErrorSignal), never as protocol errors.
//! Progress lines go to the client as log notifications, filtered by the level
//! it last asked for with `logging/setLevel`.

use crate::registry::{ToolDescriptor, ToolOutput, ToolRegistry};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use desktop_mcp_protocol::{ScreenSize, ToolCall, ToolError};
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::tool::schema_for_output,
    model::{
        CallToolRequestParams, CallToolResult, Content, Implementation, ListToolsResult,
        LoggingLevel, LoggingMessageNotificationParam, PaginatedRequestParams, ProtocolVersion,
        ServerCapabilities, ServerInfo, SetLevelRequestParams, Tool, ToolAnnotations,
    },
    service::{RequestContext, RoleServer},
};
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

const LOGGER: &str = "desktop-mcp";

const INSTRUCTIONS: &str = "This server provides tools to interact with the user interface. \
     You can move the mouse, click, type text, press hotkeys, take screenshots, and find \
     images on the screen. Use these tools to automate UI tasks for the user.";

/// desktop-mcp server handler
#[derive(Clone)]
pub struct DesktopMcpServer {
    registry: Arc<ToolRegistry>,
    /// Lowest severity forwarded to the client
    peer_level: Arc<AtomicU8>,
}

impl DesktopMcpServer {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            registry,
            peer_level: Arc::new(AtomicU8::new(severity(LoggingLevel::Info))),
        }
    }

    fn set_peer_level(&self, level: LoggingLevel) {
        self.peer_level.store(severity(level), Ordering::Relaxed);
    }

    fn peer_wants(&self, level: LoggingLevel) -> bool {
        severity(level) >= self.peer_level.load(Ordering::Relaxed)
    }
}

impl ServerHandler for DesktopMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_logging()
                .build(),
            server_info: Implementation {
                name: env!("CARGO_PKG_NAME").to_string(),
                title: Some("Desktop Automation Server".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                description: Some(env!("CARGO_PKG_DESCRIPTION").to_string()),
                icons: None,
                website_url: None,
            },
            instructions: Some(INSTRUCTIONS.to_string()),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        let tools = self.registry.descriptors().iter().map(to_tool).collect();
        Ok(ListToolsResult::with_all_items(tools))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let call = ToolCall::new(request.name.to_string(), request.arguments.unwrap_or_default());
        tracing::debug!("Tool call: {}", call.name);

        let notice = click_notice(&self.registry, &call);
        if let Some(message) = notice.filter(|_| self.peer_wants(LoggingLevel::Info)) {
            log_to_peer(&context, LoggingLevel::Info, message).await;
        }

        let name = call.name.clone();
        match self.registry.dispatch(call).await {
            Ok(output) => Ok(output_to_result(output)),
            Err(e) => {
                tracing::warn!("{} failed ({}): {}", name, e.kind().as_str(), e);
                Ok(error_to_result(&e))
            }
        }
    }

    async fn set_level(
        &self,
        request: SetLevelRequestParams,
        _: RequestContext<RoleServer>,
    ) -> Result<(), McpError> {
        tracing::debug!("Client requested log level {:?}", request.level);
        self.set_peer_level(request.level);
        Ok(())
    }
}

/// Rank of a log level, least severe first
fn severity(level: LoggingLevel) -> u8 {
    match level {
        LoggingLevel::Debug => 0,
        LoggingLevel::Info => 1,
        LoggingLevel::Notice => 2,
        LoggingLevel::Warning => 3,
        LoggingLevel::Error => 4,
        LoggingLevel::Critical => 5,
        LoggingLevel::Alert => 6,
        LoggingLevel::Emergency => 7,
    }
}

/// Convert a descriptor into its advertised MCP form
pub fn to_tool(descriptor: &ToolDescriptor) -> Tool {
    let mut tool = Tool::new(
        descriptor.name,
        descriptor.description,
        descriptor.schema.json_schema(),
    );
    tool.title = Some(descriptor.title.to_string());

    let mut annotations = ToolAnnotations::default();
    annotations.title = Some(descriptor.title.to_string());
    annotations.read_only_hint = Some(descriptor.read_only);
    annotations.destructive_hint = Some(descriptor.destructive);
    annotations.open_world_hint = Some(descriptor.open_world);
    tool.annotations = Some(annotations);

    if descriptor.name == "get_screen_size" {
        tool.output_schema = schema_for_output::<ScreenSize>().ok();
    }
    tool
}

/// Render a successful dispatch
pub fn output_to_result(output: ToolOutput) -> CallToolResult {
    match output {
        ToolOutput::Message(message) => CallToolResult::success(vec![Content::text(message)]),
        ToolOutput::Location(location) => {
            CallToolResult::success(vec![Content::text(json!(location).to_string())])
        }
        ToolOutput::Image(image) => CallToolResult::success(vec![Content::image(
            STANDARD.encode(&image.data),
            image.format.mime_type(),
        )]),
        ToolOutput::ScreenSize(size) => CallToolResult::structured(json!(size)),
    }
}

/// Render a failed dispatch as an error result
pub fn error_to_result(error: &ToolError) -> CallToolResult {
    let signal = serde_json::to_string(&error.to_signal()).unwrap_or_else(|_| {
        json!({"error": error.kind().as_str(), "message": error.to_string()}).to_string()
    });
    CallToolResult::error(vec![Content::text(signal)])
}

/// The progress line sent to the caller before a valid click
fn click_notice(registry: &ToolRegistry, call: &ToolCall) -> Option<String> {
    if call.name != "click" {
        return None;
    }
    let arguments = registry
        .descriptor("click")?
        .schema
        .validate(call.arguments.clone())
        .ok()?;
    Some(format!(
        "Clicking at ({}, {}) with {} button, {} times.",
        arguments["x"],
        arguments["y"],
        arguments["button"].as_str()?,
        arguments["clicks"]
    ))
}

/// Best-effort log notification to the calling client
async fn log_to_peer(context: &RequestContext<RoleServer>, level: LoggingLevel, message: String) {
    let params = LoggingMessageNotificationParam {
        level,
        logger: Some(LOGGER.to_string()),
        data: json!(message),
    };
    if let Err(e) = context.peer.notify_logging_message(params).await {
        tracing::debug!("Failed to send log notification: {}", e);
    }
}
