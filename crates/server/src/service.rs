//! MCP server surface over the gateway.
//!
//! Every tool call funnels through the dispatcher; partner-side failures
//! come back as tool results flagged `is_error`, never as protocol errors,
//! so the host always receives either the partner payload or a single
//! `"Error: ..."` line.

use rmcp::model::{
    CallToolRequestParam, CallToolResult, Content, Implementation, ListToolsResult,
    PaginatedRequestParam, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::service::{RequestContext, RoleServer};
use rmcp::{ErrorData, ServerHandler};
use serde_json::Value;
use std::sync::Arc;
use visa_mcp_gateway::{Gateway, GatewayError};

#[derive(Clone)]
pub struct VisaToolService {
    gateway: Arc<Gateway>,
}

impl VisaToolService {
    #[must_use]
    pub fn new(gateway: Gateway) -> Self {
        Self {
            gateway: Arc::new(gateway),
        }
    }
}

impl ServerHandler for VisaToolService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::default(),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "Tools for Visa partner APIs: foreign exchange rates, ATM lookup, \
                 subscription stop management (VSM), and stop payment management (VSPS)."
                    .to_string(),
            ),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, ErrorData> {
        Ok(ListToolsResult {
            tools: self.gateway.catalog().list_tools(),
            next_cursor: None,
            meta: None,
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        let arguments = request.arguments.unwrap_or_default();
        let outcome = self.gateway.invoke(&request.name, arguments).await;
        Ok(tool_result(outcome))
    }
}

/// Convert a dispatch outcome into the MCP result surface: the partner
/// payload as JSON text, or one `"Error: ..."` line with `is_error` set.
fn tool_result(outcome: Result<Value, GatewayError>) -> CallToolResult {
    match outcome {
        Ok(payload) => {
            let text = serde_json::to_string(&payload).unwrap_or_else(|_| payload.to_string());
            CallToolResult::success(vec![Content::text(text)])
        }
        Err(e) => CallToolResult {
            content: vec![Content::text(format!("Error: {e}"))],
            structured_content: None,
            is_error: Some(true),
            meta: None,
        },
    }
}
