//! MCP server handler implementation.
//!
//! The server plays the host runtime: it delivers lifecycle events and fetches
//! to the controller and routes tool calls to the implementations in
//! [`crate::tools`].
use std::sync::Arc;

use crate::host::ServerHost;
use crate::tools::{
    CacheGetParams, FetchParams, MessageParams, activate_impl, fetch_impl, get_impl, install_impl, keys_impl,
    message_impl, status_impl,
};

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};
use shellcache_client::LifecycleController;

/// The main MCP server handler for shellcache.
#[derive(Clone)]
pub struct ShellcacheServer {
    tool_router: ToolRouter<Self>,
    controller: Arc<LifecycleController>,
    host: Arc<ServerHost>,
}

/// Tool router implementation using the #[tool_router] macro.
#[tool_router]
impl ShellcacheServer {
    /// Create a new server handler.
    pub fn new(controller: Arc<LifecycleController>, host: Arc<ServerHost>) -> Self {
        Self { tool_router: Self::tool_router(), controller, host }
    }

    #[tool(description = "Install the current generation: fetch every shell asset and store them in the shell store. \
                          Fails without creating the store if any asset cannot be fetched.")]
    async fn install(&self) -> Result<CallToolResult, McpError> {
        install_impl(&self.controller).await
    }

    #[tool(description = "Activate the installed generation: delete stale cache stores, then claim open clients.")]
    async fn activate(&self) -> Result<CallToolResult, McpError> {
        activate_impl(&self.controller).await
    }

    /// Route one request through the controller.
    ///
    /// While the generation is not active every request passes through to the network.
    #[tool(description = "Fetch a URL through the cache router. Returns the response and whether it came from \
                          the cache, the network, the navigation fallback or a synthetic placeholder.")]
    async fn fetch(&self, params: Parameters<FetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.controller, &self.host, params.0).await
    }

    #[tool(description = "Post a client message to the controller. {\"type\": \"SKIP_WAITING\"} forces promotion; \
                          other payloads are ignored.")]
    async fn message(&self, params: Parameters<MessageParams>) -> Result<CallToolResult, McpError> {
        message_impl(&self.controller, params.0).await
    }

    #[tool(description = "List cache store names in creation order.")]
    async fn cache_keys(&self) -> Result<CallToolResult, McpError> {
        keys_impl(self.controller.router().storage().as_ref()).await
    }

    #[tool(description = "Look up one stored response by URL and method, optionally within a single store.")]
    async fn cache_get(&self, params: Parameters<CacheGetParams>) -> Result<CallToolResult, McpError> {
        get_impl(self.controller.router().storage().as_ref(), params.0).await
    }

    #[tool(description = "Report lifecycle state, store names, the skip-waiting flag and client bookkeeping.")]
    async fn status(&self) -> Result<CallToolResult, McpError> {
        status_impl(&self.controller, &self.host).await
    }
}

impl ServerHandler for ShellcacheServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "shellcache".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::fixtures::fixture;

    #[tokio::test]
    async fn test_lists_every_tool() {
        let f = fixture().await;
        let server = ShellcacheServer::new(f.controller, f.host);

        let mut names: Vec<String> = server.tool_router.list_all().into_iter().map(|t| t.name.to_string()).collect();
        names.sort();

        assert_eq!(names, vec!["activate", "cache_get", "cache_keys", "fetch", "install", "message", "status"]);
    }

    #[tokio::test]
    async fn test_server_info() {
        let f = fixture().await;
        let info = ShellcacheServer::new(f.controller, f.host).get_info();
        assert_eq!(info.server_info.name, "shellcache");
    }
}
