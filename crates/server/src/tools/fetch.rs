//! fetch tool implementation.
//!
//! Hands one request to the lifecycle controller, exactly as a host runtime
//! would for a fetch event. Pass-through requests go straight to the network.

use std::collections::BTreeMap;

use chrono::Utc;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_client::{Handled, LifecycleController, Network, Source, fetch::canonicalize};
use shellcache_core::{Destination, Request, RequestMode};

use super::{ResponseView, default_method, json_result};
use crate::error::ToolError;
use crate::host::ServerHost;

/// Input parameters for the fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FetchParams {
    /// The URL to request.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default = "default_method")]
    pub method: String,

    /// Request mode: "navigate", "same-origin", "no-cors" (default) or "cors".
    #[serde(default)]
    pub mode: RequestMode,

    /// Fetch destination, e.g. "document", "image", "script".
    #[serde(default)]
    pub destination: Destination,

    /// Extra request headers forwarded to the network.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Identifier of the client issuing the request.
    #[serde(default)]
    pub client_id: Option<String>,
}

/// Where the answer came from, including the host's own network fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Answered {
    Cache,
    Network,
    Fallback,
    Synthetic,
    PassThrough,
}

impl From<Source> for Answered {
    fn from(source: Source) -> Self {
        match source {
            Source::Cache => Answered::Cache,
            Source::Network => Answered::Network,
            Source::Fallback => Answered::Fallback,
            Source::Synthetic => Answered::Synthetic,
        }
    }
}

/// Output structure for the fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FetchOutput {
    pub url: String,
    pub method: String,
    /// The request class, whether or not the controller intercepted it.
    pub class: String,
    pub answered: Answered,
    pub fetched_at: String,
    pub response: ResponseView,
}

fn build_request(params: &FetchParams) -> Result<Request, ToolError> {
    if params.url.trim().is_empty() {
        return Err(ToolError::InvalidInput("url cannot be empty".into()));
    }
    let url = canonicalize(&params.url).map_err(|e| ToolError::InvalidInput(format!("{}: {e}", params.url)))?;

    let mut request = Request::new(&params.method, url).with_mode(params.mode).with_destination(params.destination);
    for (name, value) in &params.headers {
        request = request.with_header(name, value);
    }
    Ok(request)
}

/// Implementation of the fetch tool.
pub async fn fetch_impl(
    controller: &LifecycleController, host: &ServerHost, params: FetchParams,
) -> Result<CallToolResult, McpError> {
    if let Some(client) = &params.client_id {
        host.register_client(client).await;
    }

    let request = build_request(&params)?;
    let class = controller.router().classify(&request);
    let url = request.url.to_string();
    let method = request.method.clone();

    let (response, answered) = match controller.on_request(request.clone()).await? {
        Handled::Respond(served) => (served.response, Answered::from(served.source)),
        Handled::PassThrough => {
            tracing::debug!(%request, "fetching pass-through request");
            (controller.router().network().fetch(&request).await?, Answered::PassThrough)
        }
    };

    let output = FetchOutput {
        url,
        method,
        class: class.as_str().to_string(),
        answered,
        fetched_at: Utc::now().to_rfc3339(),
        response: ResponseView::from(&response),
    };
    json_result(&output)
}
